// Dev utility: reset the database and seed a demo ward scenario
// (patients, diet orders, recipe catalog) so the CLI can be exercised
// end to end.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path]

use chrono::{Duration, Local, Utc};
use smart_meal_ordering::db::{default_db_path, init_schema, open_sqlite_connection};
use smart_meal_ordering::domain::patient::{DietOrder, Patient};
use smart_meal_ordering::domain::recipe::Recipe;
use smart_meal_ordering::domain::types::RecipeCategory;
use smart_meal_ordering::repository::{PatientRepository, RecipeRepository};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_db_path().to_string_lossy().into_owned());

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let patients = PatientRepository::new(Arc::clone(&conn));
    let recipes = RecipeRepository::new(Arc::clone(&conn));

    seed_patients(&patients)?;
    seed_recipes(&recipes)?;

    print_quick_counts(&conn);
    eprintln!("Seeded demo scenario into {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_patients(repo: &PatientRepository) -> Result<(), Box<dyn Error>> {
    let today = Local::now().date_naive();

    // (id, first, last, room, admitted days ago, diet order)
    let roster: Vec<(&str, &str, &str, &str, i64, Option<(&str, Option<i32>, Option<i32>)>)> = vec![
        // 常规医嘱
        ("PAT-001", "Mark", "Johnson", "204", 12, Some(("Regular", Some(1500), Some(2500)))),
        // 无医嘱 → 运行时落到系统默认区间并标记复核
        ("PAT-002", "Sophie", "Lee", "310", 3, None),
        // 高热量医嘱
        ("PAT-003", "Alan", "Wu", "118", 45, Some(("High Calorie", Some(2000), Some(2500)))),
        // 心内科限制医嘱
        ("PAT-004", "Grace", "Kim", "122", 8, Some(("Cardiac", Some(1200), Some(1800)))),
        // 半截医嘱 (缺上限) → 同样按无医嘱降级
        ("PAT-005", "Peter", "Novak", "401", 1, Some(("Pending Assessment", Some(1800), None))),
    ];

    for (id, first, last, room, days_ago, diet) in roster {
        let patient = Patient {
            patient_id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            room_number: Some(room.to_string()),
            admitted_on: Some(today - Duration::days(days_ago)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        repo.insert(&patient)?;

        if let Some((diet_name, min, max)) = diet {
            let order = DietOrder {
                diet_order_id: Uuid::new_v4().to_string(),
                patient_id: id.to_string(),
                diet_name: diet_name.to_string(),
                daily_calories_min: min,
                daily_calories_max: max,
                is_active: true,
                effective_on: Some(today - Duration::days(days_ago)),
                created_at: Utc::now(),
            };
            repo.insert_diet_order(&order)?;
        }
    }
    Ok(())
}

fn seed_recipes(repo: &RecipeRepository) -> Result<(), Box<dyn Error>> {
    let menu: Vec<(&str, RecipeCategory, i32)> = vec![
        // 主菜
        ("Grilled Chicken Breast", RecipeCategory::Entree, 350),
        ("Baked Salmon Fillet", RecipeCategory::Entree, 380),
        ("Beef Stew", RecipeCategory::Entree, 420),
        ("Vegetable Lasagna", RecipeCategory::Entree, 320),
        // 配菜
        ("Steamed Rice", RecipeCategory::Side, 150),
        ("Garden Salad", RecipeCategory::Side, 80),
        ("Mashed Potatoes", RecipeCategory::Side, 180),
        ("Roasted Vegetables", RecipeCategory::Side, 120),
        // 饮品
        ("Orange Juice", RecipeCategory::Beverage, 110),
        ("Low-fat Milk", RecipeCategory::Beverage, 90),
        ("Herbal Tea", RecipeCategory::Beverage, 5),
        // 甜点
        ("Fruit Cup", RecipeCategory::Dessert, 90),
        ("Vanilla Pudding", RecipeCategory::Dessert, 140),
        ("Sugar-free Gelatin", RecipeCategory::Dessert, 10),
    ];

    for (index, (name, category, calories)) in menu.into_iter().enumerate() {
        let recipe = Recipe {
            recipe_id: format!("RCP-{:03}", index + 1),
            name: name.to_string(),
            category,
            calories,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        repo.insert(&recipe)?;
    }
    Ok(())
}

fn print_quick_counts(conn: &Arc<Mutex<rusqlite::Connection>>) {
    let c = conn.lock().unwrap();
    for table in ["patient", "diet_order", "recipe", "tray_order"] {
        let count: i64 = c
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .unwrap_or(0);
        println!("{}: {}", table, count);
    }
}
