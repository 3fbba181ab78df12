// ==========================================
// 智能膳食订餐系统 - 菜品目录仓储
// ==========================================
// 红线: 未知 category 一律按 UNKNOWN 入池, 不得丢行
// ==========================================

use crate::domain::recipe::Recipe;
use crate::domain::types::RecipeCategory;
use crate::engine::stores::RecipeCatalog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// RecipeRepository - 菜品目录仓储
// ==========================================
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecipeRepository {
    /// 创建新的 RecipeRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入菜品记录
    pub fn insert(&self, recipe: &Recipe) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO recipe (
                    recipe_id, name, category, calories, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &recipe.recipe_id,
                &recipe.name,
                recipe.category.to_db_str(),
                recipe.calories,
                &recipe.created_at,
                &recipe.updated_at,
            ],
        )?;
        Ok(recipe.recipe_id.clone())
    }

    /// 列出全部菜品（按类别 + 名称排序, 保证选餐顺序稳定）
    pub fn list_all(&self) -> RepositoryResult<Vec<Recipe>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT recipe_id, name, category, calories, created_at, updated_at
               FROM recipe
               ORDER BY category, name, recipe_id"#,
        )?;

        let recipes = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Recipe>, _>>()?;
        Ok(recipes)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        let category_str: String = row.get(2)?;
        Ok(Recipe {
            recipe_id: row.get(0)?,
            name: row.get(1)?,
            category: RecipeCategory::from_str(&category_str),
            calories: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

// ==========================================
// RecipeCatalog 实现
// ==========================================
#[async_trait]
impl RecipeCatalog for RecipeRepository {
    async fn list_recipes(&self) -> RepositoryResult<Vec<Recipe>> {
        self.list_all()
    }
}
