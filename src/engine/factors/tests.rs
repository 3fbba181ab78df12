use super::*;
use crate::config::OrderingConfig;
use crate::domain::outcome::{CalorieRange, SelectionContext};
use crate::domain::recipe::Recipe;
use crate::domain::types::{CalorieSource, MealOccasion, RecipeCategory, ReviewReason};
use chrono::Utc;

// ==========================================
// 测试辅助函数
// ==========================================

fn create_test_recipe(id: &str, category: RecipeCategory, calories: i32) -> Recipe {
    Recipe {
        recipe_id: id.to_string(),
        name: format!("菜品-{}", id),
        category,
        calories,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn create_test_catalog() -> Vec<Recipe> {
    vec![
        create_test_recipe("e1", RecipeCategory::Entree, 350),
        create_test_recipe("e2", RecipeCategory::Entree, 800),
        create_test_recipe("s1", RecipeCategory::Side, 150),
        create_test_recipe("b1", RecipeCategory::Beverage, 40),
        create_test_recipe("d1", RecipeCategory::Dessert, 90),
    ]
}

fn context_with_source(source: CalorieSource) -> SelectionContext {
    SelectionContext::new(
        "p1",
        MealOccasion::Lunch,
        CalorieRange::new(500, 700, source),
    )
}

// ==========================================
// 测试 1: 过滤与记录
// ==========================================

#[test]
fn test_pipeline_filters_and_records_every_factor() {
    let pipeline = SelectionFactorPipeline::from_config(&OrderingConfig::default());
    let context = context_with_source(CalorieSource::DietOrder);

    let evaluation = pipeline.evaluate(create_test_catalog(), &context);

    // 800 kcal 主菜被热量因子滤除
    assert_eq!(evaluation.scored.len(), 4);
    assert!(evaluation
        .scored
        .iter()
        .all(|s| s.recipe.recipe_id != "e2"));

    // 每个注册因子恰好一条执行记录
    assert_eq!(evaluation.factor_results.len(), 4);
    let calorie_result = evaluation
        .factor_results
        .iter()
        .find(|r| r.factor_name == "CALORIE_CONSTRAINT")
        .unwrap();
    assert!(calorie_result.applied);
    assert_eq!(calorie_result.reason, "Filtered from 5 to 4 recipes");
}

#[test]
fn test_disabled_factors_report_review_not_applied() {
    let pipeline = SelectionFactorPipeline::from_config(&OrderingConfig::default());
    let context = context_with_source(CalorieSource::DietOrder);

    let evaluation = pipeline.evaluate(create_test_catalog(), &context);

    let allergy = evaluation
        .factor_results
        .iter()
        .find(|r| r.factor_name == "ALLERGY_SAFETY")
        .unwrap();
    assert!(!allergy.applied);
    assert!(allergy.flag_for_review);

    // 默认配置只有热量因子实际执行
    assert_eq!(evaluation.applied_factors, vec!["CALORIE_CONSTRAINT"]);

    // 三个停用因子的复核原因全部收集
    assert!(evaluation
        .review_reasons
        .contains(&ReviewReason::MissingAllergyData));
    assert!(evaluation
        .review_reasons
        .contains(&ReviewReason::MissingTextureRequirement));
    assert!(evaluation
        .review_reasons
        .contains(&ReviewReason::MissingDietaryPreferences));
}

// ==========================================
// 测试 2: 复核信号聚合
// ==========================================

#[test]
fn test_system_default_range_adds_calorie_review_reason() {
    let pipeline = SelectionFactorPipeline::from_config(&OrderingConfig::default());

    let diet = pipeline.evaluate(
        create_test_catalog(),
        &context_with_source(CalorieSource::DietOrder),
    );
    assert!(!diet
        .review_reasons
        .contains(&ReviewReason::DefaultCalorieConstraints));

    let default = pipeline.evaluate(
        create_test_catalog(),
        &context_with_source(CalorieSource::SystemDefault),
    );
    assert!(default
        .review_reasons
        .contains(&ReviewReason::DefaultCalorieConstraints));
}

#[test]
fn test_review_reasons_deduplicated_in_order() {
    let pipeline = SelectionFactorPipeline::from_config(&OrderingConfig::default());
    let evaluation = pipeline.evaluate(
        create_test_catalog(),
        &context_with_source(CalorieSource::SystemDefault),
    );

    // 注册顺序: 过敏 → 质地 → 热量 → 宗教
    assert_eq!(
        evaluation.review_reasons,
        vec![
            ReviewReason::MissingAllergyData,
            ReviewReason::MissingTextureRequirement,
            ReviewReason::DefaultCalorieConstraints,
            ReviewReason::MissingDietaryPreferences,
        ]
    );
}

// ==========================================
// 测试 3: 加权评分
// ==========================================

#[test]
fn test_default_weights_keep_raw_calorie_score() {
    // 唯一启用因子权重 100 → 总分 = 原始热量分
    let pipeline = SelectionFactorPipeline::from_config(&OrderingConfig::default());
    let evaluation = pipeline.evaluate(
        create_test_catalog(),
        &context_with_source(CalorieSource::DietOrder),
    );

    let entree = evaluation
        .scored
        .iter()
        .find(|s| s.recipe.recipe_id == "e1")
        .unwrap();
    assert_eq!(entree.score, 100); // 350 正中主菜目标 0.5 × 700

    let side = evaluation
        .scored
        .iter()
        .find(|s| s.recipe.recipe_id == "s1")
        .unwrap();
    assert_eq!(side.score, 93);
}

#[test]
fn test_halved_weight_halves_score() {
    let mut config = OrderingConfig::default();
    config.selection_factors.calorie_constraint.weight = 50;
    let pipeline = SelectionFactorPipeline::from_config(&config);

    let evaluation = pipeline.evaluate(
        create_test_catalog(),
        &context_with_source(CalorieSource::DietOrder),
    );
    let entree = evaluation
        .scored
        .iter()
        .find(|s| s.recipe.recipe_id == "e1")
        .unwrap();
    assert_eq!(entree.score, 50); // 100 × 50 / 100
}

#[test]
fn test_empty_catalog_yields_empty_scored_pool() {
    let pipeline = SelectionFactorPipeline::from_config(&OrderingConfig::default());
    let evaluation = pipeline.evaluate(
        Vec::new(),
        &context_with_source(CalorieSource::DietOrder),
    );
    assert!(evaluation.scored.is_empty());
    assert_eq!(evaluation.factor_results.len(), 4);
}
