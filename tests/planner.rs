mod common;

use axum::http::Method;
use chrono::NaiveDate;
use common::{services, spawn_backend};
use pantry_client::{
    PageError,
    feedback::ToastKind,
    models::{Day, MealEntry, MealType, NutritionTotals},
    pages::{MealPlannerPage, NutritionTrackerPage, nutrition::MealLogEntry},
};
use serde_json::json;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
}

#[tokio::test]
async fn empty_backend_gives_empty_week() {
    let server = spawn_backend().await;
    let (services, toasts) = services(&server.base_url, true);
    let mut page = MealPlannerPage::starting_at(services, date(21));

    page.load_plan().await.unwrap();

    assert_eq!(page.week_start(), date(18));
    assert_eq!(page.plan().id, None);
    assert_eq!(page.plan().meals.len(), 7);
    assert_eq!(page.counts().total, 0);
    assert!(toasts.last().is_none());

    let request = server.backend.last_to(Method::GET, "/meal-plans").unwrap();
    let query = request.query.unwrap();
    assert!(query.contains("start_date=2026-10-18"));
    assert!(query.contains("end_date=2026-10-24"));
}

#[tokio::test]
async fn navigating_loads_the_next_week() {
    let server = spawn_backend().await;
    server.backend.set_meal_plan(json!({
        "_id": "mp-9",
        "start_date": "2026-10-25",
        "end_date": "2026-10-31",
        "meals": {
            "tuesday": { "dinner": { "recipe_id": "r4", "recipe_title": "Curry" } }
        }
    }));
    let (services, _) = services(&server.base_url, true);
    let mut page = MealPlannerPage::starting_at(services, date(18));

    page.navigate_week(1).await.unwrap();

    assert_eq!(page.week_start(), date(25));
    assert_eq!(page.week_end(), date(31));
    assert_eq!(page.plan().id.as_deref(), Some("mp-9"));
    assert_eq!(page.plan().meals.len(), 7);
    assert_eq!(page.counts().dinners, 1);
    assert_eq!(page.counts().total, 1);

    let query = server
        .backend
        .last_to(Method::GET, "/meal-plans")
        .and_then(|r| r.query)
        .unwrap();
    assert!(query.contains("start_date=2026-10-25"));
}

#[tokio::test]
async fn confirmed_auto_generate_replaces_the_week() {
    let server = spawn_backend().await;
    let (services, toasts) = services(&server.base_url, true);
    let mut page = MealPlannerPage::starting_at(services, date(18));
    page.preferences = json!({ "vegetarian": true });

    page.auto_generate().await.unwrap();

    let request = server
        .backend
        .last_to(Method::POST, "/meal-plans/generate")
        .unwrap();
    assert_eq!(request.body["start_date"], "2026-10-18");
    assert_eq!(request.body["end_date"], "2026-10-24");
    assert_eq!(request.body["preferences"]["vegetarian"], true);

    let counts = page.counts();
    assert_eq!(counts.breakfasts, 1);
    assert_eq!(counts.snacks, 1);
    assert_eq!(counts.total, 2);
    assert_eq!(page.plan().id.as_deref(), Some("mp-generated"));
    let monday = page.plan().day(Day::Monday).unwrap();
    assert_eq!(monday.breakfast.entry().unwrap().servings, 2);
    assert_eq!(toasts.last().unwrap().kind, ToastKind::Success);
}

#[tokio::test]
async fn declined_auto_generate_sends_nothing() {
    let server = spawn_backend().await;
    let (services, _) = services(&server.base_url, false);
    let mut page = MealPlannerPage::starting_at(services, date(18));

    let result = page.auto_generate().await;

    assert!(matches!(result, Err(PageError::Cancelled)));
    assert!(server.backend.requests().is_empty());
}

#[tokio::test]
async fn save_creates_then_updates_plan() {
    let server = spawn_backend().await;
    let (services, _) = services(&server.base_url, true);
    let mut page = MealPlannerPage::starting_at(services, date(18));
    page.add_to_slot(
        Day::Monday,
        MealType::Dinner,
        MealEntry {
            recipe_id: "r1".into(),
            recipe_title: "Spinach omelette".into(),
            servings: 1,
        },
    );

    page.save().await.unwrap();

    let created = server.backend.last_to(Method::POST, "/meal-plans").unwrap();
    assert_eq!(created.body["meals"]["monday"]["dinner"]["recipe_id"], "r1");
    assert_eq!(created.body["start_date"], "2026-10-18");
    assert!(created.body.get("_id").is_none());
    assert_eq!(page.plan().id.as_deref(), Some("mp-1"));

    page.save().await.unwrap();

    assert_eq!(
        server.backend.paths(),
        ["POST /meal-plans", "PUT /meal-plans/mp-1"]
    );
    let updated = server.backend.last_to(Method::PUT, "/meal-plans/mp-1").unwrap();
    assert_eq!(updated.body["_id"], "mp-1");
    assert_eq!(updated.body["meals"]["monday"]["dinner"]["recipe_title"], "Spinach omelette");
    assert_eq!(page.counts().dinners, 1);
}

#[tokio::test]
async fn water_changes_are_posted_for_the_day() {
    let server = spawn_backend().await;
    let (services, _) = services(&server.base_url, true);
    let mut page = NutritionTrackerPage::on(services, date(18));

    page.adjust_water(1).await.unwrap();
    page.adjust_water(1).await.unwrap();

    assert_eq!(page.water_glasses(), 2);
    assert_eq!(server.backend.water(), 2);
    let posted = server
        .backend
        .last_to(Method::POST, "/nutrition/water-intake")
        .unwrap();
    assert_eq!(posted.body, json!({ "date": "2026-10-18", "glasses": 2 }));

    page.set_water(20).await.unwrap();
    assert_eq!(page.water_glasses(), 8);
    assert_eq!(server.backend.water(), 8);

    page.load_day().await.unwrap();
    assert_eq!(page.log().water_intake_glasses, 8);
}

#[tokio::test]
async fn logged_meal_shows_up_after_reload() {
    let server = spawn_backend().await;
    let (services, toasts) = services(&server.base_url, true);
    let mut page = NutritionTrackerPage::on(services, date(18));

    page.log_meal(MealLogEntry {
        name: "  Oatmeal ".into(),
        meal_type: MealType::Breakfast,
        nutrition: NutritionTotals {
            calories: 350.0,
            protein: 12.0,
            ..NutritionTotals::default()
        },
        recipe_id: None,
    })
    .await
    .unwrap();

    let posted = server
        .backend
        .last_to(Method::POST, "/nutrition/log-meal")
        .unwrap();
    assert_eq!(posted.body["mealName"], "Oatmeal");
    assert_eq!(posted.body["mealType"], "breakfast");
    assert_eq!(posted.body["date"], "2026-10-18");
    assert!(posted.body.get("recipe").is_none());

    assert_eq!(
        server.backend.paths(),
        ["POST /nutrition/log-meal", "GET /nutrition/daily/2026-10-18"]
    );
    let log = page.log();
    assert_eq!(log.date, date(18));
    assert_eq!(log.meals.len(), 1);
    assert_eq!(log.meals[0].meal_name, "Oatmeal");
    assert_eq!(log.meals[0].id.as_deref(), Some("meal-0"));
    assert_eq!(log.totals.calories, 350.0);
    assert_eq!(toasts.last().unwrap().message, "Oatmeal logged successfully!");
}

#[tokio::test]
async fn load_day_only_shows_meals_for_that_date() {
    let server = spawn_backend().await;
    let (services, _) = services(&server.base_url, true);
    let mut page = NutritionTrackerPage::on(services, date(17));

    page.log_meal(MealLogEntry {
        name: "Soup".into(),
        meal_type: MealType::Dinner,
        nutrition: NutritionTotals {
            calories: 200.0,
            ..NutritionTotals::default()
        },
        recipe_id: Some("r1".into()),
    })
    .await
    .unwrap();
    assert_eq!(page.log().meals.len(), 1);

    page.set_date_at(date(18), date(18)).await.unwrap();

    assert_eq!(page.date(), date(18));
    assert!(page.log().meals.is_empty());
    assert_eq!(page.log().totals.calories, 0.0);
}
