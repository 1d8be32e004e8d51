use serde_json::{json, Value};

use super::{error_json, ok_json, today, Session, TestFixture};

async fn create_recipe(fixture: &TestFixture, session: &Session, recipe: Value) -> Value {
    let body = ok_json(
        fixture
            .post(session, "/api/recipes")
            .json(&recipe)
            .send()
            .await
            .unwrap(),
    )
    .await;
    body["data"].clone()
}

fn lentil_soup() -> Value {
    json!({
        "name": "Lentil soup",
        "description": "Warming red lentil soup with cumin",
        "servings": 2,
        "tags": ["vegan", "soup"],
        "instructions": ["Fry the onion", "Add lentils and stock", "Simmer 20 minutes"],
        "nutrition": { "calories": 300, "proteinG": 18, "carbsG": 45, "fatG": 6 },
        "ingredients": [
            { "name": "Red lentils", "quantity": 200, "unit": "grams" },
            { "name": "Onion", "quantity": 1, "unit": "pcs" },
            { "name": "Vegetable stock", "quantity": 1, "unit": "litre" }
        ]
    })
}

#[tokio::test]
async fn test_recipe_crud() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    let recipe = create_recipe(&fixture, &session, lentil_soup()).await;
    let recipe_id = recipe["id"].as_str().unwrap().to_string();
    assert_eq!(recipe["source"], "manual");
    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 3);
    assert_eq!(recipe["ingredients"][0]["unit"], "g");
    assert_eq!(recipe["ingredients"][2]["unit"], "l");

    let body = ok_json(
        fixture
            .put(&session, &format!("/api/recipes/{}", recipe_id))
            .json(&json!({
                "servings": 4,
                "ingredients": [{ "name": "Red lentils", "quantity": 400, "unit": "g" }]
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["servings"], 4);
    assert_eq!(body["data"]["name"], "Lentil soup");
    assert_eq!(body["data"]["ingredients"].as_array().unwrap().len(), 1);

    let body = ok_json(fixture.get(&session, "/api/recipes").send().await.unwrap()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = fixture
        .post(&session, "/api/recipes")
        .json(&json!({ "name": "", "servings": 2 }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "VALIDATION_ERROR").await;

    ok_json(
        fixture
            .delete(&session, &format!("/api/recipes/{}", recipe_id))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let resp = fixture
        .get(&session, &format!("/api/recipes/{}", recipe_id))
        .send()
        .await
        .unwrap();
    error_json(resp, 404, "NOT_FOUND").await;
}

#[tokio::test]
async fn test_search_is_scoped_to_owner() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("alice@example.com").await;
    let bob = fixture.register("bob@example.com").await;

    let soup = create_recipe(&fixture, &alice, lentil_soup()).await;
    create_recipe(
        &fixture,
        &alice,
        json!({
            "name": "Pancakes",
            "servings": 4,
            "ingredients": [{ "name": "Flour", "quantity": 250, "unit": "g" }]
        }),
    )
    .await;
    create_recipe(
        &fixture,
        &bob,
        json!({ "name": "Bob's lentil curry", "servings": 2 }),
    )
    .await;

    let body = ok_json(
        fixture
            .get(&alice, "/api/recipes/search?q=lentil")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["recipe"]["id"], soup["id"]);

    // Ingredients are searchable too
    let body = ok_json(
        fixture
            .get(&alice, "/api/recipes/search?q=flour")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["results"][0]["recipe"]["name"], "Pancakes");

    let body = ok_json(
        fixture
            .get(&bob, "/api/recipes/search?q=lentil")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["recipe"]["name"], "Bob's lentil curry");

    // Deleted recipes drop out of the index
    ok_json(
        fixture
            .delete(&alice, &format!("/api/recipes/{}", soup["id"].as_str().unwrap()))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let body = ok_json(
        fixture
            .get(&alice, "/api/recipes/search?q=lentil")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_recipe_nutrition_totals() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let recipe = create_recipe(&fixture, &session, lentil_soup()).await;

    let body = ok_json(
        fixture
            .get(
                &session,
                &format!("/api/recipes/{}/nutrition", recipe["id"].as_str().unwrap()),
            )
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["servings"], 2);
    assert_eq!(body["data"]["perServing"]["calories"], 300.0);
    assert_eq!(body["data"]["total"]["calories"], 600.0);
    assert_eq!(body["data"]["total"]["proteinG"], 36.0);
    assert_eq!(body["data"]["complete"], true);
}

#[tokio::test]
async fn test_meal_plan_lifecycle_and_nutrition() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let recipe = create_recipe(&fixture, &session, lentil_soup()).await;

    ok_json(
        fixture
            .put(&session, "/api/profile")
            .json(&json!({ "dailyCalorieTarget": 2000 }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let body = ok_json(
        fixture
            .post(&session, "/api/meal-plans")
            .json(&json!({
                "name": "This week",
                "weekStartDate": today(),
                "entries": [
                    { "date": today(), "mealType": "dinner", "recipeId": recipe["id"], "servings": 2 },
                    { "date": today(), "mealType": "lunch", "customName": "Leftovers" }
                ]
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let plan_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "draft");
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e["title"] == "Lentil soup"));

    let body = ok_json(
        fixture
            .get(&session, &format!("/api/meal-plans/{}/nutrition", plan_id))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let days = body["data"]["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    let first = days.iter().find(|d| d["date"] == today().as_str()).unwrap();
    assert_eq!(first["calories"], 600.0);
    assert_eq!(first["unknownEntries"], 1);
    assert_eq!(first["calorieStatus"], "under");
    assert_eq!(body["data"]["dailyCalorieTarget"], 2000);
    assert_eq!(body["data"]["dailyAverage"]["calories"], 600.0);

    // Entries outside the planned week are rejected
    let resp = fixture
        .put(&session, &format!("/api/meal-plans/{}/entries", plan_id))
        .json(&json!({
            "entries": [{ "date": super::days_ago(1), "mealType": "dinner", "customName": "Pizza" }]
        }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "VALIDATION_ERROR").await;

    let body = ok_json(
        fixture
            .put(&session, &format!("/api/meal-plans/{}/entries", plan_id))
            .json(&json!({
                "entries": [{ "date": today(), "mealType": "dinner", "customName": "Pizza" }]
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);

    let body = ok_json(
        fixture
            .put(&session, &format!("/api/meal-plans/{}", plan_id))
            .json(&json!({ "status": "active" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["status"], "active");

    ok_json(
        fixture
            .delete(&session, &format!("/api/meal-plans/{}", plan_id))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let body = ok_json(fixture.get(&session, "/api/meal-plans").send().await.unwrap()).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_summary() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    let body = ok_json(fixture.get(&session, "/api/dashboard").send().await.unwrap()).await;
    assert_eq!(body["data"]["counts"]["recipes"], 0);
    assert!(body["data"]["mealPlan"].is_null());
    assert!(body["data"]["shoppingList"].is_null());

    let recipe = create_recipe(&fixture, &session, lentil_soup()).await;
    ok_json(
        fixture
            .post(&session, "/api/meal-plans")
            .json(&json!({
                "name": "This week",
                "weekStartDate": today(),
                "entries": [
                    { "date": today(), "mealType": "dinner", "recipeId": recipe["id"], "servings": 2 }
                ]
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    ok_json(
        fixture
            .post(&session, "/api/inventory")
            .json(&json!({ "name": "Milk", "quantity": 1, "unit": "l", "expiryDate": today() }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    ok_json(
        fixture
            .post(&session, "/api/staples")
            .json(&json!({ "name": "Eggs", "quantity": 12, "frequency": "weekly" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    fixture.create_list(&session, "Weekly shop").await;

    let body = ok_json(fixture.get(&session, "/api/dashboard").send().await.unwrap()).await;
    let data = &body["data"];
    assert_eq!(data["counts"]["recipes"], 1);
    assert_eq!(data["counts"]["inventoryItems"], 1);
    assert_eq!(data["counts"]["staplesDue"], 1);
    assert_eq!(data["counts"]["openShoppingLists"], 1);
    assert_eq!(data["mealPlan"]["today"].as_array().unwrap().len(), 1);
    assert_eq!(data["shoppingList"]["name"], "Weekly shop");
    assert_eq!(data["expiringInventory"][0]["name"], "Milk");
}
