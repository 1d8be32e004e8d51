use std::sync::Arc;

use serde_json::json;

use super::{error_json, ok_json, today, MockLlm, TestFixture};
use crate::ai::LlmProvider;

async fn fixture_with_mock() -> (TestFixture, Arc<MockLlm>) {
    let llm = Arc::new(MockLlm::default());
    let fixture = TestFixture::with_llm(Some(llm.clone() as Arc<dyn LlmProvider>)).await;
    (fixture, llm)
}

#[tokio::test]
async fn test_ai_endpoints_unavailable_without_llm() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    let resp = fixture
        .post(&session, "/api/nutritionist/chat")
        .json(&json!({ "message": "How much protein do I need?" }))
        .send()
        .await
        .unwrap();
    error_json(resp, 503, "AI_UNAVAILABLE").await;

    let resp = fixture
        .post(&session, "/api/recipes/generate")
        .json(&json!({ "prompt": "Something with chickpeas" }))
        .send()
        .await
        .unwrap();
    error_json(resp, 503, "AI_UNAVAILABLE").await;

    // Nothing was stored for the failed chat
    let body = ok_json(
        fixture
            .get(&session, "/api/nutritionist/history")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_nutritionist_chat_keeps_history() {
    let (fixture, llm) = fixture_with_mock().await;
    let session = fixture.register("cook@example.com").await;

    llm.push_reply("Aim for about 0.8 g of protein per kg of body weight.");
    let body = ok_json(
        fixture
            .post(&session, "/api/nutritionist/chat")
            .json(&json!({ "message": "How much protein do I need?" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["message"]["role"], "user");
    assert_eq!(body["data"]["message"]["content"], "How much protein do I need?");
    assert_eq!(body["data"]["reply"]["role"], "assistant");
    assert!(body["data"]["reply"]["content"]
        .as_str()
        .unwrap()
        .contains("protein"));

    let request = llm.last_request().unwrap();
    assert!(request
        .messages
        .iter()
        .any(|m| m.content == "How much protein do I need?"));

    let body = ok_json(
        fixture
            .get(&session, "/api/nutritionist/history")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[1]["role"], "assistant");

    let body = ok_json(
        fixture
            .delete(&session, "/api/nutritionist/history")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["deleted"], 2);
}

#[tokio::test]
async fn test_failed_llm_call_is_bad_gateway() {
    let (fixture, _llm) = fixture_with_mock().await;
    let session = fixture.register("cook@example.com").await;

    // No scripted reply makes the provider fail
    let resp = fixture
        .post(&session, "/api/nutritionist/chat")
        .json(&json!({ "message": "Is rice healthy?" }))
        .send()
        .await
        .unwrap();
    error_json(resp, 502, "AI_ERROR").await;
}

#[tokio::test]
async fn test_generate_recipe_returns_unsaved_draft() {
    let (fixture, llm) = fixture_with_mock().await;
    let session = fixture.register("cook@example.com").await;

    llm.push_reply(
        json!({
            "name": "Chickpea curry",
            "servings": 4,
            "instructions": ["Fry onion", "Add chickpeas and tomatoes", "Simmer"],
            "ingredients": [
                { "name": "Chickpeas", "quantity": 2, "unit": "cans" },
                { "name": "Onion", "quantity": 1, "unit": "piece" }
            ]
        })
        .to_string(),
    );

    let body = ok_json(
        fixture
            .post(&session, "/api/recipes/generate")
            .json(&json!({ "prompt": "Something with chickpeas" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["name"], "Chickpea curry");
    assert_eq!(body["data"]["source"], "ai");
    assert_eq!(body["data"]["ingredients"][1]["unit"], "pcs");
    assert!(llm.last_request().unwrap().json);

    let body = ok_json(fixture.get(&session, "/api/recipes").send().await.unwrap()).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_meal_plan_saves_draft() {
    let (fixture, llm) = fixture_with_mock().await;
    let session = fixture.register("cook@example.com").await;

    let resp = fixture
        .post(&session, "/api/meal-plans/generate")
        .json(&json!({ "weekStartDate": today() }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "VALIDATION_ERROR").await;
    assert_eq!(llm.request_count(), 0);

    let body = ok_json(
        fixture
            .post(&session, "/api/recipes")
            .json(&json!({ "name": "Tomato pasta", "servings": 2 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let recipe_id = body["data"]["id"].as_str().unwrap().to_string();

    llm.push_reply(
        json!({
            "entries": [
                { "date": today(), "mealType": "dinner", "recipeId": recipe_id },
                { "date": today(), "mealType": "dinner", "recipeId": "not-a-recipe" },
                { "date": today(), "mealType": "breakfast", "recipeId": recipe_id }
            ]
        })
        .to_string(),
    );

    let body = ok_json(
        fixture
            .post(&session, "/api/meal-plans/generate")
            .json(&json!({ "weekStartDate": today() }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(body["data"]["name"], format!("Week of {}", today()));
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["recipeId"], recipe_id.as_str());
    assert_eq!(entries[0]["mealType"], "dinner");
    // Household size of a fresh profile
    assert_eq!(entries[0]["servings"], 2);

    let body = ok_json(fixture.get(&session, "/api/meal-plans").send().await.unwrap()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dedup_uses_ai_for_unconvertible_units() {
    let (fixture, llm) = fixture_with_mock().await;
    let session = fixture.register("cook@example.com").await;
    let list_id = fixture.create_list(&session, "Weekly shop").await;

    let cloves = fixture
        .add_item(&session, &list_id, "Garlic", 4.0, "cloves")
        .await;
    let whole = fixture
        .add_item(&session, &list_id, "garlic", 1.0, "pcs")
        .await;
    fixture
        .add_item(&session, &list_id, "Apple", 2.0, "pcs")
        .await;
    fixture
        .add_item(&session, &list_id, "apples", 1.0, "pcs")
        .await;

    let suggestion = json!({ "quantity": 1.5, "unit": "heads", "reasoning": "A head has about 10 cloves" })
        .to_string();

    // Only the group that needs judgement goes to the assistant
    llm.push_reply(suggestion.clone());
    let dedup_path = format!("/api/shopping-lists/{}/deduplicate", list_id);
    let body = ok_json(
        fixture
            .get(&session, &format!("{}?useAI=true", dedup_path))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(llm.request_count(), 1);
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    let garlic = groups
        .iter()
        .find(|g| g["requiresResolution"] == true)
        .unwrap();
    assert_eq!(garlic["aiSuggestion"]["unit"], "head");
    assert_eq!(garlic["aiSuggestion"]["quantity"], 1.5);
    let apples = groups
        .iter()
        .find(|g| g["requiresResolution"] == false)
        .unwrap();
    assert!(apples.get("aiSuggestion").is_none());

    llm.push_reply(suggestion);
    let body = ok_json(
        fixture
            .post(&session, &dedup_path)
            .json(&json!({ "itemIds": [cloves, whole], "useAI": true }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(llm.request_count(), 2);
    assert_eq!(body["data"]["deletedCount"], 1);
    assert_eq!(body["data"]["mergedItem"]["unit"], "head");
    assert_eq!(body["data"]["mergedItem"]["quantity"], 1.5);
}
