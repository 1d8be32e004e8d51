use serde_json::json;

use super::{error_json, ok_json, TestFixture};

#[tokio::test]
async fn test_delete_other_users_category_is_forbidden() {
    let fixture = TestFixture::new().await;
    let alice = fixture.register("alice@example.com").await;
    let bob = fixture.register("bob@example.com").await;

    let body = ok_json(
        fixture
            .post(&alice, "/api/categories")
            .json(&json!({ "name": "Spices" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let category_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .delete(&bob, &format!("/api/categories/{}", category_id))
        .send()
        .await
        .unwrap();
    error_json(resp, 403, "FORBIDDEN").await;

    let resp = fixture
        .delete(&bob, "/api/categories/does-not-exist")
        .send()
        .await
        .unwrap();
    error_json(resp, 404, "NOT_FOUND").await;

    // Still there for its owner
    ok_json(
        fixture
            .delete(&alice, &format!("/api/categories/{}", category_id))
            .send()
            .await
            .unwrap(),
    )
    .await;
}

#[tokio::test]
async fn test_reorder_categories() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    let body = ok_json(fixture.get(&session, "/api/categories").send().await.unwrap()).await;
    let mut ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect();
    ids.reverse();

    let body = ok_json(
        fixture
            .post(&session, "/api/categories/reorder")
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let reordered: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(reordered, ids.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_product_crud_and_filter() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    let body = ok_json(
        fixture
            .post(&session, "/api/products")
            .json(&json!({ "name": "Oat milk", "defaultQuantity": 1, "defaultUnit": "l" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let product_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["defaultUnit"], "l");

    ok_json(
        fixture
            .post(&session, "/api/products")
            .json(&json!({ "name": "Rye bread" }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let body = ok_json(
        fixture
            .get(&session, "/api/products?q=milk")
            .send()
            .await
            .unwrap(),
    )
    .await;
    let products = body["data"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Oat milk");

    let body = ok_json(
        fixture
            .put(&session, &format!("/api/products/{}", product_id))
            .json(&json!({ "name": "Barista oat milk" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["name"], "Barista oat milk");

    ok_json(
        fixture
            .delete(&session, &format!("/api/products/{}", product_id))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let resp = fixture
        .get(&session, &format!("/api/products/{}", product_id))
        .send()
        .await
        .unwrap();
    error_json(resp, 404, "NOT_FOUND").await;
}
