use serde_json::json;

use super::{error_json, ok_json, TestFixture};

#[tokio::test]
async fn test_detect_and_merge_plural_duplicates() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let list_id = fixture.create_list(&session, "Weekly shop").await;

    let tomato = fixture
        .add_item(&session, &list_id, "Tomato", 2.0, "pcs")
        .await;
    let tomatoes = fixture
        .add_item(&session, &list_id, "tomatoes", 3.0, "pcs")
        .await;
    fixture.add_item(&session, &list_id, "Milk", 1.0, "l").await;

    let dedup_path = format!("/api/shopping-lists/{}/deduplicate", list_id);
    let body = ok_json(fixture.get(&session, &dedup_path).send().await.unwrap()).await;
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["confidence"], "HIGH");
    assert_eq!(groups[0]["requiresResolution"], false);
    assert_eq!(groups[0]["combinedResult"]["quantity"], 5.0);
    assert_eq!(groups[0]["combinedResult"]["unit"], "pcs");
    assert_eq!(groups[0]["items"].as_array().unwrap().len(), 2);

    let body = ok_json(
        fixture
            .post(&session, &dedup_path)
            .json(&json!({ "itemIds": [tomato, tomatoes] }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["deletedCount"], 1);
    assert_eq!(body["data"]["previousItemCount"], 3);
    assert_eq!(body["data"]["newItemCount"], 2);
    assert_eq!(body["data"]["mergedItem"]["id"], tomato.as_str());
    assert_eq!(body["data"]["mergedItem"]["quantity"], 5.0);

    let items = fixture.list_items(&session, &list_id).await;
    assert_eq!(items.len(), 2);
    let survivor = items.iter().find(|i| i["id"] == tomato.as_str()).unwrap();
    assert_eq!(survivor["quantity"], 5.0);
    assert_eq!(survivor["isConsolidated"], true);

    // Merging again is a no-op once the other item is gone
    let body = ok_json(
        fixture
            .post(&session, &dedup_path)
            .json(&json!({ "itemIds": [tomato, tomatoes] }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["deletedCount"], 0);
    assert_eq!(fixture.list_items(&session, &list_id).await.len(), 2);
}

#[tokio::test]
async fn test_incompatible_units_need_resolution() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let list_id = fixture.create_list(&session, "Weekly shop").await;

    let cloves = fixture
        .add_item(&session, &list_id, "Garlic", 3.0, "cloves")
        .await;
    let whole = fixture
        .add_item(&session, &list_id, "garlic", 1.0, "pcs")
        .await;

    let dedup_path = format!("/api/shopping-lists/{}/deduplicate", list_id);
    let body = ok_json(fixture.get(&session, &dedup_path).send().await.unwrap()).await;
    let group = &body["data"][0];
    assert_eq!(group["requiresResolution"], true);
    assert_eq!(group["confidence"], "LOW");
    assert!(group["combinedResult"].is_null());

    let resp = fixture
        .post(&session, &dedup_path)
        .json(&json!({ "itemIds": [cloves, whole] }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "BAD_REQUEST").await;
    assert_eq!(fixture.list_items(&session, &list_id).await.len(), 2);

    let body = ok_json(
        fixture
            .post(&session, &dedup_path)
            .json(&json!({ "itemIds": [cloves, whole], "quantity": 1, "unit": "head" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["deletedCount"], 1);
    assert_eq!(body["data"]["mergedItem"]["unit"], "head");
    assert_eq!(body["data"]["mergedItem"]["quantity"], 1.0);
}

#[tokio::test]
async fn test_combine_all_skips_groups_needing_resolution() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let list_id = fixture.create_list(&session, "Weekly shop").await;

    fixture.add_item(&session, &list_id, "Onion", 1.0, "pcs").await;
    fixture.add_item(&session, &list_id, "onions", 2.0, "pcs").await;
    fixture.add_item(&session, &list_id, "Flour", 500.0, "g").await;
    fixture.add_item(&session, &list_id, "flour", 1.0, "kg").await;
    fixture.add_item(&session, &list_id, "Garlic", 3.0, "cloves").await;
    fixture.add_item(&session, &list_id, "garlic", 1.0, "pcs").await;

    let body = ok_json(
        fixture
            .post(
                &session,
                &format!("/api/shopping-lists/{}/deduplicate/all", list_id),
            )
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["groupsMerged"], 2);
    assert_eq!(body["data"]["totalDeleted"], 2);
    assert_eq!(body["data"]["skippedGroups"], 1);
    assert!(body["data"]["failures"].as_array().unwrap().is_empty());

    let items = fixture.list_items(&session, &list_id).await;
    assert_eq!(items.len(), 4);
    let flour = items.iter().find(|i| i["name"] == "Flour").unwrap();
    assert_eq!(flour["quantity"], 1.5);
    assert_eq!(flour["unit"], "kg");
}

#[tokio::test]
async fn test_merge_of_missing_items_is_a_no_op() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let list_id = fixture.create_list(&session, "Weekly shop").await;
    fixture.add_item(&session, &list_id, "Milk", 1.0, "l").await;

    let body = ok_json(
        fixture
            .post(
                &session,
                &format!("/api/shopping-lists/{}/deduplicate", list_id),
            )
            .json(&json!({ "itemIds": ["gone-1", "gone-2"] }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["deletedCount"], 0);
    assert_eq!(body["data"]["previousItemCount"], 1);
    assert_eq!(body["data"]["newItemCount"], 1);
    assert!(body["data"]["mergedItem"].is_null());
    assert_eq!(fixture.list_items(&session, &list_id).await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_merges_of_one_group_all_succeed() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    for round in 0..5 {
        let list_id = fixture
            .create_list(&session, &format!("Shop {}", round))
            .await;
        let ids = vec![
            fixture.add_item(&session, &list_id, "Tomato", 1.0, "pcs").await,
            fixture.add_item(&session, &list_id, "tomatoes", 2.0, "pcs").await,
            fixture.add_item(&session, &list_id, "tomatoes", 3.0, "pcs").await,
        ];

        let dedup_path = format!("/api/shopping-lists/{}/deduplicate", list_id);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let request = fixture
                    .post(&session, &dedup_path)
                    .json(&json!({ "itemIds": ids }));
                tokio::spawn(async move { request.send().await.unwrap() })
            })
            .collect();

        let mut deleted = 0;
        for handle in handles {
            let body = ok_json(handle.await.unwrap()).await;
            deleted += body["data"]["deletedCount"].as_i64().unwrap();
        }
        assert_eq!(deleted, 2);

        let items = fixture.list_items(&session, &list_id).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], ids[0].as_str());
        assert_eq!(items[0]["quantity"], 6.0);
    }
}

#[tokio::test]
async fn test_merge_rejects_unrelated_or_purchased_items() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;
    let list_id = fixture.create_list(&session, "Weekly shop").await;

    let milk = fixture.add_item(&session, &list_id, "Milk", 2.0, "pcs").await;
    let bread = fixture.add_item(&session, &list_id, "Bread", 1.0, "pcs").await;
    let apple = fixture.add_item(&session, &list_id, "Apple", 2.0, "pcs").await;
    let apples = fixture.add_item(&session, &list_id, "apples", 3.0, "pcs").await;

    let dedup_path = format!("/api/shopping-lists/{}/deduplicate", list_id);
    let resp = fixture
        .post(&session, &dedup_path)
        .json(&json!({ "itemIds": [milk, bread] }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "BAD_REQUEST").await;

    fixture.set_list_status(&session, &list_id, "finalized").await;
    ok_json(
        fixture
            .patch(
                &session,
                &format!("/api/shopping-lists/{}/items/{}", list_id, apples),
            )
            .json(&json!({ "isPurchased": true }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let resp = fixture
        .post(&session, &dedup_path)
        .json(&json!({ "itemIds": [apple, apples] }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "BAD_REQUEST").await;

    // Nothing was changed by the rejected merges
    let items = fixture.list_items(&session, &list_id).await;
    assert_eq!(items.len(), 4);
    let milk_row = items.iter().find(|i| i["id"] == milk.as_str()).unwrap();
    assert_eq!(milk_row["quantity"], 2.0);
}
