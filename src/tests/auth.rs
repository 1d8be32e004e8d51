use serde_json::{json, Value};

use super::{error_json, ok_json, session_cookie, Session, TestFixture};

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_unauthenticated_request_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/shopping-lists"))
        .send()
        .await
        .unwrap();
    let body = error_json(resp, 401, "UNAUTHORIZED").await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("cook@example.com").await;

    let (id, _) = session.cookie.split_once('.').unwrap();
    let forged = Session {
        cookie: format!("{}.not-the-secret", id),
        user_id: session.user_id.clone(),
    };

    let resp = fixture.get(&forged, "/api/auth/me").send().await.unwrap();
    error_json(resp, 401, "UNAUTHORIZED").await;
}

#[tokio::test]
async fn test_register_me_and_defaults() {
    let fixture = TestFixture::new().await;
    let session = fixture.register("Cook@Example.com").await;

    let body = ok_json(fixture.get(&session, "/api/auth/me").send().await.unwrap()).await;
    assert_eq!(body["data"]["email"], "cook@example.com");
    assert_eq!(body["data"]["id"], session.user_id.as_str());

    // Registration seeds the profile and the default categories
    let body = ok_json(fixture.get(&session, "/api/profile").send().await.unwrap()).await;
    assert!(body["data"]["householdSize"].as_i64().unwrap() >= 1);

    let body = ok_json(fixture.get(&session, "/api/categories").send().await.unwrap()).await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_short_passwords() {
    let fixture = TestFixture::new().await;
    fixture.register("cook@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({
            "email": "COOK@example.com",
            "password": "another password",
            "name": "Someone Else"
        }))
        .send()
        .await
        .unwrap();
    error_json(resp, 409, "CONFLICT").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({
            "email": "new@example.com",
            "password": "short",
            "name": "New Cook"
        }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "VALIDATION_ERROR").await;
}

#[tokio::test]
async fn test_login_and_logout() {
    let fixture = TestFixture::new().await;
    fixture.register("cook@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "cook@example.com", "password": "wrong password" }))
        .send()
        .await
        .unwrap();
    error_json(resp, 400, "VALIDATION_ERROR").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "cook@example.com", "password": "correct horse battery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = session_cookie(&resp).unwrap();
    let body: Value = resp.json().await.unwrap();
    let session = Session {
        cookie,
        user_id: body["data"]["id"].as_str().unwrap().to_string(),
    };

    ok_json(fixture.get(&session, "/api/auth/me").send().await.unwrap()).await;

    let resp = fixture.post(&session, "/api/auth/logout").send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let cleared = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cleared.contains("Max-Age=0"));

    let resp = fixture.get(&session, "/api/auth/me").send().await.unwrap();
    error_json(resp, 401, "UNAUTHORIZED").await;
}
