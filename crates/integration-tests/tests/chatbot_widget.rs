//! Widget API tests against a running server.

use serde_json::{Value, json};

use udyog_integration_tests::{TestContext, seed_domain, test_pool};

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_health() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unknown_domain_message_is_no_content() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .post(ctx.url(&format!("/chatbot/{}/messages", uuid::Uuid::new_v4())))
        .json(&json!({"chat": [], "author": "user", "message": "hello"}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 204);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unknown_domain_config_is_not_found() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url(&format!("/chatbot/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_malformed_domain_id_is_rejected() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .post(ctx.url("/chatbot/not-a-uuid/messages"))
        .json(&json!({"author": "user", "message": "hello"}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_widget_config_for_seeded_domain() {
    let pool = test_pool().await;
    let domain = seed_domain(&pool, &["What's your budget?"]).await;
    let ctx = TestContext::new();

    let config: Value = ctx
        .client
        .get(ctx.url(&format!("/chatbot/{domain}")))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(config["chatBot"]["welcomeMessage"], "Hi!");
    assert_eq!(config["helpdesk"][0]["question"], "Do you ship abroad?");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_first_email_gets_welcome_and_room() {
    let pool = test_pool().await;
    let domain = seed_domain(&pool, &["What's your budget?"]).await;
    let ctx = TestContext::new();

    let body: Value = ctx
        .client
        .post(ctx.url(&format!("/chatbot/{domain}/messages")))
        .json(&json!({
            "chat": [{"role": "assistant", "content": "Hi!"}],
            "author": "user",
            "message": "my email is a@b.com",
        }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(body["response"]["role"], "assistant");
    assert_eq!(
        body["response"]["content"],
        "Welcome aboard a! I'm glad to connect with you. Is there anything you need help with?"
    );
    assert_eq!(body["customerEmail"], "a@b.com");
    assert!(body["chatRoom"].is_string());

    let open: i64 = sqlx::query_scalar(
        r"
        SELECT count(*)
        FROM chatbot.customer_response r
        JOIN chatbot.customer c ON c.id = r.customer_id
        WHERE c.domain_id = $1 AND r.answered IS NULL
        ",
    )
    .bind(domain.as_uuid())
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(open, 1);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_preflight_allows_widget() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .request(
            reqwest::Method::OPTIONS,
            ctx.url(&format!("/chatbot/{}/messages", uuid::Uuid::new_v4())),
        )
        .header("Origin", "https://shop.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("request");
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}
