use once_cell::sync::Lazy;
use reqwest::{header, StatusCode};
use serde_json::json;

use common::{LatestResponse, MessageDto};

mod helpers;
use helpers::SIMULATOR_AUTH;

static TRACING: Lazy<()> = Lazy::new(|| {
    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO);
    subscriber.init();
});

#[tokio::test]
async fn simulator_session_over_http() {
    Lazy::force(&TRACING);

    // Arrange: Spawn the app and get a client
    let (addr, client, _db_pool) = helpers::spawn_app().await;
    let base = format!("http://{addr}/api");

    // 1. Register two users
    for (i, name) in ["alice", "bob"].into_iter().enumerate() {
        let response = client
            .post(format!("{base}/register?latest={}", i + 1))
            .header(header::AUTHORIZATION, SIMULATOR_AUTH)
            .json(&json!({ "username": name, "email": format!("{name}@example.com"), "pwd": "pw" }))
            .send()
            .await
            .expect("Failed to execute register request.");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    // 2. bob tweets, alice follows bob
    let response = client
        .post(format!("{base}/msgs/bob?latest=3"))
        .header(header::AUTHORIZATION, SIMULATOR_AUTH)
        .json(&json!({ "content": "over the wire" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .post(format!("{base}/fllws/alice?latest=4"))
        .header(header::AUTHORIZATION, SIMULATOR_AUTH)
        .json(&json!({ "follow": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // 3. Read everything back
    let msgs: Vec<MessageDto> = client
        .get(format!("{base}/msgs/bob?no=5"))
        .header(header::AUTHORIZATION, SIMULATOR_AUTH)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].content, "over the wire");
    assert_eq!(msgs[0].user, "bob");

    let follows: serde_json::Value = client
        .get(format!("{base}/fllws/alice"))
        .header(header::AUTHORIZATION, SIMULATOR_AUTH)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(follows, json!({ "follows": ["bob"] }));

    let latest: LatestResponse = client
        .get(format!("{base}/latest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest.latest, 4);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    Lazy::force(&TRACING);
    let (addr, client, _db_pool) = helpers::spawn_app().await;

    let response = client
        .get(format!("http://{addr}/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Missing x-request-id header");
    assert!(!request_id.is_empty());

    // A caller-supplied id is echoed back
    let response = client
        .get(format!("http://{addr}/public"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn browser_login_over_http() {
    Lazy::force(&TRACING);
    let (addr, client, _db_pool) = helpers::spawn_app().await;

    let response = client
        .post(format!("http://{addr}/register"))
        .form(&[
            ("username", "carol"),
            ("email", "carol@example.com"),
            ("password", "pw"),
            ("password2", "pw"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client
        .post(format!("http://{addr}/login"))
        .form(&[("username", "carol"), ("password", "pw")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let session = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session="))
        .and_then(|value| value.split(';').next())
        .expect("Login did not set a session cookie")
        .to_string();

    let response = client
        .get(format!("http://{addr}/"))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = response.text().await.unwrap();
    assert!(page.contains("My Timeline"));
    assert!(page.contains("sign out [carol]"));
}
