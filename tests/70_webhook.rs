mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::State, http::HeaderMap, http::StatusCode as AxumStatus, routing::post, Json, Router};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;
use studio_api::notify::DeliveryStats;

type Received = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// Records every POST it gets: (Authorization header, JSON body)
async fn spawn_receiver(status: AxumStatus) -> Result<(String, Received)> {
    let received: Received = Arc::default();
    let port = portpicker::pick_unused_port().context("no free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;

    let router = Router::new()
        .route(
            "/hook",
            post(
                move |State(received): State<Received>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    received.lock().expect("lock").push((auth, body));
                    status
                },
            ),
        )
        .with_state(received.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok((format!("http://127.0.0.1:{}/hook", port), received))
}

async fn wait_for(received: &Received, count: usize) -> Vec<(Option<String>, Value)> {
    for _ in 0..100 {
        {
            let events = received.lock().expect("lock");
            if events.len() >= count {
                return events.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    received.lock().expect("lock").clone()
}

/// Counters move after the receiver has answered, so poll for them
async fn settled_stats(app: &TestApp, done: impl Fn(&DeliveryStats) -> bool) -> DeliveryStats {
    for _ in 0..100 {
        let stats = app.state.notifier.stats();
        if done(&stats) {
            return stats;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    app.state.notifier.stats()
}

async fn app_with_webhook(url: String) -> Result<TestApp> {
    let mut config = common::test_config();
    config.webhook.url = Some(url);
    config.webhook.token = Some("hook-token".into());
    config.webhook.timeout_secs = 2;
    TestApp::spawn_with(config).await
}

#[tokio::test]
async fn faq_changes_are_delivered_with_bearer_token() -> Result<()> {
    let (url, received) = spawn_receiver(AxumStatus::OK).await?;
    let app = app_with_webhook(url).await?;
    let token = app.admin_token().await?;

    let (status, body) = app
        .send(Method::POST, "faqs", &token, &json!({"question": "Parking?", "answer": "Street"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().expect("id");

    app.send(Method::PUT, "faqs", &token, &json!({"id": id, "question": "Parking?", "answer": "Lot behind"}))
        .await?;
    app.send(Method::DELETE, "faqs", &token, &json!({"id": id})).await?;

    let events = wait_for(&received, 3).await;
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|(auth, _)| auth.as_deref() == Some("Bearer hook-token")));
    assert_eq!(events[0].1, json!({"id": id, "question": "Parking?", "answer": "Street", "action": "create"}));
    assert_eq!(events[1].1["action"], "update");
    assert_eq!(events[1].1["answer"], "Lot behind");
    assert_eq!(events[2].1, json!({"id": id, "action": "delete"}));

    let stats = settled_stats(&app, |s| s.delivered == 3).await;
    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.failed, 0);
    Ok(())
}

#[tokio::test]
async fn other_resources_do_not_notify() -> Result<()> {
    let (url, received) = spawn_receiver(AxumStatus::OK).await?;
    let app = app_with_webhook(url).await?;
    let token = app.admin_token().await?;

    let (status, _) = app
        .send(Method::POST, "banners", &token, &json!({"title": "t", "subtitle": "s", "message": "m"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    // Failed validation never reaches the webhook either
    let (status, _) = app.send(Method::POST, "faqs", &token, &json!({"question": "only"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(received.lock().expect("lock").is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_delivery_does_not_affect_the_request() -> Result<()> {
    let (url, received) = spawn_receiver(AxumStatus::INTERNAL_SERVER_ERROR).await?;
    let app = app_with_webhook(url).await?;
    let token = app.admin_token().await?;

    let (status, _) = app
        .send(Method::POST, "faqs", &token, &json!({"question": "Q", "answer": "A"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    wait_for(&received, 1).await;
    let stats = settled_stats(&app, |s| s.failed == 1).await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.delivered, 0);

    let health: Value = app.client.get(app.url("/health")).send().await?.json().await?;
    assert_eq!(health["data"]["webhook"]["failed"], 1);
    assert_eq!(app.list("faqs").await?.len(), 1);
    Ok(())
}
