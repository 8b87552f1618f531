//! Rendering of failures by the global error responder

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_booking::MockBooking;
use harness::server::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn production_hides_defect_details() {
    let server = TestServer::start(ConfigBuilder::new().production().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/api/v1/tours/tour-stats")).send().await.unwrap();

    assert_eq!(resp.status(), 500);
    let text = resp.text().await.unwrap();
    assert!(!text.contains("aggregation pipeline"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Something went very wrong!"}));
}

#[tokio::test]
async fn development_exposes_defect_details() {
    let server = TestServer::start(ConfigBuilder::new().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/api/v1/tours/tour-stats")).send().await.unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "aggregation pipeline failed: $group is not allowed");
    assert_eq!(body["error"]["isOperational"], false);
    assert_eq!(body["error"]["statusCode"], 500);
    assert!(body["stack"].is_string());
    assert!(body["errorId"].is_string());
}

#[tokio::test]
async fn operational_handler_error_is_passed_through() {
    let server = TestServer::start(ConfigBuilder::new().production().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/api/v1/tours/unknown-id")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "fail", "message": "No tour found with that ID"}));
}

#[tokio::test]
async fn browsers_get_an_error_page_for_views() {
    let server = TestServer::start(ConfigBuilder::new().production().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server
        .client()
        .get(server.url("/tour/<missing>"))
        .header("accept", "text/html,application/xhtml+xml")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    assert!(resp.headers()["content-type"].to_str().unwrap().starts_with("text/html"));
    let page = resp.text().await.unwrap();
    assert!(page.contains("<title>Something went wrong!</title>"));
    assert!(page.contains("Can&#39;t find /tour/%3Cmissing%3E on this server!"));
}

#[tokio::test]
async fn api_errors_stay_json_for_browsers() {
    let server = TestServer::start(ConfigBuilder::new().production().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server
        .client()
        .get(server.url("/api/v1/nothing"))
        .header("accept", "text/html")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn unsupported_method_falls_through_to_not_found() {
    let server = TestServer::start(ConfigBuilder::new().production().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server.client().delete(server.url("/api/v1/tours")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "fail", "message": "Can't find /api/v1/tours on this server!"}));
}

#[tokio::test]
async fn extractor_rejection_uses_the_envelope() {
    let server = TestServer::start(ConfigBuilder::new().production().build(), MockBooking::new().groups())
        .await
        .unwrap();

    let resp = server
        .client()
        .post(server.url("/api/v1/tours"))
        .header("content-type", "text/plain")
        .body("name=The Forest Hiker")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 415);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "fail", "message": "Unsupported Media Type"}));
}
