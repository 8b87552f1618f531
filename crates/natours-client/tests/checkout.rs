use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use natours_client::{AlertBoard, AlertKind, CheckoutClient, CheckoutError, CheckoutOutcome, PaymentRedirect, SessionId};
use serde_json::json;

#[derive(Clone, Default)]
struct RecordingRedirect {
    sessions: Arc<Mutex<Vec<String>>>,
    reject: bool,
}

#[async_trait]
impl PaymentRedirect for RecordingRedirect {
    async fn redirect_to_checkout(&self, session: &SessionId) -> Result<(), CheckoutError> {
        if self.reject {
            return Err(CheckoutError::Provider("session expired".to_owned()));
        }
        self.sessions.lock().unwrap().push(session.as_str().to_owned());
        Ok(())
    }
}

async fn checkout_session(Path(tour_id): Path<String>) -> impl IntoResponse {
    match tour_id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "fail", "message": "No tour found with that ID"})),
        ),
        "no-session" => (StatusCode::OK, Json(json!({"status": "success", "session": {}}))),
        id => (
            StatusCode::OK,
            Json(json!({"status": "success", "session": {"id": format!("cs_test_{id}"), "object": "checkout.session"}})),
        ),
    }
}

async fn booking_api() -> SocketAddr {
    let app = Router::new().route("/api/v1/bookings/checkout-session/{tour_id}", get(checkout_session));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn client(addr: SocketAddr, redirect: RecordingRedirect) -> CheckoutClient<RecordingRedirect, AlertBoard> {
    CheckoutClient::new(&format!("http://{addr}"), redirect, AlertBoard::new(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn valid_session_is_redirected_with_exact_id() {
    let addr = booking_api().await;
    let redirect = RecordingRedirect::default();
    let client = client(addr, redirect.clone());

    let outcome = client.initiate_checkout("5c88fa8cf4afda39709c2955").await;

    assert!(matches!(&outcome, CheckoutOutcome::Redirected(id) if id.as_str() == "cs_test_5c88fa8cf4afda39709c2955"));
    assert_eq!(*redirect.sessions.lock().unwrap(), ["cs_test_5c88fa8cf4afda39709c2955"]);
    assert_eq!(client.alerts().current(), None);
}

#[tokio::test]
async fn network_failure_alerts_without_redirect() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let redirect = RecordingRedirect::default();
    let client = client(addr, redirect.clone());

    let outcome = client.initiate_checkout("5c88fa8cf4afda39709c2955").await;

    assert!(matches!(outcome, CheckoutOutcome::Failed(CheckoutError::Http(_))));
    assert!(redirect.sessions.lock().unwrap().is_empty());
    let alert = client.alerts().current().unwrap();
    assert_eq!(alert.kind, AlertKind::Error);
}

#[tokio::test]
async fn api_error_message_is_shown() {
    let addr = booking_api().await;
    let redirect = RecordingRedirect::default();
    let client = client(addr, redirect.clone());

    let outcome = client.initiate_checkout("missing").await;

    assert!(matches!(outcome, CheckoutOutcome::Failed(CheckoutError::Api { status: 404, .. })));
    assert_eq!(client.alerts().current().unwrap().message, "No tour found with that ID");
    assert!(redirect.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_session_id_is_a_failure() {
    let addr = booking_api().await;
    let client = client(addr, RecordingRedirect::default());

    let outcome = client.initiate_checkout("no-session").await;
    assert!(matches!(outcome, CheckoutOutcome::Failed(CheckoutError::MissingSession)));
}

#[tokio::test]
async fn provider_rejection_is_alerted() {
    let addr = booking_api().await;
    let redirect = RecordingRedirect {
        reject: true,
        ..RecordingRedirect::default()
    };
    let client = client(addr, redirect);

    let outcome = client.initiate_checkout("5c88fa8cf4afda39709c2955").await;

    assert!(!outcome.is_redirected());
    assert!(client.alerts().current().unwrap().message.contains("session expired"));
}
