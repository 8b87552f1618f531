//! Stand-in route groups for the Natours application
//!
//! Handlers echo what reached them so tests can observe the effect of the
//! guard chain.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Path, RawQuery, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use natours_core::{AppError, NatoursError, PollutedParams, RequestContext};
use natours_server::{Resource, RouteGroups};
use serde_json::{Map, Value, json};

/// Route groups plus a count of handler invocations
#[derive(Clone, Default)]
pub struct MockBooking {
    hits: Arc<AtomicU32>,
}

impl MockBooking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests that reached a handler
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn groups(&self) -> RouteGroups {
        RouteGroups::new()
            .views(self.views())
            .and_then(|g| g.resource(Resource::Tours, self.tours()))
            .and_then(|g| g.resource(Resource::Bookings, self.bookings()))
            .expect("distinct prefixes")
    }

    fn views(&self) -> Router {
        Router::new()
            .route("/", get(overview))
            .route("/me", get(account))
            .route("/submit-user-data", post(submit_user_data))
            .with_state(self.clone())
    }

    fn tours(&self) -> Router {
        Router::new()
            .route("/", get(list_tours).post(create_tour))
            .route("/tour-stats", get(tour_stats))
            .route("/{id}", get(get_tour))
            .with_state(self.clone())
    }

    fn bookings(&self) -> Router {
        Router::new()
            .route("/checkout-session/{tour_id}", get(checkout_session))
            .with_state(self.clone())
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

async fn overview(State(mock): State<MockBooking>) -> Html<&'static str> {
    mock.hit();
    Html("<h1>All tours</h1>")
}

async fn account(State(mock): State<MockBooking>, context: RequestContext) -> Json<Value> {
    mock.hit();
    Json(json!({"jwt": context.cookie("jwt"), "requestTime": context.request_time}))
}

async fn submit_user_data(State(mock): State<MockBooking>, Form(form): Form<Map<String, Value>>) -> Json<Value> {
    mock.hit();
    Json(Value::Object(form))
}

async fn list_tours(
    State(mock): State<MockBooking>,
    RawQuery(query): RawQuery,
    Extension(polluted): Extension<PollutedParams>,
) -> Json<Value> {
    mock.hit();
    Json(json!({"status": "success", "query": query, "polluted": polluted.query}))
}

async fn create_tour(State(mock): State<MockBooking>, context: RequestContext, Json(body): Json<Value>) -> Json<Value> {
    mock.hit();
    Json(json!({"status": "success", "requestTime": context.request_time, "data": body}))
}

async fn tour_stats(State(mock): State<MockBooking>) -> Result<Json<Value>, NatoursError> {
    mock.hit();
    Err(NatoursError::internal(anyhow::anyhow!("aggregation pipeline failed: $group is not allowed")))
}

async fn get_tour(State(mock): State<MockBooking>, Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    mock.hit();
    if id == "5c88fa8cf4afda39709c2955" {
        Ok(Json(json!({"status": "success", "data": {"name": "The Sea Explorer"}})))
    } else {
        Err(AppError::new("No tour found with that ID", axum::http::StatusCode::NOT_FOUND))
    }
}

async fn checkout_session(State(mock): State<MockBooking>, Path(tour_id): Path<String>) -> Result<Json<Value>, AppError> {
    mock.hit();
    if tour_id == "5c88fa8cf4afda39709c2955" {
        Ok(Json(json!({"status": "success", "session": {"id": "cs_test_a1b2c3", "object": "checkout.session"}})))
    } else {
        Err(AppError::new("No tour found with that ID", axum::http::StatusCode::NOT_FOUND))
    }
}
