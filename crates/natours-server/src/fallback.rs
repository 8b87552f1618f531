use axum::extract::{OriginalUri, Request};
use axum::response::{IntoResponse, Response};
use http::{Method, StatusCode};
use natours_core::AppError;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Handle a request no route group claimed
///
/// GET and HEAD requests are first tried against the static directory; any
/// other miss becomes a 404 naming the original path and query.
pub async fn not_found(static_files: Option<ServeDir>, request: Request) -> Response {
    let original = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().clone(), |OriginalUri(uri)| uri.clone());
    let target = original
        .path_and_query()
        .map_or_else(|| original.path().to_owned(), |pq| pq.as_str().to_owned());

    if let Some(dir) = static_files
        && matches!(*request.method(), Method::GET | Method::HEAD)
    {
        let Ok(response) = dir.oneshot(request).await;
        if response.status() != StatusCode::NOT_FOUND {
            return response.into_response();
        }
    }

    AppError::not_found(target).into_response()
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use natours_core::ErrorReport;

    use super::*;

    fn app(static_files: Option<ServeDir>) -> Router {
        Router::new().fallback(move |request: Request| {
            let static_files = static_files.clone();
            async move { not_found(static_files, request).await }
        })
    }

    async fn call(router: Router, method: Method, uri: &str) -> Response {
        router
            .oneshot(http::Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn names_original_path_and_query() {
        let response = call(app(None), Method::GET, "/api/v1/nothing?sort=price").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(
            report.error().message(),
            "Can't find /api/v1/nothing?sort=price on this server!"
        );
    }

    #[tokio::test]
    async fn nested_router_reports_full_path() {
        let tours = Router::new().route("/{id}", axum::routing::get(|| async { "tour" }));
        let router = Router::new()
            .nest("/api/v1/tours", tours)
            .fallback(|request: Request| async move { not_found(None, request).await });
        let response = call(router, Method::DELETE, "/api/v1/tours/missing/deeper").await;

        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.error().message(), "Can't find /api/v1/tours/missing/deeper on this server!");
    }

    #[tokio::test]
    async fn serves_static_files_before_falling_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body { color: #55c57a; }").unwrap();
        let static_files = Some(ServeDir::new(dir.path()));

        let response = call(app(static_files.clone()), Method::GET, "/style.css").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, "body { color: #55c57a; }".as_bytes());

        let response = call(app(static_files.clone()), Method::GET, "/missing.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());

        let response = call(app(static_files), Method::POST, "/style.css").await;
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
