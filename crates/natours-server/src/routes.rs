use axum::Router;
use thiserror::Error;

/// API resources mounted under `/api/v1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Tours,
    Users,
    Reviews,
    Bookings,
}

impl Resource {
    /// Resources in mount order
    pub const ALL: [Self; 4] = [Self::Tours, Self::Users, Self::Reviews, Self::Bookings];

    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Tours => "/api/v1/tours",
            Self::Users => "/api/v1/users",
            Self::Reviews => "/api/v1/reviews",
            Self::Bookings => "/api/v1/bookings",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Tours => 0,
            Self::Users => 1,
            Self::Reviews => 2,
            Self::Bookings => 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("a route group is already mounted at '{0}'")]
    DuplicatePrefix(&'static str),
}

/// Route groups supplied by the application
///
/// Groups are opaque routers. They must not install their own fallback, so
/// unmatched paths reach the shared not-found handler.
#[derive(Default)]
pub struct RouteGroups {
    views: Option<Router>,
    resources: [Option<Router>; 4],
}

impl RouteGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the page-rendering group mounted at `/`
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicatePrefix`] if views were already registered
    pub fn views(mut self, router: Router) -> Result<Self, RouteError> {
        if self.views.is_some() {
            return Err(RouteError::DuplicatePrefix("/"));
        }
        self.views = Some(router);
        Ok(self)
    }

    /// Register the group for one API resource
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicatePrefix`] if the resource already has a group
    pub fn resource(mut self, resource: Resource, router: Router) -> Result<Self, RouteError> {
        let slot = &mut self.resources[resource.slot()];
        if slot.is_some() {
            return Err(RouteError::DuplicatePrefix(resource.prefix()));
        }
        *slot = Some(router);
        Ok(self)
    }

    /// Prefixes with a registered group, in mount order
    pub fn mounted(&self) -> Vec<&'static str> {
        let views = self.views.as_ref().map(|_| "/");
        let resources = Resource::ALL
            .into_iter()
            .filter(|r| self.resources[r.slot()].is_some())
            .map(Resource::prefix);
        views.into_iter().chain(resources).collect()
    }

    /// Combine every group into one router
    pub fn into_router(self) -> Router {
        let mut router = self.views.unwrap_or_default();

        for (resource, group) in Resource::ALL.into_iter().zip(self.resources) {
            if let Some(group) = group {
                tracing::debug!(prefix = resource.prefix(), "mounting route group");
                router = router.nest(resource.prefix(), group);
            }
        }

        router
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::routing::get;
    use http::StatusCode;
    use tower::ServiceExt;

    use super::*;

    fn group(label: &'static str) -> Router {
        Router::new()
            .route("/", get(move || async move { label }))
            .route("/{id}", get(move || async move { label }))
    }

    async fn body(router: Router, path: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(http::Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn resources_are_nested_under_their_prefix() {
        let router = RouteGroups::new()
            .views(Router::new().route("/", get(|| async { "overview" })))
            .unwrap()
            .resource(Resource::Tours, group("tours"))
            .unwrap()
            .resource(Resource::Bookings, group("bookings"))
            .unwrap()
            .into_router();

        assert_eq!(body(router.clone(), "/").await.1, "overview");
        assert_eq!(body(router.clone(), "/api/v1/tours").await.1, "tours");
        assert_eq!(body(router.clone(), "/api/v1/tours/5c88fa8cf4afda39709c2955").await.1, "tours");
        assert_eq!(body(router.clone(), "/api/v1/bookings/1").await.1, "bookings");
        assert_eq!(body(router, "/api/v1/users").await.0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_prefix_is_rejected() {
        let error = RouteGroups::new()
            .resource(Resource::Reviews, group("a"))
            .unwrap()
            .resource(Resource::Reviews, group("b"))
            .err()
            .unwrap();
        assert!(matches!(error, RouteError::DuplicatePrefix("/api/v1/reviews")));
    }

    #[test]
    fn mount_order_is_fixed() {
        let groups = RouteGroups::new()
            .resource(Resource::Bookings, group("b"))
            .unwrap()
            .resource(Resource::Tours, group("t"))
            .unwrap()
            .views(Router::new())
            .unwrap();
        assert_eq!(groups.mounted(), ["/", "/api/v1/tours", "/api/v1/bookings"]);
    }
}
