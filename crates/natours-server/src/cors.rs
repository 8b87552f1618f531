use http::Method;
use http::header::HeaderName;
use natours_config::{AnyOrArray, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
///
/// With credentials enabled, wildcards are answered by echoing what the
/// request asked for, since browsers reject a literal `*` there.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();
    let mirror = config.credentials;

    if config.is_credentialed_wildcard() {
        tracing::warn!("CORS accepts every origin with credentials; list origins explicitly in production");
    }

    layer = match &config.origins {
        AnyOrArray::Any if mirror => layer.allow_origin(AllowOrigin::mirror_request()),
        AnyOrArray::Any => layer.allow_origin(AllowOrigin::any()),
        AnyOrArray::List(origins) => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            layer.allow_origin(origins)
        }
    };

    layer = match &config.methods {
        AnyOrArray::Any if mirror => layer.allow_methods(AllowMethods::mirror_request()),
        AnyOrArray::Any => layer.allow_methods(AllowMethods::any()),
        AnyOrArray::List(methods) => {
            let methods: Vec<Method> = methods.iter().filter_map(|m| m.parse().ok()).collect();
            layer.allow_methods(methods)
        }
    };

    layer = match &config.headers {
        AnyOrArray::Any if mirror => layer.allow_headers(AllowHeaders::mirror_request()),
        AnyOrArray::Any => layer.allow_headers(AllowHeaders::any()),
        AnyOrArray::List(headers) => {
            let headers: Vec<HeaderName> = headers.iter().filter_map(|h| h.parse().ok()).collect();
            layer.allow_headers(headers)
        }
    };

    if !config.expose_headers.is_empty() {
        let headers: Vec<HeaderName> = config.expose_headers.iter().filter_map(|h| h.parse().ok()).collect();
        layer = layer.expose_headers(headers);
    }

    if config.credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(duration) = config.max_age_duration() {
        layer = layer.max_age(duration);
    }

    layer
}
