use std::collections::BTreeMap;

use async_trait::async_trait;
use cookie::Cookie;
use http::header::COOKIE;
use jiff::Timestamp;
use natours_core::{NatoursError, RequestContext};

use super::{Exchange, Guard};

/// Stamps the request with its arrival time, client address and cookies
pub struct RequestTime;

fn parse_cookies(exchange: &Exchange) -> BTreeMap<String, String> {
    exchange
        .parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
        .collect()
}

#[async_trait]
impl Guard for RequestTime {
    fn name(&self) -> &'static str {
        "request_time"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        let context = RequestContext::new(Timestamp::now(), exchange.client_ip, parse_cookies(exchange));
        exchange.parts.extensions.insert(context);
        Ok(())
    }
}
