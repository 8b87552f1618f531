use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::alert::{AlertKind, Alerts};
use crate::error::CheckoutError;
use crate::redirect::PaymentRedirect;

/// Opaque checkout session identifier issued by the booking API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one checkout attempt
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// The payment redirect was invoked with this session
    Redirected(SessionId),
    /// The attempt failed and an alert was shown
    Failed(CheckoutError),
}

impl CheckoutOutcome {
    pub const fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected(_))
    }
}

#[derive(Deserialize)]
struct SessionEnvelope {
    session: Option<SessionBody>,
}

#[derive(Deserialize)]
struct SessionBody {
    id: Option<String>,
}

/// Starts hosted checkouts for tours
pub struct CheckoutClient<R, A> {
    base_url: Url,
    http: reqwest::Client,
    redirect: R,
    alerts: A,
}

impl<R: PaymentRedirect, A: Alerts> CheckoutClient<R, A> {
    /// Create a client for the booking API at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid
    pub fn new(base_url: &str, redirect: R, alerts: A) -> Result<Self, CheckoutError> {
        let base_url = Url::parse(base_url).map_err(|e| CheckoutError::Config(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::Config(format!("invalid base URL: {base_url}")));
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            redirect,
            alerts,
        })
    }

    pub const fn alerts(&self) -> &A {
        &self.alerts
    }

    /// Request a session for `tour_id` and redirect to the hosted checkout
    ///
    /// Failures are shown as an error alert and returned as
    /// [`CheckoutOutcome::Failed`]; nothing is retried.
    pub async fn initiate_checkout(&self, tour_id: &str) -> CheckoutOutcome {
        let attempt = async {
            let session = self.create_session(tour_id).await?;
            self.redirect.redirect_to_checkout(&session).await?;
            Ok::<_, CheckoutError>(session)
        };

        match attempt.await {
            Ok(session) => CheckoutOutcome::Redirected(session),
            Err(error) => {
                tracing::warn!(tour_id, %error, "checkout failed");
                self.alerts.show(AlertKind::Error, &error.to_string());
                CheckoutOutcome::Failed(error)
            }
        }
    }

    async fn create_session(&self, tour_id: &str) -> Result<SessionId, CheckoutError> {
        let url = session_url(&self.base_url, tour_id);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CheckoutError::Api {
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }

        let envelope: SessionEnvelope =
            serde_json::from_str(&body).map_err(|e| CheckoutError::Parse(e.to_string()))?;

        envelope
            .session
            .and_then(|s| s.id)
            .filter(|id| !id.is_empty())
            .map(SessionId)
            .ok_or(CheckoutError::MissingSession)
    }
}

fn session_url(base_url: &Url, tour_id: &str) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["api", "v1", "bookings", "checkout-session", tour_id]);
    }
    url
}

/// Pull `message` out of an error envelope, falling back to the raw body
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}
