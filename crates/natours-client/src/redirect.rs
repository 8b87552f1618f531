use async_trait::async_trait;
use url::Url;

use crate::checkout::SessionId;
use crate::error::CheckoutError;

/// Hands a checkout session to the payment provider's hosted page
#[async_trait]
pub trait PaymentRedirect: Send + Sync {
    async fn redirect_to_checkout(&self, session: &SessionId) -> Result<(), CheckoutError>;
}

/// Moves the user agent to another page
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &Url) -> Result<(), CheckoutError>;
}

/// Redirect to a hosted checkout page identified by session id
#[derive(Debug, Clone)]
pub struct HostedCheckout<N> {
    publishable_key: String,
    checkout_base: Url,
    navigator: N,
}

impl<N: Navigator> HostedCheckout<N> {
    /// # Errors
    ///
    /// Returns [`CheckoutError::Config`] if the key is not a publishable key
    /// or the base URL cannot carry a path
    pub fn new(publishable_key: impl Into<String>, checkout_base: Url, navigator: N) -> Result<Self, CheckoutError> {
        let publishable_key = publishable_key.into();
        if !publishable_key.starts_with("pk_") {
            return Err(CheckoutError::Config(
                "payment key must be a publishable key starting with 'pk_'".to_owned(),
            ));
        }
        if checkout_base.cannot_be_a_base() {
            return Err(CheckoutError::Config(format!("invalid checkout base URL: {checkout_base}")));
        }

        Ok(Self {
            publishable_key,
            checkout_base,
            navigator,
        })
    }

    /// Hosted page address for a session
    pub fn checkout_url(&self, session: &SessionId) -> Url {
        let mut url = self.checkout_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["c", "pay", session.as_str()]);
        }
        url.query_pairs_mut().clear().append_pair("key", &self.publishable_key);
        url
    }
}

#[async_trait]
impl<N: Navigator> PaymentRedirect for HostedCheckout<N> {
    async fn redirect_to_checkout(&self, session: &SessionId) -> Result<(), CheckoutError> {
        if session.as_str().is_empty() {
            return Err(CheckoutError::Provider("empty session id".to_owned()));
        }

        let url = self.checkout_url(session);
        tracing::debug!(session = session.as_str(), "redirecting to hosted checkout");
        self.navigator.navigate(&url)
    }
}
