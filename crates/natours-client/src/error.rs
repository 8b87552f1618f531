/// Ways a checkout attempt can fail
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Transport failure talking to the booking API
    #[error("could not reach the booking service: {0}")]
    Http(#[from] reqwest::Error),

    /// The booking API answered with an error status
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message from the error envelope, or the raw body
        message: String,
    },

    /// The response was not the expected JSON shape
    #[error("unexpected checkout session response: {0}")]
    Parse(String),

    /// The response carried no session id
    #[error("checkout session response did not include a session id")]
    MissingSession,

    /// The payment provider refused the redirect
    #[error("payment provider rejected the checkout: {0}")]
    Provider(String),

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}
