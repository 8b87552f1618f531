#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Client side of the hosted payment checkout
//!
//! [`CheckoutClient`] asks the booking API for a checkout session and hands
//! the session id to a [`PaymentRedirect`]. Every failure is shown through
//! [`Alerts`] instead of being returned to the page as an error.

pub mod alert;
mod checkout;
pub mod error;
pub mod redirect;

pub use alert::{Alert, AlertBoard, AlertKind, Alerts};
pub use checkout::{CheckoutClient, CheckoutOutcome, SessionId};
pub use error::CheckoutError;
pub use redirect::{HostedCheckout, Navigator, PaymentRedirect};
