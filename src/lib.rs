//! Seller console HTTP client library.
//!
//! Every backend call made by the seller console goes through
//! [`HttpClient`]: cookies are attached, an expired access token is
//! refreshed and the request retried once, and an unrecoverable session is
//! cleared and announced as [`SessionEvent::Expired`].

pub mod cancel;
pub mod config;
pub mod http;
pub mod observability;
pub mod session;

pub use cancel::{make_cancelable, CancelHandle, Cancelable};
pub use config::ClientConfig;
pub use http::{HttpClient, HttpError, HttpResult, MultipartForm, Payload, RequestDescriptor};
pub use session::{SessionCookieJar, SessionEvent, SessionPoller, SessionStore};
