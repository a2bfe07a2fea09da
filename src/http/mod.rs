//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! Caller (page loader, form submit)
//!     → client.rs  (verb → RequestDescriptor → dispatcher)
//!     → request.rs (descriptor, per-attempt request ID, retry clone)
//!     → reqwest transport (session cookies attached)
//!     → response.rs (status check, payload decoding)
//!     → error.rs   (HttpError on anything but 2xx)
//! ```

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::{HttpClient, HttpClientBuilder};
pub use error::{HttpError, HttpResult};
pub use request::{FormPart, Method, MultipartForm, RequestBody, RequestDescriptor, X_REQUEST_ID};
pub use response::Payload;
