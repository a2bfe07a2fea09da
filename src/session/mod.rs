//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! HttpClient
//!     → store.rs   (cookies attached to every credentialed request)
//!     → refresh.rs (POST refresh endpoint on 401)
//!     → events.rs  (SessionEvent::Expired when recovery fails)
//!
//! Host application
//!     → poller.rs  (optional keep-alive: refresh every interval)
//!     ← events.rs  (decides how to send the user to the login route)
//! ```
//!
//! # Design Decisions
//! - The client only clears cookies and announces expiry; it never navigates
//! - Session state outlives any single request
//! - No module-level state: every piece is an owned value

pub mod events;
pub mod poller;
pub mod refresh;
pub mod store;

pub use events::{RecoveryPhase, SessionEvent, SessionEvents};
pub use poller::{PollerError, SessionCheck, SessionPoller};
pub use refresh::{Refresh, SessionRefresher};
pub use store::{SessionCookieJar, SessionStore};
