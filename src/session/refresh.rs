//! Session refresh.
//!
//! # Responsibilities
//! - POST the refresh endpoint with credentials and an empty body
//! - Optionally collapse concurrent refreshes into one in-flight request
//!
//! # Design Decisions
//! - Without single-flight every 401 handler refreshes on its own
//! - With single-flight the pending refresh lives in a memoized slot that is
//!   cleared once it settles, so the next expiry starts a new refresh
//! - The slot lock is never held across an await

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::http::error::HttpResult;
use crate::http::response::read_payload;
use crate::observability::metrics;

type RefreshFuture = Shared<BoxFuture<'static, HttpResult<()>>>;

/// Anything that can extend the current session.
pub trait Refresh: Send + Sync {
    fn refresh(&self) -> BoxFuture<'_, HttpResult<()>>;
}

/// Calls the refresh endpoint.
#[derive(Clone)]
pub struct SessionRefresher {
    transport: reqwest::Client,
    url: Url,
    single_flight: bool,
    in_flight: Arc<Mutex<Option<RefreshFuture>>>,
}

impl SessionRefresher {
    /// `transport` must carry the session cookie provider.
    pub fn new(transport: reqwest::Client, url: Url, single_flight: bool) -> Self {
        Self {
            transport,
            url,
            single_flight,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Refresh endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether concurrent refreshes share one request.
    pub fn is_single_flight(&self) -> bool {
        self.single_flight
    }

    /// Extend the session.
    pub async fn refresh(&self) -> HttpResult<()> {
        if !self.single_flight {
            return post_refresh(self.transport.clone(), self.url.clone()).await;
        }

        let shared = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight session refresh");
                    pending.clone()
                }
                None => {
                    let pending = post_refresh(self.transport.clone(), self.url.clone())
                        .boxed()
                        .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let result = shared.clone().await;

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|pending| pending.ptr_eq(&shared)) {
            *slot = None;
        }

        result
    }
}

impl Refresh for SessionRefresher {
    fn refresh(&self) -> BoxFuture<'_, HttpResult<()>> {
        SessionRefresher::refresh(self).boxed()
    }
}

impl std::fmt::Debug for SessionRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRefresher")
            .field("url", &self.url.as_str())
            .field("single_flight", &self.single_flight)
            .finish()
    }
}

#[instrument(skip(transport), fields(url = %url))]
async fn post_refresh(transport: reqwest::Client, url: Url) -> HttpResult<()> {
    let outcome = match transport.post(url).send().await {
        Ok(response) => read_payload(response).await.map(|_| ()),
        Err(e) => Err(e.into()),
    };

    match &outcome {
        Ok(()) => {
            debug!("Session refreshed");
            metrics::record_refresh("success");
        }
        Err(e) => {
            warn!(error = %e, "Session refresh failed");
            metrics::record_refresh("failure");
        }
    }
    outcome
}
