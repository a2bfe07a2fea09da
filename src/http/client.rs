//! Authenticated HTTP client.
//!
//! # Responsibilities
//! - Expose the verb surface used by console pages (get/post/post_media/put/delete)
//! - Resolve paths against the configured base URL
//! - Send every request with session cookies attached
//! - Recover from an expired access token: refresh once, retry once
//! - Force a logout (clear cookies, announce expiry) when recovery fails
//!
//! # Recovery protocol
//! ```text
//! ISSUING ──401 (not login, not opted out)──▶ REFRESHING
//!    │                                          │ ok         │ error
//!    │ other outcome                            ▼            ▼
//!    ▼                                       RETRYING ──▶ FAILED ──▶ clear cookies
//! returned as-is                                │ ok          ▲       publish Expired
//!                                               ▼             │       return error
//!                                            RESOLVED   error─┘
//! ```
//!
//! # Design Decisions
//! - The retry goes through `send_once`, never back through `send`, so a
//!   request is refreshed at most once
//! - The login endpoint is exempt: a failed login is a plain credential error
//! - Transport failures and non-401 statuses are returned untouched

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, LogoutPolicy, RecoveryConfig};
use crate::http::error::{HttpError, HttpResult};
use crate::http::request::{MultipartForm, RequestBody, RequestDescriptor, X_REQUEST_ID};
use crate::http::response::{read_payload, Payload};
use crate::observability::metrics::{self, Outcome};
use crate::session::events::{RecoveryPhase, SessionEvent, SessionEvents};
use crate::session::poller::SessionPoller;
use crate::session::refresh::SessionRefresher;
use crate::session::store::{SessionCookieJar, SessionStore};

/// Client for the seller console backend.
///
/// Cheap to clone; clones share transport, cookies and event channel.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    login_path: String,
    login_url: Url,
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
    refresher: SessionRefresher,
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
    recovery: RecoveryConfig,
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    config: ClientConfig,
    jar: Option<Arc<SessionCookieJar>>,
    store: Option<Arc<dyn SessionStore>>,
    events: Option<SessionEvents>,
}

impl HttpClientBuilder {
    /// Share an existing cookie jar.
    #[must_use]
    pub fn cookie_jar(mut self, jar: Arc<SessionCookieJar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Use a different store for the forced-logout clear.
    /// Defaults to the cookie jar.
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Publish session events on an existing hub.
    #[must_use]
    pub fn events(mut self, events: SessionEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Create the client. Fails on an unparsable base URL or login route.
    pub fn build(self) -> HttpResult<HttpClient> {
        let config = self.config;
        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| HttpError::InvalidUrl {
            path: base_url.clone(),
            reason: e.to_string(),
        })?;

        let origin = config
            .session
            .app_origin
            .clone()
            .unwrap_or_else(|| base_url.clone());
        let login_url = Url::parse(&origin)
            .and_then(|origin| origin.join(&config.session.login_route))
            .map_err(|e| HttpError::InvalidUrl {
                path: config.session.login_route.clone(),
                reason: e.to_string(),
            })?;

        let jar = self.jar.unwrap_or_default();
        let store: Arc<dyn SessionStore> = self
            .store
            .unwrap_or_else(|| jar.clone() as Arc<dyn SessionStore>);

        let credentialed = transport_builder(&config)
            .cookie_provider(jar)
            .build()
            .map_err(|e| HttpError::InvalidRequest(format!("failed to build transport: {}", e)))?;
        let anonymous = transport_builder(&config)
            .build()
            .map_err(|e| HttpError::InvalidRequest(format!("failed to build transport: {}", e)))?;

        let refresh_url = resolve(&base_url, &config.api.refresh_path)?;
        let refresher = SessionRefresher::new(
            credentialed.clone(),
            refresh_url,
            config.recovery.single_flight,
        );

        info!(
            base_url = %base_url,
            single_flight = config.recovery.single_flight,
            "HTTP client initialized"
        );

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                base_url,
                login_path: config.api.login_path.trim_end_matches('/').to_string(),
                login_url,
                credentialed,
                anonymous,
                refresher,
                store,
                events: self.events.unwrap_or_default(),
                recovery: config.recovery,
            }),
        })
    }
}

fn transport_builder(config: &ClientConfig) -> reqwest::ClientBuilder {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeouts.connect_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.timeouts.request_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
}

/// Join `path` onto `base`. Absolute URLs are used as given.
fn resolve(base: &str, path: &str) -> HttpResult<Url> {
    let joined = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    };
    Url::parse(&joined).map_err(|e| HttpError::InvalidUrl {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> HttpResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| HttpError::InvalidRequest(format!("failed to serialize body: {}", e)))
}

impl HttpClient {
    /// Start building a client from configuration.
    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder {
            config,
            jar: None,
            store: None,
            events: None,
        }
    }

    /// Create a client with a fresh cookie jar and event hub.
    pub fn from_config(config: ClientConfig) -> HttpResult<Self> {
        Self::builder(config).build()
    }

    /// GET `path` with query parameters.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> HttpResult<Payload> {
        self.send(RequestDescriptor::get(path).params(params.iter().copied()))
            .await
    }

    /// POST a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> HttpResult<Payload> {
        self.send(RequestDescriptor::post(path).json(to_json(body)?))
            .await
    }

    /// POST a `multipart/form-data` body.
    pub async fn post_media(&self, path: &str, form: MultipartForm) -> HttpResult<Payload> {
        self.send(RequestDescriptor::post(path).multipart(form)).await
    }

    /// PUT a JSON body.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> HttpResult<Payload> {
        self.send(RequestDescriptor::put(path).json(to_json(body)?))
            .await
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> HttpResult<Payload> {
        self.send(RequestDescriptor::delete(path)).await
    }

    /// POST credentials to the login endpoint. A 401 is returned directly.
    pub async fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> HttpResult<Payload> {
        let path = self.inner.login_path.clone();
        self.post(&path, credentials).await
    }

    /// Refresh the session outside of the recovery protocol.
    pub async fn refresh_session(&self) -> HttpResult<()> {
        self.inner.refresher.refresh().await
    }

    /// Dispatch a request, running the recovery protocol on 401.
    #[instrument(
        skip_all,
        fields(
            method = %request.method,
            path = %request.path,
            request_id = %request.meta().request_id
        )
    )]
    pub async fn send(&self, request: RequestDescriptor) -> HttpResult<Payload> {
        match self.send_once(&request).await {
            Ok(payload) => {
                metrics::record_request(request.method, Outcome::Success);
                Ok(payload)
            }
            Err(err) if self.should_recover(&request, &err) => self.recover(request).await,
            Err(err) => {
                debug!(error = %err, "Request failed");
                metrics::record_request(request.method, Outcome::Failed);
                Err(err)
            }
        }
    }

    fn should_recover(&self, request: &RequestDescriptor, err: &HttpError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        if self.is_login(request) {
            debug!("401 from login endpoint, not refreshing");
            return false;
        }
        if request.skip_refresh || !self.inner.recovery.enabled {
            debug!("401 returned without refresh");
            return false;
        }
        true
    }

    fn is_login(&self, request: &RequestDescriptor) -> bool {
        let path = request.bare_path().trim_end_matches('/');
        !self.inner.login_path.is_empty() && path.ends_with(&self.inner.login_path)
    }

    async fn recover(&self, request: RequestDescriptor) -> HttpResult<Payload> {
        info!("Access token rejected, refreshing session");

        if let Err(refresh_err) = self.inner.refresher.refresh().await {
            self.expire_session(&request, RecoveryPhase::Refreshing, &refresh_err);
            return Err(refresh_err);
        }

        let retry = request.for_retry();
        debug!(retry_request_id = %retry.meta().request_id, "Retrying after refresh");

        match self.send_once(&retry).await {
            Ok(payload) => {
                info!("Request recovered after session refresh");
                metrics::record_request(request.method, Outcome::Recovered);
                Ok(payload)
            }
            Err(retry_err) => {
                let logout = match self.inner.recovery.logout_on_retry {
                    LogoutPolicy::AnyFailure => true,
                    LogoutPolicy::AuthFailure => retry_err.is_auth_failure(),
                };
                if logout {
                    self.expire_session(&request, RecoveryPhase::Retrying, &retry_err);
                } else {
                    warn!(error = %retry_err, "Retry failed, session kept");
                    metrics::record_request(request.method, Outcome::Failed);
                }
                Err(retry_err)
            }
        }
    }

    fn expire_session(&self, request: &RequestDescriptor, phase: RecoveryPhase, cause: &HttpError) {
        warn!(%phase, error = %cause, "Session could not be recovered, forcing logout");

        self.inner.store.clear_all_session_cookies();
        self.inner.events.publish(SessionEvent::Expired {
            login_url: self.inner.login_url.clone(),
            phase,
            status: cause.status().map(|s| s.as_u16()),
            path: request.path.clone(),
        });

        metrics::record_forced_logout(phase);
        metrics::record_request(request.method, Outcome::LoggedOut);
    }

    /// Perform exactly one HTTP exchange.
    async fn send_once(&self, request: &RequestDescriptor) -> HttpResult<Payload> {
        let url = resolve(&self.inner.base_url, &request.path)?;
        let transport = if request.with_credentials {
            &self.inner.credentialed
        } else {
            &self.inner.anonymous
        };

        let is_multipart = matches!(request.body, RequestBody::Multipart(_));
        let mut builder = transport.request(request.method.into(), url);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        for (name, value) in &request.headers {
            // reqwest sets the multipart boundary itself
            if is_multipart && name == "content-type" {
                continue;
            }
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::InvalidRequest(format!("header '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidRequest(format!("header '{}': {}", name, e)))?;
            builder = builder.header(header_name, header_value);
        }
        builder = builder.header(X_REQUEST_ID, request.meta().request_id.to_string());

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        let response = builder.send().await?;
        debug!(
            status = response.status().as_u16(),
            attempt = request.meta().attempt,
            "response received"
        );
        read_payload(response).await
    }

    /// Subscribe to session events (forced logouts).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Event hub shared by all clones of this client.
    pub fn events(&self) -> &SessionEvents {
        &self.inner.events
    }

    /// Store cleared on forced logout.
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        self.inner.store.clone()
    }

    /// Refresher used by the recovery protocol.
    pub fn refresher(&self) -> &SessionRefresher {
        &self.inner.refresher
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Where users are sent to sign in again.
    pub fn login_url(&self) -> &Url {
        &self.inner.login_url
    }

    /// Build a keep-alive poller bound to this client's session.
    pub fn session_poller(&self, interval: Duration) -> SessionPoller {
        let store = self.inner.store.clone();
        let probe = resolve(&self.inner.base_url, "/").ok();
        SessionPoller::new(
            interval,
            Arc::new(self.inner.refresher.clone()),
            Arc::new(move || probe.as_ref().is_some_and(|url| store.has_session(url))),
        )
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url)
            .field("login_url", &self.inner.login_url.as_str())
            .field("refresher", &self.inner.refresher)
            .finish()
    }
}
