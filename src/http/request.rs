//! Request descriptors.
//!
//! # Responsibilities
//! - Describe a request as replayable data (method, path, params, body, headers)
//! - Keep transport-only metadata (request ID, attempt) apart from caller data
//! - Produce the retry clone used by the recovery protocol
//!
//! # Design Decisions
//! - Multipart bodies are stored as a part list, not a transport form, so the
//!   retry can rebuild an identical form
//! - Request ID is regenerated for every attempt
//! - The retry clone never inherits metadata from the failed attempt

use std::collections::BTreeMap;
use std::fmt;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use uuid::Uuid;

use crate::http::error::{HttpError, HttpResult};

/// Header carrying the per-attempt request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP method of a console request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        data: Vec<u8>,
    },
}

/// Replayable description of a `multipart/form-data` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            data,
        });
        self
    }

    /// Parts in insertion order.
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// True when no part was added.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a fresh transport form. Called once per attempt.
    pub fn to_form(&self) -> HttpResult<Form> {
        let mut form = Form::new();
        for part in &self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    data,
                } => {
                    let mut file_part = Part::bytes(data.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file_part = file_part.mime_str(mime).map_err(|e| {
                            HttpError::InvalidRequest(format!(
                                "invalid MIME type '{}' for part '{}': {}",
                                mime, name, e
                            ))
                        })?;
                    }
                    form.part(name.clone(), file_part)
                }
            };
        }
        Ok(form)
    }
}

/// Body of a console request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

/// Transport-only metadata for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestMeta {
    pub request_id: Uuid,
    pub attempt: u8,
}

impl RequestMeta {
    fn first() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            attempt: 0,
        }
    }
}

/// A request as handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the configured base URL (may also be absolute).
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: RequestBody,
    pub headers: BTreeMap<String, String>,
    /// Attach session cookies.
    pub with_credentials: bool,
    /// Return a 401 as-is instead of refreshing the session.
    pub skip_refresh: bool,
    meta: RequestMeta,
}

impl RequestDescriptor {
    /// Create a credentialed request with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: RequestBody::Empty,
            headers: BTreeMap::new(),
            with_credentials: true,
            skip_refresh: false,
            meta: RequestMeta::first(),
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Create a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Create a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Create a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters.
    #[must_use]
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Set a `multipart/form-data` body.
    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Set a header. Names are stored lowercased.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Opt out of the refresh-and-retry sequence.
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    /// Send without session cookies.
    #[must_use]
    pub fn without_credentials(mut self) -> Self {
        self.with_credentials = false;
        self
    }

    /// Transport metadata of this attempt.
    pub fn meta(&self) -> RequestMeta {
        self.meta
    }

    /// Path without query string or fragment.
    pub fn bare_path(&self) -> &str {
        let end = self.path.find(['?', '#']).unwrap_or(self.path.len());
        &self.path[..end]
    }

    /// Rebuild this request for the single post-refresh attempt.
    ///
    /// Caller data is copied; metadata of the failed attempt is not.
    /// Credentials are always on for the retry.
    pub fn for_retry(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            headers: self.headers.clone(),
            with_credentials: true,
            skip_refresh: true,
            meta: RequestMeta {
                request_id: Uuid::new_v4(),
                attempt: self.meta.attempt.saturating_add(1),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let req = RequestDescriptor::get("/api/v1/seller/orders");
        assert_eq!(req.method, Method::Get);
        assert!(req.with_credentials);
        assert!(!req.skip_refresh);
        assert_eq!(req.body, RequestBody::Empty);
        assert_eq!(req.meta().attempt, 0);
    }

    #[test]
    fn test_retry_clone_keeps_caller_data() {
        let req = RequestDescriptor::put("/api/v1/seller/store")
            .param("draft", "true")
            .header("X-Store-Id", "42")
            .json(json!({"name": "Corner Shop"}))
            .without_credentials();

        let retry = req.for_retry();
        assert_eq!(retry.method, Method::Put);
        assert_eq!(retry.path, req.path);
        assert_eq!(retry.params, vec![("draft".to_string(), "true".to_string())]);
        assert_eq!(retry.headers.get("x-store-id").map(String::as_str), Some("42"));
        assert_eq!(retry.body, req.body);
        assert!(retry.with_credentials);
        assert!(retry.skip_refresh);
    }

    #[test]
    fn test_retry_clone_gets_fresh_metadata() {
        let req = RequestDescriptor::get("/api/v1/seller/orders");
        let retry = req.for_retry();
        assert_ne!(retry.meta().request_id, req.meta().request_id);
        assert_eq!(retry.meta().attempt, 1);
    }

    #[test]
    fn test_bare_path_strips_query() {
        let req = RequestDescriptor::post("/api/v1/auth/login?next=%2Forders");
        assert_eq!(req.bare_path(), "/api/v1/auth/login");
        let req = RequestDescriptor::get("/api/v1/menu#top");
        assert_eq!(req.bare_path(), "/api/v1/menu");
    }

    #[test]
    fn test_multipart_form_builds_each_time() {
        let form = MultipartForm::new()
            .text("sku", "A-100")
            .file("image", "front.png", Some("image/png"), vec![1, 2, 3]);
        assert_eq!(form.parts().len(), 2);
        assert!(form.to_form().is_ok());
        assert!(form.to_form().is_ok());
    }

    #[test]
    fn test_multipart_rejects_bad_mime() {
        let form = MultipartForm::new().file("doc", "kyc.pdf", Some("not a mime"), vec![0]);
        let err = form.to_form().unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
    }
}
