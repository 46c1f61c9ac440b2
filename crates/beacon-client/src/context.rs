//! Request context extraction.
//!
//! Maps a framework request into a flat [`RequestContext`] for tracking
//! calls. Extraction is infallible by contract: any field that cannot be
//! read is simply absent, never an error surfaced to the request path.
//!
//! Frameworks plug in through the [`ExtractContext`] adapter; the provided
//! implementation covers any `http::Request`-based stack (axum, hyper,
//! tower services). Identity comes from typed request extensions when the
//! application's auth layer sets them, with a cookie fallback.

use http::{header::COOKIE, Request};

/// Flat request context attached to tracking calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Request path, e.g. `/api/orders`.
    pub request_path: Option<String>,
    /// HTTP method, e.g. `GET`.
    pub request_method: Option<String>,
    /// Authenticated user id.
    pub user_id: Option<i64>,
    /// Session identifier.
    pub session_id: Option<String>,
}

/// Typed request extension carrying the authenticated user id.
///
/// Auth middleware inserts this so extraction does not have to know the
/// framework's user representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

/// Typed request extension carrying the session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Adapter interface turning a raw framework request into a
/// [`RequestContext`]. One implementation per framework; the tracking core
/// never inspects framework internals.
pub trait ExtractContext {
    /// Extracts the context. Must not fail; unreadable fields are absent.
    fn extract_context(&self) -> RequestContext;
}

/// Session cookie names probed in order, most specific first.
const SESSION_COOKIES: [&str; 4] = ["sessionid", "session_id", "session", "_session"];

impl<B> ExtractContext for Request<B> {
    fn extract_context(&self) -> RequestContext {
        let user_id = self
            .extensions()
            .get::<UserId>()
            .map(|id| id.0)
            .or_else(|| cookie_value(self, "user_id").and_then(|v| v.parse().ok()));

        let session_id = self
            .extensions()
            .get::<SessionId>()
            .map(|id| id.0.clone())
            .or_else(|| {
                SESSION_COOKIES.iter().find_map(|name| {
                    cookie_value(self, name).filter(|value| !value.is_empty())
                })
            });

        RequestContext {
            request_path: Some(self.uri().path().to_string()),
            request_method: Some(self.method().as_str().to_string()),
            user_id,
            session_id,
        }
    }
}

/// Looks up a cookie by name across all `Cookie` headers. Malformed headers
/// and pairs are skipped.
fn cookie_value<B>(request: &Request<B>, name: &str) -> Option<String> {
    request.headers().get_all(COOKIE).iter().find_map(|header| {
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
    })
}
