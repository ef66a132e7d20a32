//!
//! Small helpers shared by the configuration and middleware layers.
//!
//! - [`RequestIdGenerator`] - keeps or mints the `x-request-id` of a request
//! - [`replace_handlebars_with_env`] - `{{ VAR }}` substitution in configuration text
//!

use {
    http::{HeaderValue, Request},
    regex::{Captures, Regex},
    std::{env, sync::LazyLock},
    tower_http::request_id::{MakeRequestId, RequestId},
    uuid::{ContextV7, Timestamp, Uuid},
};

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Matches `{{ VAR_NAME }}` with optional whitespace around an upper-case name.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// Produces request ids for `tower_http`'s request-id layers.
///
/// An incoming `x-request-id` header is kept as is, so ids assigned by a proxy
/// or an upstream service survive. Otherwise a UUIDv7 is minted, which sorts
/// by creation time and therefore keeps log lines of one request together.
///
/// ```
/// use webframe::RequestIdGenerator;
/// use tower_http::request_id::SetRequestIdLayer;
///
/// let layer = SetRequestIdLayer::x_request_id(RequestIdGenerator);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, req: &Request<B>) -> Option<RequestId> {
        match req.headers().get(X_REQUEST_ID) {
            Some(value) => Some(RequestId::new(value.clone())),
            None => {
                let cx = ContextV7::new().with_additional_precision();
                let uuid = Uuid::new_v7(Timestamp::now(cx));
                let value = HeaderValue::from_str(&uuid.to_string()).ok()?;
                Some(RequestId::new(value))
            }
        }
    }
}

/// Replaces `{{ VAR_NAME }}` placeholders with environment variable values.
///
/// Whitespace around the name is optional. Unset variables become empty
/// strings, which for `[logging] env` means development mode.
///
/// ```
/// use webframe::replace_handlebars_with_env;
///
/// let text = replace_handlebars_with_env("env = \"{{ WEBFRAME_DOC_UNSET }}\"");
/// assert_eq!(text, "env = \"\"");
/// ```
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}
