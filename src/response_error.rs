//! Errors returned by request handlers.
//!
//! The family is closed: every failed request ends up as exactly one
//! [`ResponseError`] variant, which decides both the wire encoding and the
//! severity of the request log line.
//!
//! | Variant | Code | Status | Body |
//! |---|---|---|---|
//! | [`BadRequestError`] | `000400` | 200 | JSON envelope |
//! | [`InternalServerError`] | `000500` | 200 | JSON envelope |
//! | [`StandardHttpError`] | none | the error's status | plain text |
//! | [`UnknownError`] | `999999` | 200 | JSON envelope |
//!
//! The JSON envelope is
//! `{"rtnCode":"..","rtnMsg":"..","rtnMsgEnglish":"..","detailError":".."}`.
//!
//! ```
//! use axum::{Json, extract::Path};
//! use webframe::{BadRequestError, Reply};
//!
//! async fn get_user(Path(id): Path<String>) -> Reply<Json<String>> {
//!     if id.is_empty() {
//!         return Err(BadRequestError::new("invalid id").into());
//!     }
//!     Ok(Json(id))
//! }
//! ```

use {
    axum::{
        body::Bytes,
        response::{IntoResponse, Response},
    },
    http::{StatusCode, header::CONTENT_TYPE},
    serde::{Deserialize, Serialize},
    std::{error::Error as StdError, fmt},
    thiserror::Error,
};

pub const SUCCESS_CODE: &str = "000000";
pub const BAD_REQUEST_CODE: &str = "000400";
pub const INTERNAL_SERVER_ERROR_CODE: &str = "000500";
pub const UNKNOWN_ERROR_CODE: &str = "999999";

const UNKNOWN_ERROR_MESSAGE: &str = "发生未知错误";
const UNKNOWN_ERROR_MESSAGE_ENGLISH: &str = "An unknown error occurred";

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Result type for axum handlers.
pub type Reply<T> = std::result::Result<T, ResponseError>;

/// The JSON envelope shared by the coded variants. Absent optional fields
/// are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub rtn_code: String,
    pub rtn_msg: String,
    pub rtn_msg_english: String,
    pub detail_error: String,
}

impl ErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        ErrorBody {
            rtn_code: code.to_string(),
            rtn_msg: message.into(),
            rtn_msg_english: String::new(),
            detail_error: String::new(),
        }
    }

    fn encode(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(json) => Bytes::from(json),
            Err(_) => Bytes::from(format!(
                r#"{{"rtnCode":"{}","rtnMsg":"","rtnMsgEnglish":"","detailError":""}}"#,
                self.rtn_code
            )),
        }
    }
}

macro_rules! coded_error_builders {
    ($name:ident, $code:expr) => {
        impl $name {
            /// Creates the error with its fixed code and the given message.
            pub fn new(message: impl Into<String>) -> Self {
                $name(ErrorBody::new($code, message))
            }

            /// Sets the English message.
            #[must_use]
            pub fn with_english(mut self, message: impl Into<String>) -> Self {
                self.0.rtn_msg_english = message.into();
                self
            }

            /// Records the text of an underlying error.
            #[must_use]
            pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
                self.0.detail_error = detail.to_string();
                self
            }

            pub fn code(&self) -> &str {
                &self.0.rtn_code
            }

            pub fn message(&self) -> &str {
                &self.0.rtn_msg
            }

            pub fn body(&self) -> &ErrorBody {
                &self.0
            }

            /// The JSON envelope.
            pub fn encode(&self) -> Bytes {
                self.0.encode()
            }
        }

        impl IntoResponse for $name {
            fn into_response(self) -> Response {
                ResponseError::from(self).into_response()
            }
        }
    };
}

/// A client-side business error, `rtnCode = "000400"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("BadRequest! code: '{}', reason: {}", .0.rtn_code, .0.rtn_msg)]
pub struct BadRequestError(ErrorBody);

coded_error_builders!(BadRequestError, BAD_REQUEST_CODE);

/// A server-side business error, `rtnCode = "000500"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Internal Server Error! code: '{}', reason: {}, detail: {}",
    .0.rtn_code, .0.rtn_msg, .0.detail_error
)]
pub struct InternalServerError(ErrorBody);

coded_error_builders!(InternalServerError, INTERNAL_SERVER_ERROR_CODE);

/// A transport-level error answered with its literal HTTP status and a
/// plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardHttpError {
    status: StatusCode,
    message: String,
}

impl StandardHttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        StandardHttpError {
            status,
            message: message.into(),
        }
    }

    /// Uses the text of `err` as the message.
    pub fn from_error(status: StatusCode, err: impl fmt::Display) -> Self {
        Self::new(status, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw message.
    pub fn encode(&self) -> Bytes {
        Bytes::from(self.message.clone())
    }
}

impl fmt::Display for StandardHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StandardHttpError! httpCode: '{}', reason: {}",
            self.status.as_u16(),
            self.message
        )
    }
}

impl StdError for StandardHttpError {}

impl IntoResponse for StandardHttpError {
    fn into_response(self) -> Response {
        ResponseError::from(self).into_response()
    }
}

/// Any failure that is not one of the known variants. Only the error's text
/// leaves the process, in `detailError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("UnknownError! code: '{}', reason: {}", .0.rtn_code, .0.detail_error)]
pub struct UnknownError(ErrorBody);

impl UnknownError {
    pub fn new(err: impl fmt::Display) -> Self {
        let mut body = ErrorBody::new(UNKNOWN_ERROR_CODE, UNKNOWN_ERROR_MESSAGE);
        body.rtn_msg_english = UNKNOWN_ERROR_MESSAGE_ENGLISH.to_string();
        body.detail_error = err.to_string();
        UnknownError(body)
    }

    pub fn code(&self) -> &str {
        &self.0.rtn_code
    }

    pub fn detail(&self) -> &str {
        &self.0.detail_error
    }

    pub fn body(&self) -> &ErrorBody {
        &self.0
    }

    pub fn encode(&self) -> Bytes {
        self.0.encode()
    }
}

impl IntoResponse for UnknownError {
    fn into_response(self) -> Response {
        ResponseError::from(self).into_response()
    }
}

/// The closed set of handler errors.
///
/// Converting into a response encodes the body and also stores the error in
/// the response extensions, where the request middleware reads it back to
/// classify the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error(transparent)]
    BadRequest(#[from] BadRequestError),
    #[error(transparent)]
    InternalServer(#[from] InternalServerError),
    #[error(transparent)]
    StandardHttp(#[from] StandardHttpError),
    #[error(transparent)]
    Unknown(#[from] UnknownError),
}

impl ResponseError {
    /// Finds the first known variant along the `source()` chain of `err`,
    /// checking BadRequest, then InternalServer, then StandardHttp at each
    /// level. Anything else becomes [`UnknownError`] carrying `err`'s text.
    pub fn classify(err: &(dyn StdError + 'static)) -> ResponseError {
        let mut current = Some(err);
        while let Some(candidate) = current {
            if let Some(known) = candidate.downcast_ref::<ResponseError>() {
                return known.clone();
            }
            if let Some(known) = candidate.downcast_ref::<BadRequestError>() {
                return known.clone().into();
            }
            if let Some(known) = candidate.downcast_ref::<InternalServerError>() {
                return known.clone().into();
            }
            if let Some(known) = candidate.downcast_ref::<StandardHttpError>() {
                return known.clone().into();
            }
            if let Some(known) = candidate.downcast_ref::<UnknownError>() {
                return known.clone().into();
            }
            current = candidate.source();
        }
        UnknownError::new(err).into()
    }

    /// The business code, absent for [`StandardHttpError`].
    pub fn code(&self) -> Option<&str> {
        match self {
            ResponseError::BadRequest(err) => Some(err.code()),
            ResponseError::InternalServer(err) => Some(err.code()),
            ResponseError::StandardHttp(_) => None,
            ResponseError::Unknown(err) => Some(err.code()),
        }
    }

    /// HTTP status of the response; coded variants always answer 200.
    pub fn status(&self) -> StatusCode {
        match self {
            ResponseError::StandardHttp(err) => err.status(),
            _ => StatusCode::OK,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseError::StandardHttp(_) => TEXT_CONTENT_TYPE,
            _ => JSON_CONTENT_TYPE,
        }
    }

    /// The response body.
    pub fn encode(&self) -> Bytes {
        match self {
            ResponseError::BadRequest(err) => err.encode(),
            ResponseError::InternalServer(err) => err.encode(),
            ResponseError::StandardHttp(err) => err.encode(),
            ResponseError::Unknown(err) => err.encode(),
        }
    }
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status(),
            [(CONTENT_TYPE, self.content_type())],
            self.encode(),
        )
            .into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<crate::Error> for ResponseError {
    fn from(err: crate::Error) -> Self {
        ResponseError::classify(&err)
    }
}

impl From<std::io::Error> for ResponseError {
    fn from(err: std::io::Error) -> Self {
        ResponseError::classify(&err)
    }
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        ResponseError::classify(&err)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for ResponseError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        ResponseError::classify(&*err)
    }
}
