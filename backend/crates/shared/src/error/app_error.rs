//! Application Error
//!
//! [`AppError`] is what crosses the HTTP boundary. Domain crates keep their
//! own closed error enums and convert into this type at the edge.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

type Cause = Box<dyn Error + Send + Sync + 'static>;

/// Wire-level error: a kind, a client-facing detail and an optional hint
///
/// The underlying cause is reachable through [`Error::source`] but is never
/// serialized.
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::Unauthorized, "Current token is not valid anymore")
///     .with_action("Sign in again");
/// assert_eq!(err.status_code(), 401);
/// assert_eq!(err.action(), Some("Sign in again"));
/// ```
#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    detail: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
    cause: Option<Cause>,
}

impl AppError {
    pub fn new(kind: ErrorKind, detail: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            action: None,
            cause: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_source(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.detail
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}
