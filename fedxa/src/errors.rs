use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};
use crate::xa::{Heuristic, XaCode};

/// Error kinds for federation and transaction coordination.
///
/// Participant failures are always reported as [`ErrorKind::Xa`] so that the
/// coordinator can classify them without inspecting messages.
///
/// # Examples
///
/// ```rust,ignore
/// use fedxa::errors::{FedError, ErrorKind, FedResult};
/// use fedxa::xa::XaCode;
///
/// fn example() -> FedResult<()> {
///     Err(FedError::xa("xid not active", XaCode::Protocol))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// An X/Open XA return or error code
    Xa(XaCode),

    /// The operation is not offered by this resolver
    NotSupported,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Federation errors
    /// A constraint could not be turned into a remote query
    QueryError,
    /// Graph routing or remote execution failed
    ResolverError,
    /// A term could not be localized or globalized
    LocalizationError,
    /// A remote session could not be obtained, used or returned
    SessionError,

    /// Invalid or missing configuration
    ConfigurationError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Xa(code) => write!(f, "XA error {}", code),
            ErrorKind::NotSupported => write!(f, "Not supported"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::QueryError => write!(f, "Query error"),
            ErrorKind::ResolverError => write!(f, "Resolver error"),
            ErrorKind::LocalizationError => write!(f, "Localization error"),
            ErrorKind::SessionError => write!(f, "Session error"),
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the crate.
///
/// `FedError` carries a message, an [`ErrorKind`], an optional cause and a
/// backtrace captured at construction.
///
/// # Examples
///
/// ```rust,ignore
/// use fedxa::errors::{FedError, ErrorKind};
///
/// let cause = FedError::new("connection reset", ErrorKind::SessionError);
/// let err = FedError::new_with_cause("Remote query failed", ErrorKind::ResolverError, cause);
/// ```
#[derive(Clone)]
pub struct FedError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<FedError>>,
    backtrace: Atomic<Backtrace>,
}

impl FedError {
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        FedError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: FedError) -> Self {
        FedError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates an error carrying an XA code.
    pub fn xa(message: &str, code: XaCode) -> Self {
        FedError::new(message, ErrorKind::Xa(code))
    }

    /// Re-signals a participant failure as a generic resource manager error
    /// (XAER_RMERR), keeping the original failure as the cause.
    pub fn resource_error(message: &str, cause: FedError) -> Self {
        FedError::new_with_cause(message, ErrorKind::Xa(XaCode::ResourceError), cause)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&FedError> {
        self.cause.as_deref()
    }

    /// Returns the XA code if this is an XA failure.
    pub fn xa_code(&self) -> Option<XaCode> {
        match &self.error_kind {
            ErrorKind::Xa(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_gone(&self) -> bool {
        self.xa_code().map(|c| c.is_gone()).unwrap_or(false)
    }

    pub fn is_rollback(&self) -> bool {
        self.xa_code().map(|c| c.is_rollback()).unwrap_or(false)
    }

    pub fn is_heuristic(&self) -> bool {
        self.xa_code().map(|c| c.is_heuristic()).unwrap_or(false)
    }

    pub fn heuristic(&self) -> Option<Heuristic> {
        self.xa_code().and_then(|c| c.heuristic())
    }
}

impl Display for FedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for FedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message and kind, then the cause chain or the backtrace
        match &self.cause {
            Some(cause) => write!(f, "{} [{}]\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => write!(
                f,
                "{} [{}]\n{:?}",
                self.message,
                self.error_kind,
                self.backtrace.read()
            ),
        }
    }
}

impl Error for FedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, FedError>`.
pub type FedResult<T> = Result<T, FedError>;

impl From<url::ParseError> for FedError {
    fn from(err: url::ParseError) -> Self {
        FedError::new(
            &format!("Invalid URI: {}", err),
            ErrorKind::ResolverError,
        )
    }
}

impl From<std::fmt::Error> for FedError {
    fn from(err: std::fmt::Error) -> Self {
        FedError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for FedError {
    fn from(msg: String) -> Self {
        FedError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for FedError {
    fn from(msg: &str) -> Self {
        FedError::new(msg, ErrorKind::InternalError)
    }
}
