use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for docstore operations.
///
/// Each kind describes one category of failure so callers can match on
/// [DocStoreError::kind] instead of parsing messages.
///
/// # Examples
///
/// ```rust
/// use docstore::errors::{DocStoreError, ErrorKind, DocStoreResult};
///
/// fn example() -> DocStoreResult<()> {
///     Err(DocStoreError::new("Document products/1-A not found", ErrorKind::NotFound))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::NotFound);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Lookup errors
    /// The requested document or attachment does not exist
    NotFound,

    // Write errors
    /// A document's stored revision advanced since it was loaded
    ConcurrencyConflict,
    /// One or more bulk load chunks failed to flush
    BulkLoadError,

    // Validation errors
    /// Malformed document body or argument
    ValidationError,
    /// Malformed document key
    InvalidKey,
    /// Invalid filter, sort or projection
    FilterError,
    /// The operation is not valid in the current state
    InvalidOperation,

    // Index errors
    /// Index does not exist
    IndexNotFound,
    /// Index already exists for the collection and field
    IndexAlreadyExists,

    // Mapping errors
    /// Error mapping an entity to or from a document
    ObjectMappingError,

    // IO errors
    /// Error reading an attachment stream
    IOError,

    // Store state
    /// The store has been closed
    StoreClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::ConcurrencyConflict => write!(f, "Concurrency conflict"),
            ErrorKind::BulkLoadError => write!(f, "Bulk load error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidKey => write!(f, "Invalid key"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::IndexAlreadyExists => write!(f, "Index already exists"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The error type of every fallible docstore operation.
///
/// `DocStoreError` carries a message, an [ErrorKind], an optional cause and
/// the document keys the failure applies to. For a
/// [ErrorKind::ConcurrencyConflict] the keys are the documents whose
/// revision moved; for a [ErrorKind::BulkLoadError] they are the documents
/// that were lost.
///
/// The backtrace is captured unresolved and symbolized only when the error
/// is debug-printed.
#[derive(Clone)]
pub struct DocStoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocStoreError>>,
    affected_keys: Vec<String>,
    backtrace: Atomic<Backtrace>,
}

impl DocStoreError {
    /// Creates a new `DocStoreError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocStoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            affected_keys: Vec::new(),
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    /// Creates a new `DocStoreError` wrapping the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocStoreError) -> Self {
        DocStoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            affected_keys: Vec::new(),
            backtrace: atomic(Backtrace::new_unresolved()),
        }
    }

    /// Attaches the document keys this error applies to.
    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.affected_keys = keys;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocStoreError> {
        self.cause.as_deref()
    }

    /// Returns the document keys this error applies to, if any.
    pub fn affected_keys(&self) -> &[String] {
        &self.affected_keys
    }
}

impl Display for DocStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.write();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, *backtrace)
            }
        }
    }
}

impl Error for DocStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docstore operations.
pub type DocStoreResult<T> = Result<T, DocStoreError>;

impl From<std::io::Error> for DocStoreError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::IOError,
        };
        DocStoreError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::num::ParseIntError> for DocStoreError {
    fn from(err: std::num::ParseIntError) -> Self {
        DocStoreError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::ValidationError,
        )
    }
}

impl From<String> for DocStoreError {
    fn from(msg: String) -> Self {
        DocStoreError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocStoreError {
    fn from(msg: &str) -> Self {
        DocStoreError::new(msg, ErrorKind::InternalError)
    }
}
