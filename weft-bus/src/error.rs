//! Error types and the thread-local last-outcome cell.

use std::cell::Cell;
use std::fmt;

/// Error returned by bus operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The addressed channel does not exist: it was never opened, or it has
    /// already been closed.
    NoChannel,
    /// A non-blocking operation could make no progress.
    WouldBlock,
}

impl BusError {
    /// Returns `true` if this error is the `NoChannel` variant.
    pub fn is_no_channel(&self) -> bool {
        matches!(self, BusError::NoChannel)
    }

    /// Returns `true` if this error is the `WouldBlock` variant.
    pub fn is_would_block(&self) -> bool {
        matches!(self, BusError::WouldBlock)
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::NoChannel => write!(f, "no such channel"),
            BusError::WouldBlock => write!(f, "operation would block"),
        }
    }
}

impl std::error::Error for BusError {}

/// Outcome code of a bus operation, mirrored into a thread-local cell on
/// every return path.
///
/// [`BusError`] is the primary error surface; this enum exists for callers
/// ported from errno-style APIs that inspect the last outcome out of band
/// via [`last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    /// The last operation succeeded.
    #[default]
    None,
    /// The last operation addressed a channel that does not exist.
    NoChannel,
    /// The last non-blocking operation could make no progress.
    WouldBlock,
    /// Reserved for builds that compile out an optional operation family.
    NotImplemented,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::None => write!(f, "ok"),
            ErrorCode::NoChannel => write!(f, "no such channel"),
            ErrorCode::WouldBlock => write!(f, "operation would block"),
            ErrorCode::NotImplemented => write!(f, "operation not compiled in"),
        }
    }
}

impl From<BusError> for ErrorCode {
    fn from(err: BusError) -> Self {
        match err {
            BusError::NoChannel => ErrorCode::NoChannel,
            BusError::WouldBlock => ErrorCode::WouldBlock,
        }
    }
}

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::None) };
}

/// Returns the outcome code of the most recent bus operation on this thread.
///
/// # Example
///
/// ```
/// use weft_bus::{last_error, set_last_error, ErrorCode};
///
/// set_last_error(ErrorCode::WouldBlock);
/// assert_eq!(last_error(), ErrorCode::WouldBlock);
/// ```
pub fn last_error() -> ErrorCode {
    LAST_ERROR.get()
}

/// Overwrites the thread-local outcome code.
pub fn set_last_error(code: ErrorCode) {
    LAST_ERROR.set(code);
}

/// Records an operation's outcome in the thread-local cell and passes the
/// result through. Success stores [`ErrorCode::None`].
pub(crate) fn record<T>(result: Result<T, BusError>) -> Result<T, BusError> {
    let code = match &result {
        Ok(_) => ErrorCode::None,
        Err(err) => ErrorCode::from(*err),
    };
    set_last_error(code);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        set_last_error(ErrorCode::NotImplemented);
        assert_eq!(last_error(), ErrorCode::NotImplemented);

        set_last_error(ErrorCode::None);
        assert_eq!(last_error(), ErrorCode::None);
    }

    #[test]
    fn record_maps_results() {
        assert_eq!(record(Ok(7u32)), Ok(7));
        assert_eq!(last_error(), ErrorCode::None);

        assert_eq!(record::<u32>(Err(BusError::NoChannel)), Err(BusError::NoChannel));
        assert_eq!(last_error(), ErrorCode::NoChannel);

        assert_eq!(record::<u32>(Err(BusError::WouldBlock)), Err(BusError::WouldBlock));
        assert_eq!(last_error(), ErrorCode::WouldBlock);
    }

    #[test]
    fn predicates() {
        assert!(BusError::NoChannel.is_no_channel());
        assert!(!BusError::NoChannel.is_would_block());
        assert!(BusError::WouldBlock.is_would_block());
    }
}
