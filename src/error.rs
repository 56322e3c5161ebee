//! Typed error kinds surfaced by the index API.
//!
//! Infrastructure failures (I/O, corrupt pages) travel as plain
//! [`eyre::Report`]s with context strings. The kinds below are the ones
//! callers match on: they are embedded in reports and recovered with
//! [`eyre::Report::downcast_ref`].

use thiserror::Error;

/// Errors a caller of the index API is expected to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A range scan was started with operators that do not form a range:
    /// the low bound takes `Gt` or `Ge`, the high bound `Lt` or `Le`.
    #[error("scan operators do not form a range (low needs Gt/Ge, high needs Lt/Le)")]
    InvalidScanOperators,

    /// The low bound of a scan exceeds its high bound.
    #[error("scan range is empty: low bound exceeds high bound")]
    InvalidScanRange,

    /// `scan_next` or `end_scan` was called with no scan in progress.
    #[error("no scan in progress")]
    ScanNotInitialized,

    /// The scan has visited every entry that satisfies its range.
    #[error("scan has visited all matching entries")]
    ScanExhausted,

    /// Reserved for eager detection of a range that matches no keys.
    #[error("no keys satisfy the scan range")]
    KeyNotFound,

    /// An existing index file's metadata does not match the relation name,
    /// byte offset, or key type it was opened with.
    #[error("index metadata does not match the requested relation, offset, or key type")]
    IndexInfoMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failed_precondition() {
        assert!(IndexError::InvalidScanOperators
            .to_string()
            .contains("Gt/Ge"));
        assert!(IndexError::InvalidScanRange.to_string().contains("low"));
        assert_eq!(
            IndexError::ScanNotInitialized.to_string(),
            "no scan in progress"
        );
    }

    #[test]
    fn kinds_survive_a_report_round_trip() {
        let report = eyre::Report::from(IndexError::ScanExhausted);
        assert_eq!(
            report.downcast_ref::<IndexError>(),
            Some(&IndexError::ScanExhausted)
        );
    }

    #[test]
    fn kinds_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IndexError>();
    }
}
