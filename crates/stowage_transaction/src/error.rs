//! Error types for the transaction engine.

use thiserror::Error;

/// Errors that can occur when opening transactions.
///
/// These are usage errors: they indicate a bug in the calling code, not a
/// condition that should be retried. Capacity or policy rejections are never
/// reported through this type; they surface as zero or partial amounts from
/// the storage operations themselves.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransactionError {
    /// An outer transaction is already open on this manager.
    ///
    /// Only one outer transaction may exist per manager at a time. Use
    /// [`Transaction::open_nested`](crate::Transaction::open_nested) to
    /// nest work inside the open transaction instead.
    #[error("a transaction is already open on this manager")]
    AlreadyOpen,

    /// A transaction open was attempted from inside a close callback.
    ///
    /// While a transaction is being torn down it is not a valid target for
    /// new nested work; callbacks observe the outcome, they do not extend
    /// the transaction.
    #[error("cannot open a transaction while another is closing")]
    OpenDuringClose,
}
