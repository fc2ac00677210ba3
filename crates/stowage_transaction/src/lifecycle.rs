//! Transaction lifecycle and close outcome.

/// Lifecycle of a transaction manager.
///
/// The lifecycle moves through `None -> Open -> Closing` on every close,
/// visits `OuterClosing` only when the outermost transaction is the one
/// closing, and returns to `None` (or `Open`, for a nested close) once
/// teardown finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No transaction is open.
    None,
    /// A transaction is open and accepting operations.
    Open,
    /// A transaction is running its participant and close callbacks.
    Closing,
    /// The outermost transaction is running its outer-close callbacks.
    OuterClosing,
}

/// Outcome of a closed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionResult {
    /// The transaction was committed; its changes become the responsibility
    /// of the enclosing transaction, or permanent if it was the outermost.
    Committed,
    /// The transaction was aborted; every change made at its depth was
    /// reverted. This is the implicit outcome of closing without a commit.
    Aborted,
}

impl TransactionResult {
    /// Checks whether the transaction committed.
    #[must_use]
    pub fn was_committed(self) -> bool {
        self == TransactionResult::Committed
    }

    /// Checks whether the transaction aborted.
    #[must_use]
    pub fn was_aborted(self) -> bool {
        self == TransactionResult::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_predicates() {
        assert!(TransactionResult::Committed.was_committed());
        assert!(!TransactionResult::Committed.was_aborted());
        assert!(TransactionResult::Aborted.was_aborted());
        assert!(!TransactionResult::Aborted.was_committed());
    }
}
