//! Transaction manager: the host-owned transaction context.

use crate::error::TransactionError;
use crate::lifecycle::{Lifecycle, TransactionResult};
use crate::participant::Participant;
use crate::transaction::{CloseContext, Transaction};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// One open transaction depth.
pub(crate) struct Frame {
    /// Snapshot participants registered at this depth, in registration
    /// order. Rollback on abort walks this in reverse.
    pub(crate) participants: Vec<Rc<dyn Participant>>,
    /// Close callbacks registered at this depth, in registration order.
    pub(crate) close_callbacks: Vec<Box<dyn FnOnce(&mut CloseContext<'_>, TransactionResult)>>,
    /// Outcome decided by `commit`/`abort`. `None` means implicit abort.
    pub(crate) outcome: Option<TransactionResult>,
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self {
            participants: Vec::new(),
            close_callbacks: Vec::new(),
            outcome: None,
        }
    }
}

/// Shared state behind a [`TransactionManager`] and its open guards.
pub(crate) struct Stack {
    /// One frame per open transaction depth; the last entry is innermost.
    pub(crate) frames: Vec<Frame>,
    /// Current lifecycle, observable by the host between operations and by
    /// callbacks during teardown.
    pub(crate) lifecycle: Lifecycle,
    /// Outer-close callbacks, queued across all depths in strict FIFO
    /// registration order and drained only when the outermost transaction
    /// closes.
    pub(crate) outer_close_callbacks: VecDeque<Box<dyn FnOnce(TransactionResult)>>,
}

/// Owns the transaction stack for one logical thread of control.
///
/// The manager is the explicit replacement for a process-global "current
/// transaction": the host creates one, opens an outer [`Transaction`] from
/// it, and threads the returned guard through every transactional
/// operation. Nested transactions are opened from the guard itself, which
/// statically enforces the strict stack discipline (a parent cannot be
/// touched, or closed, while one of its children is open).
///
/// Managers and guards are deliberately single-threaded (`!Send`): the
/// engine models one cooperative actor, not concurrent writers.
///
/// # Example
///
/// ```rust
/// use stowage_transaction::TransactionManager;
///
/// let txns = TransactionManager::new();
/// let mut tx = txns.open_outer().unwrap();
/// let nested = tx.open_nested();
/// nested.commit();
/// tx.commit();
/// assert!(!txns.is_open());
/// ```
pub struct TransactionManager {
    stack: Rc<RefCell<Stack>>,
}

impl Clone for TransactionManager {
    /// Clones the handle; both handles share the same transaction context.
    fn clone(&self) -> Self {
        Self {
            stack: Rc::clone(&self.stack),
        }
    }
}

impl TransactionManager {
    /// Creates a new manager with no open transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Rc::new(RefCell::new(Stack {
                frames: Vec::new(),
                lifecycle: Lifecycle::None,
                outer_close_callbacks: VecDeque::new(),
            })),
        }
    }

    /// Opens the outermost transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::AlreadyOpen`] if a transaction is already
    /// open on this manager, and [`TransactionError::OpenDuringClose`] when
    /// called from inside a close or outer-close callback.
    pub fn open_outer(&self) -> Result<Transaction<'_>, TransactionError> {
        let mut stack = self.stack.borrow_mut();
        match stack.lifecycle {
            Lifecycle::None => {
                stack.frames.push(Frame::new());
                stack.lifecycle = Lifecycle::Open;
                drop(stack);
                debug!("opened outer transaction");
                Ok(Transaction::new(Rc::clone(&self.stack), 0))
            }
            Lifecycle::Open => Err(TransactionError::AlreadyOpen),
            Lifecycle::Closing | Lifecycle::OuterClosing => Err(TransactionError::OpenDuringClose),
        }
    }

    /// Returns the current lifecycle.
    ///
    /// Between operations this is [`Lifecycle::None`] or [`Lifecycle::Open`];
    /// close callbacks observe [`Lifecycle::Closing`], and outer-close
    /// callbacks observe [`Lifecycle::OuterClosing`].
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.stack.borrow().lifecycle
    }

    /// Checks whether any transaction is currently open (including one that
    /// is mid-teardown).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lifecycle() != Lifecycle::None
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.stack.borrow();
        f.debug_struct("TransactionManager")
            .field("lifecycle", &stack.lifecycle)
            .field("open_depths", &stack.frames.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_has_no_transaction() {
        let txns = TransactionManager::new();
        assert_eq!(txns.lifecycle(), Lifecycle::None);
        assert!(!txns.is_open());
    }

    #[test]
    fn open_outer_twice_fails() {
        let txns = TransactionManager::new();
        let _tx = txns.open_outer().unwrap();
        assert_eq!(txns.open_outer().unwrap_err(), TransactionError::AlreadyOpen);
    }

    #[test]
    fn dropping_guard_releases_manager() {
        let txns = TransactionManager::new();
        {
            let _tx = txns.open_outer().unwrap();
            assert!(txns.is_open());
        }
        assert!(!txns.is_open());
        assert!(txns.open_outer().is_ok());
    }

    #[test]
    fn nested_depths_are_sequential() {
        let txns = TransactionManager::new();
        let mut outer = txns.open_outer().unwrap();
        assert_eq!(outer.nesting_depth(), 0);
        let mut nested = outer.open_nested();
        assert_eq!(nested.nesting_depth(), 1);
        let inner = nested.open_nested();
        assert_eq!(inner.nesting_depth(), 2);
    }
}
