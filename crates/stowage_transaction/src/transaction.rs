//! Transaction guards and the close algorithm.

use crate::lifecycle::{Lifecycle, TransactionResult};
use crate::manager::{Frame, Stack};
use crate::participant::Participant;
use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{debug, error};

/// A scoped handle to one open transaction depth.
///
/// Dropping the guard closes the transaction. **Aborting is implicit**: if
/// neither [`commit`](Transaction::commit) nor [`abort`](Transaction::abort)
/// was called, every change registered at this depth is reverted. This holds
/// on every exit path, including unwinding, so a forgotten commit or an
/// early `?` return can never leave a partial application behind.
///
/// Nested transactions are opened with
/// [`open_nested`](Transaction::open_nested), which borrows this guard
/// mutably for the lifetime of the child. The borrow checker therefore
/// enforces the strict stack discipline: a parent cannot be operated on or
/// closed while a child is open, and a child can never be opened under a
/// stale parent.
pub struct Transaction<'scope> {
    stack: Rc<RefCell<Stack>>,
    depth: usize,
    _scope: PhantomData<&'scope mut ()>,
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<'scope> Transaction<'scope> {
    pub(crate) fn new(stack: Rc<RefCell<Stack>>, depth: usize) -> Self {
        Self {
            stack,
            depth,
            _scope: PhantomData,
        }
    }

    /// Returns this transaction's nesting depth. The outermost transaction
    /// has depth 0.
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    /// Opens a nested transaction under this one.
    ///
    /// While the child is open, this guard is mutably borrowed and cannot be
    /// used; the child must be closed (committed, aborted, or dropped)
    /// first.
    pub fn open_nested(&mut self) -> Transaction<'_> {
        let mut stack = self.stack.borrow_mut();
        stack.frames.push(Frame::new());
        let depth = stack.frames.len() - 1;
        drop(stack);
        debug!(depth, "opened nested transaction");
        Transaction::new(Rc::clone(&self.stack), depth)
    }

    /// Commits this transaction and closes it.
    ///
    /// Changes made at this depth become the responsibility of the enclosing
    /// transaction, or permanent if this is the outermost one.
    pub fn commit(self) {
        self.stack.borrow_mut().frames[self.depth].outcome = Some(TransactionResult::Committed);
        // Drop performs the close.
    }

    /// Aborts this transaction and closes it, reverting every change made at
    /// this depth. Dropping the guard without committing is equivalent.
    pub fn abort(self) {
        self.stack.borrow_mut().frames[self.depth].outcome = Some(TransactionResult::Aborted);
    }

    /// Registers a callback to run when this transaction closes, whether it
    /// commits or aborts.
    ///
    /// Callbacks run in registration order, after participant
    /// rollback/commit processing, and receive a [`CloseContext`] for the
    /// closing transaction along with the outcome.
    pub fn add_close_callback(
        &mut self,
        callback: impl FnOnce(&mut CloseContext<'_>, TransactionResult) + 'static,
    ) {
        self.stack.borrow_mut().frames[self.depth]
            .close_callbacks
            .push(Box::new(callback));
    }

    /// Registers a callback to run when the *outermost* transaction finally
    /// closes, after the close callbacks of every nested level.
    ///
    /// Callbacks registered at any depth share one queue and run in strict
    /// FIFO registration order, receiving the outermost outcome.
    pub fn add_outer_close_callback(&mut self, callback: impl FnOnce(TransactionResult) + 'static) {
        self.stack
            .borrow_mut()
            .outer_close_callbacks
            .push_back(Box::new(callback));
    }

    pub(crate) fn register_participant(&mut self, participant: Rc<dyn Participant>) {
        self.stack.borrow_mut().frames[self.depth]
            .participants
            .push(participant);
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        // Also closes (as aborted) any child frame that was leaked without
        // running its destructor, so the stack can never desynchronize.
        while self.stack.borrow().frames.len() > self.depth {
            close_top(&self.stack);
        }
    }
}

/// Handle passed to close callbacks while a transaction is being torn down.
///
/// The context identifies the closing depth and accepts outer-close
/// callbacks. It deliberately offers no way to open new transactions or to
/// mutate transactional state: at this point the closing transaction's
/// outcome is already decided.
pub struct CloseContext<'a> {
    stack: &'a Rc<RefCell<Stack>>,
    depth: usize,
}

impl CloseContext<'_> {
    /// Returns the nesting depth of the closing transaction.
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    /// Registers a callback to run when the outermost transaction finally
    /// closes. See [`Transaction::add_outer_close_callback`].
    pub fn add_outer_close_callback(&mut self, callback: impl FnOnce(TransactionResult) + 'static) {
        self.stack
            .borrow_mut()
            .outer_close_callbacks
            .push_back(Box::new(callback));
    }

    /// Re-registers a participant with the enclosing (parent) frame. Used
    /// when a nested commit migrates a snapshot one level up.
    pub(crate) fn register_participant_with_parent(&mut self, participant: Rc<dyn Participant>) {
        let mut stack = self.stack.borrow_mut();
        if let Some(frame) = stack.frames.last_mut() {
            frame.participants.push(participant);
        }
    }
}

/// Closes the innermost open frame: notifies participants, runs close
/// callbacks, and (for the outermost frame) drains the outer-close queue.
///
/// A panicking participant or callback must not corrupt the stack, so every
/// notification runs under `catch_unwind`; the remaining work is drained
/// best-effort, the lifecycle is restored, and only then is the first panic
/// resumed. If the thread is already unwinding (a close running from a drop
/// during a panic), secondary panics are logged and swallowed instead,
/// since resuming would abort the process.
fn close_top(stack_rc: &Rc<RefCell<Stack>>) {
    let (frame, depth, is_outer) = {
        let mut stack = stack_rc.borrow_mut();
        let Some(frame) = stack.frames.pop() else {
            return;
        };
        stack.lifecycle = Lifecycle::Closing;
        let depth = stack.frames.len();
        (frame, depth, stack.frames.is_empty())
    };
    let result = frame.outcome.unwrap_or(TransactionResult::Aborted);
    debug!(depth, committed = result.was_committed(), "closing transaction");

    let mut first_panic: Option<Box<dyn Any + Send>> = None;
    let mut ctx = CloseContext {
        stack: stack_rc,
        depth,
    };

    // Participants first: reverse registration order on abort, so compound
    // state unwinds bottom-up; forward order on commit.
    let Frame {
        participants,
        close_callbacks,
        ..
    } = frame;
    if result.was_aborted() {
        for participant in participants.into_iter().rev() {
            let attempt =
                panic::catch_unwind(AssertUnwindSafe(|| participant.on_close(&mut ctx, result)));
            if let Err(payload) = attempt {
                record_panic(&mut first_panic, payload);
            }
        }
    } else {
        for participant in participants {
            let attempt =
                panic::catch_unwind(AssertUnwindSafe(|| participant.on_close(&mut ctx, result)));
            if let Err(payload) = attempt {
                record_panic(&mut first_panic, payload);
            }
        }
    }

    // Close callbacks run for commit and abort alike, in registration order.
    for callback in close_callbacks {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| callback(&mut ctx, result)));
        if let Err(payload) = attempt {
            record_panic(&mut first_panic, payload);
        }
    }

    if is_outer {
        stack_rc.borrow_mut().lifecycle = Lifecycle::OuterClosing;
        // FIFO drain; callbacks appended while draining also run.
        loop {
            let next = stack_rc.borrow_mut().outer_close_callbacks.pop_front();
            let Some(callback) = next else {
                break;
            };
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| callback(result)));
            if let Err(payload) = attempt {
                record_panic(&mut first_panic, payload);
            }
        }
        stack_rc.borrow_mut().lifecycle = Lifecycle::None;
        debug!(committed = result.was_committed(), "outer transaction closed");
    } else {
        stack_rc.borrow_mut().lifecycle = Lifecycle::Open;
    }

    if let Some(payload) = first_panic {
        if std::thread::panicking() {
            error!("suppressed close-callback panic while already unwinding");
        } else {
            panic::resume_unwind(payload);
        }
    }
}

fn record_panic(first: &mut Option<Box<dyn Any + Send>>, payload: Box<dyn Any + Send>) {
    if first.is_none() {
        *first = Some(payload);
    } else {
        error!("suppressed additional panic during transaction close");
    }
}

#[cfg(test)]
mod tests {
    use crate::lifecycle::{Lifecycle, TransactionResult};
    use crate::manager::TransactionManager;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) + Clone) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let log = Rc::clone(&log);
            move |entry: &str| log.borrow_mut().push(entry.to_owned())
        };
        (log, sink)
    }

    #[test]
    fn close_callbacks_run_in_registration_order() {
        let (log, sink) = recorded();
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        let a = sink.clone();
        tx.add_close_callback(move |_, _| a("first"));
        let b = sink.clone();
        tx.add_close_callback(move |_, _| b("second"));
        tx.commit();
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn close_callbacks_run_on_abort_too() {
        let (log, sink) = recorded();
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        let a = sink.clone();
        tx.add_close_callback(move |_, result| {
            assert!(result.was_aborted());
            a("closed");
        });
        drop(tx);
        assert_eq!(*log.borrow(), ["closed"]);
    }

    #[test]
    fn outer_close_callbacks_fire_after_all_close_callbacks() {
        let (log, sink) = recorded();
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        let a = sink.clone();
        tx.add_outer_close_callback(move |_| a("outer"));
        {
            let mut nested = tx.open_nested();
            let b = sink.clone();
            nested.add_close_callback(move |_, _| b("nested close"));
            let c = sink.clone();
            nested.add_outer_close_callback(move |_| c("nested outer"));
            nested.commit();
        }
        let d = sink.clone();
        tx.add_close_callback(move |_, _| d("close"));
        tx.commit();
        // Outer-close callbacks run last, in global FIFO registration order.
        assert_eq!(*log.borrow(), ["nested close", "close", "outer", "nested outer"]);
    }

    #[test]
    fn outer_close_receives_outermost_result() {
        let (log, sink) = recorded();
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        {
            let mut nested = tx.open_nested();
            let a = sink.clone();
            nested.add_outer_close_callback(move |result| {
                a(if result.was_committed() { "committed" } else { "aborted" });
            });
            nested.commit();
        }
        drop(tx); // outer aborts
        assert_eq!(*log.borrow(), ["aborted"]);
    }

    #[test]
    fn nested_close_restores_open_lifecycle() {
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        {
            let nested = tx.open_nested();
            nested.commit();
        }
        assert_eq!(txns.lifecycle(), Lifecycle::Open);
        tx.commit();
        assert_eq!(txns.lifecycle(), Lifecycle::None);
    }

    #[test]
    fn callbacks_appended_during_outer_drain_still_run() {
        let (log, sink) = recorded();
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        let a = sink.clone();
        tx.add_close_callback(move |ctx, _| {
            let b = a.clone();
            ctx.add_outer_close_callback(move |_| b("late"));
            a("close");
        });
        tx.commit();
        assert_eq!(*log.borrow(), ["close", "late"]);
    }

    #[test]
    fn explicit_abort_matches_implicit() {
        let txns = TransactionManager::new();
        let tx = txns.open_outer().unwrap();
        tx.abort();
        assert!(!txns.is_open());
    }

    #[test]
    fn close_context_reports_closing_depth() {
        let depths = Rc::new(RefCell::new(Vec::new()));
        let txns = TransactionManager::new();
        let mut tx = txns.open_outer().unwrap();
        {
            let mut nested = tx.open_nested();
            let d = Rc::clone(&depths);
            nested.add_close_callback(move |ctx, _| d.borrow_mut().push(ctx.nesting_depth()));
            nested.commit();
        }
        let d = Rc::clone(&depths);
        tx.add_close_callback(move |ctx, _| d.borrow_mut().push(ctx.nesting_depth()));
        tx.commit();
        assert_eq!(*depths.borrow(), [1, 0]);
    }

    #[test]
    fn panicking_callback_still_runs_the_rest() {
        let (log, sink) = recorded();
        let txns = TransactionManager::new();
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut tx = txns.open_outer().unwrap();
            let a = sink.clone();
            tx.add_close_callback(move |_, _| {
                a("first");
                panic!("close 1");
            });
            let b = sink.clone();
            tx.add_close_callback(move |_, _| {
                b("second");
                panic!("close 2");
            });
            drop(tx);
        }));
        assert!(caught.is_err());
        assert_eq!(*log.borrow(), ["first", "second"]);
        // The stack is consistent afterwards.
        assert_eq!(txns.lifecycle(), Lifecycle::None);
        let tx = txns.open_outer().unwrap();
        tx.commit();
    }

    #[test]
    fn result_passed_to_callbacks_matches_outcome() {
        let results = Rc::new(RefCell::new(Vec::new()));
        let txns = TransactionManager::new();

        let mut tx = txns.open_outer().unwrap();
        let r = Rc::clone(&results);
        tx.add_close_callback(move |_, result| r.borrow_mut().push(result));
        tx.commit();

        let mut tx = txns.open_outer().unwrap();
        let r = Rc::clone(&results);
        tx.add_close_callback(move |_, result| r.borrow_mut().push(result));
        drop(tx);

        assert_eq!(
            *results.borrow(),
            [TransactionResult::Committed, TransactionResult::Aborted]
        );
    }
}
