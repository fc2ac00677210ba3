//! Snapshot participants: the join point between mutable state and the
//! transaction engine.
//!
//! A [`SnapshotParticipant`] owns one mutable value and, per transaction
//! depth at which that value was first modified, one saved snapshot of it.
//! Aborting a depth restores the snapshot recorded when the participant
//! first registered there; committing a nested depth hands the snapshot one
//! level up, so the change becomes the enclosing transaction's
//! responsibility.

use crate::lifecycle::TransactionResult;
use crate::transaction::{CloseContext, Transaction};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Snapshot and restore behavior for a transactional state type.
///
/// `create_snapshot` must produce an independent copy: if the snapshot
/// aliases mutable internals of the live value, rolling back would corrupt
/// the snapshot along with the state it is meant to restore.
pub trait Snapshottable: 'static {
    /// An independent copy of the state, installed again on abort.
    type Snapshot: 'static;

    /// Produces an independent copy of the current state.
    fn create_snapshot(&self) -> Self::Snapshot;

    /// Installs a previously taken snapshot as the current state. Called
    /// only while aborting a transaction depth.
    fn read_snapshot(&mut self, snapshot: Self::Snapshot);
}

/// Internal notification contract between the engine and participants.
pub(crate) trait Participant {
    fn on_close(self: Rc<Self>, ctx: &mut CloseContext<'_>, result: TransactionResult);
}

struct ParticipantCell<S: Snapshottable> {
    state: S,
    /// One slot per transaction depth; `Some` means this participant is
    /// registered at that depth and holds the pre-entry value for it.
    snapshots: Vec<Option<S::Snapshot>>,
}

pub(crate) struct ParticipantInner<S: Snapshottable> {
    cell: RefCell<ParticipantCell<S>>,
    /// Fires once per change that survives to the outermost commit. Kept
    /// outside `cell` so the hook may freely read the state back.
    on_final_commit: RefCell<Option<Box<dyn FnMut()>>>,
}

/// A shared handle to transactional state.
///
/// Cloning the handle shares the underlying state; all clones observe the
/// same value and the same snapshot chain. Handles are single-threaded.
///
/// Mutations go through [`with_mut`](SnapshotParticipant::with_mut), which
/// snapshots the state on the first touch at the current transaction depth
/// before applying the change — so every mutation is transaction-safe
/// without the caller managing snapshots manually. Repeated mutation at the
/// same depth does not re-snapshot.
pub struct SnapshotParticipant<S: Snapshottable> {
    inner: Rc<ParticipantInner<S>>,
}

impl<S: Snapshottable> Clone for SnapshotParticipant<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Snapshottable> SnapshotParticipant<S> {
    /// Creates a participant around a starting state.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            inner: Rc::new(ParticipantInner {
                cell: RefCell::new(ParticipantCell {
                    state,
                    snapshots: Vec::new(),
                }),
                on_final_commit: RefCell::new(None),
            }),
        }
    }

    /// Creates a participant with a final-commit hook.
    ///
    /// The hook runs once per externally visible change, only when the
    /// change survives all the way to the outermost commit — the intended
    /// place for "mark dirty" style side effects, which must not fire for
    /// partial or aborted changes.
    #[must_use]
    pub fn with_on_final_commit(state: S, hook: impl FnMut() + 'static) -> Self {
        let participant = Self::new(state);
        *participant.inner.on_final_commit.borrow_mut() = Some(Box::new(hook));
        participant
    }

    /// Installs (or replaces) the final-commit hook.
    ///
    /// Useful when the hook needs to capture a clone of this participant's
    /// own handle, which cannot exist yet at construction time. The hook may
    /// read the participant's state back; it runs outside the state borrow.
    pub fn set_on_final_commit(&self, hook: impl FnMut() + 'static) {
        *self.inner.on_final_commit.borrow_mut() = Some(Box::new(hook));
    }

    /// Reads the current state.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.cell.borrow().state)
    }

    /// Mutates the state inside a transaction, snapshotting first.
    pub fn with_mut<R>(&self, transaction: &mut Transaction<'_>, f: impl FnOnce(&mut S) -> R) -> R {
        self.update_snapshots(transaction);
        f(&mut self.inner.cell.borrow_mut().state)
    }

    /// Mutates the state outside any transaction, without snapshotting.
    ///
    /// Intended for construction-time initialization and host load paths;
    /// changes made this way are not covered by any rollback.
    pub fn with_mut_untracked<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.cell.borrow_mut().state)
    }

    /// Ensures a snapshot is recorded for the given transaction's depth,
    /// registering this participant with it on the first touch.
    pub fn update_snapshots(&self, transaction: &mut Transaction<'_>) {
        let depth = transaction.nesting_depth();
        let mut cell = self.inner.cell.borrow_mut();
        if cell.snapshots.len() <= depth {
            cell.snapshots.resize_with(depth + 1, || None);
        }
        if cell.snapshots[depth].is_none() {
            let snapshot = cell.state.create_snapshot();
            cell.snapshots[depth] = Some(snapshot);
            drop(cell);
            trace!(depth, "participant snapshot recorded");
            transaction.register_participant(Rc::clone(&self.inner) as Rc<dyn Participant>);
        }
    }
}

impl<S: Snapshottable> Participant for ParticipantInner<S> {
    fn on_close(self: Rc<Self>, ctx: &mut CloseContext<'_>, result: TransactionResult) {
        let depth = ctx.nesting_depth();
        let snapshot = {
            let mut cell = self.cell.borrow_mut();
            match cell.snapshots.get_mut(depth).and_then(Option::take) {
                Some(snapshot) => snapshot,
                None => return,
            }
        };

        match result {
            TransactionResult::Aborted => {
                self.cell.borrow_mut().state.read_snapshot(snapshot);
            }
            TransactionResult::Committed if depth > 0 => {
                let mut cell = self.cell.borrow_mut();
                if cell.snapshots[depth - 1].is_none() {
                    // First registration at the parent depth: the pre-entry
                    // value moves up with the responsibility for it.
                    cell.snapshots[depth - 1] = Some(snapshot);
                    drop(cell);
                    ctx.register_participant_with_parent(self);
                }
                // Otherwise the parent depth already holds an older
                // snapshot; this one is simply discarded.
            }
            TransactionResult::Committed => {
                // Outermost commit: the change is now permanent. Queue the
                // final-commit hook behind any earlier outer-close work.
                let inner = self;
                ctx.add_outer_close_callback(move |_| {
                    if let Some(hook) = inner.on_final_commit.borrow_mut().as_mut() {
                        hook();
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::TransactionManager;

    struct Counter(u32);

    impl Snapshottable for Counter {
        type Snapshot = u32;

        fn create_snapshot(&self) -> u32 {
            self.0
        }

        fn read_snapshot(&mut self, snapshot: u32) {
            self.0 = snapshot;
        }
    }

    #[test]
    fn abort_restores_first_touch_snapshot() {
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::new(Counter(1));

        let mut tx = txns.open_outer().unwrap();
        counter.with_mut(&mut tx, |c| c.0 = 2);
        counter.with_mut(&mut tx, |c| c.0 = 3);
        drop(tx);

        assert_eq!(counter.with(|c| c.0), 1);
    }

    #[test]
    fn commit_keeps_the_change() {
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::new(Counter(1));

        let mut tx = txns.open_outer().unwrap();
        counter.with_mut(&mut tx, |c| c.0 = 2);
        tx.commit();

        assert_eq!(counter.with(|c| c.0), 2);
    }

    #[test]
    fn nested_commit_inside_aborted_outer_reverts() {
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::new(Counter(1));

        let mut tx = txns.open_outer().unwrap();
        {
            let mut nested = tx.open_nested();
            counter.with_mut(&mut nested, |c| c.0 = 2);
            nested.commit();
        }
        assert_eq!(counter.with(|c| c.0), 2);
        drop(tx);

        assert_eq!(counter.with(|c| c.0), 1);
    }

    #[test]
    fn untracked_mutation_is_not_rolled_back() {
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::new(Counter(1));

        let tx = txns.open_outer().unwrap();
        counter.with_mut_untracked(|c| c.0 = 9);
        drop(tx);

        assert_eq!(counter.with(|c| c.0), 9);
    }

    #[test]
    fn final_commit_hook_fires_once_on_outer_commit_only() {
        let fired = Rc::new(RefCell::new(0));
        let hook = {
            let fired = Rc::clone(&fired);
            move || *fired.borrow_mut() += 1
        };
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::with_on_final_commit(Counter(0), hook);

        // Aborted change: no notification.
        let mut tx = txns.open_outer().unwrap();
        counter.with_mut(&mut tx, |c| c.0 = 1);
        drop(tx);
        assert_eq!(*fired.borrow(), 0);

        // Committed change, touched at two depths: exactly one notification.
        let mut tx = txns.open_outer().unwrap();
        counter.with_mut(&mut tx, |c| c.0 = 2);
        {
            let mut nested = tx.open_nested();
            counter.with_mut(&mut nested, |c| c.0 = 3);
            nested.commit();
        }
        tx.commit();
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn hook_may_read_its_own_participant_back() {
        let seen = Rc::new(RefCell::new(None));
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::new(Counter(0));
        counter.set_on_final_commit({
            let seen = Rc::clone(&seen);
            let observer = counter.clone();
            move || *seen.borrow_mut() = Some(observer.with(|c| c.0))
        });

        let mut tx = txns.open_outer().unwrap();
        counter.with_mut(&mut tx, |c| c.0 = 7);
        tx.commit();

        assert_eq!(*seen.borrow(), Some(7));
    }

    #[test]
    fn clones_share_state_and_snapshots() {
        let txns = TransactionManager::new();
        let counter = SnapshotParticipant::new(Counter(1));
        let alias = counter.clone();

        let mut tx = txns.open_outer().unwrap();
        counter.with_mut(&mut tx, |c| c.0 = 2);
        alias.with_mut(&mut tx, |c| c.0 = 3);
        drop(tx);

        assert_eq!(counter.with(|c| c.0), 1);
        assert_eq!(alias.with(|c| c.0), 1);
    }
}
