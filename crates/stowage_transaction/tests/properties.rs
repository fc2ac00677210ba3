//! Property tests for nesting safety.

use proptest::prelude::*;
use stowage_transaction::{Transaction, TransactionManager, TransactionalValue};

/// One step of a randomly generated transactional program.
#[derive(Debug, Clone)]
enum Op {
    Set(i32),
    Nested { ops: Vec<Op>, commit: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let leaf = any::<i32>().prop_map(Op::Set);
    leaf.prop_recursive(4, 32, 5, |inner| {
        (prop::collection::vec(inner, 0..5), any::<bool>())
            .prop_map(|(ops, commit)| Op::Nested { ops, commit })
    })
}

/// Applies the program to the real value and to a shadow interpreter that
/// models "only committed operations apply".
fn run(ops: &[Op], value: &TransactionalValue<i32>, tx: &mut Transaction<'_>, shadow: &mut i32) {
    for op in ops {
        match op {
            Op::Set(v) => {
                value.set(*v, tx);
                *shadow = *v;
            }
            Op::Nested { ops, commit } => {
                let saved = *shadow;
                let mut nested = tx.open_nested();
                run(ops, value, &mut nested, shadow);
                if *commit {
                    nested.commit();
                } else {
                    nested.abort();
                    *shadow = saved;
                }
            }
        }
    }
}

proptest! {
    /// For any nesting of sets, commits, and aborts, the observed value
    /// after the outermost close equals the result of applying only the
    /// committed operations.
    #[test]
    fn nesting_preserves_committed_operations_only(
        ops in prop::collection::vec(op_strategy(), 0..6),
        outer_commit in any::<bool>(),
    ) {
        let txns = TransactionManager::new();
        let initial = -1;
        let value = TransactionalValue::new(initial);
        let mut shadow = initial;

        let mut tx = txns.open_outer().unwrap();
        run(&ops, &value, &mut tx, &mut shadow);
        if outer_commit {
            tx.commit();
        } else {
            tx.abort();
            shadow = initial;
        }

        prop_assert_eq!(value.get(), shadow);
        prop_assert!(!txns.is_open());
    }
}
