//! Placement of operations into moments.
//!
//! All strategies share one cursor `k`: the position operations are inserted
//! at. After an operation lands in moment `p` the cursor moves to
//! `max(k, p + 1)`, so later operations of a batch never move before earlier
//! ones that they depend on.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{IrError, IrResult};
use crate::moment::Moment;
use crate::operation::Operation;

/// How [`insert`](crate::Circuit::insert) places operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InsertStrategy {
    /// Scan back from the cursor and place each operation in the earliest
    /// moment reachable without crossing one that touches its qubits.
    #[default]
    Earliest,
    /// Every operation gets a fresh moment at the cursor.
    New,
    /// Use the moment just before the cursor, or a fresh one on conflict.
    Inline,
    /// A fresh moment for the first operation, then [`InsertStrategy::Inline`].
    NewThenInline,
}

/// A possibly nested, possibly lazy sequence of operations and moments.
pub enum OpTree {
    /// A single operation.
    Op(Operation),
    /// A whole moment, inserted as-is at the cursor.
    Moment(Moment),
    /// An ordered sequence of subtrees.
    Seq(Vec<OpTree>),
    /// A lazily produced sequence of subtrees.
    Lazy(Box<dyn Iterator<Item = OpTree>>),
}

impl OpTree {
    /// Wrap an iterator that is only pulled during insertion.
    pub fn lazy<I>(iter: I) -> Self
    where
        I: IntoIterator + 'static,
        I::Item: Into<OpTree>,
        I::IntoIter: 'static,
    {
        OpTree::Lazy(Box::new(iter.into_iter().map(Into::into)))
    }

    /// Flatten depth-first into operations and moments.
    pub fn into_items(self) -> OpTreeIter {
        OpTreeIter {
            stack: vec![Box::new(std::iter::once(self))],
        }
    }
}

impl std::fmt::Debug for OpTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpTree::Op(op) => f.debug_tuple("Op").field(op).finish(),
            OpTree::Moment(m) => f.debug_tuple("Moment").field(m).finish(),
            OpTree::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            OpTree::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<Operation> for OpTree {
    fn from(op: Operation) -> Self {
        OpTree::Op(op)
    }
}

impl From<Moment> for OpTree {
    fn from(moment: Moment) -> Self {
        OpTree::Moment(moment)
    }
}

impl<T: Into<OpTree>> From<Vec<T>> for OpTree {
    fn from(items: Vec<T>) -> Self {
        OpTree::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<OpTree>, const N: usize> From<[T; N]> for OpTree {
    fn from(items: [T; N]) -> Self {
        OpTree::Seq(items.into_iter().map(Into::into).collect())
    }
}

/// A leaf of an [`OpTree`].
#[derive(Debug)]
pub enum OpItem {
    /// An operation to place.
    Op(Operation),
    /// A moment to insert whole.
    Moment(Moment),
}

/// Depth-first pull iterator over an [`OpTree`].
pub struct OpTreeIter {
    stack: Vec<Box<dyn Iterator<Item = OpTree>>>,
}

impl Iterator for OpTreeIter {
    type Item = OpItem;

    fn next(&mut self) -> Option<OpItem> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(OpTree::Op(op)) => return Some(OpItem::Op(op)),
                Some(OpTree::Moment(m)) => return Some(OpItem::Moment(m)),
                Some(OpTree::Seq(items)) => self.stack.push(Box::new(items.into_iter())),
                Some(OpTree::Lazy(iter)) => self.stack.push(iter),
            }
        }
    }
}

/// Insert `tree` into `moments` at `index`, returning the final cursor.
///
/// `index` may be any position up to and including `moments.len()`.
pub(crate) fn insert_into(
    moments: &mut Vec<Moment>,
    index: usize,
    tree: OpTree,
    strategy: InsertStrategy,
) -> IrResult<usize> {
    if index > moments.len() {
        return Err(IrError::MomentIndexOutOfRange {
            index,
            len: moments.len(),
        });
    }
    debug!(index, ?strategy, moments = moments.len(), "inserting operations");

    let mut k = index;
    let mut strategy = strategy;
    for item in tree.into_items() {
        match item {
            OpItem::Moment(moment) => {
                moments.insert(k, moment);
                k += 1;
            }
            OpItem::Op(op) => {
                let p = pick_or_create(moments, k, &op, strategy);
                while p >= moments.len() {
                    moments.push(Moment::new());
                }
                trace!(op = %op, moment = p, "placed operation");
                moments[p].push(op)?;
                k = k.max(p + 1);
                if strategy == InsertStrategy::NewThenInline {
                    strategy = InsertStrategy::Inline;
                }
            }
        }
    }
    Ok(k)
}

fn pick_or_create(
    moments: &mut Vec<Moment>,
    k: usize,
    op: &Operation,
    strategy: InsertStrategy,
) -> usize {
    match strategy {
        InsertStrategy::New | InsertStrategy::NewThenInline => {
            moments.insert(k, Moment::new());
            k
        }
        InsertStrategy::Inline => {
            if k > 0 && k <= moments.len() && can_add_at(moments, k - 1, op) {
                return k - 1;
            }
            pick_or_create(moments, k, op, InsertStrategy::New)
        }
        InsertStrategy::Earliest => {
            if can_add_at(moments, k, op) {
                return prev_moment_available(moments, k, op);
            }
            pick_or_create(moments, k, op, InsertStrategy::Inline)
        }
    }
}

fn can_add_at(moments: &[Moment], index: usize, op: &Operation) -> bool {
    match moments.get(index) {
        Some(moment) => !moment.operates_on(op.qubits()),
        None => true,
    }
}

/// Earliest moment at or before `end` that `op` can join without crossing a
/// moment that touches its qubits or its classical keys.
///
/// Key conflicts are tested stream by stream, so a call is never expanded
/// into its repetitions here.
fn prev_moment_available(moments: &[Moment], end: usize, op: &Operation) -> usize {
    let op_controls = op.control_keys();
    let mut last_available = end;
    for k in (0..end).rev() {
        let moment = &moments[k];
        if moment.operates_on(op.qubits()) {
            break;
        }
        if op_controls.iter().any(|key| moment.measures_stream(key))
            || moment.control_keys().iter().any(|key| op.measures_stream(key))
        {
            break;
        }
        last_available = k;
    }
    last_available
}
