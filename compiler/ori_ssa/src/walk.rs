//! Pre-order traversal over a function's operations.

use crate::function::Function;
use crate::ids::{OpId, RegionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    Start,
    After(OpId),
    Done,
}

/// Lazy, non-restartable pre-order cursor.
///
/// Visits every operation in document order, descending into an
/// operation's regions (in order) right after visiting the operation.
///
/// The walker holds no borrow of the function: each [`next`](Self::next)
/// call takes it afresh, and the successor of the last visited operation is
/// computed only then. Between steps the caller may therefore insert
/// operations before the last visited one (they are not visited) or mutate
/// use-lists. Erasing any operation during the walk is not supported.
#[derive(Clone, Debug)]
pub struct Walker {
    root: RegionId,
    cursor: Cursor,
}

impl Walker {
    pub fn new(func: &Function) -> Self {
        Walker {
            root: func.body(),
            cursor: Cursor::Start,
        }
    }

    /// Advance to the next operation, or `None` once the walk is finished.
    pub fn next(&mut self, func: &Function) -> Option<OpId> {
        let next = match self.cursor {
            Cursor::Start => first_op_in_regions(func, &[self.root]),
            Cursor::After(op) => successor(func, op),
            Cursor::Done => None,
        };
        self.cursor = next.map_or(Cursor::Done, Cursor::After);
        next
    }
}

/// First operation of the first non-empty block among `regions`.
fn first_op_in_regions(func: &Function, regions: &[RegionId]) -> Option<OpId> {
    regions
        .iter()
        .flat_map(|&r| func.region(r).blocks().iter())
        .find_map(|&b| func.block(b).first_op())
}

fn successor(func: &Function, op: OpId) -> Option<OpId> {
    if let Some(inner) = first_op_in_regions(func, func.op(op).regions()) {
        return Some(inner);
    }

    let mut current = op;
    loop {
        let node = func.op(current);
        if let Some(next) = node.next {
            return Some(next);
        }

        // Later blocks of the same region.
        let block = node.parent_block()?;
        let region_id = func.block(block).parent_region();
        let region = func.region(region_id);
        let pos = region.blocks().iter().position(|&b| b == block)?;
        if let Some(first) = region.blocks()[pos + 1..]
            .iter()
            .find_map(|&b| func.block(b).first_op())
        {
            return Some(first);
        }

        // Later regions of the owning operation, then climb out of it.
        let parent = region.parent_op()?;
        let regions = func.op(parent).regions();
        let rpos = regions.iter().position(|&r| r == region_id)?;
        if let Some(first) = first_op_in_regions(func, &regions[rpos + 1..]) {
            return Some(first);
        }
        current = parent;
    }
}
