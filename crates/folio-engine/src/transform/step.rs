use thiserror::Error;

use super::StepMap;
use crate::model::{Node, PositionError, ReplaceError, Slice};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("structure replace would overwrite content")]
    OverwritesContent,
    #[error("structure gap-replace would overwrite content")]
    GapOverwritesContent,
    #[error("gap is not a flat range")]
    GapNotFlat,
    #[error("content does not fit in gap")]
    GapDoesNotFit,
    #[error(transparent)]
    Replace(#[from] ReplaceError),
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// An atomic document change.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `from..to` with `slice`. A `structure` step may only remove
    /// node boundaries, never content.
    Replace {
        from: usize,
        to: usize,
        slice: Slice,
        structure: bool,
    },
    /// Replace `from..to` with `slice`, keeping the content of
    /// `gap_from..gap_to` and moving it into the slice at `insert`.
    ReplaceAround {
        from: usize,
        to: usize,
        gap_from: usize,
        gap_to: usize,
        slice: Slice,
        insert: usize,
        structure: bool,
    },
}

impl Step {
    pub fn apply(&self, doc: &Node) -> Result<Node, StepError> {
        match self {
            Step::Replace {
                from,
                to,
                slice,
                structure,
            } => {
                if *structure && content_between(doc, *from, *to)? {
                    return Err(StepError::OverwritesContent);
                }
                Ok(doc.replace(*from, *to, slice)?)
            }
            Step::ReplaceAround {
                from,
                to,
                gap_from,
                gap_to,
                slice,
                insert,
                structure,
            } => {
                if *structure
                    && (content_between(doc, *from, *gap_from)?
                        || content_between(doc, *gap_to, *to)?)
                {
                    return Err(StepError::GapOverwritesContent);
                }
                let gap = doc.slice(*gap_from, *gap_to)?;
                if gap.open_start() > 0 || gap.open_end() > 0 {
                    return Err(StepError::GapNotFlat);
                }
                let inserted = slice
                    .insert_at(*insert, gap.content())
                    .ok_or(StepError::GapDoesNotFit)?;
                Ok(doc.replace(*from, *to, &inserted)?)
            }
        }
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, slice, .. } => {
                StepMap::new(&[(*from, to - from, slice.size())])
            }
            Step::ReplaceAround {
                from,
                to,
                gap_from,
                gap_to,
                slice,
                insert,
                ..
            } => StepMap::new(&[
                (*from, gap_from - from, *insert),
                (*gap_to, to - gap_to, slice.size() - insert),
            ]),
        }
    }
}

/// Whether `from..to` holds anything besides closing and opening node boundaries.
fn content_between(doc: &Node, from: usize, to: usize) -> Result<bool, PositionError> {
    let from_pos = doc.resolve(from)?;
    let mut dist = to.saturating_sub(from);
    let mut depth = from_pos.depth();
    while dist > 0
        && depth > 0
        && from_pos.index_after(depth) == from_pos.node(depth).child_count()
    {
        depth -= 1;
        dist -= 1;
    }
    if dist > 0 {
        let mut next = from_pos.node(depth).maybe_child(from_pos.index_after(depth)).cloned();
        while dist > 0 {
            match next {
                Some(node) if !node.is_leaf() => {
                    next = node.first_child().cloned();
                    dist -= 1;
                }
                _ => return Ok(true),
            }
        }
    }
    Ok(false)
}
