use crate::model::Node;
use crate::transform::Mapping;

/// A text selection between two positions inside textblocks. `anchor` stays
/// put while `head` moves with the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub anchor: usize,
    pub head: usize,
}

impl TextSelection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Cursor at the start of the first textblock, or at 0 for a document
    /// without one.
    pub fn at_start(doc: &Node) -> Self {
        Self::cursor(textblock_spans(doc).first().map_or(0, |&(start, _)| start))
    }

    /// The valid text position closest to `pos`, preferring later positions on a tie.
    pub fn near(doc: &Node, pos: usize) -> usize {
        textblock_spans(doc)
            .into_iter()
            .map(|(start, end)| pos.clamp(start, end))
            .min_by_key(|candidate| (candidate.abs_diff(pos), usize::MAX - candidate))
            .unwrap_or(0)
    }

    /// Carry the selection across `mapping` into `doc`, the document it produced.
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> Self {
        let head = Self::near(doc, mapping.map(self.head, 1));
        let anchor = if self.is_empty() {
            head
        } else {
            Self::near(doc, mapping.map(self.anchor, 1))
        };
        Self::new(anchor, head)
    }
}

/// Content spans `(start, end)` of every textblock in document order.
fn textblock_spans(doc: &Node) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    doc.descendants(&mut |node: &Node, pos: usize, _parent: Option<&Node>, _index: usize| {
        if node.is_textblock() {
            spans.push((pos + 1, pos + 1 + node.content_size()));
            return false;
        }
        true
    });
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{doc, li, ol, p};
    use crate::transform::StepMap;

    #[test]
    fn test_at_start_finds_first_textblock() {
        let document = doc(&[ol(&[li(&[p(&["a"])])]), p(&["b"])]);
        assert_eq!(TextSelection::at_start(&document), TextSelection::cursor(3));
    }

    #[test]
    fn test_near_snaps_out_of_block_boundaries() {
        let document = doc(&[p(&["ab"]), p(&["cd"])]);
        // 4 sits between the paragraphs; the closest text positions are 3 and 5.
        assert_eq!(TextSelection::near(&document, 4), 5);
        assert_eq!(TextSelection::near(&document, 0), 1);
        assert_eq!(TextSelection::near(&document, 2), 2);
    }

    #[test]
    fn test_map_follows_inserted_wrappers() {
        let document = doc(&[ol(&[li(&[p(&["a"])])])]);
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(&[(0, 0, 2), (3, 0, 2)]));

        let mapped = TextSelection::cursor(1).map(&document, &mapping);

        assert_eq!(mapped, TextSelection::cursor(3));
    }
}
