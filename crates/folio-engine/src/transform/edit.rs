use super::{Mapping, Step, StepError, Wrapper};
use crate::model::{Fragment, Node, Slice};

/// A document being edited step by step.
///
/// Every step is applied as soon as it is added, so `doc()` is always the
/// result of the steps so far and a failing step leaves the transform as it
/// was before the call.
#[derive(Debug, Clone)]
pub struct Transform {
    docs: Vec<Node>,
    steps: Vec<Step>,
    doc: Node,
    mapping: Mapping,
}

impl Transform {
    pub fn new(doc: Node) -> Self {
        Self {
            docs: Vec::new(),
            steps: Vec::new(),
            doc,
            mapping: Mapping::new(),
        }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The document before any step was applied.
    pub fn before(&self) -> &Node {
        self.docs.first().unwrap_or(&self.doc)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Documents before each step, in step order.
    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        let doc = step.apply(&self.doc)?;
        self.mapping.push(step.get_map());
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.steps.push(step);
        Ok(self)
    }

    pub fn replace(
        &mut self,
        from: usize,
        to: usize,
        slice: Slice,
    ) -> Result<&mut Self, StepError> {
        if from == to && slice.size() == 0 {
            return Ok(self);
        }
        self.step(Step::Replace {
            from,
            to,
            slice,
            structure: false,
        })
    }

    pub fn replace_with(
        &mut self,
        from: usize,
        to: usize,
        content: Fragment,
    ) -> Result<&mut Self, StepError> {
        self.replace(from, to, Slice::new(content, 0, 0))
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, StepError> {
        self.replace(from, to, Slice::empty())
    }

    pub fn insert(&mut self, pos: usize, content: Fragment) -> Result<&mut Self, StepError> {
        self.replace_with(pos, pos, content)
    }

    /// Replace `from..to` with `text`, carrying the marks found at `from`.
    /// Empty text only deletes.
    pub fn insert_text(
        &mut self,
        text: &str,
        from: usize,
        to: usize,
    ) -> Result<&mut Self, StepError> {
        if text.is_empty() {
            return self.delete(from, to);
        }
        let marks = self.doc.resolve(from)?.marks();
        let schema = self.doc.node_type().schema();
        self.replace_with(from, to, Fragment::from_node(schema.text(text, marks)))
    }

    /// Split the node at `pos` and `depth - 1` of its ancestors in two.
    pub fn split(&mut self, pos: usize, depth: usize) -> Result<&mut Self, StepError> {
        let resolved = self.doc.resolve(pos)?;
        let mut before = Fragment::empty();
        let mut after = Fragment::empty();
        for d in (resolved.depth().saturating_sub(depth) + 1..=resolved.depth()).rev() {
            before = Fragment::from_node(resolved.node(d).copy(before));
            after = Fragment::from_node(resolved.node(d).copy(after));
        }
        self.step(Step::Replace {
            from: pos,
            to: pos,
            slice: Slice::new(before.append(&after), depth, depth),
            structure: true,
        })
    }

    /// Wrap the content of `range`, given by its start and end, in `wrappers`.
    pub fn wrap(
        &mut self,
        start: usize,
        end: usize,
        wrappers: &[Wrapper],
    ) -> Result<&mut Self, StepError> {
        let content = wrappers.iter().rev().fold(Fragment::empty(), |content, wrapper| {
            Fragment::from_node(wrapper.create(content))
        });
        self.step(Step::ReplaceAround {
            from: start,
            to: end,
            gap_from: start,
            gap_to: end,
            slice: Slice::new(content, 0, 0),
            insert: wrappers.len(),
            structure: true,
        })
    }

    /// Join the blocks around `pos` by removing `depth` boundaries on each side.
    pub fn join(&mut self, pos: usize, depth: usize) -> Result<&mut Self, StepError> {
        self.step(Step::Replace {
            from: pos - depth,
            to: pos + depth,
            slice: Slice::empty(),
            structure: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeRange;
    use crate::test_support::{doc, li, ol, p, schema};
    use crate::transform::find_wrapping;
    use pretty_assertions::assert_eq;

    fn block_range(doc: &Node, from: usize, to: usize) -> NodeRange {
        let from = doc.resolve(from).unwrap();
        let to = doc.resolve(to).unwrap();
        from.block_range(&to).unwrap()
    }

    #[test]
    fn test_wrap_then_split_makes_one_item_per_paragraph() {
        let schema = schema();
        let list = schema.node_type("ordered_list").unwrap();
        let mut tr = Transform::new(doc(&[p(&["a"]), p(&["b"])]));
        let range = block_range(tr.doc(), 1, 5);
        let wrappers = find_wrapping(&range, &list, None, &range).unwrap();

        tr.wrap(range.start(), range.end(), &wrappers).unwrap();
        assert_eq!(tr.doc(), &doc(&[ol(&[li(&[p(&["a"]), p(&["b"])])])]));

        tr.split(5, 1).unwrap();
        assert_eq!(tr.doc(), &doc(&[ol(&[li(&[p(&["a"])]), li(&[p(&["b"])])])]));
        assert_eq!(tr.steps().len(), 2);
        assert_eq!(tr.before(), &doc(&[p(&["a"]), p(&["b"])]));
    }

    #[test]
    fn test_join_merges_adjacent_lists() {
        let mut tr = Transform::new(doc(&[ol(&[li(&[p(&["a"])])]), ol(&[li(&[p(&["b"])])])]));

        tr.join(7, 1).unwrap();

        assert_eq!(tr.doc(), &doc(&[ol(&[li(&[p(&["a"])]), li(&[p(&["b"])])])]));
    }

    #[test]
    fn test_insert_text_and_mapping() {
        let mut tr = Transform::new(doc(&[p(&["ac"])]));

        tr.insert_text("b", 2, 2).unwrap();

        assert_eq!(tr.doc(), &doc(&[p(&["abc"])]));
        assert_eq!(tr.mapping().map(3, 1), 4);
    }

    #[test]
    fn test_failed_step_leaves_transform_untouched() {
        let before = doc(&[ol(&[li(&[p(&["a"])])])]);
        let mut tr = Transform::new(before.clone());

        assert!(tr.delete(2, 5).is_err());

        assert_eq!(tr.doc(), &before);
        assert!(!tr.doc_changed());
    }
}
