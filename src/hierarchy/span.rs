//! Leaf-span aggregation.
//!
//! A project's schedule is the earliest start and latest end over its leaf
//! descendants. Nested projects never contribute a stored schedule of their
//! own; their computed span is merged upward instead, so every span bottoms
//! out at true leaves.

use super::Hierarchy;
use crate::schedule::Span;

/// Memoized span per arena node.
#[derive(Debug, Clone)]
pub struct SpanTable {
    spans: Vec<Option<Span>>,
}

impl SpanTable {
    /// One bottom-up pass: reverse pre-order visits children before parents.
    pub fn compute(hierarchy: &Hierarchy<'_>) -> Self {
        let mut spans: Vec<Option<Span>> = vec![None; hierarchy.records().len()];

        for &node in hierarchy.preorder().iter().rev() {
            let span = if hierarchy.has_children(node) {
                hierarchy
                    .children(node)
                    .iter()
                    .fold(None, |acc, &child| Span::merge_opt(acc, spans[child]))
            } else {
                let record = hierarchy.record(node);
                Span::from_text(record.start.as_deref(), record.end.as_deref())
            };
            spans[node] = span;
        }

        Self { spans }
    }

    /// Span of a node. For a project, `None` means no leaf descendant has a
    /// usable schedule.
    pub fn get(&self, node: usize) -> Option<Span> {
        self.spans.get(node).copied().flatten()
    }
}

impl Hierarchy<'_> {
    /// Leaf span of the project with the given id.
    pub fn leaf_span_of(&self, id: &str) -> Option<Span> {
        let node = self.position(id)?;
        self.spans().get(node)
    }
}
