//! Parent-pointer hierarchy built once per generation pass.
//!
//! Records are loaded into an index arena: each node knows its parent index
//! (when the parent is part of the set) and its children in input order.
//! From the arena we derive
//! - the pre-order traversal (parent first, siblings in input order),
//! - the depth of every reachable node,
//! - the leaf span of every project (see [`span`]).
//!
//! Records whose parent chain loops back on itself are never reachable from a
//! root. They are collected as detached and left out of the traversal.

pub mod span;

pub use span::SpanTable;

use crate::types::{Record, TaskKind};
use std::collections::HashMap;
use tracing::warn;

/// Index arena over one pass worth of records.
#[derive(Debug)]
pub struct Hierarchy<'a> {
    records: &'a [Record],
    index: HashMap<&'a str, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    /// Pre-order traversal of every node reachable from a root.
    order: Vec<usize>,
    /// Depth of reachable nodes, `None` for detached ones.
    depth: Vec<Option<u32>>,
    detached: Vec<usize>,
}

impl<'a> Hierarchy<'a> {
    /// Build the arena, resolve parents, and walk the forest.
    pub fn build(records: &'a [Record]) -> Self {
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(records.len());
        let mut duplicate = vec![false; records.len()];
        for (i, record) in records.iter().enumerate() {
            if index.contains_key(record.id.as_str()) {
                warn!(record_id = %record.id, "Duplicate record id ignored");
                duplicate[i] = true;
            } else {
                index.insert(record.id.as_str(), i);
            }
        }

        let mut parent = vec![None; records.len()];
        let mut children = vec![Vec::new(); records.len()];
        let mut roots = Vec::new();
        for (i, record) in records.iter().enumerate() {
            if duplicate[i] {
                continue;
            }
            match record.parent.as_deref().and_then(|p| index.get(p).copied()) {
                Some(p) => {
                    parent[i] = Some(p);
                    children[p].push(i);
                }
                None => roots.push(i),
            }
        }

        let mut hierarchy = Self {
            records,
            index,
            parent,
            children,
            order: Vec::with_capacity(records.len()),
            depth: vec![None; records.len()],
            detached: Vec::new(),
        };
        hierarchy.walk(&roots);

        for (i, record) in records.iter().enumerate() {
            if !duplicate[i] && hierarchy.depth[i].is_none() {
                warn!(
                    record_id = %record.id,
                    parent = ?record.parent,
                    "Record is part of a parent cycle; omitted"
                );
                hierarchy.detached.push(i);
            }
        }

        hierarchy
    }

    /// Depth-first pre-order walk with an explicit stack.
    fn walk(&mut self, roots: &[usize]) {
        let mut visited = vec![false; self.records.len()];
        let mut stack: Vec<(usize, u32)> = roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((node, level)) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            self.depth[node] = Some(level);
            self.order.push(node);
            for &child in self.children[node].iter().rev() {
                if !visited[child] {
                    stack.push((child, level + 1));
                }
            }
        }
    }

    pub fn records(&self) -> &'a [Record] {
        self.records
    }

    /// Number of nodes in the traversal.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Arena indices in pre-order.
    pub fn preorder(&self) -> &[usize] {
        &self.order
    }

    /// Record ids in pre-order.
    pub fn preorder_ids(&self) -> Vec<&'a str> {
        self.order
            .iter()
            .map(|&i| self.records[i].id.as_str())
            .collect()
    }

    /// Ids of records excluded because their parent chain loops.
    pub fn detached_ids(&self) -> Vec<&'a str> {
        self.detached
            .iter()
            .map(|&i| self.records[i].id.as_str())
            .collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn record(&self, node: usize) -> &'a Record {
        &self.records[node]
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parent[node]
    }

    pub fn children(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    pub fn has_children(&self, node: usize) -> bool {
        !self.children[node].is_empty()
    }

    pub fn kind(&self, node: usize) -> TaskKind {
        if self.has_children(node) {
            TaskKind::Project
        } else {
            TaskKind::Leaf
        }
    }

    /// Number of parent hops to a root. `None` for detached nodes.
    pub fn depth(&self, node: usize) -> Option<u32> {
        self.depth[node]
    }

    /// Depth by record id.
    pub fn depth_of(&self, id: &str) -> Option<u32> {
        self.position(id).and_then(|i| self.depth(i))
    }

    /// Compute the leaf span of every reachable project.
    pub fn spans(&self) -> SpanTable {
        SpanTable::compute(self)
    }
}

/// Order record ids so every parent immediately precedes its subtree.
pub fn sort_records(records: &[Record]) -> Vec<String> {
    Hierarchy::build(records)
        .preorder_ids()
        .into_iter()
        .map(str::to_string)
        .collect()
}
