//! Policy tree materialization.
//!
//! Walks the solved table from the root state (i=0, j=N, p=1) and emits an
//! explicit binary decision tree: each node carries the price to quote, and
//! its `accept` / `reject` children are the sub-policies after the buyer's
//! answer. Leaves sit at j = 0.
//!
//! The walk uses an explicit work stack instead of call recursion, so its
//! depth is bounded by heap, not by the thread's stack.

use serde::{Deserialize, Serialize};

use crate::types::SolvedTable;

/// Buyer's answer to a quoted price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Accept,
    Reject,
}

/// One decision node. Children are absent exactly at leaves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Price quoted at this node.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub accept: Option<Box<Policy>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reject: Option<Box<Policy>>,
}

impl Policy {
    pub fn leaf(value: f64) -> Self {
        Self {
            value,
            accept: None,
            reject: None,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.accept.is_none() && self.reject.is_none()
    }

    /// Child reached after `outcome`, if any.
    #[inline]
    pub fn child(&self, outcome: Outcome) -> Option<&Policy> {
        match outcome {
            Outcome::Accept => self.accept.as_deref(),
            Outcome::Reject => self.reject.as_deref(),
        }
    }

    /// Node reached by following `path` from here.
    pub fn follow(&self, path: &[Outcome]) -> Option<&Policy> {
        path.iter().try_fold(self, |node, &outcome| node.child(outcome))
    }

    /// Prices quoted at each node along `path`, including the node the path
    /// ends on. `None` if the path runs past a leaf.
    pub fn quoted_prices_along(&self, path: &[Outcome]) -> Option<Vec<f64>> {
        let mut prices = Vec::with_capacity(path.len() + 1);
        let mut node = self;
        prices.push(node.value);
        for &outcome in path {
            node = node.child(outcome)?;
            prices.push(node.value);
        }
        Some(prices)
    }

    /// Longest root-to-leaf edge count.
    pub fn depth(&self) -> usize {
        self.depth_range().1
    }

    /// Shortest and longest root-to-leaf edge counts.
    pub fn depth_range(&self) -> (usize, usize) {
        let mut min_depth = usize::MAX;
        let mut max_depth = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if node.is_leaf() {
                min_depth = min_depth.min(depth);
                max_depth = max_depth.max(depth);
                continue;
            }
            for child in [node.accept.as_deref(), node.reject.as_deref()]
                .into_iter()
                .flatten()
            {
                stack.push((child, depth + 1));
            }
        }
        (min_depth, max_depth)
    }

    pub fn leaf_count(&self) -> usize {
        self.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order traversal (node, accept subtree, reject subtree).
    pub fn iter(&self) -> PolicyIter<'_> {
        PolicyIter { stack: vec![self] }
    }
}

pub struct PolicyIter<'a> {
    stack: Vec<&'a Policy>,
}

impl<'a> Iterator for PolicyIter<'a> {
    type Item = &'a Policy;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(reject) = node.reject.as_deref() {
            self.stack.push(reject);
        }
        if let Some(accept) = node.accept.as_deref() {
            self.stack.push(accept);
        }
        Some(node)
    }
}

enum Task {
    Expand { i: usize, j: usize, p: f64 },
    /// Pop reject then accept off the output stack and join them under `price`.
    Assemble { price: f64 },
}

/// Materialize the optimal policy from the solved table.
///
/// Accept moves to (i+1, j−1, p − price); reject to (i, j−1, p).
pub fn build_policy(table: &SolvedTable) -> Policy {
    let mut tasks = vec![Task::Expand {
        i: 0,
        j: table.n(),
        p: 1.0,
    }];
    let mut built: Vec<Policy> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Expand { i, j, p } => {
                let best = table.read_best_price(i, j, p);
                if j >= 1 {
                    tasks.push(Task::Assemble { price: best });
                    tasks.push(Task::Expand { i, j: j - 1, p });
                    tasks.push(Task::Expand {
                        i: i + 1,
                        j: j - 1,
                        p: p - best,
                    });
                } else {
                    built.push(Policy::leaf(best));
                }
            }
            Task::Assemble { price } => {
                let reject = built.pop().map(Box::new);
                let accept = built.pop().map(Box::new);
                built.push(Policy {
                    value: price,
                    accept,
                    reject,
                });
            }
        }
    }

    debug_assert_eq!(built.len(), 1);
    built.pop().unwrap_or_else(|| Policy::leaf(0.0))
}
