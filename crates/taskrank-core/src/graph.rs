//! Dependency graph analysis.
//!
//! Builds a visualization-ready node/edge view of a task batch and finds
//! circular dependencies. Edges point from a task to each id it depends on.
//! Dependencies on ids outside the batch still produce edges, but such ids
//! have no outgoing edges of their own and can never close a cycle.
//!
//! Two results are reported for cycles:
//! - `cycle`: the first loop met by a depth-first walk (roots in input order,
//!   neighbours in declaration order), closed by repeating its first id
//! - `circular_nodes`: every id on *any* cycle, i.e. members of a strongly
//!   connected component with more than one node, plus self-loops
//!
//! The cycle walk keeps its own stack, so deep chains do not grow the call
//! stack; both passes are linear in nodes plus edges.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Characters of the title kept in a node label.
const LABEL_TITLE_CHARS: usize = 20;

/// One node per task in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: i64,
    pub title: String,
    /// Short display label: `"<id>: <title prefix>"`
    pub label: String,
}

/// Directed edge from a task to one of its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: i64,
    pub to: i64,
}

/// Node/edge structure plus cycle information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Ids on at least one cycle, ascending
    pub circular_nodes: Vec<i64>,
    /// Example cycle; empty when the graph is acyclic
    pub cycle: Vec<i64>,
}

impl DependencyGraph {
    pub fn has_circular(&self) -> bool {
        !self.cycle.is_empty()
    }

    pub fn is_circular(&self, id: i64) -> bool {
        self.circular_nodes.binary_search(&id).is_ok()
    }
}

/// Build the dependency graph for a batch.
pub fn analyze(tasks: &[Task]) -> DependencyGraph {
    let nodes = tasks
        .iter()
        .map(|task| GraphNode {
            id: task.id,
            title: task.title.clone(),
            label: node_label(task),
        })
        .collect();

    let mut edges = Vec::new();
    for task in tasks {
        let mut seen = HashSet::new();
        for &dep in &task.dependencies {
            if seen.insert(dep) {
                edges.push(GraphEdge {
                    from: task.id,
                    to: dep,
                });
            }
        }
    }

    let adjacency = Adjacency::from_tasks(tasks);
    DependencyGraph {
        nodes,
        edges,
        circular_nodes: adjacency.circular_nodes(),
        cycle: adjacency.first_cycle().unwrap_or_default(),
    }
}

/// Find the first cycle in the batch, if any.
///
/// Returns the ids along the loop with the starting id repeated at the end,
/// e.g. `[1, 2, 1]`.
pub fn detect_cycle(tasks: &[Task]) -> Option<Vec<i64>> {
    Adjacency::from_tasks(tasks).first_cycle()
}

fn node_label(task: &Task) -> String {
    let prefix: String = task.title.chars().take(LABEL_TITLE_CHARS).collect();
    format!("{}: {}", task.id, prefix)
}

/// In-batch adjacency lists, keyed by task position.
struct Adjacency {
    ids: Vec<i64>,
    out: Vec<Vec<usize>>,
}

impl Adjacency {
    fn from_tasks(tasks: &[Task]) -> Self {
        let index: HashMap<i64, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (task.id, i))
            .collect();

        let out = tasks
            .iter()
            .map(|task| {
                let mut seen = HashSet::new();
                task.dependencies
                    .iter()
                    .filter_map(|dep| index.get(dep).copied())
                    .filter(|i| seen.insert(*i))
                    .collect()
            })
            .collect();

        Self {
            ids: tasks.iter().map(|t| t.id).collect(),
            out,
        }
    }

    /// Depth-first search with an explicit stack of `(node, next edge)` frames.
    fn first_cycle(&self) -> Option<Vec<i64>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.ids.len()];
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.ids.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::OnStack;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                let Some(&neighbor) = self.out[node].get(next) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match marks[neighbor] {
                    Mark::Unvisited => {
                        marks[neighbor] = Mark::OnStack;
                        stack.push((neighbor, 0));
                    }
                    Mark::OnStack => {
                        let start = stack
                            .iter()
                            .position(|(n, _)| *n == neighbor)
                            .unwrap_or(0);
                        let mut cycle: Vec<i64> =
                            stack[start..].iter().map(|(n, _)| self.ids[*n]).collect();
                        cycle.push(self.ids[neighbor]);
                        return Some(cycle);
                    }
                    Mark::Done => {}
                }
            }
        }
        None
    }

    /// Every id on some cycle, ascending.
    fn circular_nodes(&self) -> Vec<i64> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::with_capacity(self.ids.len(), 0);
        for node in 0..self.ids.len() {
            graph.add_node(node);
        }
        for (from, targets) in self.out.iter().enumerate() {
            for &to in targets {
                graph.add_edge(from, to, ());
            }
        }

        let mut circular: Vec<i64> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| graph.contains_edge(n, n))
            })
            .flatten()
            .map(|n| self.ids[n])
            .collect();
        circular.sort_unstable();
        circular
    }
}
