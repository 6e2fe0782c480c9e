//! Dependency resolution for the draw actions of a conversion run.
//!
//! A [`Task`] pairs a label with the labels it references and a side-effecting
//! action. [`Graph::new`] validates the task set (unknown references, cycles)
//! and derives both adjacency directions once; afterwards the graph is only
//! traversed:
//!
//! * [`Graph::resolve`] runs every referenced task before the task itself
//!   (dependency-first).
//! * [`Graph::resolve_inverse`] runs every task that references the task
//!   before the task itself (dependent-first).
//!
//! Each action runs at most once per graph, no matter how many paths reach
//! its task or which entry point reaches it first.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

pub type Action<'a> = Box<dyn FnMut() + 'a>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("dependency graph is cyclic: task '{0}' is part of a cycle")]
    CyclicGraph(String),

    #[error("task '{task}' references unknown task '{label}'")]
    UnknownReference { task: String, label: String },

    #[error("duplicate task label '{0}'")]
    DuplicateLabel(String),
}

pub struct Task<'a> {
    label: String,
    references: Vec<String>,
    action: Action<'a>,
}

impl<'a> Task<'a> {
    pub fn new(
        label: impl Into<String>,
        references: Vec<String>,
        action: impl FnMut() + 'a,
    ) -> Self {
        Self {
            label: label.into(),
            references,
            action: Box::new(action),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }
}

impl fmt::Debug for Task<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("references", &self.references)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Forward,
    Inverse,
}

#[derive(Debug)]
pub struct Graph<'a> {
    tasks: Vec<Task<'a>>,
    index: HashMap<String, usize>,
    /// Per task: the tasks it references.
    forward: Vec<Vec<usize>>,
    /// Per task: the tasks referencing it.
    inverse: Vec<Vec<usize>>,
    resolved: Vec<bool>,
}

impl<'a> Graph<'a> {
    pub fn new(mut tasks: Vec<Task<'a>>) -> Result<Self, GraphError> {
        // Most-referencing first. If even the last task still references
        // something, no task can be a leaf and the set cannot be acyclic.
        tasks.sort_by(|a, b| b.references.len().cmp(&a.references.len()));
        if let Some(last) = tasks.last() {
            if !last.references.is_empty() {
                return Err(GraphError::CyclicGraph(last.label.clone()));
            }
        }

        let mut index = HashMap::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            if index.insert(task.label.clone(), idx).is_some() {
                return Err(GraphError::DuplicateLabel(task.label.clone()));
            }
        }

        let mut forward = vec![Vec::new(); tasks.len()];
        let mut inverse = vec![Vec::new(); tasks.len()];
        for (idx, task) in tasks.iter().enumerate() {
            for reference in &task.references {
                let Some(&dep) = index.get(reference) else {
                    return Err(GraphError::UnknownReference {
                        task: task.label.clone(),
                        label: reference.clone(),
                    });
                };
                forward[idx].push(dep);
                inverse[dep].push(idx);
            }
        }

        let resolved = vec![false; tasks.len()];
        let graph = Self {
            tasks,
            index,
            forward,
            inverse,
            resolved,
        };
        if let Some(idx) = graph.find_cycle() {
            return Err(GraphError::CyclicGraph(graph.tasks[idx].label.clone()));
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Labels in graph order (descending reference count, input order on ties).
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|task| task.label.as_str())
    }

    pub fn dependencies(&self, label: &str) -> Vec<&str> {
        self.neighbours(label, Walk::Forward)
    }

    pub fn dependents(&self, label: &str) -> Vec<&str> {
        self.neighbours(label, Walk::Inverse)
    }

    pub fn is_resolved(&self, label: &str) -> bool {
        self.index
            .get(label)
            .map(|&idx| self.resolved[idx])
            .unwrap_or(false)
    }

    /// Runs the actions of everything `label` references, then its own.
    /// Returns `false` if no task carries `label`.
    pub fn resolve(&mut self, label: &str) -> bool {
        let Some(&idx) = self.index.get(label) else {
            return false;
        };
        self.resolve_index(idx, Walk::Forward);
        true
    }

    /// Runs the actions of everything referencing `label`, then its own.
    /// Returns `false` if no task carries `label`.
    pub fn resolve_inverse(&mut self, label: &str) -> bool {
        let Some(&idx) = self.index.get(label) else {
            return false;
        };
        self.resolve_index(idx, Walk::Inverse);
        true
    }

    pub fn resolve_all(&mut self) {
        for idx in 0..self.tasks.len() {
            self.resolve_index(idx, Walk::Forward);
        }
    }

    pub fn resolve_inverse_all(&mut self) {
        for idx in 0..self.tasks.len() {
            self.resolve_index(idx, Walk::Inverse);
        }
    }

    fn neighbours(&self, label: &str, walk: Walk) -> Vec<&str> {
        let Some(&idx) = self.index.get(label) else {
            return Vec::new();
        };
        self.edges(idx, walk)
            .iter()
            .map(|&other| self.tasks[other].label.as_str())
            .collect()
    }

    fn edges(&self, idx: usize, walk: Walk) -> &[usize] {
        match walk {
            Walk::Forward => &self.forward[idx],
            Walk::Inverse => &self.inverse[idx],
        }
    }

    /// Depth-first walk along `walk` edges with an explicit stack, so chain
    /// depth is bounded by memory rather than by the thread's stack.
    fn resolve_index(&mut self, start: usize, walk: Walk) {
        if self.resolved[start] {
            return;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let idx = top.0;
            let next = self.edges(idx, walk).get(top.1).copied();
            top.1 += 1;
            match next {
                Some(next) if !self.resolved[next] => stack.push((next, 0)),
                Some(_) => {}
                None => {
                    stack.pop();
                    self.resolved[idx] = true;
                    (self.tasks[idx].action)();
                }
            }
        }
    }

    /// Topologically sorts the forward edges. Returns a task that lies on
    /// a cycle, if any.
    fn find_cycle(&self) -> Option<usize> {
        let edge_count = self.forward.iter().map(Vec::len).sum();
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.tasks.len(), edge_count);
        let nodes: Vec<NodeIndex> = (0..self.tasks.len()).map(|idx| graph.add_node(idx)).collect();
        for (idx, deps) in self.forward.iter().enumerate() {
            for &dep in deps {
                graph.add_edge(nodes[idx], nodes[dep], ());
            }
        }
        toposort(&graph, None)
            .err()
            .map(|cycle| graph[cycle.node_id()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn refs(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    fn logging_tasks<'a>(
        edges: &[(&'static str, &[&str])],
        log: &'a RefCell<Vec<&'static str>>,
    ) -> Vec<Task<'a>> {
        edges
            .iter()
            .map(|(label, deps)| {
                let label = *label;
                Task::new(label, refs(deps), move || log.borrow_mut().push(label))
            })
            .collect()
    }

    fn position(log: &[&str], label: &str) -> usize {
        log.iter()
            .position(|l| *l == label)
            .unwrap_or_else(|| panic!("{label} never ran"))
    }

    #[test]
    fn resolve_runs_dependencies_first() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(
            &[
                ("app", &["db", "cache"]),
                ("db", &["net"]),
                ("cache", &["net"]),
                ("net", &[]),
            ],
            &log,
        );
        let mut graph = Graph::new(tasks).unwrap();
        assert!(graph.resolve("app"));
        let log = log.borrow();
        assert_eq!(log.len(), 4);
        assert!(position(&log, "net") < position(&log, "db"));
        assert!(position(&log, "net") < position(&log, "cache"));
        assert!(position(&log, "db") < position(&log, "app"));
        assert!(position(&log, "cache") < position(&log, "app"));
    }

    #[test]
    fn diamond_runs_shared_dependency_once() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(&[("a", &[]), ("b", &["a"]), ("c", &["a"])], &log);
        let mut graph = Graph::new(tasks).unwrap();
        graph.resolve("b");
        graph.resolve("c");
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn resolve_inverse_runs_dependents_first() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(
            &[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])],
            &log,
        );
        let mut graph = Graph::new(tasks).unwrap();
        graph.resolve_inverse("a");
        let log = log.borrow();
        assert_eq!(log.len(), 4);
        assert_eq!(log.iter().filter(|l| **l == "d").count(), 1);
        assert!(position(&log, "d") < position(&log, "b"));
        assert!(position(&log, "d") < position(&log, "c"));
        assert_eq!(*log.last().unwrap(), "a");
    }

    #[test]
    fn actions_run_once_across_both_walks() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(&[("a", &[]), ("b", &["a"])], &log);
        let mut graph = Graph::new(tasks).unwrap();
        graph.resolve("b");
        graph.resolve_inverse("a");
        graph.resolve_all();
        graph.resolve_inverse_all();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(graph.is_resolved("a"));
    }

    #[test]
    fn resolve_all_respects_every_edge() {
        // Layered DAG: every node i references all nodes in the previous layer.
        let layers: Vec<Vec<String>> = (0..4)
            .map(|layer| (0..3).map(|n| format!("l{layer}n{n}")).collect())
            .collect();
        let order = RefCell::new(Vec::new());
        let mut tasks = Vec::new();
        for (layer, labels) in layers.iter().enumerate() {
            for label in labels {
                let deps = if layer == 0 {
                    Vec::new()
                } else {
                    layers[layer - 1].clone()
                };
                let name = label.clone();
                let order = &order;
                tasks.push(Task::new(label.clone(), deps, move || {
                    order.borrow_mut().push(name.clone())
                }));
            }
        }
        let mut graph = Graph::new(tasks).unwrap();
        graph.resolve_all();
        let order = order.borrow();
        assert_eq!(order.len(), 12);
        for layer in 1..layers.len() {
            for label in &layers[layer] {
                let at = order.iter().position(|l| l == label).unwrap();
                for dep in &layers[layer - 1] {
                    let dep_at = order.iter().position(|l| l == dep).unwrap();
                    assert!(dep_at < at, "{dep} ran after {label}");
                }
            }
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(
            &[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])],
            &log,
        );
        let graph = Graph::new(tasks).unwrap();
        for label in ["a", "b", "c"] {
            for dep in graph.dependencies(label) {
                assert!(graph.dependents(dep).contains(&label));
            }
            for dependent in graph.dependents(label) {
                assert!(graph.dependencies(dependent).contains(&label));
            }
        }
        assert_eq!(graph.labels().collect::<Vec<_>>(), vec!["c", "b", "a"]);
    }

    #[test]
    fn fully_cyclic_graph_is_rejected() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])], &log);
        let err = Graph::new(tasks).unwrap_err();
        assert!(matches!(err, GraphError::CyclicGraph(_)));
    }

    #[test]
    fn cycle_next_to_a_leaf_is_rejected() {
        // The leaf sorts last, so the reference-count check alone passes.
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(&[("a", &["b"]), ("b", &["a"]), ("leaf", &[])], &log);
        let err = Graph::new(tasks).unwrap_err();
        match err {
            GraphError::CyclicGraph(label) => assert!(label == "a" || label == "b"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unknown_reference_names_the_label() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(&[("a", &[]), ("b", &["ghost"])], &log);
        let err = Graph::new(tasks).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownReference {
                task: "b".to_string(),
                label: "ghost".to_string(),
            }
        );
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let log = RefCell::new(Vec::new());
        let tasks = logging_tasks(&[("a", &[]), ("a", &[])], &log);
        assert_eq!(
            Graph::new(tasks).unwrap_err(),
            GraphError::DuplicateLabel("a".to_string())
        );
    }

    #[test]
    fn deep_chains_resolve_without_recursion() {
        let depth = 200_000;
        let counter = std::cell::Cell::new(0usize);
        let tasks: Vec<Task<'_>> = (0..depth)
            .map(|i| {
                let refs = if i + 1 < depth {
                    vec![format!("t{}", i + 1)]
                } else {
                    Vec::new()
                };
                let counter = &counter;
                Task::new(format!("t{i}"), refs, move || counter.set(counter.get() + 1))
            })
            .collect();
        let mut graph = Graph::new(tasks).unwrap();
        assert!(graph.resolve("t0"));
        assert_eq!(counter.get(), depth);
        assert!(graph.resolve_inverse(&format!("t{}", depth - 1)));
        assert_eq!(counter.get(), depth);
    }

    #[test]
    fn unknown_label_is_not_resolved() {
        let mut graph = Graph::new(Vec::new()).unwrap();
        assert!(graph.is_empty());
        assert!(!graph.resolve("nope"));
        assert!(!graph.resolve_inverse("nope"));
    }
}
