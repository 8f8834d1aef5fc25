//! Mechanic dependency graph module.
//!
//! Provides the `SkillGraph` type, a directed graph of skills whose job
//! mechanics reference other skills. Used by the mechanics registry to
//! find references that loop back on themselves.

use crate::error::EngineError;
use crate::ids::SkillId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A directed graph of mechanic references between skills.
///
/// An edge `from -> to` means the mechanic on `from` reads `to`.
///
/// # Examples
///
/// ```rust
/// use buildcalc::graph::SkillGraph;
/// use buildcalc::SkillId;
///
/// let mut graph = SkillGraph::new();
/// let a = SkillId::new("A");
/// let b = SkillId::new("B");
///
/// graph.add_edge(a.clone(), b.clone());
/// assert!(graph.detect_cycles().is_ok());
///
/// graph.add_edge(b, a);
/// assert!(graph.detect_cycles().is_err());
/// ```
pub struct SkillGraph {
    graph: DiGraph<SkillId, ()>,
    node_map: HashMap<SkillId, NodeIndex>,
}

impl SkillGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a node if it doesn't exist and return its index.
    pub fn add_node(&mut self, skill: SkillId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&skill) {
            idx
        } else {
            let idx = self.graph.add_node(skill.clone());
            self.node_map.insert(skill, idx);
            idx
        }
    }

    /// Record that the mechanic on `from` references `to`.
    pub fn add_edge(&mut self, from: SkillId, to: SkillId) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        self.graph.add_edge(from_idx, to_idx, ());
    }

    pub fn contains_node(&self, skill: &SkillId) -> bool {
        self.node_map.contains_key(skill)
    }

    /// Detect cycles with a depth-first search.
    ///
    /// Returns the first cycle found as a closed path (`A -> B -> A`).
    pub fn detect_cycles(&self) -> Result<(), EngineError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut path = Vec::new();
                if let Some(cycle) = self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut path) {
                    return Err(cycle);
                }
            }
        }
        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<SkillId>,
    ) -> Option<EngineError> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(self.graph[node].clone());

        for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                let start = &self.graph[neighbor];
                let from = path.iter().position(|skill| skill == start).unwrap_or(0);
                let mut cycle = path[from..].to_vec();
                cycle.push(start.clone());
                return Some(EngineError::MechanicCycle { path: cycle });
            }
        }

        rec_stack.remove(&node);
        path.pop();
        None
    }

    /// Every skill that sits on some cycle, including self-references.
    pub fn cyclic_skills(&self) -> BTreeSet<SkillId> {
        let mut cyclic = BTreeSet::new();
        for component in tarjan_scc(&self.graph) {
            let looped = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| self.graph.contains_edge(idx, idx));
            if looped {
                cyclic.extend(component.into_iter().map(|idx| self.graph[idx].clone()));
            }
        }
        cyclic
    }
}

impl Default for SkillGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_duplicate_nodes() {
        let mut graph = SkillGraph::new();
        let a = SkillId::new("A");
        assert_eq!(graph.add_node(a.clone()), graph.add_node(a.clone()));
        assert!(graph.contains_node(&a));
    }

    #[test]
    fn test_chain_has_no_cycle() {
        let mut graph = SkillGraph::new();
        graph.add_edge(SkillId::new("A"), SkillId::new("B"));
        graph.add_edge(SkillId::new("B"), SkillId::new("C"));
        assert!(graph.detect_cycles().is_ok());
        assert!(graph.cyclic_skills().is_empty());
    }

    #[test]
    fn test_cycle_path_closed() {
        let mut graph = SkillGraph::new();
        let a = SkillId::new("A");
        let b = SkillId::new("B");
        let c = SkillId::new("C");
        graph.add_edge(a.clone(), b.clone());
        graph.add_edge(b.clone(), c.clone());
        graph.add_edge(c.clone(), a.clone());

        match graph.detect_cycles() {
            Err(EngineError::MechanicCycle { path }) => {
                assert_eq!(path.len(), 4);
                assert_eq!(path[0], path[3]);
                assert!(path.contains(&b));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_path_excludes_tail() {
        let mut graph = SkillGraph::new();
        let x = SkillId::new("X");
        let a = SkillId::new("A");
        let b = SkillId::new("B");
        graph.add_edge(x.clone(), a.clone());
        graph.add_edge(a.clone(), b.clone());
        graph.add_edge(b.clone(), a.clone());

        let Err(EngineError::MechanicCycle { path }) = graph.detect_cycles() else {
            panic!("expected cycle");
        };
        assert!(!path.contains(&x));

        let cyclic = graph.cyclic_skills();
        assert!(cyclic.contains(&a) && cyclic.contains(&b));
        assert!(!cyclic.contains(&x));
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let mut graph = SkillGraph::new();
        let a = SkillId::new("A");
        graph.add_edge(a.clone(), a.clone());
        assert!(graph.detect_cycles().is_err());
        assert_eq!(graph.cyclic_skills().len(), 1);
    }
}
