//! Dependencies between stats
//!
//! A derived stat depends on every stat its formula names. Names are
//! matched as whole identifiers (case-insensitive), never as substrings:
//! a formula over `POINTS` does not depend on `INT`.

use crate::core::formula::{evaluate, extract_variables};
use crate::error::{StatforgeError, StatforgeResult};
use crate::types::StatDefinition;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Stats as nodes; an edge `a -> b` means `b`'s formula references `a`
pub struct StatDependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl StatDependencyGraph {
    /// Build the graph for a set of stats.
    ///
    /// Identifiers that are not stat names (`Level`, `BaseValue`, typos)
    /// add no edges.
    pub fn build(stats: &[StatDefinition]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for stat in stats {
            node_map
                .entry(key(&stat.name))
                .or_insert_with(|| graph.add_node(stat.name.clone()));
        }

        for stat in stats {
            let Some(formula) = stat.formula_text() else {
                continue;
            };
            let Some(&to_idx) = node_map.get(&key(&stat.name)) else {
                continue;
            };
            for var in extract_variables(formula) {
                if let Some(&from_idx) = node_map.get(&key(&var)) {
                    graph.update_edge(from_idx, to_idx, ());
                }
            }
        }

        Self { graph, node_map }
    }

    fn index(&self, name: &str) -> Option<NodeIndex> {
        self.node_map.get(&key(name)).copied()
    }

    /// Order in which stats can be computed (dependencies first)
    pub fn resolution_order(&self) -> StatforgeResult<Vec<String>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            StatforgeError::CircularDependency(format!(
                "stat '{}' depends on itself",
                self.graph[cycle.node_id()]
            ))
        })?;

        Ok(order
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Like [`resolution_order`](Self::resolution_order), but never fails:
    /// stats on a cycle, and every stat downstream of one, are left out.
    pub fn acyclic_order(&self) -> Vec<String> {
        // tarjan_scc yields components in reverse topological order
        let sccs = tarjan_scc(&self.graph);

        let mut blocked = HashSet::new();
        for scc in &sccs {
            let cyclic = scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]);
            if !cyclic {
                continue;
            }
            for &idx in scc {
                let mut dfs = Dfs::new(&self.graph, idx);
                while let Some(n) = dfs.next(&self.graph) {
                    blocked.insert(n);
                }
            }
        }

        sccs.into_iter()
            .rev()
            .flatten()
            .filter(|idx| !blocked.contains(idx))
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Stats referenced directly by `name`'s formula
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Stats whose formula references `name` directly
    pub fn direct_dependents_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.index(name) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names
    }

    /// Every stat affected when `name` changes, directly or through other
    /// derived stats
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        let Some(start) = self.index(name) else {
            return Vec::new();
        };

        let mut dfs = Dfs::new(&self.graph, start);
        let mut names = Vec::new();
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                names.push(self.graph[idx].clone());
            }
        }
        names.sort();
        names
    }
}

/// Preview value of a base stat at `level`: `(base or 10) + (growth or 0) * level`
pub fn base_stat_preview(stat: &StatDefinition, level: u32) -> f64 {
    let base = f64::from(stat.base_value.unwrap_or(10));
    let growth = f64::from(stat.growth_per_level.unwrap_or(0));
    base + growth * f64::from(level)
}

/// Preview values for every stat at `level`.
///
/// Base stats use [`base_stat_preview`]. Derived stats are evaluated in
/// dependency order with `Level` and their own `BaseValue` bound. A derived
/// stat is left out when it fails to evaluate, yields NaN or an infinity,
/// or sits on or downstream of a cycle. Stats unrelated to a cycle still
/// resolve.
pub fn resolve_stat_values(stats: &[StatDefinition], level: u32) -> HashMap<String, f64> {
    let mut values: HashMap<String, f64> = stats
        .iter()
        .filter(|s| !s.is_derived())
        .map(|s| (s.name.clone(), base_stat_preview(s, level)))
        .collect();

    let graph = StatDependencyGraph::build(stats);
    let order = graph.resolution_order().unwrap_or_else(|e| {
        debug!(error = %e, "stats on a cycle are not resolved");
        graph.acyclic_order()
    });

    for name in order {
        let Some(stat) = stats.iter().find(|s| s.name == name) else {
            continue;
        };
        let Some(formula) = stat.formula_text() else {
            continue;
        };

        let mut bindings = values.clone();
        bindings.insert("Level".to_string(), f64::from(level));
        bindings.insert(
            "BaseValue".to_string(),
            f64::from(stat.base_value.unwrap_or(0)),
        );

        match evaluate(formula, &bindings) {
            Ok(value) if value.is_finite() => {
                values.insert(stat.name.clone(), value);
            }
            Ok(value) => debug!(stat = %stat.name, value, "derived stat is not finite"),
            Err(e) => debug!(stat = %stat.name, error = %e, "derived stat has no preview value"),
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_stats() -> Vec<StatDefinition> {
        vec![
            StatDefinition::base("VIT", 8, 3),
            StatDefinition::base("INT", 12, 2),
            StatDefinition::base("POINTS", 0, 5),
            StatDefinition::derived("HP", "VIT * 12 + Level * 5"),
            StatDefinition::derived("Shield", "HP * 0.1 + INT"),
            StatDefinition::derived("Bonus", "POINTS * 2"),
        ]
    }

    #[test]
    fn test_resolution_order_puts_dependencies_first() {
        let graph = StatDependencyGraph::build(&sample_stats());
        let order = graph.resolution_order().unwrap();
        let pos = |n: &str| order.iter().position(|s| s == n).unwrap();

        assert!(pos("VIT") < pos("HP"));
        assert!(pos("HP") < pos("Shield"));
        assert!(pos("INT") < pos("Shield"));
    }

    #[test]
    fn test_direct_relations() {
        let graph = StatDependencyGraph::build(&sample_stats());
        assert_eq!(graph.dependencies_of("Shield"), vec!["HP", "INT"]);
        assert_eq!(graph.direct_dependents_of("VIT"), vec!["HP"]);
        assert!(graph.dependencies_of("VIT").is_empty());
    }

    #[test]
    fn test_dependents_are_transitive() {
        let graph = StatDependencyGraph::build(&sample_stats());
        assert_eq!(graph.dependents_of("vit"), vec!["HP", "Shield"]);
    }

    #[test]
    fn test_identifier_match_is_exact() {
        // "POINTS" contains "INT" but is a different identifier
        let graph = StatDependencyGraph::build(&sample_stats());
        assert_eq!(graph.direct_dependents_of("INT"), vec!["Shield"]);
    }

    #[test]
    fn test_cycle_detected() {
        let stats = vec![
            StatDefinition::derived("A", "B + 1"),
            StatDefinition::derived("B", "A * 2"),
        ];
        let err = StatDependencyGraph::build(&stats)
            .resolution_order()
            .unwrap_err();
        assert!(matches!(err, StatforgeError::CircularDependency(_)));
    }

    #[test]
    fn test_base_stat_preview_defaults() {
        assert_eq!(base_stat_preview(&StatDefinition::base("STR", 10, 2), 5), 20.0);

        let mut bare = StatDefinition::base("LCK", 0, 0);
        bare.base_value = None;
        bare.growth_per_level = None;
        assert_eq!(base_stat_preview(&bare, 99), 10.0);
    }

    #[test]
    fn test_resolve_stat_values_chains_derived_stats() {
        let values = resolve_stat_values(&sample_stats(), 10);
        // VIT = 8 + 3 * 10 = 38; HP = 38 * 12 + 50 = 506
        assert_eq!(values["VIT"], 38.0);
        assert_eq!(values["HP"], 506.0);
        // INT = 12 + 20 = 32; Shield = 50.6 + 32
        assert!((values["Shield"] - 82.6).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_stat_values_skips_broken_formula() {
        let stats = vec![
            StatDefinition::base("STR", 10, 0),
            StatDefinition::derived("Broken", "STR / 0"),
            StatDefinition::derived("Fine", "STR * 2"),
        ];
        let values = resolve_stat_values(&stats, 1);
        assert!(!values.contains_key("Broken"));
        assert_eq!(values["Fine"], 20.0);
    }

    #[test]
    fn test_resolve_stat_values_skips_non_finite_result() {
        let stats = vec![
            StatDefinition::base("VIT", 8, 0),
            StatDefinition::derived("HP", "VIT * 12"),
            StatDefinition::derived("Weird", "sqrt(0 - VIT)"),
        ];
        let values = resolve_stat_values(&stats, 1);
        assert_eq!(values["HP"], 96.0);
        assert!(!values.contains_key("Weird"));
    }

    #[test]
    fn test_acyclic_order_skips_cycle_and_downstream() {
        let stats = vec![
            StatDefinition::base("VIT", 8, 0),
            StatDefinition::derived("HP", "VIT * 12"),
            StatDefinition::derived("A", "B + 1"),
            StatDefinition::derived("B", "A * 2"),
            StatDefinition::derived("C", "A + HP"),
            StatDefinition::derived("Loop", "Loop + 1"),
            StatDefinition::derived("Shield", "HP / 2"),
        ];
        let order = StatDependencyGraph::build(&stats).acyclic_order();
        let pos = |n: &str| order.iter().position(|s| s == n).unwrap();

        assert_eq!(order.len(), 3);
        assert!(pos("VIT") < pos("HP"));
        assert!(pos("HP") < pos("Shield"));
    }

    #[test]
    fn test_resolve_stat_values_around_a_cycle() {
        let stats = vec![
            StatDefinition::base("VIT", 8, 0),
            StatDefinition::derived("HP", "VIT * 12"),
            StatDefinition::derived("Shield", "HP / 2"),
            StatDefinition::derived("A", "B"),
            StatDefinition::derived("B", "A"),
        ];
        let values = resolve_stat_values(&stats, 1);
        assert_eq!(values["HP"], 96.0);
        assert_eq!(values["Shield"], 48.0);
        assert!(!values.contains_key("A"));
        assert!(!values.contains_key("B"));
    }
}
