// src/dag/plan.rs

//! Execution planning.
//!
//! Planning happens in three passes over a [`TargetGraph`]:
//!
//! 1. Depth-first walk from the requested roots along dependency edges to
//!    collect every target the run needs (reporting unknown names).
//! 2. Cycle detection over the planned subset, using dependency edges plus
//!    any `before` ordering edges between planned targets.
//! 3. A stable topological sort: whenever several targets are ready, the one
//!    registered first goes next. The same registry and roots always produce
//!    the same plan.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::dag::graph::TargetGraph;
use crate::errors::{Result, RundagError};
use crate::types::TargetName;

/// Ordered list of targets for one invocation. Every target appears after all
/// of its dependencies, and exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    order: Vec<TargetName>,
}

impl ExecutionPlan {
    pub fn targets(&self) -> &[TargetName] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.order.iter().any(|t| t == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|t| t == name)
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.order.join(" -> "))
    }
}

pub(crate) fn resolve<S: AsRef<str>>(graph: &TargetGraph, roots: &[S]) -> Result<ExecutionPlan> {
    let mut planned: HashSet<&str> = HashSet::new();

    for root in roots {
        let Some(def) = graph.get(root.as_ref()) else {
            return Err(RundagError::UnknownTarget(root.as_ref().to_string()));
        };
        collect_reachable(graph, def.name.as_str(), &mut planned)?;
    }

    // Ordering edges only count between targets that are both planned, but a
    // `before` naming an unregistered target is still a configuration mistake.
    for name in &planned {
        if let Some(def) = graph.get(name) {
            if let Some(unknown) = def.before.iter().find(|b| !graph.contains(b)) {
                return Err(RundagError::UnknownDependency {
                    target: def.name.clone(),
                    dependency: unknown.clone(),
                });
            }
        }
    }

    let mut in_registration_order: Vec<&str> = planned.iter().copied().collect();
    in_registration_order.sort_by_key(|name| graph.index_of(name));

    if let Some(path) = find_cycle(graph, in_registration_order.iter().copied()) {
        return Err(RundagError::CyclicDependency(path));
    }

    let order = stable_toposort(graph, &in_registration_order, &planned);
    debug!(roots = roots.len(), planned = order.len(), ?order, "resolved execution plan");

    Ok(ExecutionPlan { order })
}

/// Depth-first walk along dependency edges. Terminates on cycles (they are
/// reported by [`find_cycle`] with a full path).
fn collect_reachable<'g>(
    graph: &'g TargetGraph,
    root: &'g str,
    planned: &mut HashSet<&'g str>,
) -> Result<()> {
    let mut stack: Vec<&'g str> = vec![root];

    while let Some(name) = stack.pop() {
        if !planned.insert(name) {
            continue;
        }
        for dep in graph.dependencies_of(name) {
            if !graph.contains(dep) {
                return Err(RundagError::UnknownDependency {
                    target: name.to_string(),
                    dependency: dep.clone(),
                });
            }
            stack.push(dep.as_str());
        }
    }

    Ok(())
}

/// Targets that must precede `name`, restricted to `within`: its dependencies
/// plus every target declaring `before = [name]`.
fn predecessors<'g>(
    graph: &'g TargetGraph,
    name: &str,
    within: &dyn Fn(&str) -> bool,
) -> Vec<&'g str> {
    let mut preds: Vec<&'g str> = graph
        .dependencies_of(name)
        .iter()
        .map(String::as_str)
        .filter(|&d| within(d))
        .collect();

    for def in graph.targets() {
        if def.before.iter().any(|b| b == name) && within(def.name.as_str()) {
            preds.push(def.name.as_str());
        }
    }

    preds
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Look for a cycle among `nodes` and render it as `A -> B -> A`, where each
/// arrow reads "waits for".
pub(crate) fn find_cycle<'g, I>(graph: &'g TargetGraph, nodes: I) -> Option<String>
where
    I: IntoIterator<Item = &'g str>,
{
    let nodes: Vec<&'g str> = nodes.into_iter().collect();
    let members: HashSet<&str> = nodes.iter().copied().collect();
    let within = |n: &str| members.contains(n);

    let mut marks: HashMap<&'g str, Mark> = HashMap::new();
    let mut path: Vec<&'g str> = Vec::new();

    fn visit<'g>(
        graph: &'g TargetGraph,
        name: &'g str,
        within: &dyn Fn(&str) -> bool,
        marks: &mut HashMap<&'g str, Mark>,
        path: &mut Vec<&'g str>,
    ) -> Option<String> {
        match marks.get(name) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<&str> = path[start..].to_vec();
                cycle.push(name);
                return Some(cycle.join(" -> "));
            }
            None => {}
        }

        marks.insert(name, Mark::Visiting);
        path.push(name);
        for pred in predecessors(graph, name, within) {
            if let Some(cycle) = visit(graph, pred, within, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(name, Mark::Done);
        None
    }

    for name in nodes {
        if let Some(cycle) = visit(graph, name, &within, &mut marks, &mut path) {
            return Some(cycle);
        }
    }
    None
}

/// Kahn's algorithm with the ready set keyed by registration index.
///
/// Assumes the planned subset is acyclic.
fn stable_toposort(
    graph: &TargetGraph,
    in_registration_order: &[&str],
    planned: &HashSet<&str>,
) -> Vec<TargetName> {
    let within = |n: &str| planned.contains(n);

    let mut remaining: HashMap<&str, usize> = HashMap::new();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for &name in in_registration_order {
        let preds = predecessors(graph, name, &within);
        remaining.insert(name, preds.len());
        for pred in preds {
            successors.entry(pred).or_default().push(name);
        }
    }

    let index = |n: &str| graph.index_of(n).unwrap_or(usize::MAX);

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| Reverse((index(*name), *name)))
        .collect();

    let mut order = Vec::with_capacity(in_registration_order.len());
    while let Some(Reverse((_, name))) = ready.pop() {
        order.push(name.to_string());
        for &next in successors.get(name).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(count) = remaining.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse((index(next), next)));
                }
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::graph::TargetDef;

    fn graph(defs: Vec<TargetDef>) -> TargetGraph {
        let mut g = TargetGraph::new();
        for d in defs {
            g.add(d).unwrap();
        }
        g
    }

    fn build_script() -> TargetGraph {
        graph(vec![
            TargetDef::new("Clean").with_before(["Restore"]),
            TargetDef::new("Restore"),
            TargetDef::new("Compile").with_deps(["Restore"]),
            TargetDef::new("Test").with_deps(["Compile"]),
        ])
    }

    #[test]
    fn plan_orders_dependencies_first() {
        let plan = build_script().plan("Test").unwrap();
        assert_eq!(plan.targets(), ["Restore", "Compile", "Test"]);
    }

    #[test]
    fn before_only_orders_when_both_are_planned() {
        let g = build_script();
        let plan = g.plan_many(&["Test", "Clean"]).unwrap();
        assert_eq!(plan.targets(), ["Clean", "Restore", "Compile", "Test"]);

        // Clean is registered first, but a plan rooted elsewhere never pulls it in.
        assert!(!g.plan("Compile").unwrap().contains("Clean"));
    }

    #[test]
    fn before_can_override_registration_order() {
        let g = graph(vec![
            TargetDef::new("Restore"),
            TargetDef::new("Clean").with_before(["Restore"]),
        ]);
        let plan = g.plan_many(&["Restore", "Clean"]).unwrap();
        assert_eq!(plan.targets(), ["Clean", "Restore"]);
    }

    #[test]
    fn diamond_is_planned_once_per_target() {
        let g = graph(vec![
            TargetDef::new("Restore"),
            TargetDef::new("Lint").with_deps(["Restore"]),
            TargetDef::new("Compile").with_deps(["Restore"]),
            TargetDef::new("Package").with_deps(["Compile", "Lint"]),
        ]);
        let plan = g.plan("Package").unwrap();
        assert_eq!(plan.targets(), ["Restore", "Lint", "Compile", "Package"]);
    }

    #[test]
    fn unknown_root_is_reported() {
        let err = build_script().plan("Deploy").unwrap_err();
        assert!(matches!(err, RundagError::UnknownTarget(name) if name == "Deploy"));
    }

    #[test]
    fn unknown_dependency_is_reported_at_plan_time() {
        let g = graph(vec![TargetDef::new("Compile").with_deps(["Restore"])]);
        let err = g.plan("Compile").unwrap_err();
        assert!(matches!(
            err,
            RundagError::UnknownDependency { ref target, ref dependency }
                if target == "Compile" && dependency == "Restore"
        ));
    }

    #[test]
    fn two_cycle_is_reported_with_path() {
        let g = graph(vec![
            TargetDef::new("A").with_deps(["B"]),
            TargetDef::new("B").with_deps(["A"]),
        ]);
        match g.plan("A").unwrap_err() {
            RundagError::CyclicDependency(path) => assert_eq!(path, "A -> B -> A"),
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let g = graph(vec![TargetDef::new("A").with_deps(["A"])]);
        match g.plan("A").unwrap_err() {
            RundagError::CyclicDependency(path) => assert_eq!(path, "A -> A"),
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn planning_is_repeatable() {
        let g = build_script();
        let first = g.plan_many(&["Test", "Clean"]).unwrap();
        let second = g.plan_many(&["Test", "Clean"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn display_joins_with_arrows() {
        let plan = build_script().plan("Compile").unwrap();
        assert_eq!(plan.to_string(), "Restore -> Compile");
    }
}
