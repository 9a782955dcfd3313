// src/dag/graph.rs

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::dot::Dot;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::plan::{self, ExecutionPlan};
use crate::errors::{Result, RundagError};
use crate::types::TargetName;

/// Static shape of one target: its name and the edges it declares.
///
/// The shape is fixed once registered; only per-run completion state changes,
/// and that lives in [`crate::dag::StateTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDef {
    pub name: TargetName,
    /// Targets that must succeed before this one may run.
    pub deps: Vec<TargetName>,
    /// Targets that must not start before this one, when both are planned.
    ///
    /// Ordering only: never pulls a target into a plan and never causes skips.
    pub before: Vec<TargetName>,
    pub description: Option<String>,
}

impl TargetDef {
    pub fn new(name: impl Into<TargetName>) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            before: Vec::new(),
            description: None,
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetName>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_before<I, S>(mut self, before: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetName>,
    {
        self.before = before.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Registry of target shapes, kept in registration order.
///
/// Registration order is the tie-break for planning, so the map is an
/// `IndexMap` rather than a hash map.
#[derive(Debug, Clone, Default)]
pub struct TargetGraph {
    targets: IndexMap<TargetName, TargetDef>,
}

impl TargetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target. Dependency names are not checked here; unknown names
    /// surface when planning or validating.
    pub fn add(&mut self, def: TargetDef) -> Result<()> {
        if self.targets.contains_key(&def.name) {
            return Err(RundagError::DuplicateTarget(def.name));
        }
        debug!(target_name = %def.name, deps = ?def.deps, "registered target");
        self.targets.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TargetDef> {
        self.targets.get(name)
    }

    /// Position of `name` in registration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.targets.get_index_of(name)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// All targets in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetDef> {
        self.targets.values()
    }

    /// Immediate dependencies of a target.
    pub fn dependencies_of(&self, name: &str) -> &[TargetName] {
        self.targets
            .get(name)
            .map(|t| t.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Plan a run of `root` and everything it transitively depends on.
    pub fn plan(&self, root: &str) -> Result<ExecutionPlan> {
        self.plan_many(&[root])
    }

    /// Plan the union of several requested roots.
    pub fn plan_many<S: AsRef<str>>(&self, roots: &[S]) -> Result<ExecutionPlan> {
        plan::resolve(self, roots)
    }

    /// Check every reference and reject cycles across the whole registry,
    /// not just the part reachable from some root.
    pub fn validate(&self) -> Result<()> {
        for def in self.targets.values() {
            for referenced in def.deps.iter().chain(def.before.iter()) {
                if !self.contains(referenced) {
                    return Err(RundagError::UnknownDependency {
                        target: def.name.clone(),
                        dependency: referenced.clone(),
                    });
                }
            }
        }

        let graph = self.ordering_graph();
        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = cycle.node_id();
                let path = plan::find_cycle(self, self.targets.keys().map(String::as_str))
                    .unwrap_or_else(|| format!("cycle involving target '{node}'"));
                Err(RundagError::CyclicDependency(path))
            }
        }
    }

    /// Render the graph in Graphviz DOT format.
    ///
    /// Dependency edges point from the dependency to the dependent; ordering
    /// edges (`before`) are labelled `before`.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraphMap<&str, &str> = DiGraphMap::new();
        for name in self.targets.keys() {
            graph.add_node(name.as_str());
        }
        for def in self.targets.values() {
            for dep in def.deps.iter().filter(|d| self.contains(d)) {
                graph.add_edge(dep.as_str(), def.name.as_str(), "");
            }
            for later in def.before.iter().filter(|b| self.contains(b)) {
                graph.add_edge(def.name.as_str(), later.as_str(), "before");
            }
        }
        format!("{:?}", Dot::new(&graph))
    }

    // Edge direction: earlier -> later.
    //
    // `[target.B] after = ["A"]` adds A -> B.
    // `[target.A] before = ["B"]` also adds A -> B.
    fn ordering_graph(&self) -> DiGraphMap<&str, ()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.targets.keys() {
            graph.add_node(name.as_str());
        }
        for def in self.targets.values() {
            for dep in &def.deps {
                graph.add_edge(dep.as_str(), def.name.as_str(), ());
            }
            for later in &def.before {
                graph.add_edge(def.name.as_str(), later.as_str(), ());
            }
        }
        graph
    }
}
