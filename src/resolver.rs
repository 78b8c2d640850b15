//! # Dependency Resolver
//!
//! Computes a startup order in which every module comes after all of its dependencies.
//!
//! The algorithm is a depth-first topological sort with explicit coloring:
//!
//! - `visiting`: modules on the current DFS path. Reaching one of these again means a cycle.
//! - `visited`: modules already appended to the result.
//!
//! Dependencies are visited before the module itself is appended (post-order), so a module is
//! only appended once everything it needs is already in the list. Roots are taken in
//! registration order and dependencies in declaration order, so the same registry always
//! produces the same order. Runs in `O(V + E)`.

use crate::error::OrchestratorError;
use crate::registry::ModuleRegistry;
use std::collections::HashSet;
use tracing::debug;

/// Returns module names in dependency order (dependencies first).
pub fn resolve_order(registry: &ModuleRegistry) -> Result<Vec<String>, OrchestratorError> {
    let mut state = Dfs {
        registry,
        visiting: HashSet::new(),
        visited: HashSet::new(),
        path: Vec::new(),
        order: Vec::with_capacity(registry.len()),
    };

    for name in registry.all() {
        state.visit(name)?;
    }

    debug!(order = ?state.order, "Resolved startup order");
    Ok(state.order)
}

struct Dfs<'a> {
    registry: &'a ModuleRegistry,
    visiting: HashSet<&'a str>,
    visited: HashSet<&'a str>,
    path: Vec<&'a str>,
    order: Vec<String>,
}

impl<'a> Dfs<'a> {
    fn visit(&mut self, name: &'a str) -> Result<(), OrchestratorError> {
        if self.visited.contains(name) {
            return Ok(());
        }
        if self.visiting.contains(name) {
            let start = self.path.iter().position(|n| *n == name).unwrap_or(0);
            let mut path: Vec<String> = self.path[start..].iter().map(|n| n.to_string()).collect();
            path.push(name.to_string());
            return Err(OrchestratorError::CycleDetected {
                module: name.to_string(),
                path,
            });
        }

        let descriptor = self.registry.lookup(name)?;

        self.visiting.insert(name);
        self.path.push(name);

        for dep in descriptor.dependencies() {
            if !self.registry.contains(dep) {
                return Err(OrchestratorError::MissingDependency {
                    dependency: dep.clone(),
                    required_by: name.to_string(),
                });
            }
            self.visit(dep)?;
        }

        self.path.pop();
        self.visiting.remove(name);
        self.visited.insert(name);
        self.order.push(name.to_string());
        Ok(())
    }
}
