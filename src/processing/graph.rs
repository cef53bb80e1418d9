//! Dependency-ordered resource graph handed to the engine.
//!
//! Resources may only reference resources declared before them, so the graph
//! is acyclic by construction and declaration order is one valid apply order.

use crate::models::{Resource, ResourceKind};
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;

#[derive(Debug, Default)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> ResourceGraph {
        ResourceGraph::default()
    }

    /// Add a resource. Fails on a duplicate name or a dependency on a resource
    /// not yet declared.
    pub fn declare(&mut self, resource: Resource) -> Result<&Resource, Box<dyn Error>> {
        if self.index.contains_key(&resource.name) {
            return Err(format!("Duplicate resource name: {}", resource.name).into());
        }
        if let Some(missing) = resource
            .depends_on
            .iter()
            .find(|d| !self.index.contains_key(*d))
        {
            return Err(format!(
                "Resource {} depends on undeclared resource {missing}",
                resource.name
            )
            .into());
        }
        log::trace!(
            "declare {} {} deps=[{}]",
            resource.kind,
            resource.name,
            resource.depends_on.iter().join(",")
        );
        let pos = self.resources.len();
        self.index.insert(resource.name.clone(), pos);
        self.resources.push(resource);
        Ok(&self.resources[pos])
    }

    /// Resources in declaration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.index.get(name).map(|&i| &self.resources[i])
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// All resources of one kind, in declaration order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    /// Number of resources per kind, sorted by kind.
    pub fn count_by_kind(&self) -> Vec<(ResourceKind, usize)> {
        self.resources
            .iter()
            .map(|r| r.kind)
            .counts()
            .into_iter()
            .sorted()
            .collect()
    }

    /// Group resources into apply waves.
    ///
    /// Every resource lands in the wave after its deepest dependency, so all
    /// resources of one wave can be created concurrently. Within a wave the
    /// declaration order is kept.
    pub fn apply_waves(&self) -> Vec<Vec<&str>> {
        let mut depth: Vec<usize> = Vec::with_capacity(self.resources.len());
        for r in &self.resources {
            // dependencies are always earlier, so their depth is known
            let d = r
                .depends_on
                .iter()
                .filter_map(|dep| self.index.get(dep))
                .map(|&i| depth[i] + 1)
                .max()
                .unwrap_or(0);
            depth.push(d);
        }

        let mut waves: Vec<Vec<&str>> = vec![Vec::new(); depth.iter().max().map_or(0, |m| m + 1)];
        for (r, d) in self.resources.iter().zip(depth) {
            waves[d].push(&r.name);
        }
        waves
    }
}
