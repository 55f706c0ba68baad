use crate::resources::Resource;
use crate::types::StackError;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Dependency graph over declared resources.
///
/// An edge exists when a resource's inputs reference another resource's
/// attributes, or when it names the other resource in `depends_on`.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    declared: Vec<String>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn build(resources: &[Resource]) -> Result<Self, StackError> {
        let declared: Vec<String> = resources.iter().map(|r| r.name.clone()).collect();
        let known: BTreeSet<&str> = declared.iter().map(String::as_str).collect();

        let mut dependencies = BTreeMap::new();
        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for resource in resources {
            let mut deps: BTreeSet<String> = resource
                .references()?
                .into_iter()
                .map(|reference| reference.resource)
                .collect();
            deps.extend(resource.depends_on.iter().cloned());

            for dep in &deps {
                if !known.contains(dep.as_str()) {
                    return Err(StackError::UnknownResource {
                        resource: resource.name.clone(),
                        target: dep.clone(),
                    });
                }
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .insert(resource.name.clone());
            }
            dependencies.insert(resource.name.clone(), deps);
        }

        Ok(Self {
            declared,
            dependencies,
            dependents,
        })
    }

    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(name)
    }

    pub fn dependents(&self, name: &str) -> impl Iterator<Item = &String> {
        self.dependents.get(name).into_iter().flatten()
    }

    /// Resources ordered so that each comes after all of its dependencies.
    /// Ties keep declaration order.
    pub fn order(&self) -> Result<Vec<String>, StackError> {
        let mut pending: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.len()))
            .collect();

        let mut ready: VecDeque<&str> = self
            .declared
            .iter()
            .map(String::as_str)
            .filter(|name| pending.get(name) == Some(&0))
            .collect();

        let mut ordered = Vec::with_capacity(self.declared.len());
        while let Some(name) = ready.pop_front() {
            ordered.push(name.to_string());
            pending.remove(name);

            let mut unblocked = Vec::new();
            for dependent in self.dependents(name) {
                if let Some(count) = pending.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        unblocked.push(dependent.as_str());
                    }
                }
            }
            unblocked.sort_by_key(|n| self.position(n));
            ready.extend(unblocked);
        }

        if !pending.is_empty() {
            let remaining: BTreeSet<&str> = pending.keys().copied().collect();
            return Err(StackError::DependencyCycle(self.find_cycle(&remaining)));
        }

        Ok(ordered)
    }

    fn position(&self, name: &str) -> usize {
        self.declared
            .iter()
            .position(|n| n == name)
            .unwrap_or(usize::MAX)
    }

    /// Walk dependencies inside `remaining` until a name repeats
    fn find_cycle(&self, remaining: &BTreeSet<&str>) -> Vec<String> {
        let mut path: Vec<&str> = Vec::new();
        let mut current = remaining.iter().next().copied();

        while let Some(name) = current {
            if let Some(start) = path.iter().position(|n| *n == name) {
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return cycle;
            }
            path.push(name);
            current = self
                .dependencies(name)
                .and_then(|deps| deps.iter().find(|d| remaining.contains(d.as_str())))
                .map(String::as_str);
        }

        path.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Output;
    use crate::resources::{BucketArgs, CannedAcl, PublicAccessBlockArgs};

    fn bucket(name: &str) -> Resource {
        Resource::new(name, BucketArgs::new(CannedAcl::Private))
    }

    fn block(name: &str, target: &str) -> Resource {
        Resource::new(
            name,
            PublicAccessBlockArgs::all_blocked(Output::attribute(target, "id")),
        )
    }

    #[test]
    fn test_order_puts_dependencies_first() {
        let resources = vec![block("block", "logs"), bucket("site"), bucket("logs")];
        let graph = DependencyGraph::build(&resources).unwrap();
        assert_eq!(graph.order().unwrap(), vec!["site", "logs", "block"]);
    }

    #[test]
    fn test_explicit_dependency_is_an_edge() {
        let resources = vec![bucket("a").depends_on(["b"]), bucket("b")];
        let graph = DependencyGraph::build(&resources).unwrap();
        assert!(graph.dependencies("a").unwrap().contains("b"));
        assert_eq!(graph.order().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let resources = vec![block("block", "missing")];
        assert!(matches!(
            DependencyGraph::build(&resources),
            Err(StackError::UnknownResource { target, .. }) if target == "missing"
        ));
    }

    #[test]
    fn test_cycle_reported_as_path() {
        let resources = vec![
            bucket("a").depends_on(["b"]),
            bucket("b").depends_on(["c"]),
            bucket("c").depends_on(["a"]),
            bucket("d"),
        ];
        let graph = DependencyGraph::build(&resources).unwrap();
        match graph.order() {
            Err(StackError::DependencyCycle(path)) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }
}
