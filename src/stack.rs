use crate::graph::DependencyGraph;
use crate::output::Output;
use crate::resources::{Resource, ResourceRef};
use crate::types::{DesiredResource, DesiredState, StackError};
use std::collections::{BTreeMap, BTreeSet};

/// The set of declared resources and exported outputs for one stack
#[derive(Debug, Clone)]
pub struct Stack {
    project: String,
    name: String,
    resources: Vec<Resource>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a resource; logical names must be unique within the stack
    pub fn declare(&mut self, resource: Resource) -> Result<ResourceRef, StackError> {
        if self.resource(&resource.name).is_some() {
            return Err(StackError::DuplicateResource(resource.name));
        }

        tracing::info!(
            "Declared {} '{}'",
            resource.type_token(),
            resource.name
        );
        let handle = ResourceRef::new(resource.name.as_str());
        self.resources.push(resource);
        Ok(handle)
    }

    pub fn export(&mut self, name: impl Into<String>, value: Output) {
        self.outputs.insert(name.into(), value);
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    /// Implicit and explicit dependencies of one resource
    pub fn dependencies(&self, name: &str) -> Result<BTreeSet<String>, StackError> {
        let resource = self
            .resource(name)
            .ok_or_else(|| StackError::UnknownResource {
                resource: self.name.clone(),
                target: name.to_string(),
            })?;

        let mut deps: BTreeSet<String> = resource
            .references()?
            .into_iter()
            .map(|reference| reference.resource)
            .collect();
        deps.extend(resource.depends_on.iter().cloned());
        Ok(deps)
    }

    pub fn graph(&self) -> Result<DependencyGraph, StackError> {
        let graph = DependencyGraph::build(&self.resources)?;

        let declared: BTreeSet<&str> = self.resources.iter().map(|r| r.name.as_str()).collect();
        for (output, value) in &self.outputs {
            for reference in value.references() {
                if !declared.contains(reference.resource.as_str()) {
                    return Err(StackError::UnknownResource {
                        resource: output.clone(),
                        target: reference.resource,
                    });
                }
            }
        }

        Ok(graph)
    }

    /// Validate the graph and produce the desired-state document
    pub fn render(&self) -> Result<DesiredState, StackError> {
        let order = self.graph()?.order()?;

        let mut resources = Vec::with_capacity(order.len());
        for name in order {
            let Some(resource) = self.resource(&name) else {
                continue;
            };
            resources.push(DesiredResource {
                name: resource.name.clone(),
                type_token: resource.type_token().to_string(),
                depends_on: resource.depends_on.clone(),
                inputs: resource.inputs()?,
            });
        }

        Ok(DesiredState {
            project: self.project.clone(),
            stack: self.name.clone(),
            resources,
            outputs: self.outputs.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BucketArgs, CannedAcl, TopicArgs};

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut stack = Stack::new("site", "dev");
        stack
            .declare(Resource::new("logs", BucketArgs::new(CannedAcl::Private)))
            .unwrap();
        assert!(matches!(
            stack.declare(Resource::new("logs", BucketArgs::new(CannedAcl::Private))),
            Err(StackError::DuplicateResource(name)) if name == "logs"
        ));
    }

    #[test]
    fn test_dependencies_merge_references_and_explicit_entries() {
        let mut stack = Stack::new("site", "dev");
        assert_eq!(stack.project(), "site");

        let logs = stack
            .declare(Resource::new("logs", BucketArgs::new(CannedAcl::LogDeliveryWrite)))
            .unwrap();
        let topic = TopicArgs {
            delivery_policy: Default::default(),
        };
        stack.declare(Resource::new("topic", topic)).unwrap();
        stack
            .declare(
                Resource::new(
                    "site",
                    BucketArgs::new(CannedAcl::PublicRead).logging(logs.id(), "log/"),
                )
                .depends_on(["topic"]),
            )
            .unwrap();

        let deps = stack.dependencies("site").unwrap();
        assert_eq!(deps, BTreeSet::from(["logs".to_string(), "topic".to_string()]));
        assert!(stack.dependencies("logs").unwrap().is_empty());
        assert!(matches!(
            stack.dependencies("cdn"),
            Err(StackError::UnknownResource { target, .. }) if target == "cdn"
        ));
    }

    #[test]
    fn test_output_referencing_undeclared_resource_rejected() {
        let mut stack = Stack::new("site", "dev");
        stack.export("cdnURL", Output::attribute("cdn", "domainName"));
        assert!(matches!(
            stack.render(),
            Err(StackError::UnknownResource { target, .. }) if target == "cdn"
        ));
    }

    #[test]
    fn test_render_keeps_output_templates() {
        let mut stack = Stack::new("site", "dev");
        let bucket = stack
            .declare(Resource::new("site", BucketArgs::new(CannedAcl::PublicRead)))
            .unwrap();
        stack.export("siteArn", bucket.arn());

        let state = stack.render().unwrap();
        let rendered = serde_json::to_value(&state).unwrap();
        assert_eq!(rendered["outputs"]["siteArn"], "${site.arn}");
        assert_eq!(rendered["resources"][0]["type"], "aws:s3/bucket:Bucket");
        assert!(rendered["resources"][0].get("dependsOn").is_none());
    }
}
