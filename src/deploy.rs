//! Apply driver: hands declared resources to a provider in dependency order.

use crate::provider::Provider;
use crate::stack::Stack;
use crate::types::{ApplyError, ApplyResult, Attributes, StackError};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Create every resource of `stack` through `provider`.
///
/// A resource starts as soon as all of its dependencies have been created,
/// so independent resources are created concurrently. Inputs are resolved
/// against the attributes of already created resources right before each
/// creation. After the first failure nothing new is started; creations
/// already in flight are awaited and reported in [`ApplyError::created`].
pub async fn apply(stack: &Stack, provider: Arc<dyn Provider>) -> Result<ApplyResult, ApplyError> {
    let graph = stack.graph()?;
    let order = graph.order()?;

    tracing::info!(
        "Applying stack '{}' ({} resources)",
        stack.name(),
        order.len()
    );

    let mut created: BTreeMap<String, Attributes> = BTreeMap::new();
    let mut waiting: BTreeMap<String, usize> = BTreeMap::new();
    let mut ready: VecDeque<String> = VecDeque::new();

    for name in &order {
        let count = graph.dependencies(name).map_or(0, |deps| deps.len());
        if count == 0 {
            ready.push_back(name.clone());
        } else {
            waiting.insert(name.clone(), count);
        }
    }

    let mut in_flight = FuturesUnordered::new();
    let mut failure: Option<StackError> = None;

    loop {
        while failure.is_none()
            && let Some(name) = ready.pop_front()
        {
            let Some(resource) = stack.resource(&name) else {
                continue;
            };
            match resource.resolve(&created) {
                Ok(kind) => {
                    tracing::debug!("Starting {} '{}'", kind.type_token(), name);
                    let provider = Arc::clone(&provider);
                    in_flight.push(async move {
                        let result = provider.create(&name, &kind).await;
                        (name, result)
                    });
                }
                Err(e) => failure = Some(e),
            }
        }

        let Some((name, result)) = in_flight.next().await else {
            break;
        };

        match result {
            Ok(attributes) => {
                for dependent in graph.dependents(&name) {
                    if let Some(count) = waiting.get_mut(dependent.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            waiting.remove(dependent.as_str());
                            ready.push_back(dependent.clone());
                        }
                    }
                }
                created.insert(name, attributes);
            }
            Err(e) => {
                tracing::error!("Failed to create '{}': {}", name, e);
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }
    }

    if let Some(source) = failure {
        return Err(ApplyError { created, source });
    }

    let mut outputs = BTreeMap::new();
    for (key, value) in stack.outputs() {
        match value.resolve(&created) {
            Ok(resolved) => {
                outputs.insert(key.clone(), resolved);
            }
            Err(source) => return Err(ApplyError { created, source }),
        }
    }

    tracing::info!(
        "Applied stack '{}': {} resources created",
        stack.name(),
        created.len()
    );

    Ok(ApplyResult {
        resources: created,
        outputs,
        completed_at: chrono::Utc::now(),
    })
}
