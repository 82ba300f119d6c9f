use super::descriptor::{LocalTool, ToolDescriptor};
use super::error::{RegistryError, ToolError};
use super::process::{ConnectionState, ProviderClient};
use super::schema::{Strictness, validate};
use crate::types::ToolSpec;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a group of tools comes from.
pub enum ToolSource {
    Local(Arc<dyn LocalTool>),
    /// A provider whose discovery has completed.
    Remote(ProviderClient),
}

impl ToolSource {
    pub fn label(&self) -> String {
        match self {
            ToolSource::Local(tool) => format!("local:{}", tool.name()),
            ToolSource::Remote(client) => client.name().to_string(),
        }
    }
}

/// Guidance a provider sent during its handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderGuidance {
    pub provider: String,
    pub instruction: String,
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    source: String,
}

/// Name-addressed dispatch table over every registered tool source.
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    providers: Vec<ProviderClient>,
    strictness: Strictness,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_strictness(Strictness::Open)
    }

    pub fn with_strictness(strictness: Strictness) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            providers: Vec::new(),
            strictness,
        }
    }

    /// Register every tool of `source`, or none of them.
    ///
    /// Returns the number of tools added. A name that is already taken, or
    /// that appears twice within the source, fails the whole source with
    /// [`RegistryError::NameCollision`]; the earlier registration stays.
    pub fn register(&mut self, source: ToolSource) -> Result<usize, RegistryError> {
        let label = source.label();
        let (descriptors, provider) = match source {
            ToolSource::Local(tool) => (vec![ToolDescriptor::from_local(tool)], None),
            ToolSource::Remote(client) => {
                let state = client.state();
                if state != ConnectionState::Ready {
                    return Err(RegistryError::ProviderNotReady {
                        provider: client.name().to_string(),
                        state,
                    });
                }
                (client.descriptors(), Some(client))
            }
        };

        let mut incoming = HashSet::new();
        for descriptor in &descriptors {
            let name = descriptor.name();
            if let Some(&existing) = self.index.get(name) {
                return Err(RegistryError::NameCollision {
                    tool: name.to_string(),
                    incoming: label,
                    owner: self.entries[existing].source.clone(),
                });
            }
            if !incoming.insert(name) {
                return Err(RegistryError::NameCollision {
                    tool: name.to_string(),
                    incoming: label.clone(),
                    owner: label,
                });
            }
        }

        let added = descriptors.len();
        for descriptor in descriptors {
            debug!(tool = descriptor.name(), source = %label, "Registered tool");
            self.index
                .insert(descriptor.name().to_string(), self.entries.len());
            self.entries.push(RegisteredTool {
                descriptor,
                source: label.clone(),
            });
        }
        if let Some(client) = provider {
            self.providers.push(client);
        }
        info!(source = %label, tools = added, "Registered tool source");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&idx| &self.entries[idx].descriptor)
    }

    /// Label of the source that registered `name`.
    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&idx| self.entries[idx].source.as_str())
    }

    /// Tool metadata in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.spec())
            .collect()
    }

    pub fn providers(&self) -> &[ProviderClient] {
        &self.providers
    }

    pub fn instructions(&self) -> Vec<ProviderGuidance> {
        self.providers
            .iter()
            .filter_map(|client| {
                client.instructions().map(|instruction| ProviderGuidance {
                    provider: client.name().to_string(),
                    instruction,
                })
            })
            .collect()
    }

    pub async fn dispatch(&self, name: &str, raw_args: Value) -> Result<String, ToolError> {
        self.dispatch_with(name, raw_args, self.strictness).await
    }

    /// Look up, validate, and invoke. Failures, panics included, come back as
    /// a [`ToolError`].
    pub async fn dispatch_with(
        &self,
        name: &str,
        raw_args: Value,
        strictness: Strictness,
    ) -> Result<String, ToolError> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = validate(descriptor, raw_args, strictness)?;

        match AssertUnwindSafe(descriptor.invoke(args)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(tool = name, panic = %message, "Tool panicked during invocation");
                Err(ToolError::execution(name, format!("tool panicked: {message}")))
            }
        }
    }

    /// Close every remote provider.
    pub async fn shutdown(&self) {
        futures::future::join_all(self.providers.iter().map(|client| client.close())).await;
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
