//! Startup wiring
//!
//! Builds the tool registry from configuration: enabled built-ins first, then
//! every configured provider, spawned and discovered concurrently and
//! registered in config order.

use crate::application::builtin::builtin;
use crate::application::tooling::{
    ProviderClient, RegistryError, ToolError, ToolRegistry, ToolSource,
};
use crate::config::AppConfig;
use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info, warn};

/// A provider left out of the registry and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedProvider {
    pub name: String,
    pub reason: String,
}

pub struct StartupReport {
    pub registry: ToolRegistry,
    /// Providers whose tools were registered, in config order.
    pub started: Vec<String>,
    pub excluded: Vec<ExcludedProvider>,
}

impl StartupReport {
    pub fn has_exclusions(&self) -> bool {
        !self.excluded.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("required provider '{provider}' failed to start: {source}")]
    RequiredProvider {
        provider: String,
        #[source]
        source: ToolError,
    },
}

impl StartupError {
    pub fn user_message(&self) -> String {
        match self {
            StartupError::Registry(RegistryError::NameCollision {
                tool,
                incoming,
                owner,
            }) => format!(
                "Tool \"{tool}\" is offered by both {owner} and {incoming}. Remove one of them from the configuration."
            ),
            StartupError::Registry(err) => err.to_string(),
            StartupError::RequiredProvider { provider, source } => format!(
                "Required tool provider \"{provider}\" could not start: {}",
                source.user_message()
            ),
        }
    }
}

/// Register built-ins and start every configured provider.
///
/// Providers that fail to spawn or to complete their handshake are excluded
/// and listed in the report, unless marked `required`. Any fatal error closes
/// every provider started so far before it is returned.
pub async fn build_registry(config: &AppConfig) -> Result<StartupReport, StartupError> {
    let mut registry = ToolRegistry::with_strictness(config.agent.strictness);

    for name in &config.tools.builtin {
        match builtin(name) {
            Some(tool) => {
                registry.register(ToolSource::Local(tool))?;
            }
            None => warn!(tool = name.as_str(), "Unknown built-in tool skipped"),
        }
    }

    info!(
        providers = config.providers.len(),
        "Starting tool providers"
    );
    let attempts = join_all(config.providers.iter().cloned().map(|provider| async move {
        let name = provider.name.clone();
        let required = provider.required;
        let result = ProviderClient::connect(provider).await;
        (name, required, result)
    }))
    .await;

    let mut connected: Vec<ProviderClient> = Vec::new();
    let mut excluded = Vec::new();
    let mut fatal: Option<StartupError> = None;
    for (name, required, result) in attempts {
        match result {
            Ok(client) => connected.push(client),
            Err(source) if required => {
                error!(provider = name.as_str(), error = %source, "Required tool provider failed to start");
                if fatal.is_none() {
                    fatal = Some(StartupError::RequiredProvider {
                        provider: name,
                        source,
                    });
                }
            }
            Err(source) => {
                warn!(provider = name.as_str(), error = %source, "Tool provider excluded");
                excluded.push(ExcludedProvider {
                    name,
                    reason: source.to_string(),
                });
            }
        }
    }

    if let Some(err) = fatal {
        close_all(&connected).await;
        return Err(err);
    }

    let mut started = Vec::with_capacity(connected.len());
    for client in &connected {
        if let Err(err) = registry.register(ToolSource::Remote(client.clone())) {
            error!(provider = client.name(), error = %err, "Tool provider registration failed");
            close_all(&connected).await;
            return Err(err.into());
        }
        started.push(client.name().to_string());
    }

    info!(
        tools = registry.len(),
        started = started.len(),
        excluded = excluded.len(),
        "Tool registry ready"
    );
    Ok(StartupReport {
        registry,
        started,
        excluded,
    })
}

async fn close_all(clients: &[ProviderClient]) {
    join_all(clients.iter().map(|client| client.close())).await;
}
