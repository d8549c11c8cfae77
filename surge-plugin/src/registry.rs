//! Plugin registry keyed by `(name, platform)`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{PluginError, PluginResult};
use crate::types::{PluginDescriptor, PluginKey, Selector};

/// A plugin together with its registration metadata
pub struct RegisteredPlugin<P: ?Sized> {
    /// Registration-time metadata
    pub descriptor: PluginDescriptor,
    /// Shared plugin handle
    pub plugin: Arc<P>,
    /// Registration time
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

// Derive would require `P: Clone`, which trait objects never are
impl<P: ?Sized> Clone for RegisteredPlugin<P> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            plugin: Arc::clone(&self.plugin),
            registered_at: self.registered_at,
        }
    }
}

impl<P: ?Sized> std::fmt::Debug for RegisteredPlugin<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("descriptor", &self.descriptor)
            .field("registered_at", &self.registered_at)
            .finish_non_exhaustive()
    }
}

impl<P: ?Sized> RegisteredPlugin<P> {
    pub fn key(&self) -> PluginKey {
        self.descriptor.key()
    }

    pub fn order(&self) -> i32 {
        self.descriptor.order
    }
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of currently registered plugins
    pub total_plugins: usize,
    /// Number of hidden plugins among them
    pub hidden_plugins: usize,
    /// Total number of successful registrations
    pub total_registrations: u64,
    /// Total number of successful unregistrations
    pub total_unregistrations: u64,
    /// Number of rejected duplicate registrations
    pub rejected_duplicates: u64,
}

/// Explicit runtime registry of plugins of one kind
///
/// The registry is cheap to clone; clones share the same storage.
pub struct PluginRegistry<P: ?Sized + Send + Sync> {
    plugins: Arc<RwLock<BTreeMap<PluginKey, RegisteredPlugin<P>>>>,
    stats: Arc<RwLock<RegistryStats>>,
}

impl<P: ?Sized + Send + Sync> Clone for PluginRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            plugins: Arc::clone(&self.plugins),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<P: ?Sized + Send + Sync> Default for PluginRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized + Send + Sync> PluginRegistry<P> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            plugins: Arc::new(RwLock::new(BTreeMap::new())),
            stats: Arc::new(RwLock::new(RegistryStats::default())),
        }
    }

    /// Register a plugin under the descriptor's `(name, platform)`
    pub async fn register(&self, descriptor: PluginDescriptor, plugin: Arc<P>) -> PluginResult<()> {
        let key = descriptor.key();

        if key.name.is_empty() {
            return Err(PluginError::invalid_selector(
                key.to_string(),
                "plugin name is empty",
            ));
        }

        let hidden = descriptor.hidden;
        {
            let mut plugins = self.plugins.write().await;
            if plugins.contains_key(&key) {
                drop(plugins);
                self.stats.write().await.rejected_duplicates += 1;
                return Err(PluginError::DuplicatePlugin {
                    name: key.name,
                    platform: key.platform,
                });
            }

            plugins.insert(
                key.clone(),
                RegisteredPlugin {
                    descriptor,
                    plugin,
                    registered_at: chrono::Utc::now(),
                },
            );
        }

        // Update stats
        {
            let mut stats = self.stats.write().await;
            stats.total_plugins += 1;
            stats.total_registrations += 1;
            if hidden {
                stats.hidden_plugins += 1;
            }
        }

        tracing::info!(
            target: "plugin_registry",
            plugin = %key,
            hidden,
            "Plugin registered"
        );

        Ok(())
    }

    /// Remove a registration
    ///
    /// Unregistering a key that is not present fails with `PluginNotFound`,
    /// so a second unregistration of the same key is an error.
    pub async fn unregister(&self, key: &PluginKey) -> PluginResult<RegisteredPlugin<P>> {
        let removed = {
            let mut plugins = self.plugins.write().await;
            plugins.remove(key)
        };

        let Some(removed) = removed else {
            return Err(PluginError::not_found(&key.name, &key.platform));
        };

        {
            let mut stats = self.stats.write().await;
            stats.total_plugins = stats.total_plugins.saturating_sub(1);
            stats.total_unregistrations += 1;
            if removed.descriptor.hidden {
                stats.hidden_plugins = stats.hidden_plugins.saturating_sub(1);
            }
        }

        tracing::info!(
            target: "plugin_registry",
            plugin = %key,
            "Plugin unregistered"
        );

        Ok(removed)
    }

    /// Exact lookup by name and platform
    pub async fn lookup(&self, name: &str, platform: &str) -> PluginResult<RegisteredPlugin<P>> {
        let plugins = self.plugins.read().await;
        plugins
            .get(&PluginKey::new(name, platform))
            .cloned()
            .ok_or_else(|| PluginError::not_found(name, platform))
    }

    /// Resolve a parsed selector
    ///
    /// An explicit platform must match exactly. A bare name resolves to the
    /// default platform first, then to the only registration of that name on
    /// any other platform.
    pub async fn resolve(&self, selector: &Selector) -> PluginResult<RegisteredPlugin<P>> {
        let key = selector.key();
        let plugins = self.plugins.read().await;

        if let Some(found) = plugins.get(&key) {
            return Ok(found.clone());
        }

        if selector.has_explicit_platform() {
            return Err(PluginError::not_found(key.name, key.platform));
        }

        let mut candidates = plugins
            .iter()
            .filter(|(k, _)| k.name == selector.name)
            .map(|(_, registered)| registered);

        match (candidates.next(), candidates.next()) {
            (Some(only), None) => {
                tracing::debug!(
                    target: "plugin_registry",
                    selector = %selector,
                    plugin = %only.key(),
                    "Resolved bare selector to non-default platform"
                );
                Ok(only.clone())
            }
            (None, _) => Err(PluginError::not_found(key.name, key.platform)),
            (Some(_), Some(_)) => Err(PluginError::MultipleMatches {
                name: selector.name.clone(),
                platforms: plugins
                    .keys()
                    .filter(|k| k.name == selector.name)
                    .map(|k| k.platform.clone())
                    .collect(),
            }),
        }
    }

    /// Parse and resolve a selector string
    pub async fn resolve_str(&self, selector: &str) -> PluginResult<RegisteredPlugin<P>> {
        let selector = Selector::parse(selector)?;
        self.resolve(&selector).await
    }

    /// List registrations, ordered by `(name, platform)`
    pub async fn list_all(
        &self,
        name: Option<&str>,
        platform: Option<&str>,
        include_hidden: bool,
    ) -> Vec<RegisteredPlugin<P>> {
        let plugins = self.plugins.read().await;
        plugins
            .values()
            .filter(|registered| name.is_none_or(|n| registered.descriptor.name == n))
            .filter(|registered| platform.is_none_or(|p| registered.descriptor.platform == p))
            .filter(|registered| include_hidden || !registered.descriptor.hidden)
            .cloned()
            .collect()
    }

    pub async fn contains(&self, key: &PluginKey) -> bool {
        self.plugins.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.plugins.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plugins.read().await.is_empty()
    }

    /// Get registry statistics
    pub async fn get_stats(&self) -> RegistryStats {
        self.stats.read().await.clone()
    }
}
