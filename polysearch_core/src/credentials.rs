//! Credential resolution and the capability registry.
//!
//! Credentials are read once per call into a [`Credentials`] snapshot; every
//! "is this engine usable" question is answered from that snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth_store::AuthStore;
use crate::engines::{EngineId, Provider};
use crate::error::SearchError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    keys: HashMap<Provider, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Blank values are ignored.
    pub fn with(mut self, provider: Provider, key: impl Into<String>) -> Self {
        self.set(provider, key);
        self
    }

    pub fn set(&mut self, provider: Provider, key: impl Into<String>) {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            self.keys.remove(&provider);
        } else {
            self.keys.insert(provider, trimmed.to_string());
        }
    }

    /// Resolve every provider through `lookup(env_var_name)`.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut creds = Self::new();
        for provider in Provider::ALL {
            if let Some(value) = lookup(provider.env_var()) {
                creds.set(provider, value);
            }
        }
        creds
    }

    /// Environment first, then the credential store.
    pub fn resolve(store: Option<&dyn AuthStore>) -> Self {
        Self::from_lookup(|var| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| store.and_then(|s| s.load(var)))
        })
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    pub fn has(&self, provider: Provider) -> bool {
        self.keys.contains_key(&provider)
    }

    /// The key for `provider`, or the "API key not configured" error.
    pub fn require(&self, provider: Provider) -> Result<&str, SearchError> {
        self.get(provider).ok_or(SearchError::MissingCredential {
            provider: provider.display_name(),
        })
    }

    pub fn is_engine_enabled(&self, engine: EngineId) -> bool {
        self.has(engine.provider())
    }

    /// Enabled engines in canonical order.
    pub fn enabled_engines(&self) -> Vec<EngineId> {
        EngineId::ALL
            .into_iter()
            .filter(|id| self.is_engine_enabled(*id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Where the dispatcher gets its per-call credential snapshot.
pub trait CredentialSource: Send + Sync {
    fn snapshot(&self) -> Credentials;
}

impl CredentialSource for Credentials {
    fn snapshot(&self) -> Credentials {
        self.clone()
    }
}

/// Reads the process environment on every snapshot, falling back to a store.
#[derive(Clone, Default)]
pub struct EnvCredentials {
    store: Option<Arc<dyn AuthStore>>,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: Arc<dyn AuthStore>) -> Self {
        Self { store: Some(store) }
    }
}

impl CredentialSource for EnvCredentials {
    fn snapshot(&self) -> Credentials {
        Credentials::resolve(self.store.as_deref())
    }
}
