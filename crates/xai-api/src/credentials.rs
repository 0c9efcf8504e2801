//! API key resolution.
//!
//! An explicit key always wins. When none is given, a [`CredentialResolver`]
//! supplies the fallback — by default the `XAI_API_KEY` environment variable.
//! The resolver is injectable so tests never mutate the process environment.

use xai_types::ConfigError;

/// Environment variable consulted by the default resolver.
pub const API_KEY_ENV_VAR: &str = "XAI_API_KEY";

/// Source of an API key when none is passed explicitly.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self) -> Option<String>;
}

/// Reads the key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new() -> Self {
        Self::with_var(API_KEY_ENV_VAR)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver for EnvCredential {
    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|v| !v.is_empty())
    }
}

/// A fixed key, or a deliberate absence of one. Mainly for tests.
#[derive(Debug, Clone)]
pub struct StaticCredential(pub Option<String>);

impl CredentialResolver for StaticCredential {
    fn resolve(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolve the key to use: explicit argument first, then the resolver.
///
/// An empty explicit key counts as absent. Failure to resolve is a
/// construction-time error; no request carrying a known-bad credential is
/// ever sent.
pub fn resolve_api_key(
    explicit: Option<String>,
    resolver: &dyn CredentialResolver,
) -> Result<String, ConfigError> {
    explicit
        .filter(|k| !k.is_empty())
        .or_else(|| resolver.resolve())
        .ok_or_else(|| ConfigError::MissingApiKey {
            var: API_KEY_ENV_VAR.into(),
        })
}
