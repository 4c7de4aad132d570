// Loader configuration.
// Repository coordinate, branch, credential, path prefix, TTL and source mode,
// plus partial runtime updates and environment bootstrap.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplateError};
use crate::types::CollectionType;

/// Default cache TTL: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PATH_PREFIX: &str = "templates";

/// Where templates are loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMode {
    #[default]
    Remote,
    #[serde(alias = "local")]
    LocalOnly,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Remote => "remote",
            SourceMode::LocalOnly => "local-only",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceMode {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" | "github" => Ok(SourceMode::Remote),
            "local" | "local-only" => Ok(SourceMode::LocalOnly),
            other => Err(TemplateError::InvalidConfig(format!(
                "unknown source mode '{}'",
                other
            ))),
        }
    }
}

/// Repository coordinate in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinate {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let coordinate = Self {
            owner: owner.into(),
            name: name.into(),
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    fn validate(&self) -> Result<()> {
        for part in [&self.owner, &self.name] {
            if part.trim().is_empty() || part.contains('/') || part.contains(char::is_whitespace)
            {
                return Err(TemplateError::InvalidConfig(format!(
                    "invalid repository coordinate '{}'",
                    self
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoCoordinate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, name)) => RepoCoordinate::new(owner, name),
            None => Err(TemplateError::InvalidConfig(format!(
                "repository must be 'owner/name', got '{}'",
                s
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for RepoCoordinate {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// API token. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Everything a remote fetcher needs for one request.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub repository: RepoCoordinate,
    pub branch: String,
    pub credential: Option<Credential>,
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub repository: RepoCoordinate,
    pub branch: String,
    pub credential: Option<Credential>,
    /// Repository-internal directory holding `steps/` and `workflows/`.
    pub path_prefix: String,
    pub cache_ttl: Duration,
    pub source: SourceMode,
}

impl Config {
    /// Create a configuration for a repository with default settings.
    pub fn new(repository: RepoCoordinate) -> Self {
        Self {
            repository,
            branch: DEFAULT_BRANCH.to_string(),
            credential: None,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            cache_ttl: DEFAULT_TTL,
            source: SourceMode::Remote,
        }
    }

    /// Build a configuration from `TEMPLATES_*` and `GITHUB_TOKEN` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let repository: RepoCoordinate = lookup("TEMPLATES_REPO")
            .ok_or_else(|| TemplateError::MissingEnv("TEMPLATES_REPO".to_string()))?
            .parse()?;

        let cache_ttl_secs = lookup("TEMPLATES_CACHE_TTL")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    TemplateError::InvalidConfig(format!(
                        "TEMPLATES_CACHE_TTL '{}' is not a number",
                        raw
                    ))
                })
            })
            .transpose()?;

        let update = ConfigUpdate {
            repository: None,
            branch: lookup("TEMPLATES_BRANCH"),
            credential: lookup("GITHUB_TOKEN")
                .filter(|t| !t.is_empty())
                .map(Credential::new),
            path_prefix: lookup("TEMPLATES_PATH"),
            cache_ttl_secs,
            source: lookup("TEMPLATES_SOURCE").map(|s| s.parse()).transpose()?,
        };

        let mut config = Config::new(repository);
        config.apply(update)?;
        Ok(config)
    }

    /// Remote coordinates for the fetcher.
    pub fn remote_target(&self) -> RemoteTarget {
        RemoteTarget {
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            credential: self.credential.clone(),
        }
    }

    /// Repository path of a collection directory, e.g. `templates/steps`.
    pub fn collection_path(&self, kind: CollectionType) -> String {
        let prefix = self.path_prefix.trim_matches('/');
        if prefix.is_empty() {
            kind.as_str().to_string()
        } else {
            format!("{}/{}", prefix, kind.as_str())
        }
    }

    /// Human-readable description of the active source.
    pub fn describe_source(&self) -> String {
        match self.source {
            SourceMode::Remote => format!(
                "github:{}@{}/{}",
                self.repository,
                self.branch,
                self.path_prefix.trim_matches('/')
            ),
            SourceMode::LocalOnly => "bundled".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.repository.validate()?;
        if self.branch.trim().is_empty() {
            return Err(TemplateError::InvalidConfig("branch must not be empty".into()));
        }
        if self
            .path_prefix
            .split('/')
            .any(|segment| segment == "..")
        {
            return Err(TemplateError::InvalidConfig(format!(
                "path prefix '{}' must not contain '..'",
                self.path_prefix
            )));
        }
        Ok(())
    }

    /// Overlay the provided fields, leaving unset ones untouched.
    ///
    /// The result is validated before it replaces `self`.
    pub fn apply(&mut self, update: ConfigUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(repository) = update.repository {
            next.repository = repository;
        }
        if let Some(branch) = update.branch {
            next.branch = branch;
        }
        if let Some(credential) = update.credential {
            next.credential = Some(credential);
        }
        if let Some(prefix) = update.path_prefix {
            next.path_prefix = prefix;
        }
        if let Some(secs) = update.cache_ttl_secs {
            next.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(source) = update.source {
            next.source = source;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial configuration used by runtime reconfiguration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigUpdate {
    pub repository: Option<RepoCoordinate>,
    pub branch: Option<String>,
    pub credential: Option<Credential>,
    pub path_prefix: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub source: Option<SourceMode>,
}

impl ConfigUpdate {
    pub fn source(source: SourceMode) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }
}
