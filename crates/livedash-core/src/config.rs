//! Dashboard configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! command-line flags. Missing keys fall back to the `add` dialect defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cartesian::DEFAULT_MAX_VISIBLE;
use crate::error::{DashError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_POLL_PATH: &str = "temperature/";
pub const DEFAULT_MUTATE_PATH: &str = "modifyData/";

/// Server dialects seen in the wild. They differ only in the mutation tag
/// and the auto-poll period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Add,
    Modify,
}

impl Dialect {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "add" => Some(Self::Add),
            "modify" => Some(Self::Modify),
            _ => None,
        }
    }

    pub fn operation(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
        }
    }

    pub fn poll_interval_secs(self) -> u64 {
        match self {
            Self::Add => 5,
            Self::Modify => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub base_url: String,
    pub poll_path: String,
    pub mutate_path: String,
    pub operation: String,
    pub poll_interval_secs: u64,
    pub max_visible: usize,
    pub graph_width: f64,
    pub graph_height: f64,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self::for_dialect(Dialect::default())
    }
}

impl DashConfig {
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_path: DEFAULT_POLL_PATH.to_string(),
            mutate_path: DEFAULT_MUTATE_PATH.to_string(),
            operation: dialect.operation().to_string(),
            poll_interval_secs: dialect.poll_interval_secs(),
            max_visible: DEFAULT_MAX_VISIBLE,
            graph_width: 300.0,
            graph_height: 200.0,
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DashError::Config(e.to_string()))?;
        config.validate()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DashError::Config(e.to_string()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Switch operation tag and interval together.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.operation = dialect.operation().to_string();
        self.poll_interval_secs = dialect.poll_interval_secs();
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_url(&self) -> String {
        join_url(&self.base_url, &self.poll_path)
    }

    pub fn mutate_url(&self) -> String {
        join_url(&self.base_url, &self.mutate_path)
    }

    fn validate(self) -> Result<Self> {
        if self.base_url.trim().is_empty() {
            return Err(DashError::Config("base_url must not be empty".into()));
        }
        if self.operation.trim().is_empty() {
            return Err(DashError::Config("operation must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(DashError::Config("poll_interval_secs must be at least 1".into()));
        }
        if self.max_visible == 0 {
            return Err(DashError::Config("max_visible must be at least 1".into()));
        }
        if !(self.graph_width > 0.0 && self.graph_height > 0.0) {
            return Err(DashError::Config("graph size must be positive".into()));
        }
        Ok(self)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
