use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity::{Cacheable, EntityId};

/// A hosted web application. Keyed by its domain name, not its numeric id,
/// because every webapp endpoint addresses it by domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebApp {
    /// Numeric id
    pub id: u64,
    /// Owning username
    pub user: String,
    /// Domain the app is served on
    pub domain_name: String,
    /// Python version identifier (e.g. `3.10`)
    pub python_version: String,
    /// Source directory
    #[serde(default)]
    pub source_directory: Option<String>,
    /// Working directory
    #[serde(default)]
    pub working_directory: Option<String>,
    /// Virtualenv path
    #[serde(default)]
    pub virtualenv_path: Option<String>,
    /// Date the app is disabled unless extended (free accounts)
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    /// Whether plain HTTP is redirected to HTTPS
    #[serde(default)]
    pub force_https: bool,
}

/// Body of a webapp configuration change. Takes effect after a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebAppUpdate {
    /// Python version identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    /// Source directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<String>,
    /// Virtualenv path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtualenv_path: Option<String>,
    /// Redirect plain HTTP to HTTPS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_https: Option<bool>,
}

impl Cacheable for WebApp {
    fn cache_id(&self) -> EntityId {
        EntityId::Name(self.domain_name.clone())
    }
}
