use serde::{Deserialize, Serialize};

use super::entity::{Cacheable, EntityId};

/// A long-running command the platform keeps alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlwaysOnTask {
    /// Task id
    pub id: u64,
    /// API path of the task
    pub url: String,
    /// Owning username
    pub user: String,
    /// Command to keep running
    pub command: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Whether the task is enabled
    pub enabled: bool,
    /// Last reported process state (e.g. `running`, `starting`)
    #[serde(default)]
    pub state: Option<String>,
}

impl Cacheable for AlwaysOnTask {
    fn cache_id(&self) -> EntityId {
        EntityId::Int(self.id)
    }
}
