use serde::{Deserialize, Serialize};

use super::entity::{Cacheable, EntityId};

/// An interactive console on the remote account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Console {
    /// Console id
    pub id: u64,
    /// Owning username
    pub user: String,
    /// Executable the console runs (e.g. `python3.10`, `bash`)
    pub executable: String,
    /// Command-line arguments passed to the executable
    #[serde(default)]
    pub arguments: String,
    /// Working directory, if one was set at creation
    #[serde(default)]
    pub working_directory: Option<String>,
    /// Display name
    pub name: String,
    /// API path of the console, relative to `/api/v0`
    pub console_url: String,
    /// Path of the embeddable console frame
    pub console_frame_url: String,
}

impl Cacheable for Console {
    fn cache_id(&self) -> EntityId {
        EntityId::Int(self.id)
    }
}
