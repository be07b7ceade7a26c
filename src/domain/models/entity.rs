//! Identity of cached entities and the typed hydration step.
//!
//! Response payloads are never copied field-by-field onto loose objects.
//! Every payload goes through [`hydrate`], which deserializes it into one of
//! the typed records and rejects fields the record does not declare.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

use super::{AlwaysOnTask, Category, Console, ScheduledTask, WebApp};
use crate::domain::errors::{ClientError, ClientResult};

/// Stable identifier of a remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric id (consoles, tasks)
    Int(u64),
    /// Name-based id (webapps are keyed by domain name)
    Name(String),
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for EntityId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for EntityId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A value the cache can store: it must expose a stable identifier.
pub trait Cacheable: Clone + Send + Sync + 'static {
    /// Identifier the value is keyed by inside its category store.
    fn cache_id(&self) -> EntityId;
}

/// A typed record hydrated from an API payload.
pub trait Record: Cacheable + DeserializeOwned + Into<Entity> {
    /// Cache category records of this type live in.
    const CATEGORY: Category;

    /// Extract the record back out of the cache's entity union.
    fn from_entity(entity: Entity) -> Option<Self>;
}

/// Union of every record type, used as the cache value type of a client session.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A console
    Console(Console),
    /// A scheduled task
    ScheduledTask(ScheduledTask),
    /// An always-on task
    AlwaysOnTask(AlwaysOnTask),
    /// A webapp
    WebApp(WebApp),
}

impl Entity {
    /// Category this entity belongs to.
    pub const fn category(&self) -> Category {
        match self {
            Self::Console(_) => Category::Console,
            Self::ScheduledTask(_) => Category::ScheduledTask,
            Self::AlwaysOnTask(_) => Category::AlwaysOnTask,
            Self::WebApp(_) => Category::WebApp,
        }
    }
}

impl Cacheable for Entity {
    fn cache_id(&self) -> EntityId {
        match self {
            Self::Console(console) => console.cache_id(),
            Self::ScheduledTask(task) => task.cache_id(),
            Self::AlwaysOnTask(task) => task.cache_id(),
            Self::WebApp(webapp) => webapp.cache_id(),
        }
    }
}

macro_rules! impl_record {
    ($record:ident, $category:expr) => {
        impl From<$record> for Entity {
            fn from(record: $record) -> Self {
                Self::$record(record)
            }
        }

        impl Record for $record {
            const CATEGORY: Category = $category;

            fn from_entity(entity: Entity) -> Option<Self> {
                match entity {
                    Entity::$record(record) => Some(record),
                    _ => None,
                }
            }
        }
    };
}

impl_record!(Console, Category::Console);
impl_record!(ScheduledTask, Category::ScheduledTask);
impl_record!(AlwaysOnTask, Category::AlwaysOnTask);
impl_record!(WebApp, Category::WebApp);

/// Deserialize an API payload into a typed record.
///
/// Unknown fields are rejected by the records themselves; the rejection is
/// logged here so schema drift on the remote side shows up in the logs.
pub fn hydrate<T: DeserializeOwned>(payload: Value) -> ClientResult<T> {
    serde_json::from_value(payload).map_err(|err| {
        if err.to_string().contains("unknown field") {
            warn!(
                record = std::any::type_name::<T>(),
                error = %err,
                "payload carries fields the record does not declare"
            );
        }
        ClientError::Hydration(err)
    })
}
