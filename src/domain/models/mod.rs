pub mod always_on_task;
pub mod category;
pub mod config;
pub mod console;
pub mod entity;
pub mod scheduled_task;
pub mod webapp;

pub use always_on_task::AlwaysOnTask;
pub use category::Category;
pub use config::{
    CacheConfig, ClientConfig, LimiterConfig, LogFormat, LoggingConfig, Region, RotationPolicy,
};
pub use console::Console;
pub use entity::{hydrate, Cacheable, Entity, EntityId, Record};
pub use scheduled_task::{NewScheduledTask, ScheduledTask, ScheduledTaskUpdate, TaskInterval};
pub use webapp::{WebApp, WebAppUpdate};
