use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity category the cache partitions its stores by.
///
/// The set is closed: a coordinator registers a subset of these at
/// construction and never grows afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Interactive consoles
    Console,
    /// Scheduled (cron-like) tasks
    ScheduledTask,
    /// Always-on tasks
    AlwaysOnTask,
    /// Web applications, keyed by domain name
    #[serde(rename = "webapp")]
    WebApp,
}

impl Category {
    /// Every category, in registration order.
    pub const ALL: [Self; 4] = [
        Self::Console,
        Self::ScheduledTask,
        Self::AlwaysOnTask,
        Self::WebApp,
    ];

    /// Stable string identifier used in config files and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::ScheduledTask => "scheduled-task",
            Self::AlwaysOnTask => "always-on-task",
            Self::WebApp => "webapp",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("Invalid category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("sched_task".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_matches_display() {
        let json = serde_json::to_string(&Category::ScheduledTask).unwrap();
        assert_eq!(json, "\"scheduled-task\"");
        let webapp: Category = serde_json::from_str("\"webapp\"").unwrap();
        assert_eq!(webapp, Category::WebApp);
    }
}
