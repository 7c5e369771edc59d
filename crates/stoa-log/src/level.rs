//! Severity levels and the priority orderings applied to them.
//!
//! Two orderings exist: the default one shared by the logger, console and
//! file transports, and the database ordering in which `http` outranks
//! everything else so that access logs are always persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A named severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Http,
    Verbose,
    Debug,
    Silly,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Http,
        Level::Verbose,
        Level::Debug,
        Level::Silly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Http => "http",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Silly => "silly",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LogError::Config(format!("unknown log level '{s}'")))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Silly,
        }
    }
}

// ---------------------------------------------------------------------------
// SeverityLevels
// ---------------------------------------------------------------------------

/// Ordered mapping from level to numeric priority.
///
/// Lower numbers are more significant. A level missing from the mapping is
/// never accepted by a threshold built on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityLevels {
    priorities: Vec<(Level, u8)>,
}

impl SeverityLevels {
    /// Build from explicit `(level, priority)` pairs.
    pub fn new(priorities: impl IntoIterator<Item = (Level, u8)>) -> Self {
        let mut priorities: Vec<(Level, u8)> = priorities.into_iter().collect();
        priorities.sort_by_key(|&(_, p)| p);
        Self { priorities }
    }

    /// Ordering used by the logger and the console/file transports.
    pub fn standard() -> Self {
        Self::new([
            (Level::Error, 0),
            (Level::Warn, 1),
            (Level::Info, 2),
            (Level::Http, 3),
            (Level::Verbose, 4),
            (Level::Debug, 5),
            (Level::Silly, 6),
        ])
    }

    /// Ordering used by the database transport.
    pub fn database() -> Self {
        Self::new([
            (Level::Http, 0),
            (Level::Info, 1),
            (Level::Error, 2),
            (Level::Debug, 3),
            (Level::Warn, 4),
        ])
    }

    pub fn priority(&self, level: Level) -> Option<u8> {
        self.priorities.iter().find(|(l, _)| *l == level).map(|&(_, p)| p)
    }

    /// Levels in priority order, most significant first.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.priorities.iter().map(|&(l, _)| l)
    }

    /// Whether `level` is at least as significant as `threshold`.
    pub fn allows(&self, level: Level, threshold: Level) -> bool {
        match (self.priority(level), self.priority(threshold)) {
            (Some(p), Some(t)) => p <= t,
            _ => false,
        }
    }
}

impl Default for SeverityLevels {
    fn default() -> Self {
        Self::standard()
    }
}

/// A minimum level bound to the ordering it is evaluated under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold {
    pub level: Level,
    pub levels: SeverityLevels,
}

impl Threshold {
    pub fn new(level: Level, levels: SeverityLevels) -> Self {
        Self { level, levels }
    }

    pub fn standard(level: Level) -> Self {
        Self::new(level, SeverityLevels::standard())
    }

    pub fn allows(&self, level: Level) -> bool {
        self.levels.allows(level, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("HTTP".parse::<Level>().unwrap(), Level::Http);
        assert_eq!(" warn ".parse::<Level>().unwrap(), Level::Warn);
        assert!("fatal".parse::<Level>().is_err());
    }

    #[test]
    fn standard_threshold() {
        let t = Threshold::standard(Level::Info);
        assert!(t.allows(Level::Error));
        assert!(t.allows(Level::Warn));
        assert!(t.allows(Level::Info));
        assert!(!t.allows(Level::Http));
        assert!(!t.allows(Level::Debug));
    }

    #[test]
    fn database_ordering_puts_http_first() {
        let levels = SeverityLevels::database();
        let order: Vec<Level> = levels.levels().collect();
        assert_eq!(order, vec![Level::Http, Level::Info, Level::Error, Level::Debug, Level::Warn]);

        // operation_logs sink: info threshold accepts http and info only.
        let op = Threshold::new(Level::Info, levels.clone());
        assert!(op.allows(Level::Http));
        assert!(op.allows(Level::Info));
        assert!(!op.allows(Level::Error));
        assert!(!op.allows(Level::Warn));

        // access_logs sink: http only.
        let access = Threshold::new(Level::Http, levels);
        assert!(access.allows(Level::Http));
        assert!(!access.allows(Level::Info));
    }

    #[test]
    fn unmapped_levels_are_rejected() {
        let t = Threshold::new(Level::Warn, SeverityLevels::database());
        assert!(!t.allows(Level::Verbose));
        assert!(!t.allows(Level::Silly));
    }

    #[test]
    fn tracing_levels_map() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Silly);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }
}
