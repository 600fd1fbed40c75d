use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::report::aggregate::{DEFAULT_LINK_PREFIX, DEFAULT_SEPARATOR};

pub const DB_ENV: &str = "STATUSDECK_DB";
pub const TEMPLATE_ENV: &str = "STATUSDECK_TEMPLATE";
pub const OUTPUT_ENV: &str = "STATUSDECK_OUTPUT";
pub const SEED_ENV: &str = "STATUSDECK_SEED";
pub const LOCATION_ENV: &str = "STATUSDECK_LOCATION";
pub const COVER_MARKER_ENV: &str = "STATUSDECK_COVER_MARKER";
pub const SEPARATOR_ENV: &str = "STATUSDECK_SEPARATOR";
pub const LINK_PREFIX_ENV: &str = "STATUSDECK_LINK_PREFIX";
pub const SUMMARY_CHUNK_SIZE_ENV: &str = "STATUSDECK_SUMMARY_CHUNK_SIZE";
pub const CHUNK_SIZE_ENV: &str = "STATUSDECK_CHUNK_SIZE";
pub const TEACH_CHUNK_SIZE_ENV: &str = "STATUSDECK_TEACH_CHUNK_SIZE";
pub const PLAN_CHUNK_SIZE_ENV: &str = "STATUSDECK_PLAN_CHUNK_SIZE";
pub const LEARNINGS_CAP_ENV: &str = "STATUSDECK_LEARNINGS_CAP";
pub const INSIGHTS_CAP_ENV: &str = "STATUSDECK_INSIGHTS_CAP";

const DEFAULT_SUMMARY_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(3).unwrap();
const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(3).unwrap();
const DEFAULT_TEACH_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();
const DEFAULT_PLAN_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(3).unwrap();

/// Settings for one report run.
///
/// Built from [`ReportConfig::default`], then overridden by `STATUSDECK_*`
/// environment variables ([`ReportConfig::from_env`]) and finally by
/// command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// SQLite database holding the status records
    pub db: PathBuf,
    /// Template presentation
    pub template: PathBuf,
    /// Where the finished presentation is written
    pub output: PathBuf,
    /// Sampling seed; drawn at random and logged when absent
    pub seed: Option<u64>,
    /// Place name stamped on the cover slide
    pub location: String,
    /// Text identifying the cover shape to stamp
    pub cover_marker: String,
    pub separator: char,
    pub link_prefix: String,
    /// Project groups shown on the summary slide
    pub summary_chunk_size: NonZeroUsize,
    /// Project groups per slide in the project series
    pub chunk_size: NonZeroUsize,
    /// Support items per slide in the project series
    pub teach_chunk_size: NonZeroUsize,
    /// Plan groups per slide in the plan series
    pub plan_chunk_size: NonZeroUsize,
    pub learnings_cap: usize,
    pub insights_cap: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            db: PathBuf::from("db.sqlite3"),
            template: PathBuf::from("template.pptx"),
            output: PathBuf::from("status_report.pptx"),
            seed: None,
            location: "Auroville".to_string(),
            cover_marker: "Weekly status".to_string(),
            separator: DEFAULT_SEPARATOR,
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            summary_chunk_size: DEFAULT_SUMMARY_CHUNK_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            teach_chunk_size: DEFAULT_TEACH_CHUNK_SIZE,
            plan_chunk_size: DEFAULT_PLAN_CHUNK_SIZE,
            learnings_cap: 8,
            insights_cap: 5,
        }
    }
}

impl ReportConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Blank or unparsable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| read_non_empty(lookup(name));
        let size = |name: &str, default_value: NonZeroUsize| {
            read_parsed::<usize>(lookup(name))
                .and_then(NonZeroUsize::new)
                .unwrap_or(default_value)
        };

        Self {
            db: text(DB_ENV).map_or(defaults.db, PathBuf::from),
            template: text(TEMPLATE_ENV).map_or(defaults.template, PathBuf::from),
            output: text(OUTPUT_ENV).map_or(defaults.output, PathBuf::from),
            seed: read_parsed::<u64>(lookup(SEED_ENV)).or(defaults.seed),
            location: text(LOCATION_ENV).unwrap_or(defaults.location),
            cover_marker: text(COVER_MARKER_ENV).unwrap_or(defaults.cover_marker),
            separator: read_parsed::<char>(lookup(SEPARATOR_ENV)).unwrap_or(defaults.separator),
            link_prefix: text(LINK_PREFIX_ENV).unwrap_or(defaults.link_prefix),
            summary_chunk_size: size(SUMMARY_CHUNK_SIZE_ENV, defaults.summary_chunk_size),
            chunk_size: size(CHUNK_SIZE_ENV, defaults.chunk_size),
            teach_chunk_size: size(TEACH_CHUNK_SIZE_ENV, defaults.teach_chunk_size),
            plan_chunk_size: size(PLAN_CHUNK_SIZE_ENV, defaults.plan_chunk_size),
            learnings_cap: read_parsed::<usize>(lookup(LEARNINGS_CAP_ENV))
                .unwrap_or(defaults.learnings_cap),
            insights_cap: read_parsed::<usize>(lookup(INSIGHTS_CAP_ENV))
                .unwrap_or(defaults.insights_cap),
        }
    }
}

#[must_use]
fn read_non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
fn read_parsed<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|value| value.trim().parse::<T>().ok())
}
