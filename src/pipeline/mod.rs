//! The daily news pipeline: summarize, collect engagement, select, render.
//!
//! Every stage is a function over `Vec<Article>`; the binaries only decide where the
//! input comes from and where the output goes, using [`PipelinePaths`].

pub mod engagement;
pub mod newsletter;
pub mod overlap;
pub mod select;
pub mod summarize;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::article::load_json;
use crate::config::PipelineConfig;
use crate::TARGET_PIPELINE;

const STAMP_FORMAT: &str = "%m_%d_%Y";

/// The UTC day a pipeline run belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayStamp(NaiveDate);

impl DayStamp {
    pub fn today_utc() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses the `MM_DD_YYYY` form used in file names.
    pub fn parse(stamp: &str) -> Result<Self> {
        NaiveDate::parse_from_str(stamp, STAMP_FORMAT)
            .map(Self)
            .map_err(|e| anyhow!("Invalid date stamp '{}' (expected MM_DD_YYYY): {}", stamp, e))
    }

    /// `MM/DD/YYYY`, for headings.
    pub fn display_slashed(&self) -> String {
        self.0.format("%m/%d/%Y").to_string()
    }
}

impl fmt::Display for DayStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STAMP_FORMAT))
    }
}

/// File locations for one day's run.
#[derive(Clone, Debug)]
pub struct PipelinePaths {
    pub dir: PathBuf,
    pub day: DayStamp,
}

impl PipelinePaths {
    pub fn new(dir: impl Into<PathBuf>, day: DayStamp) -> Self {
        Self {
            dir: dir.into(),
            day,
        }
    }

    pub fn source_articles(&self, source: &str) -> PathBuf {
        self.dir
            .join(format!("{}_articles_24h_{}.json", source, self.day))
    }

    pub fn summary_json(&self) -> PathBuf {
        self.dir.join(format!("summary_combined_{}.json", self.day))
    }

    pub fn summary_markdown(&self) -> PathBuf {
        self.dir.join(format!("summary_combined_{}.md", self.day))
    }

    pub fn engagement_json(&self) -> PathBuf {
        self.dir
            .join(format!("summary_with_twitter_{}.json", self.day))
    }

    pub fn top_articles_json(&self) -> PathBuf {
        self.dir
            .join(format!("top_10_unique_articles_{}.json", self.day))
    }

    pub fn newsletter_markdown(&self) -> PathBuf {
        self.dir.join(format!("newsletter_{}.md", self.day))
    }
}

/// Loads a stage input, or logs and returns `None` when the file is missing.
///
/// A missing input is an expected condition (an earlier stage has not run yet), not a
/// failure of this stage.
pub fn load_stage_input<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        error!(target: TARGET_PIPELINE, "File not found: {}", path.display());
        return Ok(None);
    }
    load_json(path).map(Some)
}

/// Flags every pipeline binary accepts.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct DayArgs {
    /// Day to process as MM_DD_YYYY (defaults to today, UTC)
    #[arg(long)]
    pub date: Option<String>,

    /// Directory holding the stage files (defaults to DAYBOOK_DATA_DIR or .)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl DayArgs {
    pub fn paths(&self, config: &PipelineConfig) -> Result<PipelinePaths> {
        let day = match &self.date {
            Some(stamp) => DayStamp::parse(stamp)?,
            None => DayStamp::today_utc(),
        };
        let dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config.data_dir.clone());
        Ok(PipelinePaths::new(dir, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{save_json, Article};

    #[test]
    fn test_day_stamp() {
        let day = DayStamp::parse("05_22_2025").unwrap();
        assert_eq!(day.to_string(), "05_22_2025");
        assert_eq!(day.display_slashed(), "05/22/2025");
        assert!(DayStamp::parse("2025-05-22").is_err());
    }

    #[test]
    fn test_paths() {
        let paths = PipelinePaths::new("/data", DayStamp::parse("01_02_2026").unwrap());
        assert_eq!(
            paths.source_articles("Decrypt"),
            PathBuf::from("/data/Decrypt_articles_24h_01_02_2026.json")
        );
        assert_eq!(
            paths.summary_json(),
            PathBuf::from("/data/summary_combined_01_02_2026.json")
        );
        assert_eq!(
            paths.engagement_json(),
            PathBuf::from("/data/summary_with_twitter_01_02_2026.json")
        );
        assert_eq!(
            paths.top_articles_json(),
            PathBuf::from("/data/top_10_unique_articles_01_02_2026.json")
        );
        assert_eq!(
            paths.newsletter_markdown(),
            PathBuf::from("/data/newsletter_01_02_2026.md")
        );
    }

    #[test]
    fn test_load_stage_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(load_stage_input::<Article>(&missing).unwrap().is_none());

        let present = dir.path().join("present.json");
        save_json(&present, &[Article::default()]).unwrap();
        assert_eq!(load_stage_input::<Article>(&present).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_day_args_override_config() {
        let config = PipelineConfig::default();
        let args = DayArgs {
            date: Some("12_31_2025".into()),
            data_dir: Some(PathBuf::from("/tmp/brief")),
        };
        let paths = args.paths(&config).unwrap();
        assert_eq!(paths.dir, PathBuf::from("/tmp/brief"));
        assert_eq!(paths.day.to_string(), "12_31_2025");

        let paths = DayArgs::default().paths(&config).unwrap();
        assert_eq!(paths.dir, PathBuf::from("."));
        assert!(DayArgs {
            date: Some("31-12-2025".into()),
            data_dir: None
        }
        .paths(&config)
        .is_err());
    }
}
