// CSV reports, one file per run and day

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A row type with a fixed header and file prefix.
pub trait ReportRecord: Serialize {
    const COLUMNS: &'static [&'static str];
    const PREFIX: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiredDomain {
    #[serde(rename = "Domain")]
    pub domain: String,
}

impl ExpiredDomain {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl ReportRecord for ExpiredDomain {
    const COLUMNS: &'static [&'static str] = &["Domain"];
    const PREFIX: &'static str = "expired_domains";
}

/// An expired domain with its SEO signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedDomain {
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "PastUsage", serialize_with = "yes_no")]
    pub past_usage: bool,
    #[serde(rename = "BrandabilityScore")]
    pub brandability: u8,
    #[serde(rename = "Backlinks")]
    pub backlinks: u64,
}

impl ReportRecord for EnrichedDomain {
    const COLUMNS: &'static [&'static str] =
        &["Domain", "PastUsage", "BrandabilityScore", "Backlinks"];
    const PREFIX: &'static str = "expired_domains_enriched";
}

fn yes_no<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "Yes" } else { "No" })
}

/// `<prefix>_<YYYY-MM-DD>.csv`
pub fn report_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}

/// Write `records` to the dated report file in `dir`, replacing any report
/// already written there the same day. The header row is always written.
pub fn write_report<R: ReportRecord>(
    dir: &Path,
    date: NaiveDate,
    records: &[R],
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_filename(R::PREFIX, date));

    let csv_error = |source: csv::Error| ReportError::Csv {
        path: path.clone(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .map_err(csv_error)?;

    writer.write_record(R::COLUMNS).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush()?;

    Ok(path)
}
