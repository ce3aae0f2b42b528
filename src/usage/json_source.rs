use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{SourceError, TimeWindow, UsageRecord, UsageSource};

/// A single bucket of usage statistics the way the platform reports it. The platform splits usage
/// into buckets, so the same package might show up several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatsEntity {
    pub package_name: Arc<str>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub first_time_stamp: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_time_stamp: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_time_used: DateTime<Utc>,
    // Older platforms don't report visibility.
    #[serde(with = "chrono::serde::ts_milliseconds", default)]
    pub last_time_visible: DateTime<Utc>,
}

/// Reads usage statistics from a JSON export of the platform's usage-stats service.
pub struct JsonUsageSource {
    path: PathBuf,
}

impl JsonUsageSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entities(&self) -> Result<Vec<UsageStatsEntity>, SourceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                return Err(SourceError::Unavailable(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

impl UsageSource for JsonUsageSource {
    #[instrument(skip(self), fields(path = ?self.path))]
    fn query(&self, window: TimeWindow) -> Result<Vec<UsageRecord>, SourceError> {
        let entities = self.read_entities()?;
        debug!("Read {} usage buckets", entities.len());
        Ok(aggregate(entities, window))
    }
}

/// Merges buckets overlapping `window` into one record per package. The latest moments win.
/// Packages keep the order in which they were first seen.
pub fn aggregate(
    entities: impl IntoIterator<Item = UsageStatsEntity>,
    window: TimeWindow,
) -> Vec<UsageRecord> {
    let mut positions = HashMap::<Arc<str>, usize>::new();
    let mut records: Vec<UsageRecord> = vec![];

    for entity in entities {
        if !window.overlaps(entity.first_time_stamp, entity.last_time_stamp) {
            continue;
        }
        match positions.get(&entity.package_name) {
            Some(&index) => {
                let record = &mut records[index];
                record.last_time_used = record.last_time_used.max(entity.last_time_used);
                record.last_time_visible = record.last_time_visible.max(entity.last_time_visible);
            }
            None => {
                positions.insert(entity.package_name.clone(), records.len());
                records.push(UsageRecord {
                    package_name: entity.package_name,
                    last_time_used: entity.last_time_used,
                    last_time_visible: entity.last_time_visible,
                });
            }
        }
    }

    records
}
