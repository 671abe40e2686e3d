//! Per-sample level matching with change suppression

use crate::types::{ManifestTable, QualityLevel};

/// Matches frame dimensions against a manifest table and decides when a
/// change is worth reporting.
///
/// A level is reported only when its bitrate differs from the last reported
/// bitrate. Two table entries with the same bitrate are one level as far as
/// notifications go.
#[derive(Debug, Clone)]
pub struct LevelTracker {
    table: ManifestTable,
    last_notified: Option<u64>,
}

impl LevelTracker {
    pub fn new(table: ManifestTable) -> Self {
        Self {
            table,
            last_notified: None,
        }
    }

    /// Bitrate of the most recent report, if any
    pub fn last_notified(&self) -> Option<u64> {
        self.last_notified
    }

    /// Feed one dimension sample.
    ///
    /// Returns the level to report, or `None` when nothing matched or the
    /// matched bitrate was already reported. The last-notified bitrate moves
    /// only when a level is returned.
    pub fn sample(&mut self, width: u32, height: u32) -> Option<QualityLevel> {
        let entry = self.table.find_by_dimensions(width, height)?;
        if self.last_notified == Some(entry.level.bitrate) {
            return None;
        }
        self.last_notified = Some(entry.level.bitrate);
        Some(entry.level.clone())
    }
}
