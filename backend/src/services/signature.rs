//! Snapshot signatures for change detection.
//!
//! The signature covers only what affects coverage: job name, stage name and
//! the raw boundary strings of every range. Entries are sorted before hashing
//! so key order in the source JSON never produces a spurious change.

use sha2::{Digest, Sha256};

use crate::models::{JobRanges, RawDateRange, TimelineSnapshot};

/// Field separator inside one signature line.
const FIELD_SEP: char = '\u{1f}';

/// Calculate the SHA-256 signature of a snapshot.
///
/// # Returns
/// Hexadecimal string representation of the hash.
pub fn snapshot_signature(snapshot: &TimelineSnapshot) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (job, record) in &snapshot.jobs {
        match record.ranges() {
            JobRanges::PerStage(stages) => {
                for (stage, range) in &stages {
                    lines.push(signature_line(job, stage, range));
                }
            }
            JobRanges::Single(range) => lines.push(signature_line(job, "", &range)),
        }
    }
    lines.sort_unstable();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn signature_line(job: &str, stage: &str, range: &RawDateRange) -> String {
    format!(
        "{job}{sep}{stage}{sep}{start}{sep}{end}",
        sep = FIELD_SEP,
        start = range.starting_date.as_deref().unwrap_or(""),
        end = range.ending_date.as_deref().unwrap_or(""),
    )
}

/// Remembers the last signature seen and reports whether a new snapshot
/// differs from it.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature of `snapshot` if it differs from the last committed one.
    /// Nothing is recorded until [`ChangeDetector::commit`].
    pub fn changed_signature(&self, snapshot: &TimelineSnapshot) -> Option<String> {
        let signature = snapshot_signature(snapshot);
        if self.last.as_deref() == Some(signature.as_str()) {
            return None;
        }
        Some(signature)
    }

    pub fn commit(&mut self, signature: String) {
        self.last = Some(signature);
    }

    /// Record `snapshot`; returns its signature if it differs from the last one.
    pub fn observe(&mut self, snapshot: &TimelineSnapshot) -> Option<String> {
        let signature = self.changed_signature(snapshot)?;
        self.commit(signature.clone());
        Some(signature)
    }

    pub fn last_signature(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
