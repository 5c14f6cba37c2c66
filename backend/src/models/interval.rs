//! Job timeline ingestion and the interval/window types the aggregator consumes.
//!
//! The job source delivers a map keyed by job name. Each job either carries
//! per-stage ranges under `flowtag_timeline` or, when that map is absent or
//! empty, a single top-level `starting_date`/`ending_date` pair. The choice is
//! made once here ([`JobRanges`]) so downstream code only sees [`Interval`]s.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::time::{days_between, days_in_year, parse_day};
use crate::error::{HeatmapError, HeatmapResult};

/// Raw date pair exactly as the source sent it.
///
/// Values that are not JSON strings (numbers, objects, `null`) are kept as
/// `None` so a single malformed job never fails the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDateRange {
    #[serde(default, deserialize_with = "lenient_string")]
    pub starting_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ending_date: Option<String>,
}

impl RawDateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            starting_date: Some(start.into()),
            ending_date: Some(end.into()),
        }
    }

    /// Parse both boundaries; `None` if either is missing or unparseable.
    pub fn parse(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = parse_day(self.starting_date.as_deref()?)?;
        let end = parse_day(self.ending_date.as_deref()?)?;
        Some((start, end))
    }
}

/// One job as delivered by the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub starting_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ending_date: Option<String>,
    /// Per process-stage ranges, keyed by stage name.
    #[serde(default, alias = "stages", deserialize_with = "lenient_stages")]
    pub flowtag_timeline: BTreeMap<String, RawDateRange>,
}

/// Resolved shape of a job's date ranges.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRanges {
    /// One range per process stage.
    PerStage(BTreeMap<String, RawDateRange>),
    /// Fallback when the job has no stage ranges.
    Single(RawDateRange),
}

impl JobRecord {
    /// Pick per-stage ranges when present, the top-level pair otherwise.
    pub fn into_ranges(self) -> JobRanges {
        if self.flowtag_timeline.is_empty() {
            JobRanges::Single(RawDateRange {
                starting_date: self.starting_date,
                ending_date: self.ending_date,
            })
        } else {
            JobRanges::PerStage(self.flowtag_timeline)
        }
    }

    pub fn ranges(&self) -> JobRanges {
        self.clone().into_ranges()
    }
}

/// A full poll result: job name to job record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineSnapshot {
    pub jobs: BTreeMap<String, JobRecord>,
}

/// Outcome of turning a snapshot into intervals.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub intervals: Vec<Interval>,
    /// Ranges skipped because a boundary was missing or unparseable.
    pub dropped: usize,
}

impl TimelineSnapshot {
    pub fn new(jobs: BTreeMap<String, JobRecord>) -> Self {
        Self { jobs }
    }

    /// Parse a snapshot from the source's JSON body.
    pub fn from_json_str(body: &str) -> HeatmapResult<Self> {
        serde_json::from_str(body).map_err(|e| {
            HeatmapError::source_data(format!("Invalid job map JSON: {}", e))
                .with_operation("parse_snapshot")
        })
    }

    pub fn from_value(value: serde_json::Value) -> HeatmapResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Flatten every job into intervals, dropping ranges with bad boundaries.
    pub fn intervals(&self) -> IngestReport {
        let mut report = IngestReport::default();

        for (job, record) in &self.jobs {
            match record.ranges() {
                JobRanges::PerStage(stages) => {
                    for (stage, range) in &stages {
                        push_range(&mut report, job, Some(stage), range);
                    }
                }
                JobRanges::Single(range) => push_range(&mut report, job, None, &range),
            }
        }

        report
    }
}

fn push_range(report: &mut IngestReport, job: &str, stage: Option<&str>, range: &RawDateRange) {
    match Interval::from_raw(job, stage, range) {
        Some(interval) => report.intervals.push(interval),
        None => {
            report.dropped += 1;
            log::debug!(
                "Dropping range for job '{}' stage {:?}: start={:?} end={:?}",
                job,
                stage,
                range.starting_date,
                range.ending_date
            );
        }
    }
}

/// An inclusive day range contributing one unit of coverage per day.
///
/// Boundaries are order-normalised at construction: a reversed pair covers
/// the same days as the forward pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    pub group: String,
    pub stage: Option<String>,
    start: NaiveDate,
    end: NaiveDate,
}

impl Interval {
    pub fn new(group: impl Into<String>, stage: Option<String>, a: NaiveDate, b: NaiveDate) -> Self {
        let (start, end) = if b < a { (b, a) } else { (a, b) };
        Self {
            group: group.into(),
            stage,
            start,
            end,
        }
    }

    /// Ungrouped interval, mostly useful in tests and benchmarks.
    pub fn days(a: NaiveDate, b: NaiveDate) -> Self {
        Self::new("", None, a, b)
    }

    pub fn from_raw(group: &str, stage: Option<&str>, raw: &RawDateRange) -> Option<Self> {
        let (start, end) = raw.parse()?;
        Some(Self::new(group, stage.map(str::to_string), start, end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, counting both ends.
    pub fn span_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// The bounded run of days being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageWindow {
    start: NaiveDate,
    num_days: u32,
}

impl CoverageWindow {
    pub fn new(start: NaiveDate, num_days: u32) -> HeatmapResult<Self> {
        if num_days == 0 {
            return Err(HeatmapError::invalid_window(
                "A coverage window needs at least one day",
            ));
        }
        start
            .checked_add_days(Days::new(u64::from(num_days - 1)))
            .ok_or_else(|| {
                HeatmapError::invalid_window(format!(
                    "Window of {} days starting {} overflows the calendar",
                    num_days, start
                ))
            })?;
        Ok(Self { start, num_days })
    }

    /// January 1st through December 31st of `year`.
    pub fn calendar_year(year: i32) -> HeatmapResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
            HeatmapError::invalid_window(format!("Year {} is out of range", year))
        })?;
        Self::new(start, days_in_year(year))
    }

    /// `days` consecutive days starting at `start`.
    pub fn rolling(start: NaiveDate, days: u32) -> HeatmapResult<Self> {
        Self::new(start, days)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    pub fn last_day(&self) -> NaiveDate {
        // Checked in `new`
        self.start + Days::new(u64::from(self.num_days - 1))
    }

    /// Year of the first day; month-block layouts use it.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.last_day()
    }

    /// 0-based offset of `day` from the window start, if inside the window.
    pub fn day_index(&self, day: NaiveDate) -> Option<usize> {
        if !self.contains(day) {
            return None;
        }
        usize::try_from(days_between(self.start, day)).ok()
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.num_days as usize {
            return None;
        }
        self.start.checked_add_days(Days::new(index as u64))
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.num_days as usize).filter_map(move |i| self.date_at(i))
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_stages<'de, D>(deserializer: D) -> Result<BTreeMap<String, RawDateRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Object(map)) = value else {
        return Ok(BTreeMap::new());
    };

    Ok(map
        .into_iter()
        .map(|(stage, raw)| {
            let range = serde_json::from_value::<RawDateRange>(raw).unwrap_or_default();
            (stage, range)
        })
        .collect())
}
