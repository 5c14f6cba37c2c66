#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use planner_heatmap::models::TimelineSnapshot;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with the given variables set (`Some`) or removed (`None`),
/// restoring the previous values afterwards, even on panic.
///
/// Calls are serialised because the process environment is global and tests
/// run in parallel.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = EnvRestore::apply(changes);
    f()
}

struct EnvRestore {
    saved: Vec<(String, Option<String>)>,
}

impl EnvRestore {
    fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (key, value) in changes {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }

        Self { saved }
    }
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Job map JSON with one single-range job per `(name, start, end)`.
pub fn job_map_json(jobs: &[(&str, &str, &str)]) -> String {
    let entries: serde_json::Map<String, serde_json::Value> = jobs
        .iter()
        .map(|(name, start, end)| {
            (
                name.to_string(),
                serde_json::json!({ "starting_date": start, "ending_date": end }),
            )
        })
        .collect();
    serde_json::Value::Object(entries).to_string()
}

pub fn job_map(jobs: &[(&str, &str, &str)]) -> TimelineSnapshot {
    TimelineSnapshot::from_json_str(&job_map_json(jobs)).unwrap()
}
