//! Persistence for the run log and the ground-truth corpus.
//!
//! Both live as pretty-printed JSON arrays on disk. A missing file is "no data
//! yet" and loads as empty; a file that exists but fails to decode is an error.

use crate::config::StorageConfig;
use crate::error::{ParseEvalError, Result};
use crate::provider::Provider;
use crate::schema::ParsedQuery;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default filename for the run log.
pub const DEFAULT_RESULTS_PATH: &str = "data/results.json";

/// Default filename for the ground-truth corpus.
pub const DEFAULT_GROUND_TRUTH_PATH: &str = "data/groundtruth.json";

/// Parses per provider for one request; a provider that failed or was not
/// called has no entry.
pub type ProviderParses = BTreeMap<Provider, ParsedQuery>;

/// One logged parse request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub query: String,
    #[serde(default, deserialize_with = "parses_skipping_null")]
    pub response: ProviderParses,
    /// Wall time of the whole request, across all providers.
    pub latency_ms: i64,
    pub time: DateTime<Utc>,
}

/// A curated reference parse for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthEntry {
    pub query: String,
    pub truth: ParsedQuery,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ambiguous: bool,
    /// Alternatives accepted for an ambiguous query.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptable_interpretations: Vec<ParsedQuery>,
}

/// File-backed access to the run log and ground truth.
#[derive(Debug, Clone)]
pub struct RunStore {
    results_path: PathBuf,
    ground_truth_path: PathBuf,
}

impl RunStore {
    pub fn new(results_path: impl Into<PathBuf>, ground_truth_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
            ground_truth_path: ground_truth_path.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(
            storage.results_path.clone(),
            storage.ground_truth_path.clone(),
        )
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    pub fn ground_truth_path(&self) -> &Path {
        &self.ground_truth_path
    }

    /// Load every stored run, oldest first.
    pub fn load_runs(&self) -> Result<Vec<StoredRun>> {
        load_json_array(&self.results_path)
    }

    /// Load the ground-truth corpus.
    pub fn load_ground_truth(&self) -> Result<Vec<GroundTruthEntry>> {
        load_json_array(&self.ground_truth_path)
    }

    /// The run log exactly as stored on disk.
    pub fn read_raw_runs(&self) -> Result<String> {
        if !self.results_path.exists() {
            return Err(ParseEvalError::RunsNotFound(self.results_path.clone()));
        }
        fs::read_to_string(&self.results_path).map_err(|e| ParseEvalError::io(&self.results_path, e))
    }

    /// Append a run stamped with the current time and rewrite the log.
    pub fn append_run(
        &self,
        query: &str,
        response: ProviderParses,
        latency_ms: i64,
    ) -> Result<StoredRun> {
        let mut runs = self.load_runs()?;
        let run = StoredRun {
            query: query.to_string(),
            response,
            latency_ms,
            time: Utc::now(),
        };
        runs.push(run.clone());
        save_json_array(&runs, &self.results_path)?;
        debug!(path = %self.results_path.display(), runs = runs.len(), "appended run");
        Ok(run)
    }
}

/// Load a JSON array; a missing file is an empty array.
fn load_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!(path = %path.display(), "file not found, treating as empty");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| ParseEvalError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content)
        .map_err(|e| ParseEvalError::Serialization(format!("{}: {}", path.display(), e)))
}

fn save_json_array<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ParseEvalError::io(parent, e))?;
        }
    }

    let data = serde_json::to_string_pretty(items)
        .map_err(|e| ParseEvalError::Serialization(e.to_string()))?;
    fs::write(path, data).map_err(|e| ParseEvalError::io(path, e))?;

    Ok(())
}

/// Older logs may hold `"provider": null` for a failed call.
fn parses_skipping_null<'de, D>(deserializer: D) -> std::result::Result<ProviderParses, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<Provider, Option<ParsedQuery>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(provider, parse)| parse.map(|p| (provider, p)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RunStore {
        RunStore::new(
            dir.path().join("data/results.json"),
            dir.path().join("data/groundtruth.json"),
        )
    }

    fn berlin() -> ParsedQuery {
        ParsedQuery {
            location: "Berlin".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.load_runs().unwrap().is_empty());
        assert!(store.load_ground_truth().unwrap().is_empty());
    }

    #[test]
    fn test_raw_runs_require_a_log() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.read_raw_runs().unwrap_err();
        assert!(matches!(err, ParseEvalError::RunsNotFound(_)));
    }

    #[test]
    fn test_append_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut response = ProviderParses::new();
        response.insert(Provider::Claude, berlin());
        store.append_run("Hotel in Berlin", response, 812).unwrap();
        store
            .append_run("Hotel in Paris", ProviderParses::new(), 90)
            .unwrap();

        let runs = store.load_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].query, "Hotel in Berlin");
        assert_eq!(runs[0].latency_ms, 812);
        assert_eq!(runs[0].response[&Provider::Claude], berlin());
        assert!(runs[1].response.is_empty());
        assert!(runs[0].time <= runs[1].time);

        let raw = store.read_raw_runs().unwrap();
        assert!(raw.contains("\"claude\""));
        assert!(raw.contains("\"latency_ms\": 812"));
    }

    #[test]
    fn test_malformed_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(store.results_path(), "[{\"query\": ").unwrap();

        let err = store.load_runs().unwrap_err();
        assert!(matches!(err, ParseEvalError::Serialization(_)));
    }

    #[test]
    fn test_null_provider_entries_are_dropped() {
        let json = r#"{
            "query": "Hotel in Berlin",
            "response": {"openai": null, "claude": {"location": "Berlin"}},
            "latency_ms": 1200,
            "time": "2025-09-01T12:00:00.123456+02:00"
        }"#;
        let run: StoredRun = serde_json::from_str(json).unwrap();
        assert_eq!(run.response.len(), 1);
        assert!(run.response.contains_key(&Provider::Claude));
        assert_eq!(run.time.to_rfc3339(), "2025-09-01T10:00:00.123456+00:00");
    }

    #[test]
    fn test_ground_truth_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            store.ground_truth_path(),
            r#"[
                {"query": "Hotel in Berlin", "truth": {"location": "Berlin"}},
                {"query": "günstig in Rom", "truth": {"location": "Rom"}, "ambiguous": true,
                 "acceptable_interpretations": [{"location": "Rom", "price_max_eur": 80}]}
            ]"#,
        )
        .unwrap();

        let entries = store.load_ground_truth().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].ambiguous);
        assert!(entries[0].acceptable_interpretations.is_empty());
        assert!(entries[1].ambiguous);
        assert_eq!(entries[1].acceptable_interpretations[0].price_max_eur, 80.0);
    }
}
