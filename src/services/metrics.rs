//! Performance monitor: timers, counters and recorded values.
//!
//! Every recorded metric is appended as one JSON line to
//! `<LOG_PATH>/metrics.log`, and folded into an in-memory aggregate.

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use crate::config::METRICS_LOG_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Timer,
    Counter,
    Value,
}

#[derive(Debug, Default, Clone, Copy)]
struct Aggregate {
    count: u64,
    total: f64,
    min: f64,
    max: f64,
}

impl Aggregate {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.total += value;
    }
}

/// Aggregated view of one metric
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricSummary {
    pub count: u64,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl From<Aggregate> for MetricSummary {
    fn from(a: Aggregate) -> Self {
        Self {
            count: a.count,
            total: a.total,
            min: a.min,
            max: a.max,
            avg: if a.count == 0 { 0.0 } else { a.total / a.count as f64 },
        }
    }
}

/// Open metrics log; one lock per line keeps concurrent writers from
/// interleaving
struct MetricsLog {
    path: PathBuf,
    file: Mutex<File>,
}

pub struct PerformanceMonitor {
    log: Option<MetricsLog>,
    aggregates: Mutex<HashMap<String, Aggregate>>,
}

impl PerformanceMonitor {
    /// Monitor writing JSON lines into `log_dir`
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        let dir = log_dir.as_ref();
        let path = dir.join(METRICS_LOG_FILE);
        let opened = std::fs::create_dir_all(dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
        let log = match opened {
            Ok(file) => Some(MetricsLog {
                path,
                file: Mutex::new(file),
            }),
            Err(e) => {
                tracing::warn!("Cannot open metrics log {}: {}", path.display(), e);
                None
            }
        };
        Self {
            log,
            aggregates: Mutex::new(HashMap::new()),
        }
    }

    /// Monitor keeping aggregates only
    pub fn in_memory() -> Self {
        Self {
            log: None,
            aggregates: Mutex::new(HashMap::new()),
        }
    }

    pub fn start_timer(&self, name: impl Into<String>) -> Timer<'_> {
        Timer {
            monitor: self,
            name: name.into(),
            started: Instant::now(),
            tags: Map::new(),
        }
    }

    pub fn increment(&self, name: &str) {
        self.record(name, MetricKind::Counter, 1.0, Map::new());
    }

    pub fn record_value(&self, name: &str, value: f64) {
        self.record(name, MetricKind::Value, value, Map::new());
    }

    pub fn record(&self, name: &str, kind: MetricKind, value: f64, tags: Map<String, Value>) {
        if let Ok(mut aggregates) = self.aggregates.lock() {
            aggregates.entry(name.to_string()).or_default().add(value);
        }
        self.append_line(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "metric": name,
            "kind": kind,
            "value": value,
            "tags": tags,
        }));
    }

    pub fn summary(&self, name: &str) -> Option<MetricSummary> {
        let aggregates = self.aggregates.lock().ok()?;
        aggregates.get(name).copied().map(MetricSummary::from)
    }

    /// All metrics, sorted by name
    pub fn summaries(&self) -> BTreeMap<String, MetricSummary> {
        match self.aggregates.lock() {
            Ok(aggregates) => aggregates
                .iter()
                .map(|(name, agg)| (name.clone(), MetricSummary::from(*agg)))
                .collect(),
            Err(_) => BTreeMap::new(),
        }
    }

    fn append_line(&self, line: Value) {
        let Some(log) = &self.log else {
            return;
        };
        let mut bytes = match serde_json::to_vec(&line) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to serialize metric: {}", e);
                return;
            }
        };
        bytes.push(b'\n');

        let result = match log.file.lock() {
            Ok(mut file) => file.write_all(&bytes),
            Err(_) => return,
        };
        if let Err(e) = result {
            tracing::warn!("Failed to write metric to {}: {}", log.path.display(), e);
        }
    }
}

/// Running timer; records its elapsed milliseconds when stopped.
pub struct Timer<'a> {
    monitor: &'a PerformanceMonitor,
    name: String,
    started: Instant,
    tags: Map<String, Value>,
}

impl Timer<'_> {
    pub fn tag(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }

    /// Record and return elapsed milliseconds
    pub fn stop(self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
        self.monitor
            .record(&self.name, MetricKind::Timer, elapsed, self.tags);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates() {
        let monitor = PerformanceMonitor::in_memory();
        monitor.record_value("payload", 10.0);
        monitor.record_value("payload", 30.0);
        monitor.record_value("payload", 20.0);

        let summary = monitor.summary("payload").unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.avg, 20.0);
        assert!(monitor.summary("missing").is_none());
    }

    #[test]
    fn test_counters_and_timers() {
        let monitor = PerformanceMonitor::in_memory();
        monitor.increment("logins");
        monitor.increment("logins");
        let elapsed = monitor.start_timer("work").tag("route", "/x").stop();

        assert_eq!(monitor.summary("logins").unwrap().total, 2.0);
        assert!(elapsed >= 0.0);
        assert_eq!(
            monitor.summaries().keys().collect::<Vec<_>>(),
            vec!["logins", "work"]
        );
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = PerformanceMonitor::new(dir.path().join("logs"));
        monitor.increment("a");
        monitor.record_value("b", 2.5);

        let raw = std::fs::read_to_string(dir.path().join("logs").join(METRICS_LOG_FILE)).unwrap();
        let lines: Vec<Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["metric"], "a");
        assert_eq!(lines[0]["kind"], "counter");
        assert_eq!(lines[1]["value"], 2.5);
    }

    #[test]
    fn test_concurrent_writers_keep_lines_whole() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = std::sync::Arc::new(PerformanceMonitor::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let monitor = monitor.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        monitor
                            .start_timer("http.request")
                            .tag("route", format!("/worker/{}/{}", worker, i))
                            .tag("method", "GET")
                            .stop();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join(METRICS_LOG_FILE)).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 1600);
        for line in lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["metric"], "http.request");
        }
        assert_eq!(monitor.summary("http.request").unwrap().count, 1600);
    }
}
