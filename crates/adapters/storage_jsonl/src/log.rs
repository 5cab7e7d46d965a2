//! `PayloadLog` implementation writing daily JSON-lines files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use roomwatch_app::ports::{PayloadLog, PayloadRecord};
use roomwatch_domain::error::RoomwatchError;
use roomwatch_domain::time::Timestamp;

use crate::config::JsonlConfig;
use crate::error::StorageError;

#[derive(Serialize)]
struct Line<'a> {
    received_at: Timestamp,
    ingress: &'a str,
    payload: &'a Map<String, Value>,
}

/// Appends payload records to one file per UTC day.
pub struct JsonLinesLog {
    dir: PathBuf,
    write: Mutex<()>,
}

impl JsonLinesLog {
    #[must_use]
    pub fn new(config: &JsonlConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            write: Mutex::new(()),
        }
    }

    /// File receiving records stamped on the same UTC day as `at`.
    #[must_use]
    pub fn file_for(&self, at: Timestamp) -> PathBuf {
        self.dir
            .join(format!("payloads-{}.jsonl", at.format("%Y-%m-%d")))
    }

    async fn write_record(&self, record: &PayloadRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(&Line {
            received_at: record.received_at,
            ingress: record.ingress,
            payload: &record.payload,
        })?;
        line.push(b'\n');

        let path = self.file_for(record.received_at);
        let _guard = self.write.lock().await;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| io_error(&path, source))?;
        file.write_all(&line)
            .await
            .map_err(|source| io_error(&path, source))?;
        file.flush().await.map_err(|source| io_error(&path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl PayloadLog for JsonLinesLog {
    async fn append(&self, record: PayloadRecord) -> Result<(), RoomwatchError> {
        self.write_record(&record).await?;
        tracing::trace!(ingress = record.ingress, "payload appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn record(at: Timestamp, payload: Value) -> PayloadRecord {
        let Value::Object(payload) = payload else {
            panic!("payload must be an object");
        };
        PayloadRecord {
            received_at: at,
            ingress: "link",
            payload,
        }
    }

    fn log_in(dir: &Path) -> JsonLinesLog {
        JsonLinesLog::new(&JsonlConfig {
            dir: dir.to_path_buf(),
        })
    }

    #[tokio::test]
    async fn should_append_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();

        log.append(record(at, json!({"door": "open"}))).await.unwrap();
        log.append(record(at, json!({"light": "on"}))).await.unwrap();

        let content = std::fs::read_to_string(tmp.path().join("payloads-2024-05-17.jsonl")).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["payload"]["door"], "open");
        assert_eq!(lines[1]["ingress"], "link");
    }

    #[tokio::test]
    async fn should_split_files_by_utc_day() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        let before = Utc.with_ymd_and_hms(2024, 5, 17, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 1).unwrap();
        log.append(record(before, json!({"door": true}))).await.unwrap();
        log.append(record(after, json!({"door": false}))).await.unwrap();

        assert!(tmp.path().join("payloads-2024-05-17.jsonl").exists());
        assert!(tmp.path().join("payloads-2024-05-18.jsonl").exists());
    }

    #[tokio::test]
    async fn should_create_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(&tmp.path().join("nested/history"));
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        log.append(record(at, json!({}))).await.unwrap();

        assert!(log.file_for(at).exists());
    }

    #[tokio::test]
    async fn should_report_unwritable_directory_as_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let log = log_in(&blocker);

        let err = log
            .append(record(Utc::now(), json!({"door": true})))
            .await
            .unwrap_err();

        assert!(matches!(err, RoomwatchError::Storage(_)));
    }
}
