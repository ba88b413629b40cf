//! CSV loading and export for the facility task log.
//!
//! Loading is all-or-nothing: a missing file, a missing required column, or
//! a single unparseable timestamp fails the whole load with a typed error
//! rather than producing a partial or silently-defaulted record set.
//!
//! The log is comma-separated with a header row. Header names are
//! whitespace-trimmed before matching. Files that are not valid UTF-8 are
//! decoded as ISO-8859-1, so Latin-1 exports from office tooling load
//! without mangling.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::{info, warn};

use crate::error::TaskLogError;
use crate::model::TaskRecord;

/// Column that must be present: the scheduled date and time.
pub const COL_TIMESTAMP: &str = "Timestamp";
/// Column that must be present: the task status.
pub const COL_STATUS: &str = "Task_Status";

const COL_NAME: &str = "Task_Name";
const COL_FACILITY: &str = "Facility_ID";
const COL_TYPE: &str = "Task_Type";
const COL_PRIORITY: &str = "Priority";
const COL_ASSIGNEE: &str = "Assignee";
const COL_WORKLOAD: &str = "Workload_Estimate";
const COL_FREQUENCY: &str = "Task_Frequency";

/// Timestamp format written by the facility scheduling system.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Fallback for rows exported without seconds.
const TIMESTAMP_FORMAT_SHORT: &str = "%Y-%m-%d %H:%M";

/// Load the task log from a file on disk.
pub fn load(path: &Path) -> Result<Vec<TaskRecord>, TaskLogError> {
    let bytes = fs::read(path)?;
    let records = load_from_slice(&bytes)?;

    info!(
        path = %path.display(),
        record_count = records.len(),
        "Task log loaded"
    );

    Ok(records)
}

/// Load the task log from raw bytes.
pub fn load_from_slice(bytes: &[u8]) -> Result<Vec<TaskRecord>, TaskLogError> {
    let text = decode_latin1_tolerant(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    // Header names are trimmed before matching; the scheduling system pads
    // some of them with spaces.
    let headers = reader.headers()?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .map(str::trim)
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let timestamp_idx = *columns
        .get(COL_TIMESTAMP)
        .ok_or(TaskLogError::MissingColumn(COL_TIMESTAMP))?;
    let status_idx = *columns
        .get(COL_STATUS)
        .ok_or(TaskLogError::MissingColumn(COL_STATUS))?;

    let get = |name: &str| columns.get(name).copied();
    let name_idx = get(COL_NAME);
    let facility_idx = get(COL_FACILITY);
    let type_idx = get(COL_TYPE);
    let priority_idx = get(COL_PRIORITY);
    let assignee_idx = get(COL_ASSIGNEE);
    let workload_idx = get(COL_WORKLOAD);
    let frequency_idx = get(COL_FREQUENCY);

    let mut records = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row = row?;
        // Data rows start on line 2, after the header.
        let line = i + 2;

        let raw_timestamp = row.get(timestamp_idx).unwrap_or("").trim();
        let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| {
            TaskLogError::ParseTimestamp {
                row: line,
                value: raw_timestamp.to_string(),
            }
        })?;

        let status = row.get(status_idx).unwrap_or("").trim();
        let mut record = TaskRecord::new(status, timestamp);

        if let Some(value) = field(&row, name_idx) {
            record = record.with_name(value);
        }
        if let Some(value) = field(&row, facility_idx) {
            record = record.with_facility(value);
        }
        if let Some(value) = field(&row, type_idx) {
            record = record.with_task_type(value);
        }
        if let Some(value) = field(&row, priority_idx) {
            record = record.with_priority(value);
        }
        if let Some(value) = field(&row, assignee_idx) {
            record = record.with_assignee(value);
        }
        // Numeric columns are supplementary; non-numeric cells are left
        // unset instead of failing the load, but never silently.
        if let Some(value) = field(&row, workload_idx) {
            match value.parse() {
                Ok(hours) => record = record.with_workload(hours),
                Err(_) => warn!(row = line, value, "Non-numeric Workload_Estimate cell left unset"),
            }
        }
        if let Some(value) = field(&row, frequency_idx) {
            match value.parse() {
                Ok(per_week) => record = record.with_frequency(per_week),
                Err(_) => warn!(row = line, value, "Non-numeric Task_Frequency cell left unset"),
            }
        }

        records.push(record);
    }

    Ok(records)
}

/// Serialize a record set back to the comma-separated log format.
///
/// Columns follow the in-memory schema order so repeated exports are
/// byte-identical; calendar fields are re-derived on reload rather than
/// exported.
pub fn export(records: &[TaskRecord]) -> Result<String, TaskLogError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer.write_record([
        COL_NAME,
        COL_FACILITY,
        COL_TYPE,
        COL_STATUS,
        COL_PRIORITY,
        COL_ASSIGNEE,
        COL_TIMESTAMP,
        COL_WORKLOAD,
        COL_FREQUENCY,
    ])?;

    for record in records {
        writer.write_record([
            record.task_name.as_deref().unwrap_or(""),
            record.facility_id.as_deref().unwrap_or(""),
            record.task_type.as_deref().unwrap_or(""),
            &record.status,
            record.priority.as_deref().unwrap_or(""),
            record.assignee.as_deref().unwrap_or(""),
            &record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &record
                .workload_estimate
                .map(|w| w.to_string())
                .unwrap_or_default(),
            &record
                .task_frequency
                .map(|f| f.to_string())
                .unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TaskLogError::Load(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| TaskLogError::Load(std::io::Error::other(e.to_string())))
}

/// Decode bytes as UTF-8, falling back to ISO-8859-1.
///
/// Latin-1 bytes map one-to-one onto the first 256 Unicode code points, so
/// the fallback cannot fail.
fn decode_latin1_tolerant(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_SHORT))
        .ok()
}

fn field<'a>(row: &'a csv::StringRecord, idx: Option<usize>) -> Option<&'a str> {
    let value = row.get(idx?)?.trim();
    if value.is_empty() { None } else { Some(value) }
}
