//! # Historical run records
//!
//! Telemetry dumps contain one record per vehicle run. Each record names the path that was
//! followed and carries a list of raw report entries, each of which should hold one status
//! observation. Entries are loosely formatted, so every entry is parsed individually and either
//! yields an [`Observation`] or is skipped with a [`SkipReason`], without affecting the rest of
//! the run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::cmp::Ordering;
use std::fs;
use std::path::Path as FsPath;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// State string reported by the vehicle while it is actively running a path.
pub const RUNNING_STATE: &str = "RUNNING";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A run record as it appears in the telemetry dump.
///
/// Fields are held as raw JSON so that a record with a missing or mistyped field can be rejected
/// on its own when it is parsed, rather than failing the whole dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRunRecord {
    /// The `pathId` field, a number or a numeric string. `Null` if the field is missing.
    pub path_id: Value,

    /// The `rawReportEntries` field, a list of entries. `Null` if the field is missing.
    pub raw_report_entries: Value,
}

/// A single status observation of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Units: seconds
    pub timestamp_s: f64,

    pub state: RunState,

    /// Index of the waypoint the vehicle is currently heading for.
    pub progress_index: i64,

    /// Fraction of the path completed, in the range [0, 1].
    pub progress_fraction: f64,
}

/// A run record with all parseable observations extracted, in timestamp order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRunRecord {
    pub path_id: u64,
    pub observations: Vec<Observation>,

    /// Number of report entries which could not be parsed and were skipped.
    pub num_skipped: usize,
}

/// The fields of an observation as they are named in the dump.
#[derive(Debug, Deserialize)]
struct RawObservation {
    timestamp: f64,
    state: String,
    current_point: i64,
    progress: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The reported state of the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Other(String),
}

/// Result of parsing one raw report entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryParse {
    Parsed(Observation),
    Skipped(SkipReason),
}

/// Why a raw report entry was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The entry was a string which could not be parsed as JSON.
    InvalidJson(String),

    /// The entry held an empty list.
    EmptyEntry,

    /// The entry was neither an object nor a list of objects.
    UnexpectedShape,

    /// The entry was missing fields or had fields of the wrong type.
    InvalidFields(String),

    /// The timestamp or progress was NaN or infinite.
    NonFiniteValue,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Cannot read the history dump: {0}")]
    ReadError(std::io::Error),

    #[error("Cannot parse the history dump: {0}")]
    ParseError(serde_json::Error),

    #[error("Invalid path identifier {0:?}")]
    InvalidPathId(String),

    #[error("The report entries of a run on path {0} are not a list")]
    InvalidReportEntries(u64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RunState {
    pub fn from_report(state: &str) -> Self {
        match state {
            RUNNING_STATE => RunState::Running,
            s => RunState::Other(s.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

impl RawRunRecord {
    /// Take the fields of a record from one element of the dump.
    ///
    /// Elements which are not objects give a record with neither field, which fails to parse.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => Self {
                path_id: fields.remove("pathId").unwrap_or(Value::Null),
                raw_report_entries: fields.remove("rawReportEntries").unwrap_or(Value::Null),
            },
            _ => Self::default(),
        }
    }

    /// The path id of this record.
    pub fn path_id(&self) -> Result<u64, HistoryError> {
        match &self.path_id {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| HistoryError::InvalidPathId(n.to_string())),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| HistoryError::InvalidPathId(s.clone())),
            v => Err(HistoryError::InvalidPathId(v.to_string())),
        }
    }

    /// Parse every report entry of this record.
    ///
    /// Only an invalid path identifier, or entries which are not a list, fail the record.
    /// Missing or null entries give a run with no observations. Entries which cannot be parsed
    /// are skipped and counted.
    pub fn parse(&self) -> Result<HistoricalRunRecord, HistoryError> {
        let path_id = self.path_id()?;

        let entries: &[Value] = match &self.raw_report_entries {
            Value::Array(entries) => entries,
            Value::Null => &[],
            _ => return Err(HistoryError::InvalidReportEntries(path_id)),
        };

        let mut observations = Vec::with_capacity(entries.len());
        let mut num_skipped = 0;

        for (i, entry) in entries.iter().enumerate() {
            match parse_entry(entry) {
                EntryParse::Parsed(o) => observations.push(o),
                EntryParse::Skipped(reason) => {
                    debug!(
                        "Skipping report entry {} of a run on path {}: {:?}",
                        i, path_id, reason
                    );
                    num_skipped += 1;
                }
            }
        }

        // Stable sort, entries sharing a timestamp keep their reported order
        observations.sort_by(|a, b| {
            a.timestamp_s
                .partial_cmp(&b.timestamp_s)
                .unwrap_or(Ordering::Equal)
        });

        Ok(HistoricalRunRecord {
            path_id,
            observations,
            num_skipped,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a history dump from a JSON string.
///
/// Only a dump which is not a JSON list is an error. The records within it are checked when each
/// is parsed.
pub fn parse_dump(json: &str) -> Result<Vec<RawRunRecord>, HistoryError> {
    let values: Vec<Value> = serde_json::from_str(json).map_err(HistoryError::ParseError)?;

    Ok(values.into_iter().map(RawRunRecord::from_value).collect())
}

/// Read and parse a history dump file.
pub fn read_dump<P: AsRef<FsPath>>(path: P) -> Result<Vec<RawRunRecord>, HistoryError> {
    let json = fs::read_to_string(path).map_err(HistoryError::ReadError)?;
    parse_dump(&json)
}

/// Parse a single raw report entry.
///
/// An entry is either an observation object, a list whose first element is an observation
/// object, or a string containing either of those. Strings written as Python literals, as
/// produced by some telemetry exporters, are accepted.
pub fn parse_entry(entry: &Value) -> EntryParse {
    let owned;
    let value = match entry {
        Value::String(s) => {
            owned = match serde_json::from_str::<Value>(s) {
                Ok(v) => v,
                Err(e) => match serde_json::from_str::<Value>(&python_literal_to_json(s)) {
                    Ok(v) => v,
                    Err(_) => return EntryParse::Skipped(SkipReason::InvalidJson(e.to_string())),
                },
            };
            &owned
        }
        v => v,
    };

    let object = match value {
        Value::Array(items) => match items.first() {
            Some(first) => first,
            None => return EntryParse::Skipped(SkipReason::EmptyEntry),
        },
        Value::Object(_) => value,
        _ => return EntryParse::Skipped(SkipReason::UnexpectedShape),
    };

    if !object.is_object() {
        return EntryParse::Skipped(SkipReason::UnexpectedShape);
    }

    let raw: RawObservation = match RawObservation::deserialize(object) {
        Ok(r) => r,
        Err(e) => return EntryParse::Skipped(SkipReason::InvalidFields(e.to_string())),
    };

    if !raw.timestamp.is_finite() || !raw.progress.is_finite() {
        return EntryParse::Skipped(SkipReason::NonFiniteValue);
    }

    EntryParse::Parsed(Observation {
        timestamp_s: raw.timestamp,
        state: RunState::from_report(&raw.state),
        progress_index: raw.current_point,
        progress_fraction: raw.progress,
    })
}

/// Rewrite a Python literal, such as the `repr` of a list of dicts, as JSON.
///
/// Strings in either quote style become double quoted, and `True`, `False` and `None` outside
/// strings become `true`, `false` and `null`. Anything else is passed through unchanged, so an
/// input which is not a literal still fails to parse as JSON afterwards.
fn python_literal_to_json(literal: &str) -> String {
    let mut json = String::with_capacity(literal.len());
    let mut chars = literal.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                json.push('"');

                while let Some(sc) = chars.next() {
                    match sc {
                        '\\' => match chars.next() {
                            Some('\'') => json.push('\''),
                            Some(esc) => {
                                json.push('\\');
                                json.push(esc);
                            }
                            None => json.push('\\'),
                        },
                        q if q == c => break,
                        '"' => json.push_str("\\\""),
                        other => json.push(other),
                    }
                }

                json.push('"');
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                word.push(c);
                while let Some(&wc) = chars.peek() {
                    if wc.is_ascii_alphanumeric() || wc == '_' {
                        word.push(wc);
                        chars.next();
                    } else {
                        break;
                    }
                }

                match word.as_str() {
                    "True" => json.push_str("true"),
                    "False" => json.push_str("false"),
                    "None" => json.push_str("null"),
                    w => json.push_str(w),
                }
            }
            other => json.push(other),
        }
    }

    json
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entry_shapes() {
        let expected = Observation {
            timestamp_s: 12.5,
            state: RunState::Running,
            progress_index: 4,
            progress_fraction: 0.25,
        };

        let object = json!({"timestamp": 12.5, "state": "RUNNING", "current_point": 4, "progress": 0.25});
        assert_eq!(parse_entry(&object), EntryParse::Parsed(expected.clone()));

        let list = json!([{"timestamp": 12.5, "state": "RUNNING", "current_point": 4, "progress": 0.25, "extra": "ignored"}]);
        assert_eq!(parse_entry(&list), EntryParse::Parsed(expected.clone()));

        let string = json!("[{\"timestamp\": 12.5, \"state\": \"RUNNING\", \"current_point\": 4, \"progress\": 0.25}]");
        assert_eq!(parse_entry(&string), EntryParse::Parsed(expected.clone()));

        let single_quoted = json!("[{'timestamp': 12.5, 'state': 'RUNNING', 'current_point': 4, 'progress': 0.25}]");
        assert_eq!(parse_entry(&single_quoted), EntryParse::Parsed(expected));
    }

    #[test]
    fn test_parse_entry_skips() {
        match parse_entry(&json!("{not json")) {
            EntryParse::Skipped(SkipReason::InvalidJson(_)) => (),
            r => panic!("Expected invalid json, got {:?}", r),
        }

        assert_eq!(
            parse_entry(&json!([])),
            EntryParse::Skipped(SkipReason::EmptyEntry)
        );
        assert_eq!(
            parse_entry(&json!(42)),
            EntryParse::Skipped(SkipReason::UnexpectedShape)
        );
        assert_eq!(
            parse_entry(&json!([1, 2])),
            EntryParse::Skipped(SkipReason::UnexpectedShape)
        );

        match parse_entry(&json!({"timestamp": 1.0, "state": "RUNNING"})) {
            EntryParse::Skipped(SkipReason::InvalidFields(_)) => (),
            r => panic!("Expected invalid fields, got {:?}", r),
        }
        match parse_entry(&json!({"timestamp": "soon", "state": "RUNNING", "current_point": 1, "progress": 0.0})) {
            EntryParse::Skipped(SkipReason::InvalidFields(_)) => (),
            r => panic!("Expected invalid fields, got {:?}", r),
        }
    }

    #[test]
    fn test_record_parse() {
        let dump = r#"[
            {
                "pathId": "17",
                "rawReportEntries": [
                    "[{\"timestamp\": 10.0, \"state\": \"RUNNING\", \"current_point\": 5, \"progress\": 0.5}]",
                    "garbage",
                    {"timestamp": 0.0, "state": "RUNNING", "current_point": 0, "progress": 0.0},
                    {"timestamp": 15.0, "state": "PAUSED", "current_point": 5, "progress": 0.5}
                ]
            },
            {"pathId": 3},
            {"pathId": "abc", "rawReportEntries": []}
        ]"#;

        let raw = parse_dump(dump).unwrap();
        assert_eq!(raw.len(), 3);

        let record = raw[0].parse().unwrap();
        assert_eq!(record.path_id, 17);
        assert_eq!(record.num_skipped, 1);

        // Observations are put into timestamp order
        let times: Vec<f64> = record.observations.iter().map(|o| o.timestamp_s).collect();
        assert_eq!(times, vec![0.0, 10.0, 15.0]);
        assert_eq!(record.observations[2].state, RunState::Other(String::from("PAUSED")));

        let empty = raw[1].parse().unwrap();
        assert_eq!(empty.path_id, 3);
        assert!(empty.observations.is_empty());

        match raw[2].parse() {
            Err(HistoryError::InvalidPathId(s)) => assert_eq!(s, "abc"),
            r => panic!("Expected an invalid path id, got {:?}", r),
        }
    }

    #[test]
    fn test_python_literal_entries() {
        let expected = Observation {
            timestamp_s: 1.0,
            state: RunState::Running,
            progress_index: 2,
            progress_fraction: 0.5,
        };

        let literal = Value::String(String::from(
            "[{'timestamp': 1.0, 'state': 'RUNNING', 'current_point': 2, 'progress': 0.5, \
             'docked': False, 'error': None}]",
        ));
        assert_eq!(parse_entry(&literal), EntryParse::Parsed(expected.clone()));

        let apostrophe = Value::String(String::from(
            r#"[{'timestamp': 1.0, 'state': 'RUNNING', 'current_point': 2, 'progress': 0.5, 'note': "operator's stop", 'ok': True}]"#,
        ));
        assert_eq!(parse_entry(&apostrophe), EntryParse::Parsed(expected));
    }

    #[test]
    fn test_python_literal_to_json() {
        assert_eq!(
            python_literal_to_json(r#"{'a': 'say "hi"', 'b': 'it\'s', 'c': "x'y"}"#),
            r#"{"a": "say \"hi\"", "b": "it's", "c": "x'y"}"#
        );
        assert_eq!(
            python_literal_to_json("[True, False, None, 'None', 1e-3]"),
            r#"[true, false, null, "None", 1e-3]"#
        );
    }

    #[test]
    fn test_bad_records_isolated() {
        let dump = r#"[
            {"pathId": 7, "rawReportEntries": []},
            {"pathId": null, "rawReportEntries": []},
            {"pathId": 7.5, "rawReportEntries": []},
            {"rawReportEntries": []},
            {"pathId": 8, "rawReportEntries": null},
            {"pathId": 9, "rawReportEntries": {"timestamp": 1.0}},
            "not a record",
            {"pathId": "10", "rawReportEntries": [
                {"timestamp": 1.0, "state": "RUNNING", "current_point": 2, "progress": 0.5}
            ]}
        ]"#;

        let raw = parse_dump(dump).unwrap();
        assert_eq!(raw.len(), 8);

        let parsed: Vec<Result<HistoricalRunRecord, HistoryError>> =
            raw.iter().map(|r| r.parse()).collect();

        assert_eq!(parsed[0].as_ref().unwrap().path_id, 7);
        for (i, r) in parsed[1..4].iter().enumerate() {
            match r {
                Err(HistoryError::InvalidPathId(_)) => (),
                r => panic!("Expected record {} to have an invalid id, got {:?}", i + 1, r),
            }
        }

        let no_entries = parsed[4].as_ref().unwrap();
        assert_eq!(no_entries.path_id, 8);
        assert!(no_entries.observations.is_empty());

        match parsed[5] {
            Err(HistoryError::InvalidReportEntries(9)) => (),
            ref r => panic!("Expected invalid report entries, got {:?}", r),
        }
        match parsed[6] {
            Err(HistoryError::InvalidPathId(_)) => (),
            ref r => panic!("Expected an invalid path id, got {:?}", r),
        }

        let good = parsed[7].as_ref().unwrap();
        assert_eq!(good.path_id, 10);
        assert_eq!(good.observations.len(), 1);

        // Only a dump which isn't a list is rejected outright
        match parse_dump(r#"{"pathId": 7}"#) {
            Err(HistoryError::ParseError(_)) => (),
            r => panic!("Expected a parse error, got {:?}", r),
        }
    }
}
