use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{ExperimentError, Result};
use crate::keys::Key;
use crate::policy::{Condition, Feedback};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One keypress attempt. Several records can share a cursor position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub session: u32,
    pub block: u32,
    pub trial: u32,
    pub cursor_position: usize,
    pub timestamp: DateTime<Local>,
    pub response_time: Duration,
    pub target_response: Key,
    pub response: Key,
    pub feedback: Feedback,
    pub condition: Condition,
}

impl TrialRecord {
    pub fn was_correct(&self) -> bool {
        self.response == self.target_response
    }
}

/// Log columns, in the order of the full schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Session,
    Block,
    Trial,
    CursorPosition,
    Timestamp,
    ResponseTime,
    TargetResponse,
    Response,
    Feedback,
    Condition,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Session,
        Column::Block,
        Column::Trial,
        Column::CursorPosition,
        Column::Timestamp,
        Column::ResponseTime,
        Column::TargetResponse,
        Column::Response,
        Column::Feedback,
        Column::Condition,
    ];

    pub fn value(&self, record: &TrialRecord) -> String {
        match self {
            Column::Session => record.session.to_string(),
            Column::Block => record.block.to_string(),
            Column::Trial => record.trial.to_string(),
            Column::CursorPosition => record.cursor_position.to_string(),
            Column::Timestamp => record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            Column::ResponseTime => record.response_time.as_secs_f64().to_string(),
            Column::TargetResponse => record.target_response.to_string(),
            Column::Response => record.response.to_string(),
            Column::Feedback => record.feedback.to_string(),
            Column::Condition => record.condition.to_string(),
        }
    }
}

/// Ordered column set of a results log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ExperimentError::invalid_config("log schema has no columns"));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(ExperimentError::invalid_config(format!(
                    "log schema lists `{column}` more than once"
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn full() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(Column::to_string).collect()
    }

    /// Serializes a record in schema order, one field per column.
    pub fn encode(&self, record: &TrialRecord) -> Vec<String> {
        self.columns.iter().map(|c| c.value(record)).collect()
    }

    /// Checks a row of already-encoded fields against the schema width.
    pub fn check_width(&self, fields: &[String]) -> Result<()> {
        if fields.len() == self.columns.len() {
            Ok(())
        } else {
            Err(ExperimentError::RecordWidth {
                expected: self.columns.len(),
                found: fields.len(),
            })
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::full()
    }
}
