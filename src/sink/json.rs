//! JSON lines sink

use std::io::Write;

use serde::Serialize;

use super::{Sink, SinkKind, SinkState};
use crate::diff::{Diff, DisplayValues, RunContext, Side};
use crate::error::Result;
use crate::model::CellValue;

/// Writes one JSON object per diff, one per line, then a summary object
pub struct JsonSink<W: Write> {
    writer: W,
    state: SinkState,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: SinkState::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Serializable diff for JSON output
#[derive(Serialize)]
struct JsonDiff<'a> {
    #[serde(rename = "type")]
    diff_type: &'static str,
    row_step: u64,
    column_step: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<Side>,
    key: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lhs_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rhs_value: Option<serde_json::Value>,
    display: &'a DisplayValues,
}

#[derive(Serialize)]
struct JsonSummary {
    #[serde(rename = "type")]
    summary_type: &'static str,
    row_diffs: u64,
    column_diffs: u64,
    diffs: u64,
    row_steps: u64,
}

fn cell_value_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        CellValue::Float(f) => serde_json::json!(*f),
        CellValue::String(s) => serde_json::Value::String(s.clone()),
        CellValue::Date(d) => serde_json::Value::String(d.to_string()),
        CellValue::Time(t) => serde_json::Value::String(t.to_string()),
        CellValue::DateTime(dt) => serde_json::Value::String(dt.to_string()),
    }
}

impl<W: Write> Sink for JsonSink<W> {
    fn open(&mut self, _run: &RunContext) -> Result<()> {
        self.state.open()
    }

    fn close(&mut self, run: &RunContext) -> Result<()> {
        self.state.close()?;
        let summary = JsonSummary {
            summary_type: "summary",
            row_diffs: self.state.row_diffs(),
            column_diffs: self.state.column_diffs(),
            diffs: self.diff_count(),
            row_steps: run.row_step(),
        };
        serde_json::to_writer(&mut self.writer, &summary)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn record(&mut self, diff: Diff, _run: &RunContext) -> Result<()> {
        self.state.count(&diff)?;
        let key = diff.key_values().iter().map(cell_value_to_json).collect();
        let json = match &diff {
            Diff::Row(d) => JsonDiff {
                diff_type: "row",
                row_step: d.row_step(),
                column_step: diff.column_step(),
                side: Some(d.side()),
                key,
                column: None,
                lhs_value: None,
                rhs_value: None,
                display: d.display_values(),
            },
            Diff::Column(d) => JsonDiff {
                diff_type: "column",
                row_step: d.row_step(),
                column_step: diff.column_step(),
                side: None,
                key,
                column: Some(d.column_name()),
                lhs_value: Some(cell_value_to_json(d.lhs_value())),
                rhs_value: Some(cell_value_to_json(d.rhs_value())),
                display: d.row().display_values(),
            },
        };
        serde_json::to_writer(&mut self.writer, &json)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn row_diff_count(&self) -> u64 {
        self.state.row_diffs()
    }

    fn column_diff_count(&self) -> u64 {
        self.state.column_diffs()
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Json
    }
}
