//! Human-readable report sink


use termcolor::{Color, ColorSpec, WriteColor};

use super::{Sink, SinkKind, SinkState};
use crate::diff::{ColumnDiff, Diff, DisplayValues, RowDiff, RunContext, Side};
use crate::error::Result;
use crate::model::CellValue;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Formatting switches for [`ReportSink`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Leave out run timestamps so output is reproducible
    pub stable_output: bool,
    /// Print only the header and the summary
    pub summary_only: bool,
}

/// Renders diffs as text while the run progresses
pub struct ReportSink<W: WriteColor> {
    writer: W,
    options: ReportOptions,
    state: SinkState,
    last_column_row: Option<u64>,
}

impl<W: WriteColor> ReportSink<W> {
    pub fn new(writer: W, options: ReportOptions) -> Self {
        Self {
            writer,
            options,
            state: SinkState::default(),
            last_column_row: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self, run: &RunContext) -> Result<()> {
        writeln!(self.writer, "{}", RULE)?;
        writeln!(
            self.writer,
            " tablediff: {} → {} ({} diff)",
            run.lhs_name(),
            run.rhs_name(),
            run.kind()
        )?;
        if !self.options.stable_output {
            writeln!(
                self.writer,
                " started: {}",
                run.started_at().format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        writeln!(self.writer, "{}", RULE)?;
        Ok(())
    }

    fn write_row_diff(&mut self, diff: &RowDiff) -> Result<()> {
        let color = match diff.side() {
            Side::Left => Color::Red,
            Side::Right => Color::Green,
            Side::Both => Color::Yellow,
        };
        self.writer.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(
            self.writer,
            "{} {}",
            diff.side().symbol(),
            format_key(diff.key_values())
        )?;
        self.writer.reset()?;
        writeln!(
            self.writer,
            " only in {} {}",
            diff.side(),
            format_display(diff.display_values())
        )?;
        Ok(())
    }

    fn write_column_diff(&mut self, diff: &ColumnDiff) -> Result<()> {
        let row = diff.row();
        if self.last_column_row != Some(row.row_step()) {
            self.last_column_row = Some(row.row_step());
            self.writer
                .set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(self.writer, "! {}", format_key(row.key_values()))?;
            self.writer.reset()?;
            writeln!(self.writer, " {}", format_display(row.display_values()))?;
        }
        writeln!(
            self.writer,
            "    {}: {} → {}",
            diff.column_name(),
            diff.lhs_value(),
            diff.rhs_value()
        )?;
        Ok(())
    }

    fn write_summary(&mut self, run: &RunContext) -> Result<()> {
        if self.diff_count() == 0 {
            writeln!(self.writer, "No differences found.")?;
        }
        writeln!(
            self.writer,
            "Summary: {} row diffs, {} column diffs, {} total ({} row steps)",
            self.state.row_diffs(),
            self.state.column_diffs(),
            self.diff_count(),
            run.row_step()
        )?;
        Ok(())
    }
}

fn format_key(values: &[CellValue]) -> String {
    let parts: Vec<_> = values.iter().map(|v| v.display().into_owned()).collect();
    format!("[{}]", parts.join(", "))
}

fn format_display(values: &DisplayValues) -> String {
    let parts: Vec<_> = values
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

impl<W: WriteColor> Sink for ReportSink<W> {
    fn open(&mut self, run: &RunContext) -> Result<()> {
        self.state.open()?;
        self.write_header(run)
    }

    fn close(&mut self, run: &RunContext) -> Result<()> {
        self.state.close()?;
        self.write_summary(run)?;
        self.writer.flush()?;
        Ok(())
    }

    fn record(&mut self, diff: Diff, _run: &RunContext) -> Result<()> {
        self.state.count(&diff)?;
        if self.options.summary_only {
            return Ok(());
        }
        match &diff {
            Diff::Row(d) => self.write_row_diff(d),
            Diff::Column(d) => self.write_column_diff(d),
        }
    }

    fn row_diff_count(&self) -> u64 {
        self.state.row_diffs()
    }

    fn column_diff_count(&self) -> u64 {
        self.state.column_diffs()
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Report
    }
}
