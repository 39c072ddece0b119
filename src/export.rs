//! Writing comparison tables: CSV, TSV, JSON, a plain-text summary and a
//! lossless binary form.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::model::ComparisonTable;

pub const TABLE_HEADER: [&str; 9] = [
    "token",
    "feature_index",
    "count_0",
    "count_1",
    "freq_0",
    "freq_1",
    "log_odds_ratio",
    "variance",
    "z_score",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
    /// bincode; keeps every token byte-exact, emoji included
    Bin,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
            ExportFormat::Bin => "bin",
        }
    }
}

/// Neutralize spreadsheet formulas: a cell starting with `=`, `+`, `-`, `@`,
/// tab or carriage return gets a leading `'`.
pub fn csv_safe_cell(s: String) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{s}"),
        _ => s,
    }
}

/// Table name for an n-gram range `(1, n)`.
pub fn ngram_kind(n: usize) -> String {
    match n {
        1 => "word".to_string(),
        2 => "bigram".to_string(),
        3 => "trigram".to_string(),
        n => format!("{n}gram"),
    }
}

/// Write rows as delimited text with a header line.
pub fn write_delimited<W: Write>(table: &ComparisonTable, out: W, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(out);
    wtr.write_record(TABLE_HEADER)?;
    for r in table {
        wtr.write_record([
            csv_safe_cell(r.token.clone()),
            r.feature_index.to_string(),
            r.count_0.to_string(),
            r.count_1.to_string(),
            r.freq_0.to_string(),
            r.freq_1.to_string(),
            r.log_odds_ratio.to_string(),
            r.variance.to_string(),
            r.z_score.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Human-readable summary: the `top` strongest tokens on each side.
pub fn render_summary(table: &ComparisonTable, labels: [&str; 2], top: usize) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{} tokens, {} prior, alpha = {}",
        table.len(),
        table.prior_mode,
        table.alpha
    );
    let sides = [
        (labels[0], table.top_group0(top)),
        (labels[1], table.top_group1(top)),
    ];
    for (label, rows) in sides {
        let _ = writeln!(s, "\nMost distinctive for group '{label}':");
        if rows.is_empty() {
            let _ = writeln!(s, "  (none)");
        }
        for r in rows {
            let _ = writeln!(
                s,
                "  {:<24} z = {:>8.3}  counts {}/{}",
                r.token, r.z_score, r.count_0, r.count_1
            );
        }
    }
    s
}

/// Write `table` in `format` into `out`.
pub fn write_table<W: Write>(
    table: &ComparisonTable,
    format: ExportFormat,
    labels: [&str; 2],
    mut out: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_delimited(table, out, b',')?,
        ExportFormat::Tsv => write_delimited(table, out, b'\t')?,
        ExportFormat::Json => serde_json::to_writer_pretty(&mut out, &table.rows)?,
        ExportFormat::Bin => bincode::serialize_into(&mut out, table)?,
        ExportFormat::Txt => out.write_all(render_summary(table, labels, 25).as_bytes())?,
    }
    Ok(())
}

/// Write `table` to `<out_dir>/<prefix>_<stamp>_<kind>.<ext>` atomically.
pub fn export_table(
    table: &ComparisonTable,
    format: ExportFormat,
    labels: [&str; 2],
    out_dir: &Path,
    file_stem: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{file_stem}.{}", format.extension()));

    let tmp = NamedTempFile::new_in(out_dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        write_table(table, format, labels, &mut w)?;
        w.flush()?;
    }
    tmp.persist(&path).map_err(|e| e.error)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

/// Read a table written with [`ExportFormat::Bin`].
pub fn load_table(path: &Path) -> Result<ComparisonTable> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}
