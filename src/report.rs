use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use crate::pipeline::AnalysisResult;

pub const COLUMNS: [&str; 10] = [
    "url_ID",
    "URL",
    "Positive Score",
    "Negative Score",
    "Polarity Score",
    "Subjectivity Score",
    "Average Sentence Length",
    "Percentage of Complex Words",
    "Fog Index",
    "Average Words Per Sentence",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Csv,
    Json,
}

impl ReportFormat {
    /// Pick a format from an output file's extension; CSV unless it says otherwise.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("txt") => ReportFormat::Table,
            _ => ReportFormat::Csv,
        }
    }
}

pub fn write_report(results: &[AnalysisResult], format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        ReportFormat::Table => write_table(results, out),
        ReportFormat::Csv => write_csv(results, out),
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, results)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

fn row_fields(r: &AnalysisResult, float: impl Fn(f64) -> String) -> [String; 10] {
    let m = &r.metrics;
    [
        r.id.clone(),
        r.url.clone(),
        m.positive_count.to_string(),
        m.negative_count.to_string(),
        float(m.polarity_score),
        float(m.subjectivity_score),
        float(m.avg_sentence_length),
        float(m.pct_complex_words),
        float(m.fog_index),
        float(m.avg_words_per_sentence),
    ]
}

fn write_csv(results: &[AnalysisResult], out: &mut dyn Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(COLUMNS)?;
    for r in results {
        writer.write_record(row_fields(r, |f| f.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_table(results: &[AnalysisResult], out: &mut dyn Write) -> Result<()> {
    let rows: Vec<[String; 10]> = results
        .iter()
        .map(|r| row_fields(r, |f| format!("{:.4}", f)))
        .collect();

    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (c, w))| {
                // text columns left, numbers right
                if i < 2 {
                    format!("{:<w$}", c, w = w)
                } else {
                    format!("{:>w$}", c, w = w)
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };

    writeln!(out, "{}", line(&COLUMNS))?;
    writeln!(out, "{}", "-".repeat(widths.iter().sum::<usize>() + 3 * (widths.len() - 1)))?;
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(out, "{}", line(&cells))?;
    }
    Ok(())
}
