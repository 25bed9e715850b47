//! Turns any list of serializable records into csv, xls (tab separated text
//! Excel opens directly) or a print-ready HTML document.

use askama::Template;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use snafu::{ResultExt, ensure};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::Result;
use crate::error::{
    CreateFileSnafu, ExportCsvSnafu, ExportFlushSnafu, ExportSerializeSnafu, NoDataSnafu,
    TemplateSnafu,
};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xls,
    /// Print-ready document, saved as HTML and printed to PDF by the browser
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xls => "xls",
            ExportFormat::Pdf => "html",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Xls => "application/vnd.ms-excel;charset=utf-8",
            ExportFormat::Pdf => "text/html;charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
}

impl ExportFile {
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        fs::write(&path, &self.content).context(CreateFileSnafu { path: path.clone() })?;
        info!("Exported {:?}", path);
        Ok(path)
    }
}

pub type Row = Map<String, Value>;

/// Serializes records to JSON objects, non-object records land in a `value` column
pub fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<Row>> {
    records
        .iter()
        .map(|record| {
            let value = serde_json::to_value(record).context(ExportSerializeSnafu)?;
            Ok(match value {
                Value::Object(map) => map,
                other => {
                    let mut map = Map::new();
                    map.insert("value".to_string(), other);
                    map
                }
            })
        })
        .collect()
}

/// Union of every key in every row, in order of first appearance.
/// Rows keep the field order of the serialized records.
pub fn collect_columns(rows: &[Row]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns: Vec<String> = Vec::new();
    for row in rows.iter() {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        // Nested data is kept as JSON text
        Some(nested) => nested.to_string(),
    }
}

fn write_delimited(rows: &[Row], delimiter: u8) -> Result<String> {
    let columns = collect_columns(rows);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&columns).context(ExportCsvSnafu)?;
    for row in rows.iter() {
        writer
            .write_record(columns.iter().map(|c| cell_text(row.get(c))))
            .context(ExportCsvSnafu)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context(ExportFlushSnafu)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// RFC 4180 csv, fields with commas, quotes or line breaks are quoted
pub fn to_csv(rows: &[Row]) -> Result<String> {
    write_delimited(rows, b',')
}

pub fn to_xls(rows: &[Row]) -> Result<String> {
    // BOM so Excel picks up UTF-8
    let mut content = String::from('\u{FEFF}');
    content.push_str(&write_delimited(rows, b'\t')?);
    Ok(content)
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
body { font-family: sans-serif; font-size: 12px; margin: 24px; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #999; padding: 4px 6px; text-align: left; vertical-align: top; }
th { background: #eee; }
@page { size: landscape; margin: 12mm; }
</style>
</head>
<body onload="window.print()">
<h1>{{ title }}</h1>
<p>Generated {{ generated_at }}, {{ rows.len() }} records</p>
<table>
<thead>
<tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr>
</thead>
<tbody>
{% for row in rows %}<tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>
{% endfor %}</tbody>
</table>
</body>
</html>
"#
)]
struct PrintTemplate<'a> {
    title: &'a str,
    generated_at: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

pub fn to_print_html(title: &str, rows: &[Row], now: DateTime<Utc>) -> Result<String> {
    let columns = collect_columns(rows);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(c))).collect())
        .collect();

    let tpl = PrintTemplate {
        title,
        generated_at: now.format("%Y-%m-%d %H:%M UTC").to_string(),
        columns,
        rows: cells,
    };
    tpl.render().context(TemplateSnafu)
}

/// Builds the export file, refusing to produce one for an empty list
pub fn export_records<T: Serialize>(
    records: &[T],
    name: &str,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<ExportFile> {
    ensure!(!records.is_empty(), NoDataSnafu);

    let rows = to_rows(records)?;
    let content = match format {
        ExportFormat::Csv => to_csv(&rows)?,
        ExportFormat::Xls => to_xls(&rows)?,
        ExportFormat::Pdf => to_print_html(name, &rows, now)?,
    };

    Ok(ExportFile {
        filename: format!(
            "{}-{}.{}",
            name,
            now.format("%Y%m%d-%H%M%S"),
            format.extension()
        ),
        mime: format.mime(),
        content,
    })
}
