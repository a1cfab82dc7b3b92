//! Rendering extraction results.

use docex_core::models::extraction::display_value;
use docex_core::Extraction;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one line per table row
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn render(extraction: &Extraction, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Csv => render_csv(extraction),
        OutputFormat::Text => Ok(render_text(extraction)),
    }
}

/// Scalar fields repeated on every table row; a single line when there are
/// no rows.
fn render_csv(extraction: &Extraction) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let row_names: Vec<&String> = extraction
        .rows
        .first()
        .map(|row| row.keys().collect())
        .unwrap_or_default();

    let header: Vec<&str> = extraction
        .fields
        .keys()
        .chain(row_names.iter().copied())
        .map(String::as_str)
        .collect();
    wtr.write_record(&header)?;

    let scalars: Vec<String> = extraction.fields.values().map(display_value).collect();

    if extraction.rows.is_empty() {
        wtr.write_record(&scalars)?;
    }
    for row in &extraction.rows {
        let record: Vec<String> = scalars
            .iter()
            .cloned()
            .chain(row_names.iter().map(|name| {
                row.get(name.as_str()).map(display_value).unwrap_or_default()
            }))
            .collect();
        wtr.write_record(&record)?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn render_text(extraction: &Extraction) -> String {
    let mut output = String::new();

    for (name, value) in &extraction.fields {
        output.push_str(&format!("{}: {}\n", name, display_value(value)));
    }

    output.push_str(&format!("\nRows ({}):\n", extraction.rows.len()));
    for (i, row) in extraction.rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|(name, value)| format!("{}={}", name, display_value(value)))
            .collect();
        output.push_str(&format!("  [{}] {}\n", i + 1, cells.join(", ")));
    }

    output
}
