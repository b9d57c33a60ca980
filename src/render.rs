use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::report::{Block, ReportDocument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

pub fn render_markdown(document: &ReportDocument) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", document.title);

    for block in &document.blocks {
        match block {
            Block::Text { text } => {
                let _ = writeln!(output, "{text}  ");
            }
            Block::Heading { text } => {
                let _ = writeln!(output);
                let _ = writeln!(output, "## {text}");
            }
            Block::Table { headers, rows } => {
                let _ = writeln!(output);
                let _ = writeln!(output, "| {} |", headers.join(" | "));
                let _ = writeln!(output, "|{}", "---|".repeat(headers.len()));
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
                    let _ = writeln!(output, "| {} |", cells.join(" | "));
                }
            }
            Block::PageBreak => {
                let _ = writeln!(output);
                let _ = writeln!(output, "---");
            }
        }
    }

    output
}

pub fn render(document: &ReportDocument, format: ReportFormat) -> anyhow::Result<String> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(document)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(document).context("failed to encode report as JSON")
        }
    }
}

/// Writes the rendered report, defaulting the file name to the report's
/// stem in the current directory.
pub fn export(
    document: &ReportDocument,
    format: ReportFormat,
    out: Option<&Path>,
) -> anyhow::Result<PathBuf> {
    let path = out.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(format!("{}.{}", document.file_stem, format.extension()))
    });
    let body = render(document, format)?;
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(path)
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ReportDocument {
        ReportDocument {
            title: "Laporan Prestasi Mengikut Kelas".to_string(),
            file_stem: "Laporan_Mengikut_Kelas".to_string(),
            blocks: vec![
                Block::Text { text: "Susunan: Mata Tertinggi".to_string() },
                Block::Heading { text: "KELAS: 1 BESTARI".to_string() },
                Block::Table {
                    headers: vec!["No.".to_string(), "Nama".to_string()],
                    rows: vec![vec!["1".to_string(), "A|B".to_string()]],
                },
                Block::PageBreak,
            ],
        }
    }

    #[test]
    fn markdown_lays_out_tables_and_breaks() {
        let markdown = render_markdown(&document());
        assert!(markdown.starts_with("# Laporan Prestasi Mengikut Kelas\n"));
        assert!(markdown.contains("## KELAS: 1 BESTARI"));
        assert!(markdown.contains("| No. | Nama |\n|---|---|\n| 1 | A\\|B |"));
        assert!(markdown.trim_end().ends_with("---"));
    }

    #[test]
    fn json_tags_block_kinds() {
        let json = render(&document(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["blocks"][1]["kind"], "heading");
        assert_eq!(value["blocks"][3]["kind"], "page_break");
    }

    #[test]
    fn export_writes_to_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("laporan.md");
        let written = export(&document(), ReportFormat::Markdown, Some(&out)).unwrap();
        assert_eq!(written, out);
        let body = std::fs::read_to_string(&out).unwrap();
        assert!(body.contains("KELAS: 1 BESTARI"));
    }
}
