//! # Export Module
//!
//! Writes a finished research result to a downloadable file. PDF output
//! uses a built-in PDF font, so the report is first reduced to plain
//! Latin-1 text: Markdown markers are stripped and every character outside
//! Latin-1 becomes `?`. Unsupported characters never fail an export.

use anyhow::{Context, Result};
use clap::ValueEnum;
use genpdf::elements::{Break, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, SimplePageDecorator};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::ResearchResult;

const REPORT_FILE_STEM: &str = "research_report";
const FONT_FAMILY: &str = "LiberationSans";

/// Directories searched for the font family after the configured one.
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/liberation-sans",
    "/usr/local/share/fonts",
];

/// Replacement for characters the target encoding cannot hold.
pub const REPLACEMENT_CHAR: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Markdown,
    Text,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }
}

// =============================================================================
// REPORT EXPORTER
// =============================================================================
#[derive(Debug, Clone, Default)]
pub struct ReportExporter {
    font_dir: Option<PathBuf>,
}

impl ReportExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for the PDF font family here before the system directories.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }

    /// Write `result` in `format` to `dest`, or to a fresh temporary
    /// directory when no destination is given. Returns the file path.
    pub fn export(
        &self,
        result: &ResearchResult,
        format: ExportFormat,
        dest: Option<&Path>,
    ) -> Result<PathBuf> {
        let path = match dest {
            Some(path) => path.to_path_buf(),
            None => default_destination(format)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        match format {
            ExportFormat::Pdf => self.write_pdf(result, &path)?,
            ExportFormat::Markdown => write_file(&path, &result.report)?,
            ExportFormat::Text => write_file(&path, &to_latin1_lossy(&strip_markup(&result.report)))?,
            ExportFormat::Json => {
                let json = serde_json::to_string_pretty(result)
                    .context("Failed to serialize research result")?;
                write_file(&path, &json)?
            }
        }

        info!(path = %path.display(), format = ?format, "Report exported");
        Ok(path)
    }

    fn write_pdf(&self, result: &ResearchResult, path: &Path) -> Result<()> {
        let fonts = self.load_fonts()?;

        let title = pdf_title(result);
        let mut doc = Document::new(fonts);
        doc.set_title(title.clone());
        doc.set_font_size(12);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        let title_style = Style::new().bold().with_font_size(18);
        doc.push(Paragraph::new(StyledString::new(title, title_style)));
        doc.push(Break::new(1));

        for paragraph in pdf_paragraphs(&result.report) {
            doc.push(Paragraph::new(paragraph));
            doc.push(Break::new(0.5));
        }

        doc.render_to_file(path)
            .with_context(|| format!("Failed to render PDF to {}", path.display()))?;
        Ok(())
    }

    fn load_fonts(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>> {
        let candidates = self
            .font_dir
            .iter()
            .cloned()
            .chain(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));

        for dir in candidates {
            match genpdf::fonts::from_files(&dir, FONT_FAMILY, Some(genpdf::fonts::Builtin::Helvetica)) {
                Ok(family) => {
                    debug!(dir = %dir.display(), "Loaded PDF font family");
                    return Ok(family);
                }
                Err(e) => debug!(dir = %dir.display(), error = %e, "Font family not found"),
            }
        }

        anyhow::bail!(
            "No {} font family found; set RESEARCH_FONT_DIR or choose another --format",
            FONT_FAMILY
        )
    }
}

fn default_destination(format: ExportFormat) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix("research-")
        .tempdir()
        .context("Failed to create temporary directory")?
        .keep();
    Ok(dir.join(format!("{}.{}", REPORT_FILE_STEM, format.extension())))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

// =============================================================================
// TEXT CLEANUP
// =============================================================================
/// Remove Markdown emphasis markers and leading heading hashes.
pub fn strip_markup(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.replace('*', "");
            let unheaded = line.trim_start_matches('#');
            if unheaded.len() == line.len() {
                line
            } else {
                unheaded.trim_start().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pdf_title(result: &ResearchResult) -> String {
    to_latin1_lossy(&format!("Research Report: {}", result.query))
}

/// Body paragraphs for the PDF: the cleaned report split on blank lines,
/// with the lines inside each paragraph joined by spaces.
pub fn pdf_paragraphs(report: &str) -> Vec<String> {
    to_latin1_lossy(&strip_markup(report))
        .split("\n\n")
        .map(|block| {
            block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Keep Latin-1 characters, replace everything else.
pub fn to_latin1_lossy(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { REPLACEMENT_CHAR })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn result() -> ResearchResult {
        ResearchResult::new(
            "solar ☀ storage",
            "# Research Report\n\n## Executive Summary\n\n**Batteries** are *cheap* — café ☀\n### Conclusions\nDone".to_string(),
            vec![Source::new("A", "https://a.example", "snippet")],
        )
    }

    #[test]
    fn test_strip_markup() {
        let stripped = strip_markup(&result().report);
        assert_eq!(
            stripped,
            "Research Report\n\nExecutive Summary\n\nBatteries are cheap — café ☀\nConclusions\nDone"
        );
    }

    #[test]
    fn test_strip_markup_keeps_inline_hashes() {
        assert_eq!(strip_markup("Use C# and #tags"), "Use C# and #tags");
    }

    #[test]
    fn test_latin1_replacement() {
        assert_eq!(to_latin1_lossy("café ☀ — ok"), "café ? ? ok");
        assert_eq!(to_latin1_lossy("plain"), "plain");
    }

    #[test]
    fn test_pdf_paragraphs_split_on_blank_lines() {
        let paragraphs = pdf_paragraphs(&result().report);
        assert_eq!(
            paragraphs,
            vec![
                "Research Report".to_string(),
                "Executive Summary".to_string(),
                "Batteries are cheap ? café ? Conclusions Done".to_string(),
            ]
        );
    }

    #[test]
    fn test_pdf_paragraphs_skip_empty_blocks() {
        assert_eq!(pdf_paragraphs("one\n\n\n\n  \n\ntwo\n"), vec!["one", "two"]);
        assert!(pdf_paragraphs("").is_empty());
    }

    #[test]
    fn test_pdf_title_is_latin1() {
        assert_eq!(pdf_title(&result()), "Research Report: solar ? storage");
    }

    #[test]
    fn test_export_text_to_destination() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("report.txt");

        let path = ReportExporter::new()
            .export(&result(), ExportFormat::Text, Some(&dest))
            .unwrap();

        assert_eq!(path, dest);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Research Report\n"));
        assert!(written.contains("café ?"));
        assert!(!written.contains('*'));
    }

    #[test]
    fn test_export_markdown_to_temp_dir() {
        let path = ReportExporter::new()
            .export(&result(), ExportFormat::Markdown, None)
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "research_report.md");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), result().report);
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("result.json");

        ReportExporter::new()
            .export(&result(), ExportFormat::Json, Some(&dest))
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&dest).unwrap()).unwrap();
        assert_eq!(value["sources_found"], 1);
        assert_eq!(value["sources"][0]["url"], "https://a.example");
    }

    #[test]
    fn test_extensions() {
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
        assert_eq!(ExportFormat::Markdown.extension(), "md");
        assert_eq!(ExportFormat::default(), ExportFormat::Pdf);
    }

    #[test]
    #[ignore] // Requires the LiberationSans font family on the system
    fn test_export_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("report.pdf");

        ReportExporter::new()
            .export(&result(), ExportFormat::Pdf, Some(&dest))
            .unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
