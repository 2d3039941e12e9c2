//! Input readers: plain text, Markdown and PDF files to speakable text.

mod cleanup;
mod decode;
mod pdf;

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::NarrateError;

pub use cleanup::{normalize_for_speech, repair_pdf_text, strip_markdown};
pub use decode::decode_text;
pub use pdf::extract_pdf_text;

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Markdown,
    Pdf,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self, NarrateError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("txt") | Some("text") => Ok(InputKind::Text),
            Some("md") | Some("markdown") => Ok(InputKind::Markdown),
            Some("pdf") => Ok(InputKind::Pdf),
            _ => Err(NarrateError::Configuration(format!(
                "Unsupported input file: {} (expected .txt, .md or .pdf)",
                path.display()
            ))),
        }
    }
}

/// A 1-based inclusive page range. `last` is open-ended when `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: u32,
    pub last: Option<u32>,
}

impl FromStr for PageRange {
    type Err = NarrateError;

    /// Parse "3-10", "5" or "3-".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            NarrateError::Configuration(format!(
                "Invalid page range '{}'. Use 'start-end' (e.g., '3-10'), a single page, or 'start-'",
                s
            ))
        };
        let parse_page = |p: &str| -> Result<u32, NarrateError> {
            match p.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(n),
            }
        };

        let range = match s.split_once('-') {
            Some((first, last)) if last.trim().is_empty() => PageRange {
                first: parse_page(first)?,
                last: None,
            },
            Some((first, last)) => PageRange {
                first: parse_page(first)?,
                last: Some(parse_page(last)?),
            },
            None => {
                let page = parse_page(s)?;
                PageRange {
                    first: page,
                    last: Some(page),
                }
            }
        };

        if matches!(range.last, Some(last) if last < range.first) {
            return Err(invalid());
        }
        Ok(range)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last {
            Some(last) if last == self.first => write!(f, "{}", self.first),
            Some(last) => write!(f, "{}-{}", self.first, last),
            None => write!(f, "{}-", self.first),
        }
    }
}

/// Read an input file and return text ready for chunking.
///
/// `pages` applies to PDF input only.
pub fn read_input(path: &Path, pages: Option<PageRange>) -> Result<String> {
    let kind = InputKind::from_path(path)?;
    if pages.is_some() && kind != InputKind::Pdf {
        log::warn!("--pages only applies to PDF input; ignoring it");
    }

    let raw = match kind {
        InputKind::Text | InputKind::Markdown => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let text = decode_text(&bytes);
            if kind == InputKind::Markdown {
                strip_markdown(&text)
            } else {
                text
            }
        }
        InputKind::Pdf => repair_pdf_text(&extract_pdf_text(path, pages)?),
    };

    let text = normalize_for_speech(&raw);
    log::info!(
        "Read {} characters of {:?} input from {}",
        text.chars().count(),
        kind,
        path.display()
    );
    Ok(text)
}
