//! PDF text extraction through the `pdftotext` tool (poppler-utils).

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use super::PageRange;
use crate::error::NarrateError;

/// Extract the text of `path`, optionally limited to a page range.
pub fn extract_pdf_text(path: &Path, pages: Option<PageRange>) -> Result<String> {
    let pdftotext = which::which("pdftotext").map_err(|_| {
        NarrateError::Configuration(
            "pdftotext not found. Install poppler-utils to read PDF input.".to_string(),
        )
    })?;

    let mut cmd = Command::new(pdftotext);
    cmd.args(["-enc", "UTF-8"]);
    if let Some(range) = pages {
        cmd.arg("-f").arg(range.first.to_string());
        if let Some(last) = range.last {
            cmd.arg("-l").arg(last.to_string());
        }
    }
    cmd.arg(path).arg("-");

    log::debug!("Running {:?}", cmd);
    let output = cmd.output().context("Failed to run pdftotext")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "pdftotext failed on {}: {}",
            path.display(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
