//! Text cleanup applied to every input before chunking.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that trip up synthesis engines and their replacements.
const SPEECH_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201c}', "\""),  // Left double quote
    ('\u{201d}', "\""),  // Right double quote
    ('\u{00ab}', "\""),  // Left guillemet
    ('\u{00bb}', "\""),  // Right guillemet
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', " - "), // Em dash
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2026}', "."),   // Ellipsis
    ('\u{00a0}', " "),   // Non-breaking space
    ('\u{200b}', ""),    // Zero-width space
    ('\u{200c}', ""),    // Zero-width non-joiner
    ('\u{200d}', ""),    // Zero-width joiner
    ('\u{feff}', ""),    // BOM
    ('\u{00ad}', ""),    // Soft hyphen
];

static MULTIPLE_PERIODS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());
static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *\n *").unwrap());
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static MD_HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*_][ \t]*){3,}$").unwrap());
static MD_CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:```|~~~).*$").unwrap());
static MD_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static MD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*").unwrap());
static MD_BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:>[ \t]?)+").unwrap());
static MD_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+[.)])[ \t]+").unwrap());
static MD_BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static MD_BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").unwrap());
static MD_ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static MD_ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\n]+)_\b").unwrap());
static MD_INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

static PDF_HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-[ \t]*\n[ \t]*(\w)").unwrap());
static PDF_PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static PDF_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static PDF_MISSING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Ll}[.!?;:,])(\p{Lu})").unwrap());

/// Normalize text so synthesis engines read it cleanly.
///
/// Replaces typographic characters, drops control and zero-width characters,
/// collapses runs of periods and spaces, and keeps at most one blank line
/// between paragraphs.
pub fn normalize_for_speech(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match SPEECH_REPLACEMENTS.iter().find(|(ch, _)| *ch == c) {
            Some((_, replacement)) => result.push_str(replacement),
            None if c == '\n' || c == '\t' => result.push(c),
            None if c.is_control() => {}
            None => result.push(c),
        }
    }

    let result = MULTIPLE_PERIODS.replace_all(&result, ".");
    let result = HORIZONTAL_SPACE.replace_all(&result, " ");
    let result = SPACE_AROUND_NEWLINE.replace_all(&result, "\n");
    let result = EXTRA_NEWLINES.replace_all(&result, "\n\n");
    result.trim().to_string()
}

/// Reduce Markdown to the text a listener should hear.
pub fn strip_markdown(markdown: &str) -> String {
    let text = MD_HORIZONTAL_RULE.replace_all(markdown, "");
    let text = MD_CODE_FENCE.replace_all(&text, "");
    let text = MD_IMAGE.replace_all(&text, "$1");
    let text = MD_LINK.replace_all(&text, "$1");
    let text = MD_HEADER.replace_all(&text, "");
    let text = MD_BLOCKQUOTE.replace_all(&text, "");
    // List markers go before emphasis so "* item" is not read as italics
    let text = MD_LIST_MARKER.replace_all(&text, "");
    let text = MD_BOLD_STARS.replace_all(&text, "$1");
    let text = MD_BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = MD_ITALIC_STAR.replace_all(&text, "$1");
    let text = MD_ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = MD_INLINE_CODE.replace_all(&text, "$1");
    text.into_owned()
}

/// Repair layout artifacts of extracted PDF text.
///
/// Joins words hyphenated across lines, turns page breaks into paragraph
/// breaks, joins wrapped lines within a paragraph, and restores the space
/// after sentence punctuation that extraction sometimes drops.
pub fn repair_pdf_text(text: &str) -> String {
    let text = text.replace('\u{000c}', "\n\n");
    let text = PDF_HYPHEN_BREAK.replace_all(&text, "$1$2");

    let paragraphs: Vec<String> = PDF_PARAGRAPH_BREAK
        .split(&text)
        .map(|p| PDF_LINE_BREAK.replace_all(p.trim(), " ").into_owned())
        .filter(|p| !p.is_empty())
        .collect();
    let text = paragraphs.join("\n\n");

    PDF_MISSING_SPACE.replace_all(&text, "$1 $2").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_quotes_and_dashes() {
        let text = "\u{201c}Hi,\u{201d} she said\u{2014}twice. It\u{2019}s 1\u{2013}2.";
        assert_eq!(
            normalize_for_speech(text),
            "\"Hi,\" she said - twice. It's 1-2."
        );
    }

    #[test]
    fn test_periods_collapsed() {
        assert_eq!(normalize_for_speech("Wait... what\u{2026} ok.."), "Wait. what. ok.");
    }

    #[test]
    fn test_control_and_zero_width_removed() {
        assert_eq!(normalize_for_speech("a\x00b\u{200b}c\r\nd"), "abc\nd");
    }

    #[test]
    fn test_whitespace_normalized() {
        let text = "  Hello   world \n\n\n\n  Next\tparagraph  ";
        assert_eq!(normalize_for_speech(text), "Hello world\n\nNext paragraph");
    }

    #[test]
    fn test_markdown_links_and_images() {
        let md = "See [the docs](https://example.com) and ![a cat](cat.png).";
        assert_eq!(strip_markdown(md), "See the docs and a cat.");
    }

    #[test]
    fn test_markdown_emphasis() {
        let md = "Some **bold**, *italic*, __strong__ and _em_ text, snake_case_name kept.";
        assert_eq!(
            strip_markdown(md),
            "Some bold, italic, strong and em text, snake_case_name kept."
        );
    }

    #[test]
    fn test_markdown_structure() {
        let md = "# Title\n\n> Quoted line\n\n- first *item*\n* second\n1. third\n\n---\n\nUse `code` here.";
        assert_eq!(
            strip_markdown(md),
            "Title\n\nQuoted line\n\nfirst item\nsecond\nthird\n\n\n\nUse code here."
        );
    }

    #[test]
    fn test_markdown_keeps_inline_hyphens() {
        assert_eq!(strip_markdown("A well-known fact - really."), "A well-known fact - really.");
    }

    #[test]
    fn test_pdf_dehyphenation_and_line_join() {
        let text = "The experi-\nment was a\nsuccess.\n\nNew para-\ngraph here.";
        assert_eq!(
            repair_pdf_text(text),
            "The experiment was a success.\n\nNew paragraph here."
        );
    }

    #[test]
    fn test_pdf_page_breaks() {
        let text = "End of page one.\u{000c}Start of page two.";
        assert_eq!(
            repair_pdf_text(text),
            "End of page one.\n\nStart of page two."
        );
    }

    #[test]
    fn test_pdf_missing_space_after_punctuation() {
        assert_eq!(repair_pdf_text("First ends.Second begins."), "First ends. Second begins.");
        assert_eq!(repair_pdf_text("The U.S.A is big."), "The U.S.A is big.");
    }
}
