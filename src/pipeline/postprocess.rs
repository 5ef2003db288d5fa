//! Post-processing: deterministic cleanup of the rendered LaTeX text.
//!
//! The tree passes work on nodes and cannot see what the text looks like
//! once the pieces are joined back together. Removing a figure, a comment
//! and the whitespace around them routinely leaves ragged runs of blank
//! lines or a file that ends mid-line. These rules fix that at the text
//! level without touching anything TeX would read differently: in TeX, any
//! number of blank lines is one paragraph break.
//!
//! Only applied when whitespace stripping is enabled. Unlike the tree
//! passes, the rules see verbatim bodies too.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the blank-line rule only has to
//! recognise `\n`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to rendered LaTeX.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Remove byte-order marks
/// 3. Collapse two or more consecutive blank lines to one
/// 4. Ensure the text ends with exactly one newline
pub fn polish(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_byte_order_marks(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove byte-order marks ──────────────────────────────────────────

/// Every file spliced in can bring its own BOM, which would otherwise end up
/// in the middle of the document.
fn remove_byte_order_marks(input: &str) -> String {
    input.replace('\u{FEFF}', "")
}

// ── Rule 3: Collapse excessive blank lines ───────────────────────────────────

/// A line break followed by two or more lines that are empty or hold only
/// spaces and tabs.
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 4: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}
