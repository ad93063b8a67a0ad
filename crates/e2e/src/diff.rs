//! Readable mismatch reports for Sinhala output
//!
//! Sinhala text is full of combining signs and zero-width joiners, so two
//! strings that render identically can still differ. The report points at the
//! first diverging character and spells out the code points around it.

use std::fmt::Write;

/// Characters of context shown on each side of the divergence
const CONTEXT: usize = 4;

/// Describe how `actual` differs from `expected`. Returns an empty string
/// when they are equal.
pub fn describe_mismatch(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::new();
    }

    let expected_chars: Vec<char> = expected.chars().collect();
    let actual_chars: Vec<char> = actual.chars().collect();

    let at = expected_chars
        .iter()
        .zip(&actual_chars)
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected_chars.len().min(actual_chars.len()));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "first difference at char {} (expected {} chars, got {})",
        at,
        expected_chars.len(),
        actual_chars.len()
    );
    let _ = writeln!(out, "  expected: {}", window(&expected_chars, at));
    let _ = write!(out, "  actual:   {}", window(&actual_chars, at));
    out
}

/// Escaped code points around `at`, with the char at `at` bracketed
fn window(chars: &[char], at: usize) -> String {
    let start = at.saturating_sub(CONTEXT);
    let end = (at + CONTEXT + 1).min(chars.len());

    let mut parts = Vec::new();
    if start > 0 {
        parts.push("…".to_string());
    }
    for (i, c) in chars.iter().enumerate().take(end).skip(start) {
        let shown = escape(*c);
        parts.push(if i == at { format!("[{}]", shown) } else { shown });
    }
    if at >= chars.len() {
        parts.push("[<end>]".to_string());
    }
    if end < chars.len() {
        parts.push("…".to_string());
    }
    parts.join(" ")
}

fn escape(c: char) -> String {
    match c {
        ' ' => "␠".to_string(),
        c if c.is_ascii_graphic() => c.to_string(),
        c => format!("{}U+{:04X}", printable(c), c as u32),
    }
}

fn printable(c: char) -> String {
    if c.is_whitespace() || c.is_control() || is_format(c) {
        String::new()
    } else {
        format!("{}:", c)
    }
}

/// Zero-width and direction marks that render as nothing
fn is_format(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}')
}
