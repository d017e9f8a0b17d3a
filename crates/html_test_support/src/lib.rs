//! Test support for span-annotated fragment parsing: snapshot rendering,
//! fixture manifests, and streaming helpers.

pub mod manifest;
pub mod snapshot;
pub mod stream;

/// Render a readable first-mismatch report between two line sets.
pub fn diff_report(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;

    const MISSING: &str = "<missing>";
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    let mismatch = (0..max).find(|&i| {
        expected.get(i).map(String::as_str).unwrap_or(MISSING)
            != actual.get(i).map(String::as_str).unwrap_or(MISSING)
    });
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(&mut out, "first mismatch at line {}:", i + 1);
        for line in start..end {
            let left = expected.get(line).map(String::as_str).unwrap_or(MISSING);
            let right = actual.get(line).map(String::as_str).unwrap_or(MISSING);
            let marker = if line == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line + 1);
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}
