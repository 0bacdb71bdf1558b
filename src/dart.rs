//! Dart-side naming and quoting helpers shared by every emitter.

use regex::Regex;

/// Escape a string for inclusion inside a single-quoted Dart literal.
/// Backslashes must be doubled before anything else.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' => out.push_str("\\$"),
            c if (c as u32) < 32 => {}
            c => out.push(c),
        }
    }
    out
}

/// "#2196F3" (or "2196F3") -> "Color(0xFF2196F3)". Hex digits pass through
/// uppercased; anything malformed falls back to opaque black so the theme
/// stays compilable.
pub fn color_literal(hex: &str) -> String {
    let raw = hex.trim_start_matches('#');
    if raw.len() == 6 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("Color(0xFF{})", raw.to_ascii_uppercase())
    } else {
        "Color(0xFF000000)".to_string()
    }
}

pub fn to_snake_case(text: &str) -> String {
    let punct = Regex::new(r"[^A-Za-z0-9 ]+").unwrap();
    let text = punct.replace_all(text, "_");

    let boundary_a = Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap();
    let text = boundary_a.replace_all(&text, "${1}_${2}");
    let boundary_b = Regex::new(r"([a-z\d])([A-Z])").unwrap();
    let text = boundary_b.replace_all(&text, "${1}_${2}");

    let collapsed = Regex::new(r"_+").unwrap();
    let text = text.to_lowercase().replace(' ', "_");
    collapsed
        .replace_all(&text, "_")
        .trim_matches('_')
        .to_string()
}

pub fn to_pascal_case(text: &str) -> String {
    let punct = Regex::new(r"[^A-Za-z0-9]+").unwrap();
    let spaced = punct.replace_all(text, " ");

    let mut out = String::new();
    for word in spaced.split_whitespace() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

pub fn to_camel_case(text: &str) -> String {
    let pascal = to_pascal_case(text);
    let mut chars = pascal.chars();
    let mut out = match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => return String::new(),
    };
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Indentation-aware text sink for assembling Dart source.
#[derive(Debug, Default)]
pub struct DartWriter {
    buf: String,
    indent: usize,
}

impl DartWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str("  ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Emit a line and indent until the matching `close`.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    pub fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// For `} else {` style lines: dedent for the line, re-indent after.
    pub fn chain(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
        self.indent += 1;
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
