use std::sync::OnceLock;

use regex::Regex;

pub const NUMERIC_CLASS: &str = "num";

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn numeric_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9,.\-]*$").expect("numeric class should compile"))
}

/// Alignment heuristic only: digits, commas, periods and hyphens, nothing else.
/// The empty string, `-` and `1-2-3` all qualify.
pub fn is_numeric_like(value: &str) -> bool {
    numeric_like_re().is_match(value)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow {
    pub cells: Vec<String>,
    text: String,
}

impl RenderedRow {
    fn new(cells: Vec<String>) -> Self {
        let text = row_text(&cells);
        Self { cells, text }
    }

    /// The row as a reader sees it: cells tab-separated, ASCII whitespace runs
    /// collapsed. No-break spaces stay as they are.
    pub fn visible_text(&self) -> &str {
        &self.text
    }
}

fn row_text(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| c.split_ascii_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\t")
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedTable {
    pub fields: Vec<String>,
    pub rows: Vec<RenderedRow>,
    pub markup: String,
}

impl RenderedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Builds the table markup. Cells are placed by position, not by field name,
/// so a short row simply ends early.
pub fn render_table(fields: &[String], rows: &[Vec<String>]) -> RenderedTable {
    let mut out = String::new();
    out.push_str("<table>\n  <thead>\n    <tr>");
    for f in fields {
        out.push_str(&format!("<th>{}</th>", escape_html(f)));
    }
    out.push_str("</tr>\n  </thead>\n  <tbody>\n");
    for row in rows {
        out.push_str("    <tr>");
        for value in row {
            if is_numeric_like(value) {
                out.push_str(&format!(
                    "<td class=\"{NUMERIC_CLASS}\">{}</td>",
                    escape_html(value)
                ));
            } else {
                out.push_str(&format!("<td>{}</td>", escape_html(value)));
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("  </tbody>\n</table>\n");

    RenderedTable {
        fields: fields.to_vec(),
        rows: rows.iter().cloned().map(RenderedRow::new).collect(),
        markup: out,
    }
}
