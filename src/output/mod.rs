pub mod report;

use serde::Serialize;

use crate::meta::DownloadLink;
use crate::page::{PageSession, PageState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

fn state_label(state: PageState) -> &'static str {
    match state {
        PageState::Idle => "idle",
        PageState::Loading => "loading",
        PageState::Rendered => "rendered",
        PageState::Failed => "failed",
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PageExport<'a> {
    pub state: &'static str,
    pub meta: &'a str,
    pub download: DownloadExport<'a>,
    pub query: &'a str,
    pub error: Option<&'a str>,
    pub fields: &'a [String],
    pub rows: Vec<&'a [String]>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DownloadExport<'a> {
    pub href: &'a str,
    pub filename: &'a str,
}

impl<'a> From<&'a DownloadLink> for DownloadExport<'a> {
    fn from(link: &'a DownloadLink) -> Self {
        Self {
            href: &link.href,
            filename: &link.filename,
        }
    }
}

pub fn build_export(page: &PageSession) -> PageExport<'_> {
    PageExport {
        state: state_label(page.state()),
        meta: page.meta_text(),
        download: page.download().into(),
        query: page.search_value(),
        error: page.error_message(),
        fields: page.fields(),
        rows: page
            .visible_rows()
            .into_iter()
            .map(|r| r.cells.as_slice())
            .collect(),
    }
}

pub fn render_text(page: &PageSession) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(page.meta_text());
    out.push('\n');
    if let Some(err) = page.error_message() {
        out.push_str(err);
        out.push('\n');
        return out.into_bytes();
    }
    if !page.fields().is_empty() {
        out.push_str(&page.fields().join("\t"));
        out.push('\n');
    }
    for row in page.visible_rows() {
        out.push_str(&row.cells.join("\t"));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(page: &PageSession) -> Vec<u8> {
    serde_json::to_vec_pretty(&build_export(page)).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(page: &PageSession) -> Vec<u8> {
    report::render_html(page)
}

pub fn render(page: &PageSession, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(page),
        OutputFormat::Json => render_json(page),
        OutputFormat::Html => render_html(page),
    }
}
