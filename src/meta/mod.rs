use itertools::Itertools;

use crate::snapshot::Snapshot;

pub const BASE_DATE_LABEL: &str = "基準日";
pub const GENERATED_AT_LABEL: &str = "產生時間";
pub const FAILED_LABEL: &str = "載入失敗";
pub const PAIR_SEPARATOR: &str = "、";
pub const SECTION_SEPARATOR: &str = " | ";

pub const CSV_DIR: &str = "data";
pub const INERT_HREF: &str = "#";
pub const PLACEHOLDER_FILENAME: &str = "latest.csv";

/// `基準日 2024-05-10 | D0 2024-05-10、D-1 2024-05-09 | 產生時間 2024-05-10T18:00:00+08:00`
pub fn meta_line(snapshot: &Snapshot) -> String {
    let pairs = snapshot
        .dated_labels()
        .into_iter()
        .map(|(label, date)| format!("{} {}", label.unwrap_or(""), date.unwrap_or("")))
        .join(PAIR_SEPARATOR);

    [
        format!(
            "{BASE_DATE_LABEL} {}",
            snapshot.base_date.as_deref().unwrap_or("")
        ),
        pairs,
        format!(
            "{GENERATED_AT_LABEL} {}",
            snapshot.generated_at.as_deref().unwrap_or("")
        ),
    ]
    .join(SECTION_SEPARATOR)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub filename: String,
}

impl DownloadLink {
    pub fn is_inert(&self) -> bool {
        self.href == INERT_HREF
    }
}

impl Default for DownloadLink {
    fn default() -> Self {
        Self {
            href: INERT_HREF.to_string(),
            filename: PLACEHOLDER_FILENAME.to_string(),
        }
    }
}

pub fn download_link(snapshot: &Snapshot) -> DownloadLink {
    match snapshot.csv_file() {
        Some(file) => DownloadLink {
            href: format!("{CSV_DIR}/{file}"),
            filename: file.to_string(),
        },
        None => DownloadLink::default(),
    }
}
