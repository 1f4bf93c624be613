use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One day's table snapshot as published next to the site (`data/latest.json`).
///
/// Every field is optional on the wire. Anything missing degrades to an empty
/// value instead of failing the load, so a half-written payload still renders.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "opt_text")]
    pub base_date: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub trading_dates: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub generated_at: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub fields: Vec<String>,
    #[serde(default, deserialize_with = "text_rows")]
    pub rows: Vec<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub csv: Option<CsvInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<SourceInfo>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CsvInfo {
    #[serde(default, deserialize_with = "opt_text")]
    pub file: Option<String>,
}

/// Upstream pages the generator scraped. Informational only.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SourceInfo {
    #[serde(default, deserialize_with = "opt_text")]
    pub bfi84u: Option<String>,
    #[serde(default)]
    pub twt93u_by_date: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn csv_file(&self) -> Option<&str> {
        self.csv
            .as_ref()
            .and_then(|c| c.file.as_deref())
            .filter(|f| !f.trim().is_empty())
    }

    /// `(label, trading_date)` pairs, padded with `None` on the shorter side.
    pub fn dated_labels(&self) -> Vec<(Option<&str>, Option<&str>)> {
        let len = self.labels.len().max(self.trading_dates.len());
        (0..len)
            .map(|i| {
                (
                    self.labels.get(i).map(String::as_str),
                    self.trading_dates.get(i).map(String::as_str),
                )
            })
            .collect()
    }
}

pub(crate) fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// Scalars become text, anything else (objects, arrays) is dropped.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(cell_text(other)),
    }
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(scalar_text))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items.into_iter().map(cell_text).collect(),
        _ => Vec::new(),
    })
}

fn text_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(rows)) => rows
            .into_iter()
            .map(|row| match row {
                Value::Array(cells) => cells.into_iter().map(cell_text).collect(),
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generator_payload() {
        let raw = r#"{
            "base_date": "2024-05-10",
            "generated_at": "2024-05-10T18:00:00+08:00",
            "trading_dates": ["2024-05-10", "2024-05-09"],
            "labels": ["D0", "D-1"],
            "source": {"bfi84u": "https://example.test/BFI84U", "twt93u_by_date": {"20240510": "https://example.test/a"}},
            "csv": {"file": "latest-2024-05-10.csv"},
            "fields": ["代號", "名稱"],
            "rows": [["2330", "台積電"]]
        }"#;
        let snap = Snapshot::from_json(raw).unwrap();
        assert_eq!(snap.base_date.as_deref(), Some("2024-05-10"));
        assert_eq!(snap.fields, vec!["代號", "名稱"]);
        assert_eq!(snap.rows, vec![vec!["2330".to_string(), "台積電".to_string()]]);
        assert_eq!(snap.csv_file(), Some("latest-2024-05-10.csv"));
        assert_eq!(snap.source.unwrap().twt93u_by_date.len(), 1);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let snap = Snapshot::from_json("{}").unwrap();
        assert!(snap.fields.is_empty());
        assert!(snap.rows.is_empty());
        assert!(snap.csv_file().is_none());
        assert!(snap.base_date.is_none());
    }

    #[test]
    fn numeric_and_null_cells_become_text() {
        let snap = Snapshot::from_json(r#"{"fields":["a","b","c"],"rows":[[1, null, 2.5]]}"#).unwrap();
        assert_eq!(snap.rows[0], vec!["1", "", "2.5"]);
    }

    #[test]
    fn wrong_typed_optional_fields_degrade() {
        let payloads = [
            r#""base_date":20240510"#,
            r#""generated_at":1715335200"#,
            r#""csv":"latest.csv""#,
            r#""csv":{"file":123}"#,
            r#""source":"x""#,
            r#""source":{"twt93u_by_date":[1,2]}"#,
            r#""labels":"D0""#,
        ];
        for extra in payloads {
            let raw = format!(r#"{{{extra},"fields":["a"],"rows":[["1"],["2"]]}}"#);
            let snap = Snapshot::from_json(&raw).unwrap_or_else(|e| panic!("{extra}: {e}"));
            assert_eq!(snap.rows.len(), 2, "{extra}");
            let table = crate::render::render_table(&snap.fields, &snap.rows);
            assert_eq!(table.row_count(), 2, "{extra}");
        }
    }

    #[test]
    fn scalar_optionals_keep_their_text() {
        let snap = Snapshot::from_json(
            r#"{"base_date":20240510,"csv":{"file":123},"source":"x","generated_at":{"t":1}}"#,
        )
        .unwrap();
        assert_eq!(snap.base_date.as_deref(), Some("20240510"));
        assert_eq!(snap.csv_file(), Some("123"));
        assert!(snap.source.is_none());
        assert!(snap.generated_at.is_none());

        let snap = Snapshot::from_json(r#"{"csv":"latest.csv","rows":[["a"],"junk"]}"#).unwrap();
        assert!(snap.csv.is_none());
        assert_eq!(snap.rows, vec![vec!["a".to_string()], Vec::new()]);
    }

    #[test]
    fn blank_csv_file_is_treated_as_absent() {
        let snap = Snapshot::from_json(r#"{"csv":{"file":"  "}}"#).unwrap();
        assert!(snap.csv_file().is_none());
    }

    #[test]
    fn dated_labels_pad_shorter_side() {
        let snap = Snapshot {
            labels: vec!["D0".into(), "D-1".into()],
            trading_dates: vec!["2024-05-10".into()],
            ..Snapshot::default()
        };
        assert_eq!(
            snap.dated_labels(),
            vec![(Some("D0"), Some("2024-05-10")), (Some("D-1"), None)]
        );
    }
}
