use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::loader::{LoadError, SnapshotLoader, SnapshotSource};
use crate::page::{PageSession, PageState};
use crate::render::{escape_html, is_numeric_like};
use crate::snapshot::Snapshot;

const SNAPSHOT_JSON: &str = r#"{
  "base_date": "2024-05-10",
  "generated_at": "2024-05-10T18:05:00+08:00",
  "trading_dates": ["2024-05-10", "2024-05-09", "2024-05-08"],
  "labels": ["D0", "D-1", "D-2"],
  "csv": {"file": "latest-2024-05-10.csv"},
  "fields": ["股票代號", "股票名稱", "融券_今日餘額_D0"],
  "rows": [
    ["2330", "台積電", "1,234"],
    ["2317", "鴻海", "—"],
    ["2454", "聯發科", "88"]
  ]
}"#;

fn fruit_snapshot() -> Snapshot {
    Snapshot {
        fields: vec!["name".into(), "qty".into()],
        rows: vec![
            vec!["Apple".into(), "10".into()],
            vec!["Banana".into(), "20".into()],
            vec!["apple".into(), "30".into()],
        ],
        ..Snapshot::default()
    }
}

fn rendered(snapshot: Snapshot) -> PageSession {
    let mut page = PageSession::new();
    page.begin_loading().unwrap();
    page.finish(Ok(snapshot)).unwrap();
    page
}

async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let n = sock.read(&mut buf).await.unwrap();
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(response.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;
        request
    });
    (format!("http://{addr}/"), handle)
}

fn local_loader(base: &str) -> SnapshotLoader {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    SnapshotLoader::new(base, None).unwrap().with_client(client)
}

#[test]
fn escape_leaves_no_reserved_characters() {
    for raw in ["a&b", "<script>", "\"quoted\"", "it's", "&amp;<>\"'"] {
        let escaped = escape_html(raw);
        for ch in ['<', '>', '"', '\''] {
            assert!(!escaped.contains(ch), "{raw} -> {escaped}");
        }
        for (i, _) in escaped.match_indices('&') {
            let rest = &escaped[i..];
            assert!(
                ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"]
                    .iter()
                    .any(|e| rest.starts_with(e)),
                "{raw} -> {escaped}"
            );
        }
    }
}

#[test]
fn numeric_like_matches_character_class_only() {
    for s in ["0", "1,234.56", "-", "1-2-3", "", "...", "-12.5"] {
        assert!(is_numeric_like(s), "{s:?}");
    }
    for s in ["12a", "1 234", "+1", "—", "N/A", "1e5"] {
        assert!(!is_numeric_like(s), "{s:?}");
    }
}

#[test]
fn two_column_table_renders_escaped_cell() {
    let page = rendered(Snapshot {
        fields: vec!["A".into(), "B".into()],
        rows: vec![
            vec!["1".into(), "x".into()],
            vec!["2,5".into(), "y<z".into()],
        ],
        ..Snapshot::default()
    });
    let markup = page.table_markup();
    assert!(markup.contains("<th>A</th><th>B</th>"));
    assert_eq!(markup.matches("<tr>").count(), 3);
    assert!(markup.contains("y&lt;z"));
}

#[test]
fn search_filters_and_clears() {
    let mut page = rendered(fruit_snapshot());
    assert_eq!(page.input("apple"), 2);
    assert!(page.is_row_shown(0));
    assert!(!page.is_row_shown(1));
    assert!(page.is_row_shown(2));

    assert_eq!(page.input(""), 3);
    assert!((0..3).all(|i| page.is_row_shown(i)));
}

#[test]
fn missing_csv_gives_inert_download() {
    let page = rendered(fruit_snapshot());
    assert_eq!(page.download().href, "#");
    assert!(!page.download().href.contains("undefined"));
}

#[test]
fn rerender_filters_only_latest_rows() {
    let mut page = rendered(fruit_snapshot());
    page.input("banana");

    page.rerender(&Snapshot {
        fields: vec!["name".into()],
        rows: vec![vec!["Banana split".into()], vec!["Cherry".into()]],
        ..Snapshot::default()
    })
    .unwrap();
    assert_eq!(page.listener_count(), 1);
    assert_eq!(page.visible_rows().len(), 2);

    assert_eq!(page.input("banana"), 1);
    let texts: Vec<_> = page
        .visible_rows()
        .iter()
        .map(|r| r.visible_text().to_string())
        .collect();
    assert_eq!(texts, vec!["Banana split".to_string()]);
}

#[test]
fn generator_payload_renders_meta_and_download() {
    let snap = Snapshot::from_json(SNAPSHOT_JSON).unwrap();
    let page = rendered(snap);
    assert_eq!(
        page.meta_text(),
        "基準日 2024-05-10 | D0 2024-05-10、D-1 2024-05-09、D-2 2024-05-08 | 產生時間 2024-05-10T18:05:00+08:00"
    );
    assert_eq!(page.download().href, "data/latest-2024-05-10.csv");
    assert!(page.table_markup().contains("<td class=\"num\">1,234</td>"));
    assert!(page.table_markup().contains("<td>—</td>"));
}

#[tokio::test]
async fn http_500_surfaces_status_in_page() {
    let (base, server) = serve_once("500 Internal Server Error", "oops").await;
    let source = SnapshotSource::Remote(local_loader(&base));

    let mut page = PageSession::new();
    let state = page.load(&source).await.unwrap();
    assert_eq!(state, PageState::Failed);
    assert!(page.error_message().unwrap().contains("500"));
    assert!(page.table_markup().contains("500"));
    assert_eq!(page.meta_text(), crate::meta::FAILED_LABEL);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /data/latest.json?cb="));
}

#[tokio::test]
async fn successful_fetch_renders_page() {
    let (base, server) = serve_once("200 OK", SNAPSHOT_JSON).await;
    let loader = local_loader(&base);
    let snapshot = loader.load().await.unwrap();
    assert_eq!(snapshot.rows.len(), 3);

    let request = server.await.unwrap();
    let first_line = request.lines().next().unwrap_or_default();
    let cb = first_line
        .split("cb=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap();
    assert!(cb.parse::<i64>().unwrap() > 0);
}

#[tokio::test]
async fn malformed_body_is_a_load_error() {
    let (base, _server) = serve_once("200 OK", "{\"rows\": 5").await;
    let err = local_loader(&base).load().await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn file_source_loads_and_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, SNAPSHOT_JSON).unwrap();

    let mut page = PageSession::new();
    let state = page.load(&SnapshotSource::File(path)).await.unwrap();
    assert_eq!(state, PageState::Rendered);
    assert_eq!(page.input("台積"), 1);

    let mut missing = PageSession::new();
    let state = missing
        .load(&SnapshotSource::File(dir.path().join("gone.json")))
        .await
        .unwrap();
    assert_eq!(state, PageState::Failed);
    assert!(missing.error_message().unwrap().contains("gone.json"));
}
