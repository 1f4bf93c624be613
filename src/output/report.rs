use crate::page::PageSession;
use crate::render::escape_html;

pub const PAGE_TITLE: &str = "融券・借券餘額";
pub const SEARCH_PLACEHOLDER: &str = "搜尋代號或名稱";
pub const DOWNLOAD_TEXT: &str = "下載 CSV";

pub fn render_html(page: &PageSession) -> Vec<u8> {
    let download = page.download();

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
      margin: 1.5rem;
      color: #0f172a;
    }}
    #meta {{
      color: #475569;
      font-size: 0.9rem;
      margin-bottom: 0.75rem;
    }}
    .toolbar {{
      display: flex;
      gap: 0.75rem;
      align-items: center;
      margin-bottom: 1rem;
    }}
    #search {{
      padding: 0.4rem 0.6rem;
      min-width: 16rem;
    }}
    table {{
      border-collapse: collapse;
      font-size: 0.85rem;
    }}
    th, td {{
      border: 1px solid #e2e8f0;
      padding: 0.25rem 0.5rem;
      white-space: nowrap;
    }}
    th {{
      background: #f8fafc;
      position: sticky;
      top: 0;
    }}
    td.num {{
      text-align: right;
      font-variant-numeric: tabular-nums;
    }}
    .error {{
      color: #be123c;
    }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <div id="meta">{meta}</div>
  <div class="toolbar">
    <input id="search" type="search" placeholder="{placeholder}" value="{query}"/>
    <a id="download" href="{href}" download="{filename}">{download_text}</a>
  </div>
  <div id="table-area">
{table}  </div>

  <script>
    (function() {{
      const input = document.getElementById('search');
      const area = document.getElementById('table-area');
      let detach = null;

      function bind() {{
        if (detach) detach();
        const rows = Array.from(area.querySelectorAll('tbody tr'));
        const onInput = function() {{
          const q = input.value.trim().toLowerCase();
          for (const tr of rows) {{
            tr.style.display = !q || tr.innerText.toLowerCase().includes(q) ? '' : 'none';
          }}
        }};
        input.addEventListener('input', onInput);
        detach = function() {{ input.removeEventListener('input', onInput); }};
      }}

      bind();
      if (input.value) input.dispatchEvent(new Event('input'));
    }})();
  </script>
</body>
</html>
"####,
        title = PAGE_TITLE,
        meta = escape_html(page.meta_text()),
        placeholder = SEARCH_PLACEHOLDER,
        query = escape_html(page.search_value()),
        href = escape_html(&download.href),
        filename = escape_html(&download.filename),
        download_text = DOWNLOAD_TEXT,
        table = page.table_markup(),
    );

    html.into_bytes()
}
