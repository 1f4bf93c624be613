use thiserror::Error;
use tracing::{debug, info, warn};

use crate::filter::SearchBinding;
use crate::loader::{LoadError, SnapshotSource};
use crate::meta::{self, DownloadLink};
use crate::render::{self, RenderedRow, RenderedTable};
use crate::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    Idle,
    Loading,
    Rendered,
    Failed,
}

impl PageState {
    pub fn is_settled(self) -> bool {
        matches!(self, PageState::Rendered | PageState::Failed)
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("page already settled ({state:?}); reload to fetch again")]
    AlreadySettled { state: PageState },

    #[error("page is {state:?}, expected Loading")]
    NotLoading { state: PageState },

    #[error("page is {state:?}, only a rendered page can be re-rendered")]
    NotRendered { state: PageState },
}

/// A rendered table and the one search listener attached to it.
/// They are swapped as a unit so a listener never outlives its rows.
#[derive(Clone, Debug)]
struct MountedTable {
    table: RenderedTable,
    binding: SearchBinding,
}

/// Everything one page load owns: the four mount points of the host page plus
/// the load state. Created per load, dropped with the page.
#[derive(Clone, Debug)]
pub struct PageSession {
    state: PageState,
    meta_text: String,
    table_markup: String,
    mounted: Option<MountedTable>,
    search_value: String,
    download: DownloadLink,
    error: Option<String>,
    renders: u64,
}

impl Default for PageSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSession {
    pub fn new() -> Self {
        Self {
            state: PageState::Idle,
            meta_text: String::new(),
            table_markup: String::new(),
            mounted: None,
            search_value: String::new(),
            download: DownloadLink::default(),
            error: None,
            renders: 0,
        }
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn meta_text(&self) -> &str {
        &self.meta_text
    }

    pub fn table_markup(&self) -> &str {
        &self.table_markup
    }

    pub fn download(&self) -> &DownloadLink {
        &self.download
    }

    pub fn search_value(&self) -> &str {
        &self.search_value
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fields(&self) -> &[String] {
        self.mounted
            .as_ref()
            .map(|m| m.table.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Number of search listeners currently attached. Never more than one.
    pub fn listener_count(&self) -> usize {
        usize::from(self.mounted.is_some())
    }

    pub fn binding_generation(&self) -> Option<u64> {
        self.mounted.as_ref().map(|m| m.binding.generation())
    }

    pub fn begin_loading(&mut self) -> Result<(), PageError> {
        match self.state {
            PageState::Idle => {
                self.state = PageState::Loading;
                debug!("page loading");
                Ok(())
            }
            state => Err(PageError::AlreadySettled { state }),
        }
    }

    /// Settles a loading page with the outcome of the fetch.
    pub fn finish(&mut self, outcome: Result<Snapshot, LoadError>) -> Result<PageState, PageError> {
        if self.state != PageState::Loading {
            return Err(PageError::NotLoading { state: self.state });
        }
        match outcome {
            Ok(snapshot) => {
                self.mount(&snapshot);
                self.state = PageState::Rendered;
                info!(
                    rows = snapshot.rows.len(),
                    fields = snapshot.fields.len(),
                    "page rendered"
                );
            }
            Err(err) => {
                warn!(error = %err, "snapshot load failed");
                self.fail(&err);
            }
        }
        Ok(self.state)
    }

    pub async fn load(&mut self, source: &SnapshotSource) -> Result<PageState, PageError> {
        self.begin_loading()?;
        let outcome = source.load().await;
        self.finish(outcome)
    }

    /// Replaces the table of a rendered page with `snapshot`'s rows. The old
    /// listener is detached before the new one is bound; the search box keeps
    /// its text but the new rows start fully shown until the next input.
    /// The script embedded in the html output rebinds the same way.
    pub fn rerender(&mut self, snapshot: &Snapshot) -> Result<(), PageError> {
        if self.state != PageState::Rendered {
            return Err(PageError::NotRendered { state: self.state });
        }
        self.mount(snapshot);
        Ok(())
    }

    /// Dispatches a search box input event. Returns the number of visible rows.
    pub fn input(&mut self, text: &str) -> usize {
        self.search_value = text.to_string();
        match self.mounted.as_mut() {
            Some(mounted) => mounted.binding.on_input(text),
            None => 0,
        }
    }

    pub fn visible_rows(&self) -> Vec<&RenderedRow> {
        match self.mounted.as_ref() {
            Some(m) => m
                .binding
                .shown_indices()
                .into_iter()
                .filter_map(|i| m.table.rows.get(i))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_row_shown(&self, row: usize) -> bool {
        self.mounted
            .as_ref()
            .map(|m| m.binding.is_shown(row))
            .unwrap_or(false)
    }

    fn mount(&mut self, snapshot: &Snapshot) {
        self.meta_text = meta::meta_line(snapshot);
        self.download = meta::download_link(snapshot);

        self.mounted = None;
        self.renders += 1;
        let table = render::render_table(&snapshot.fields, &snapshot.rows);
        let binding = SearchBinding::bind(&table, self.renders);
        self.table_markup = table.markup.clone();
        self.mounted = Some(MountedTable { table, binding });
        debug!(generation = self.renders, "search listener bound");
    }

    fn fail(&mut self, err: &LoadError) {
        let message = err.to_string();
        self.mounted = None;
        self.meta_text = meta::FAILED_LABEL.to_string();
        self.table_markup = format!("<p class=\"error\">{}</p>", render::escape_html(&message));
        self.error = Some(message);
        self.state = PageState::Failed;
    }
}
