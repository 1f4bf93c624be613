use tracing::trace;

use crate::render::RenderedTable;

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The search box listener for one rendered table.
///
/// A binding captures the row texts of the table it was bound to and never
/// sees another table; re-rendering means dropping it and binding a new one.
#[derive(Clone, Debug)]
pub struct SearchBinding {
    generation: u64,
    haystacks: Vec<String>,
    shown: Vec<bool>,
    query: String,
}

impl SearchBinding {
    pub fn bind(table: &RenderedTable, generation: u64) -> Self {
        let haystacks = table
            .rows
            .iter()
            .map(|r| r.visible_text().to_lowercase())
            .collect::<Vec<_>>();
        let shown = vec![true; haystacks.len()];
        Self {
            generation,
            haystacks,
            shown,
            query: String::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Handles one input event and returns how many rows remain shown.
    pub fn on_input(&mut self, raw: &str) -> usize {
        self.query = normalize_query(raw);
        if self.query.is_empty() {
            self.shown.iter_mut().for_each(|s| *s = true);
        } else {
            for (shown, text) in self.shown.iter_mut().zip(&self.haystacks) {
                *shown = text.contains(&self.query);
            }
        }
        let visible = self.visible_count();
        trace!(generation = self.generation, query = %self.query, visible, "filter applied");
        visible
    }

    pub fn is_shown(&self, row: usize) -> bool {
        self.shown.get(row).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.shown.iter().filter(|s| **s).count()
    }

    pub fn shown_indices(&self) -> Vec<usize> {
        self.shown
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.then_some(i))
            .collect()
    }
}
