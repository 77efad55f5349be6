//! Plain-text tables for terminal output.

use marketdesk_core::models::{Page, PageQuery};
use marketdesk_core::utils::truncate_string;

/// Widest a single column may get before its cells are truncated.
const MAX_COLUMN_WIDTH: usize = 40;

pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count().min(MAX_COLUMN_WIDTH));
            }
        }

        let line = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    let cell = truncate_string(cell, width);
                    let pad = width.saturating_sub(cell.chars().count());
                    format!("{}{}", cell, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(line(self.headers.iter().map(|h| h.to_string()).collect()));
        out.push(line(widths.iter().map(|&w| "-".repeat(w)).collect()));
        for row in &self.rows {
            out.push(line(row.clone()));
        }
        out.join("\n")
    }
}

/// "Showing 11-20 of 23 (page 2 of 3)".
pub fn page_footer<T>(page: &Page<T>, query: &PageQuery) -> String {
    if page.total == 0 {
        return "No results".to_string();
    }
    let (first, last) = page.showing_range(query);
    format!(
        "Showing {}-{} of {} (page {} of {})",
        first,
        last,
        page.total,
        query.page,
        page.total_pages(query.limit).max(1)
    )
}
