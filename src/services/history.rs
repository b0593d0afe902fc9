// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audio history feed: infinite scroll over the provider's history table,
//! with search and sort applied locally to whatever has been loaded.

use crate::error::{AppError, Result};
use crate::gateway::Gateway;
use crate::models::HistoryItem;
use crate::time_utils::parse_created_date;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column the loaded list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Voice,
    Text,
    PageUrl,
    AudioUrl,
    CreatedDate,
    Listens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::CreatedDate,
            direction: SortDirection::Descending,
        }
    }
}

/// What a call to [`HistoryFeed::load_more`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page arrived; this many new items were appended.
    Appended(usize),
    /// The provider returned an empty page; nothing more will be requested.
    Exhausted,
    /// No request was made (already loading, exhausted, or detached).
    Skipped,
    /// The feed was detached while the request was in flight.
    Discarded,
}

struct FeedState {
    items: Vec<HistoryItem>,
    /// Next page to request, 1-based
    next_page: u32,
    loading: bool,
    has_more: bool,
    sort: SortState,
    search: String,
    attached: bool,
}

/// Paged, searchable, sortable view of generated audio.
pub struct HistoryFeed {
    gateway: Arc<dyn Gateway>,
    page_size: u32,
    state: Mutex<FeedState>,
}

impl HistoryFeed {
    pub fn new(gateway: Arc<dyn Gateway>, page_size: u32) -> Self {
        Self {
            gateway,
            page_size: page_size.max(1),
            state: Mutex::new(FeedState {
                items: Vec::new(),
                next_page: 1,
                loading: false,
                has_more: true,
                sort: SortState::default(),
                search: String::new(),
                attached: true,
            }),
        }
    }

    // ─── Paging ──────────────────────────────────────────────────

    /// Request the next page and append it.
    ///
    /// Concurrent callers are collapsed: while one request is in flight
    /// every other call returns [`LoadOutcome::Skipped`] without touching
    /// the provider. A failed request leaves the page counter and
    /// `has_more` as they were, so the next call retries the same page.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let page = {
            let mut state = self.state.lock().await;
            if state.loading || !state.has_more || !state.attached {
                return Ok(LoadOutcome::Skipped);
            }
            state.loading = true;
            state.next_page
        };

        tracing::debug!(page, page_size = self.page_size, "Fetching history page");
        let fetched = self.gateway.fetch_history_page(page, self.page_size).await;

        let mut state = self.state.lock().await;
        state.loading = false;

        if !state.attached {
            tracing::debug!(page, "Feed detached, dropping late history page");
            return Ok(LoadOutcome::Discarded);
        }

        let items = fetched.map_err(|e| {
            tracing::warn!(page, error = %e, "Failed to fetch history page");
            AppError::from(e)
        })?;

        if items.is_empty() {
            state.has_more = false;
            tracing::debug!(page, "History exhausted");
            return Ok(LoadOutcome::Exhausted);
        }

        // Rows inserted upstream shift offsets, so a page can repeat items
        // already loaded.
        let known: HashSet<u64> = state.items.iter().map(|item| item.id).collect();
        let before = state.items.len();
        state
            .items
            .extend(items.into_iter().filter(|item| !known.contains(&item.id)));
        let appended = state.items.len() - before;

        state.next_page += 1;
        let sort = state.sort;
        sort_items(&mut state.items, sort);

        tracing::debug!(page, appended, total = state.items.len(), "History page loaded");
        Ok(LoadOutcome::Appended(appended))
    }

    /// The end-of-list sentinel scrolled into view.
    pub async fn on_sentinel_visible(&self) -> Result<LoadOutcome> {
        if !self.has_more().await {
            return Ok(LoadOutcome::Skipped);
        }
        self.load_more().await
    }

    /// Stop accepting pages. Any request in flight is dropped on arrival.
    pub async fn detach(&self) {
        self.state.lock().await.attached = false;
    }

    // ─── Sort & search ───────────────────────────────────────────

    /// Sort the loaded list by `field`.
    ///
    /// Choosing the active field while it is ascending flips it to
    /// descending; anything else sorts ascending.
    pub async fn sort(&self, field: SortField) -> SortState {
        let mut state = self.state.lock().await;
        let direction =
            if state.sort.field == field && state.sort.direction == SortDirection::Ascending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
        let sort = SortState { field, direction };
        state.sort = sort;
        sort_items(&mut state.items, sort);
        sort
    }

    /// Set the search filter. An empty term shows everything.
    pub async fn search(&self, term: &str) {
        self.state.lock().await.search = term.trim().to_lowercase();
    }

    /// Loaded items passing the search filter, in current sort order.
    pub async fn visible(&self) -> Vec<HistoryItem> {
        let state = self.state.lock().await;
        if state.search.is_empty() {
            return state.items.clone();
        }
        state
            .items
            .iter()
            .filter(|item| item.matches(&state.search))
            .cloned()
            .collect()
    }

    /// Remove one item from the loaded list if `confirm` agrees.
    ///
    /// Local only: the provider copy is untouched and reappears on a fresh
    /// load. Returns whether an item was removed.
    pub async fn remove<F>(&self, id: u64, confirm: F) -> bool
    where
        F: FnOnce(&HistoryItem) -> bool,
    {
        let item = {
            let state = self.state.lock().await;
            match state.items.iter().find(|item| item.id == id) {
                Some(item) => item.clone(),
                None => return false,
            }
        };

        if !confirm(&item) {
            return false;
        }

        let mut state = self.state.lock().await;
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        let removed = state.items.len() < before;
        if removed {
            tracing::info!(id, "Removed history item from view");
        }
        removed
    }

    // ─── Accessors ───────────────────────────────────────────────

    /// Every loaded item, ignoring the search filter.
    pub async fn items(&self) -> Vec<HistoryItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn sort_state(&self) -> SortState {
        self.state.lock().await.sort
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.has_more
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn next_page(&self) -> u32 {
        self.state.lock().await.next_page
    }
}

fn sort_items(items: &mut [HistoryItem], sort: SortState) {
    items.sort_by(|a, b| {
        let ordering = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn compare(a: &HistoryItem, b: &HistoryItem, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Listens => a.listens.cmp(&b.listens),
        // None < Some, so unparseable dates sort first.
        SortField::CreatedDate => {
            parse_created_date(&a.created_date).cmp(&parse_created_date(&b.created_date))
        }
        SortField::Voice => a.voice.name.cmp(&b.voice.name),
        SortField::Text => a.text.cmp(&b.text),
        SortField::PageUrl => a.page_url.cmp(&b.page_url),
        SortField::AudioUrl => a.audio_url.cmp(&b.audio_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryVoice;

    fn item(id: u64, created_date: &str) -> HistoryItem {
        HistoryItem {
            id,
            voice: HistoryVoice {
                name: "Rachel".to_string(),
                code: "EN".to_string(),
            },
            text: format!("item {}", id),
            page_url: format!("https://example.com/{}", id),
            audio_url: format!("https://cdn.example.com/{}.mp3", id),
            created_date: created_date.to_string(),
            listens: 0,
        }
    }

    #[test]
    fn test_created_date_sort_mixes_formats() {
        let mut items = vec![
            item(1, "2025-05-28T10:00:00Z"),
            item(2, "garbage"),
            item(3, "2025-05-27"),
        ];
        sort_items(
            &mut items,
            SortState {
                field: SortField::CreatedDate,
                direction: SortDirection::Ascending,
            },
        );
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        sort_items(&mut items, SortState::default());
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut items = vec![item(3, "2025-01-01"), item(1, "2025-01-01"), item(2, "2025-01-01")];
        sort_items(
            &mut items,
            SortState {
                field: SortField::Voice,
                direction: SortDirection::Ascending,
            },
        );
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
