use crate::catalog::CatalogError;
use crate::config::Config;
use crate::favorites::{self, Favorites};
use crate::filter::{self, FilterState, ALL_CATEGORIES};
use crate::model::Entry;
use crate::prefs;
use std::path::PathBuf;

/// Lifecycle of the one-shot catalog load.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogPhase {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub slug: String,
    pub label: String,
}

pub struct AppState {
    pub config: Config,

    pub phase: CatalogPhase,

    pub entries: Vec<Entry>,

    /// "all" first, then every slug in order of first appearance.
    pub categories: Vec<Category>,

    pub filter: FilterState,

    pub filtered_indices: Vec<usize>,

    pub selected_index: usize,

    pub favorites: Favorites,

    pub night_mode: bool,

    favorites_path: Option<PathBuf>,

    night_mode_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_store(config, favorites::favorites_path(), prefs::night_mode_path())
    }

    /// Store paths are injected so tests can point persistence at a scratch
    /// directory, or disable it entirely with None.
    pub fn with_store(
        config: Config,
        favorites_path: Option<PathBuf>,
        night_mode_path: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            phase: CatalogPhase::Loading,
            entries: Vec::new(),
            categories: vec![Category {
                slug: ALL_CATEGORIES.to_string(),
                label: "All".to_string(),
            }],
            filter: FilterState::default(),
            filtered_indices: Vec::new(),
            selected_index: 0,
            favorites: favorites_path
                .as_deref()
                .map(favorites::load_from)
                .unwrap_or_default(),
            night_mode: night_mode_path
                .as_deref()
                .map(prefs::load_from)
                .unwrap_or(false),
            favorites_path,
            night_mode_path,
        }
    }

    /// Populates the catalog exactly once, on load success.
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.categories.truncate(1);
        for e in &self.entries {
            if !self.categories.iter().any(|c| c.slug == e.category) {
                self.categories.push(Category {
                    slug: e.category.clone(),
                    label: e.category_name.clone(),
                });
            }
        }
        // A requested category that the catalog doesn't know reverts to all.
        if !self.categories.iter().any(|c| c.slug == self.filter.category) {
            self.filter.category = ALL_CATEGORIES.to_string();
        }
        self.phase = CatalogPhase::Ready;
        self.update_filter();
    }

    pub fn set_load_error(&mut self, err: &CatalogError) {
        self.phase = CatalogPhase::Failed(err.to_string());
        self.entries.clear();
        self.filtered_indices.clear();
        self.selected_index = 0;
    }

    pub fn push_search(&mut self, text: &str) {
        self.filter.search.push_str(text);
        self.update_filter();
    }

    pub fn pop_search(&mut self) {
        self.filter.search.pop();
        self.update_filter();
    }

    pub fn clear_search(&mut self) {
        self.filter.search.clear();
        self.update_filter();
    }

    pub fn set_category(&mut self, slug: &str) {
        if self.categories.iter().any(|c| c.slug == slug) {
            self.filter.category = slug.to_string();
            self.update_filter();
        }
    }

    /// Steps the mutually exclusive category selection left or right,
    /// wrapping over "all" plus the discovered categories.
    pub fn cycle_category(&mut self, delta: i32) {
        let len = self.categories.len() as i32;
        if len == 0 {
            return;
        }
        let current = self
            .categories
            .iter()
            .position(|c| c.slug == self.filter.category)
            .unwrap_or(0) as i32;
        let next = (current + delta).rem_euclid(len) as usize;
        self.filter.category = self.categories[next].slug.clone();
        self.update_filter();
    }

    pub fn toggle_favorites_only(&mut self) {
        self.filter.favorites_only = !self.filter.favorites_only;
        self.update_filter();
    }

    /// Flips the selected entry in the favorite ledger and persists the set.
    /// A failed write is logged and otherwise ignored; the in-memory ledger
    /// stays authoritative for this session.
    pub fn toggle_selected_favorite(&mut self) {
        let Some(id) = self.get_selected().map(|e| e.id) else {
            return;
        };
        self.favorites.toggle(id);
        if let Some(path) = &self.favorites_path {
            if let Err(e) = favorites::save_to(path, &self.favorites) {
                log::warn!("could not persist favorites: {e}");
            }
        }
        self.update_filter();
    }

    pub fn toggle_night_mode(&mut self) {
        self.night_mode = !self.night_mode;
        if let Some(path) = &self.night_mode_path {
            if let Err(e) = prefs::save_to(path, self.night_mode) {
                log::warn!("could not persist night mode: {e}");
            }
        }
    }

    pub fn update_filter(&mut self) {
        self.filtered_indices = filter::filter(&self.entries, &self.filter, self.favorites.ids());
        log::info!(
            "filter: category='{}' search='{}' favorites_only={} -> {} of {}",
            self.filter.category,
            self.filter.search,
            self.filter.favorites_only,
            self.filtered_indices.len(),
            self.entries.len()
        );
        self.selected_index = 0;
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.filtered_indices.is_empty() {
            self.selected_index = 0;
            return;
        }
        let len = self.filtered_indices.len() as i32;
        self.selected_index = (self.selected_index as i32 + delta).rem_euclid(len) as usize;
    }

    pub fn get_selected(&self) -> Option<&Entry> {
        self.filtered_indices
            .get(self.selected_index)
            .map(|&idx| &self.entries[idx])
    }

    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    pub fn showing_count(&self) -> usize {
        self.filtered_indices.len()
    }

    /// Size of the ledger itself, stale ids included.
    pub fn favorites_count(&self) -> usize {
        self.favorites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: u32, name: &str, category: &str, category_name: &str) -> Entry {
        Entry {
            id,
            name: name.to_string(),
            description: String::new(),
            url: String::new(),
            icon: String::new(),
            category: category.to_string(),
            category_name: category_name.to_string(),
            tags: Vec::new(),
        }
    }

    // No store paths: these tests must never read or write the user's data.
    fn ready_state() -> AppState {
        let mut state = AppState::with_store(Config::default(), None, None);
        state.set_entries(vec![
            entry(1, "Foo", "news", "News"),
            entry(2, "Bar", "tools", "Tools"),
            entry(3, "Baz", "news", "News"),
        ]);
        state
    }

    #[test]
    fn categories_follow_first_appearance_order() {
        let state = ready_state();
        let slugs: Vec<&str> = state.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["all", "news", "tools"]);
        assert_eq!(state.categories[1].label, "News");
    }

    #[test]
    fn cycling_wraps_both_directions() {
        let mut state = ready_state();
        state.cycle_category(-1);
        assert_eq!(state.filter.category, "tools");
        state.cycle_category(1);
        assert_eq!(state.filter.category, "all");
        state.cycle_category(2);
        assert_eq!(state.filter.category, "tools");
    }

    #[test]
    fn selection_wraps_over_filtered_results() {
        let mut state = ready_state();
        assert_eq!(state.showing_count(), 3);
        state.move_selection(-1);
        assert_eq!(state.selected_index, 2);
        state.move_selection(1);
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn refilter_resets_selection() {
        let mut state = ready_state();
        state.move_selection(2);
        state.push_search("ba");
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.showing_count(), 2);
    }

    #[test]
    fn favorites_only_reflects_ledger_mutations() {
        let mut state = ready_state();
        state.toggle_favorites_only();
        assert_eq!(state.showing_count(), 0);

        state.toggle_favorites_only();
        state.move_selection(1); // Bar
        state.toggle_selected_favorite();
        state.toggle_favorites_only();
        assert_eq!(state.showing_count(), 1);
        assert_eq!(state.get_selected().unwrap().id, 2);
    }

    #[test]
    fn unknown_requested_category_reverts_to_all() {
        let mut state = AppState::with_store(Config::default(), None, None);
        state.filter.category = "ghosts".to_string();
        state.set_entries(vec![entry(1, "Foo", "news", "News")]);
        assert_eq!(state.filter.category, "all");
        assert_eq!(state.showing_count(), 1);
    }

    #[test]
    fn load_error_clears_the_view() {
        let mut state = ready_state();
        let err = crate::catalog::load(std::path::Path::new("/definitely/missing.json"))
            .unwrap_err();
        state.set_load_error(&err);
        assert!(matches!(state.phase, CatalogPhase::Failed(_)));
        assert_eq!(state.showing_count(), 0);
        assert!(state.get_selected().is_none());
    }

    #[test]
    fn favorite_toggle_persists_through_the_injected_store() {
        let dir = tempfile::tempdir().unwrap();
        let fav_path = dir.path().join("favorites.json");

        let mut state = AppState::with_store(Config::default(), Some(fav_path.clone()), None);
        state.set_entries(vec![entry(1, "Foo", "news", "News")]);
        state.toggle_selected_favorite();
        assert!(fav_path.exists());

        // A fresh session pointed at the same store sees the favorite.
        let reloaded = AppState::with_store(Config::default(), Some(fav_path), None);
        assert!(reloaded.favorites.contains(1));
        assert_eq!(reloaded.favorites_count(), 1);
    }

    #[test]
    fn night_mode_toggle_persists_through_the_injected_store() {
        let dir = tempfile::tempdir().unwrap();
        let mode_path = dir.path().join("night-mode");

        let mut state = AppState::with_store(Config::default(), None, Some(mode_path.clone()));
        state.toggle_night_mode();
        assert!(state.night_mode);

        let reloaded = AppState::with_store(Config::default(), None, Some(mode_path));
        assert!(reloaded.night_mode);
    }

    #[test]
    fn storeless_state_keeps_mutations_in_memory() {
        let mut state = ready_state();
        state.toggle_selected_favorite();
        assert!(state.favorites.contains(1));
        state.toggle_night_mode();
        assert!(state.night_mode);
    }

    #[test]
    fn favorites_count_reports_ledger_size_including_stale_ids() {
        let mut state = ready_state();
        state.favorites.toggle(1);
        state.favorites.toggle(999); // No such entry; tolerated.
        assert_eq!(state.favorites_count(), 2);
    }
}
