use crate::model::Entry;
use std::collections::BTreeSet;

/// Sentinel category slug meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

/// The visible filter controls. Mutated only by input handlers; the filtered
/// view is recomputed from scratch on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub category: String,
    pub search: String,
    pub favorites_only: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            search: String::new(),
            favorites_only: false,
        }
    }
}

/// Filters the catalog down to the indices of entries passing every active
/// clause. Pure and total: empty search and empty favorites are valid inputs.
/// Relative order of the result always equals catalog order.
pub fn filter(entries: &[Entry], state: &FilterState, favorites: &BTreeSet<u32>) -> Vec<usize> {
    let needle = state.search.trim().to_lowercase();
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            if state.category != ALL_CATEGORIES && e.category != state.category {
                return false;
            }
            if !needle.is_empty() && !matches_search(e, &needle) {
                return false;
            }
            if state.favorites_only && !favorites.contains(&e.id) {
                return false;
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

/// Case-insensitive substring match against name, description, any tag, or
/// the category display label. `needle` must already be lowercased.
fn matches_search(entry: &Entry, needle: &str) -> bool {
    entry.name.to_lowercase().contains(needle)
        || entry.description.to_lowercase().contains(needle)
        || entry.tags.iter().any(|t| t.to_lowercase().contains(needle))
        || entry.category_name.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: u32, name: &str, category: &str, category_name: &str, tags: &[&str]) -> Entry {
        Entry {
            id,
            name: name.to_string(),
            description: format!("{name} description"),
            url: format!("https://{}.example.com", name.to_lowercase()),
            icon: String::new(),
            category: category.to_string(),
            category_name: category_name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry(1, "Foo", "news", "News", &["a"]),
            entry(2, "Bar", "tools", "Tools", &["b"]),
            entry(3, "Baz", "news", "News", &["foobar"]),
        ]
    }

    #[test]
    fn identity_when_no_filter_active() {
        let entries = sample();
        let got = filter(&entries, &FilterState::default(), &BTreeSet::new());
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[test]
    fn category_clause_restricts_to_slug() {
        let entries = sample();
        let state = FilterState {
            category: "tools".to_string(),
            ..Default::default()
        };
        let got = filter(&entries, &state, &BTreeSet::new());
        assert_eq!(got, vec![1]);
        for &i in &got {
            assert_eq!(entries[i].category, "tools");
        }
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let entries = sample();
        let state = FilterState {
            search: "FOO".to_string(),
            ..Default::default()
        };
        // "Foo" by name, "Baz" via its "foobar" tag.
        let got = filter(&entries, &state, &BTreeSet::new());
        assert_eq!(got, vec![0, 2]);

        // Category display label is searched too.
        let state = FilterState {
            search: "tools".to_string(),
            ..Default::default()
        };
        assert_eq!(filter(&entries, &state, &BTreeSet::new()), vec![1]);
    }

    #[test]
    fn favorites_only_with_empty_set_yields_nothing() {
        let entries = sample();
        let state = FilterState {
            favorites_only: true,
            ..Default::default()
        };
        assert!(filter(&entries, &state, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn favorites_only_keeps_ledger_members() {
        let entries = sample();
        let favorites = BTreeSet::from([2]);
        let state = FilterState {
            favorites_only: true,
            ..Default::default()
        };
        let got = filter(&entries, &state, &favorites);
        assert_eq!(got, vec![1]);
        assert!(got.iter().all(|&i| favorites.contains(&entries[i].id)));
    }

    #[test]
    fn clauses_conjoin() {
        let entries = sample();
        let favorites = BTreeSet::from([1, 2]);
        let state = FilterState {
            category: "news".to_string(),
            search: "foo".to_string(),
            favorites_only: true,
        };
        // Baz matches news+foo but is not a favorite; Bar is a favorite but
        // wrong category. Only Foo passes all three clauses.
        assert_eq!(filter(&entries, &state, &favorites), vec![0]);
    }

    #[test]
    fn stale_favorite_ids_are_harmless() {
        let entries = sample();
        let favorites = BTreeSet::from([2, 999]);
        let state = FilterState {
            favorites_only: true,
            ..Default::default()
        };
        assert_eq!(filter(&entries, &state, &favorites), vec![1]);
    }

    #[test]
    fn order_is_catalog_order() {
        let entries = sample();
        let state = FilterState {
            search: "description".to_string(),
            ..Default::default()
        };
        assert_eq!(filter(&entries, &state, &BTreeSet::new()), vec![0, 1, 2]);
    }

    #[test]
    fn surrounding_whitespace_in_search_is_ignored() {
        let entries = sample();
        let state = FilterState {
            search: "  bar \n".to_string(),
            ..Default::default()
        };
        assert_eq!(filter(&entries, &state, &BTreeSet::new()), vec![1, 2]);
    }
}
