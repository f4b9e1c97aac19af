use anyhow::Result;
use directories::ProjectDirs;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted set of favorite entry ids. Ids referencing entries that have
/// since left the catalog are tolerated and never pruned.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Favorites {
    ids: BTreeSet<u32>,
}

impl Favorites {
    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Add if absent, remove if present. Returns whether the id is a favorite
    /// afterwards. Toggling twice restores the original set.
    pub fn toggle(&mut self, id: u32) -> bool {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &BTreeSet<u32> {
        &self.ids
    }
}

pub fn favorites_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "hanami", "hanami")
        .map(|dirs| dirs.data_dir().join("favorites.json"))
}

/// Loads the ledger from the given file. Absent or unparseable state yields
/// an empty set; never an error.
pub fn load_from(path: &Path) -> Favorites {
    if let Ok(content) = fs::read_to_string(path) {
        if let Ok(ids) = serde_json::from_str::<Vec<u32>>(&content) {
            return Favorites {
                ids: ids.into_iter().collect(),
            };
        }
        log::warn!("favorites file at {:?} is unreadable, starting empty", path);
    }
    Favorites::default()
}

/// Persists the full ledger. Callers treat failure as best-effort: the
/// in-memory set stays authoritative for the session.
pub fn save_to(path: &Path, favorites: &Favorites) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    // Stored as a plain id list, the same shape the set was loaded from.
    let ids: Vec<u32> = favorites.ids.iter().copied().collect();
    let content = serde_json::to_string(&ids)?;
    fs::write(path, content)?;
    Ok(())
}
