use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

// The night-mode flag is stored as the string "true"/"false" in its own
// file, independent of the favorites ledger. Anything else reads as false.

pub fn night_mode_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "hanami", "hanami")
        .map(|dirs| dirs.data_dir().join("night-mode"))
}

pub fn load_from(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|s| s.trim() == "true")
        .unwrap_or(false)
}

/// Best-effort persist; a failed write leaves the in-session flag intact.
pub fn save_to(path: &Path, night_mode: bool) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, night_mode.to_string())?;
    Ok(())
}
