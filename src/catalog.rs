use crate::config::{self, Config};
use crate::model::{CatalogDoc, Entry};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The one failure mode that reaches the user: the initial load failing or
/// returning malformed data. Non-retryable; the view shows it permanently.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("catalog {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where the catalog document lives: CLI override, then config, then
/// data.json next to the config file, then the working directory.
pub fn resolve_path(cli_override: Option<PathBuf>, config: &Config) -> PathBuf {
    if let Some(path) = cli_override {
        return path;
    }
    if let Some(path) = &config.general.catalog {
        return path.clone();
    }
    if let Some(dir) = config::config_dir() {
        let candidate = dir.join("data.json");
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from("data.json")
}

/// Reads and parses the catalog exactly once. No retry, no partial result.
pub fn load(path: &Path) -> Result<Vec<Entry>, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: CatalogDoc =
        serde_json::from_str(&content).map_err(|source| CatalogError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("catalog: loaded {} entries from {:?}", doc.websites.len(), path);
    Ok(doc.websites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn loads_a_well_formed_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{"websites":[{"id":1,"name":"Foo","description":"d","url":"https://foo.test",
                "icon":"🌸","category":"news","categoryName":"News","tags":[]}]}"#,
        )
        .unwrap();

        let entries = load(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Foo");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn bad_json_is_a_malformed_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"websites\": [{\"id\": \"not a number\"}]}").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[test]
    fn cli_override_wins_path_resolution() {
        let config = Config::default();
        let got = resolve_path(Some(PathBuf::from("/tmp/own.json")), &config);
        assert_eq!(got, PathBuf::from("/tmp/own.json"));
    }

    #[test]
    fn config_path_beats_the_default() {
        let mut config = Config::default();
        config.general.catalog = Some(PathBuf::from("/srv/catalog.json"));
        assert_eq!(resolve_path(None, &config), PathBuf::from("/srv/catalog.json"));
    }
}
