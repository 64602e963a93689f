//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::PartialConfig;
use crate::routing::RouteError;

/// Conventional config file names, tried in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["page-front.toml", "page-front.config.toml", ".page-front.toml"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Find the first conventional config file in `dir`.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Parse a partial configuration from a TOML file.
pub fn load_partial(path: &Path) -> Result<PartialConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the conventional config file from `dir`, if there is one.
pub fn load_from_dir(dir: &Path) -> Result<Option<(PathBuf, PartialConfig)>, ConfigError> {
    match discover_config(dir) {
        Some(path) => {
            let partial = load_partial(&path)?;
            Ok(Some((path, partial)))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    #[test]
    fn test_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).is_none());

        fs::write(dir.path().join(".page-front.toml"), "").unwrap();
        assert_eq!(
            discover_config(dir.path()).unwrap(),
            dir.path().join(".page-front.toml")
        );

        fs::write(dir.path().join("page-front.toml"), "").unwrap();
        assert_eq!(
            discover_config(dir.path()).unwrap(),
            dir.path().join("page-front.toml")
        );
    }

    #[test]
    fn test_load_partial_with_legacy_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-front.toml");
        fs::write(
            &path,
            r#"
mode = "production"
vitePort = 4001
clearScreen = true

[[routes]]
path = "/admin"
file = "src/admin.tsx"
name = "admin"
"#,
        )
        .unwrap();

        let partial = load_partial(&path).unwrap();
        assert_eq!(partial.mode, Some(Mode::Production));
        assert_eq!(partial.dev_port, Some(4001));
        assert_eq!(partial.clear_screen, Some(true));
        assert_eq!(partial.routes.len(), 1);
        assert_eq!(partial.routes[0].name, "admin");
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(load_partial(&missing), Err(ConfigError::NotFound(_))));

        let broken = dir.path().join("page-front.toml");
        fs::write(&broken, "mode = [").unwrap();
        assert!(matches!(load_partial(&broken), Err(ConfigError::Parse { .. })));

        assert!(load_from_dir(&dir.path().join("empty")).unwrap().is_none());
    }
}
