// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::fs::FileSystem;

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Like [`load_from_path`], reading through `fs`.
pub fn load_with_fs(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path)?;
    parse_str(&contents)
}

/// Deserialize config text without semantic validation.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a config file and validate it: references, self-dependencies,
/// cycles and the default target.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let config = ConfigFile::try_from(raw)?;
    debug!(path = %path.display(), targets = config.target.len(), "loaded config");
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Rundag.toml")
}

/// Directory that relative paths in a config file are resolved against.
///
/// A bare file name such as `Rundag.toml` has an empty parent, which means
/// the current directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RundagError;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn parses_targets_in_document_order() {
        let raw = parse_str(
            r#"
            [config]
            default_target = "Test"

            [target.Test]
            after = ["Compile"]

            [target.Compile]
            cmd = "make"
            "#,
        )
        .unwrap();

        let names: Vec<_> = raw.target.keys().cloned().collect();
        assert_eq!(names, vec!["Test", "Compile"]);
        assert_eq!(raw.config.default_target.as_deref(), Some("Test"));
        assert_eq!(raw.target["Compile"].cmd.as_deref(), Some("make"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_str("[target.A]\ncommand = \"echo\"\n").unwrap_err();
        assert!(matches!(err, RundagError::TomlError(_)));
    }

    #[test]
    fn loads_through_a_filesystem() {
        let fs = MockFileSystem::new();
        fs.add_file("ci/Rundag.toml", "[target.Build]\ncmd = \"make\"\n");

        let raw = load_with_fs(&fs, Path::new("ci/Rundag.toml")).unwrap();
        assert!(raw.target.contains_key("Build"));

        let missing = load_with_fs(&fs, Path::new("Rundag.toml")).unwrap_err();
        assert!(matches!(missing, RundagError::Other(_)));
    }

    #[test]
    fn root_dir_of_bare_file_name_is_current_dir() {
        assert_eq!(config_root_dir(Path::new("Rundag.toml")), PathBuf::from("."));
        assert_eq!(
            config_root_dir(Path::new("build/Rundag.toml")),
            PathBuf::from("build")
        );
    }
}
