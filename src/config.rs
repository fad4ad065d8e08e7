//! `gddoc.yml` settings: what to scan and where the JSON goes.

use crate::indent::IndentUnit;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "gddoc.yml";

const TEMPLATE_HEADER: &str = "\
# gddoc settings
#
# doc_destination: directory receiving one JSON file per script
# indentation:     `tabulator` or `N spaces` (2..=12)
# project_scan:    scan every .gd file below project_scan_options.src_path
# filelist_scan:   scan the files listed in scan_list
";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} doesn't exist; create a template with `gddoc --init`", .0.display())]
    NotFound(PathBuf),

    #[error("configuration file {} already exists; move it away to start over", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("nothing to scan: enable `project_scan` or `filelist_scan`")]
    NothingToScan,

    #[error("`project_scan` needs `project_scan_options.src_path`")]
    MissingSrcPath,

    #[error("`filelist_scan` is enabled but `scan_list` is empty")]
    EmptyScanList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Output directory; JSON goes to stdout when unset.
    pub doc_destination: Option<PathBuf>,
    pub indentation: IndentUnit,
    pub project_scan: bool,
    pub project_scan_options: ProjectScanOptions,
    pub filelist_scan: bool,
    pub scan_list: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectScanOptions {
    /// Root of the Godot project (where `project.godot` lives).
    pub src_path: Option<PathBuf>,
    pub read_gd_project: bool,
    pub scene2src_links: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            doc_destination: None,
            indentation: IndentUnit::Tab,
            project_scan: false,
            project_scan_options: ProjectScanOptions::default(),
            filelist_scan: false,
            scan_list: Vec::new(),
        }
    }
}

impl Default for ProjectScanOptions {
    fn default() -> Self {
        ProjectScanOptions {
            src_path: None,
            read_gd_project: true,
            scene2src_links: true,
        }
    }
}

impl Settings {
    /// Contents written by `gddoc --init`.
    pub fn template() -> Self {
        Settings {
            doc_destination: Some(PathBuf::from("docs")),
            indentation: IndentUnit::Tab,
            project_scan: true,
            project_scan_options: ProjectScanOptions {
                src_path: Some(PathBuf::from(".")),
                ..Default::default()
            },
            filelist_scan: false,
            scan_list: vec![PathBuf::from("./file1.gd"), PathBuf::from("./file2.gd")],
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let settings = Settings::from_yaml(&text)?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.project_scan && !self.filelist_scan {
            return Err(ConfigError::NothingToScan);
        }
        if self.project_scan && self.project_scan_options.src_path.is_none() {
            return Err(ConfigError::MissingSrcPath);
        }
        if self.filelist_scan && self.scan_list.is_empty() {
            return Err(ConfigError::EmptyScanList);
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Write the settings template to `path`. Never overwrites.
pub fn init(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => ConfigError::AlreadyExists(path.to_path_buf()),
            _ => io_err(e),
        })?;
    let body = Settings::template().to_yaml()?;
    file.write_all(TEMPLATE_HEADER.as_bytes()).map_err(io_err)?;
    file.write_all(body.as_bytes()).map_err(io_err)?;
    info!(path = %path.display(), "settings template created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_is_valid() {
        let yaml = Settings::template().to_yaml().unwrap();
        let parsed = Settings::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, Settings::template());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let settings = Settings::from_yaml(
            "filelist_scan: true\nscan_list: [a.gd]\nindentation: 4 spaces\n",
        )
        .unwrap();
        assert_eq!(settings.indentation, IndentUnit::Spaces(4));
        assert_eq!(settings.doc_destination, None);
        assert!(settings.project_scan_options.read_gd_project);
    }

    #[test]
    fn validation_errors() {
        assert!(matches!(
            Settings::from_yaml("doc_destination: out\n"),
            Err(ConfigError::NothingToScan)
        ));
        assert!(matches!(
            Settings::from_yaml("project_scan: true\n"),
            Err(ConfigError::MissingSrcPath)
        ));
        assert!(matches!(
            Settings::from_yaml("filelist_scan: true\n"),
            Err(ConfigError::EmptyScanList)
        ));
        assert!(matches!(
            Settings::from_yaml("filelist_scan: true\nscan_list: [a.gd]\nindentation: 20\n"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            Settings::from_yaml("project_scan: true\nrebuild_src_path: true\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        init(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# gddoc settings"));
        assert!(Settings::load(&path).is_ok());
        assert!(matches!(init(&path), Err(ConfigError::AlreadyExists(_))));
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Settings::load(&dir.path().join("nope.yml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
