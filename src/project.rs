//! Godot project enumeration: script discovery, `project.godot` metadata
//! and scene-to-script links.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PROJECT_FILE: &str = "project.godot";

/// Project-level data written next to the per-script documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectInfo {
    /// `section/key` → value from `project.godot`
    pub metadata: BTreeMap<String, String>,
    /// script → scenes referencing it
    pub scene_links: BTreeMap<PathBuf, Vec<PathBuf>>,
}

/// Expand files, directories (recursive) and glob patterns into `.gd`
/// scripts. Sorted and deduplicated.
pub fn discover_scripts<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let path = Path::new(input);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let pattern = if path.is_dir() {
            format!("{}/**/*.gd", input.trim_end_matches('/'))
        } else {
            input.to_string()
        };
        let matches: Vec<_> = glob::glob(&pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file() && is_script(p))
            .collect();
        if matches.is_empty() {
            warn!("no scripts matched: {}", input);
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn is_script(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gd")
}

/// Read `project.godot` below `root`.
pub fn read_project_metadata(root: &Path) -> Result<BTreeMap<String, String>> {
    let path = root.join(PROJECT_FILE);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_project_file(&text))
}

/// Flatten the ini-style project file into `section/key` entries.
/// Keys before the first section stay bare. Lines without `=` (value
/// continuations, comments) are skipped.
pub fn parse_project_file(text: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let mut section = String::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let key = if section.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", section, key)
        };
        metadata.insert(key, unquote(value.trim()).to_string());
    }
    metadata
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Link each script to the `.tscn` scenes below `root` mentioning its
/// file name. Scripts without scenes are left out.
pub fn link_scenes(root: &Path, scripts: &[PathBuf]) -> Result<BTreeMap<PathBuf, Vec<PathBuf>>> {
    let pattern = format!("{}/**/*.tscn", root.display());
    let mut scenes: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?
        .filter_map(|r| r.ok())
        .collect();
    scenes.sort();

    let mut links: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for scene in &scenes {
        let content = match fs::read_to_string(scene) {
            Ok(content) => content,
            Err(e) => {
                warn!("skipping scene {}: {}", scene.display(), e);
                continue;
            }
        };
        for script in scripts {
            let Some(name) = script.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if content.contains(name) {
                debug!(script = %script.display(), scene = %scene.display(), "linked");
                links.entry(script.clone()).or_default().push(scene.clone());
            }
        }
    }
    Ok(links)
}
