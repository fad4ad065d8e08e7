//! gddoc: extract documentation trees from GDScript doc-comments.
//!
//! Three modes:
//!
//! - **stdin mode**: `gddoc < player.gd` prints the JSON tree
//! - **file mode**: `gddoc -o docs scripts/ main.gd` (globs and directories supported)
//! - **config mode**: `gddoc` with a `gddoc.yml` in the working directory, or `gddoc -c settings.yml`

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use gddoc::config::{self, Settings, DEFAULT_CONFIG_FILE};
use gddoc::indent::IndentUnit;
use gddoc::model::ClassDoc;
use gddoc::parser::{self, ScanOutcome};
use gddoc::project::{self, ProjectInfo};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gddoc",
    about = "Extract documentation trees from GDScript doc-comments"
)]
struct Cli {
    /// Scripts, directories or glob patterns. If omitted, uses the
    /// settings file when present, otherwise reads from stdin.
    files: Vec<String>,

    /// Settings file [default: gddoc.yml]
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write a settings template and exit
    #[arg(long)]
    init: bool,

    /// Output directory for the JSON documents (stdout when omitted)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Indentation unit: `tabulator` or `N spaces`
    #[arg(long)]
    indent: Option<IndentUnit>,

    /// More logging (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Fail when any diagnostic was reported
    #[arg(long)]
    deny_warnings: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if cli.init {
        config::init(&config_path)?;
        println!("created {}", config_path.display());
        return Ok(());
    }

    let summary = if !cli.files.is_empty() {
        file_mode(&cli)?
    } else if cli.config.is_some() || config_path.is_file() {
        config_mode(&cli, &config_path)?
    } else {
        stdin_mode(&cli)?
    };

    if summary.unreadable > 0 {
        bail!("{} file(s) could not be read", summary.unreadable);
    }
    if cli.deny_warnings && summary.diagnostics > 0 {
        bail!("{} diagnostic(s) reported", summary.diagnostics);
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Summary {
    diagnostics: usize,
    unreadable: usize,
}

impl Summary {
    fn of<'a>(outcomes: impl IntoIterator<Item = &'a ScanOutcome>) -> Self {
        let mut summary = Summary::default();
        for outcome in outcomes {
            summary.diagnostics += outcome.diagnostics.len();
            if outcome.is_aborted() {
                summary.unreadable += 1;
            }
        }
        summary
    }
}

/// stdin mode: scan standard input, print its tree.
fn stdin_mode(cli: &Cli) -> Result<Summary> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let outcome = parser::scan_str("<stdin>", &input, cli.indent.unwrap_or_default());
    println!("{}", serde_json::to_string_pretty(&outcome.tree)?);
    Ok(Summary::of([&outcome]))
}

/// file mode: scan the named scripts.
fn file_mode(cli: &Cli) -> Result<Summary> {
    let scripts = project::discover_scripts(&cli.files)?;
    if scripts.is_empty() {
        bail!("no scripts found");
    }
    let outcomes = parser::scan_all(&scripts, cli.indent.unwrap_or_default());
    emit(&outcomes, None, cli.output.as_deref())?;
    Ok(Summary::of(outcomes.values()))
}

/// config mode: scan what the settings file names, CLI flags win.
fn config_mode(cli: &Cli, config_path: &Path) -> Result<Summary> {
    let settings = Settings::load(config_path)?;
    let indent = cli.indent.unwrap_or(settings.indentation);
    let destination = cli.output.clone().or(settings.doc_destination.clone());

    let mut inputs: Vec<String> = Vec::new();
    let project_root = match (&settings.project_scan_options.src_path, settings.project_scan) {
        (Some(root), true) => {
            inputs.push(root.to_string_lossy().to_string());
            Some(root.clone())
        }
        _ => None,
    };
    if settings.filelist_scan {
        inputs.extend(settings.scan_list.iter().map(|p| p.to_string_lossy().to_string()));
    }

    let scripts = project::discover_scripts(&inputs)?;
    info!(scripts = scripts.len(), "scripts discovered");
    let outcomes = parser::scan_all(&scripts, indent);

    let project = match project_root {
        Some(root) => Some(project_info(&root, &settings, &scripts)?),
        None => None,
    };
    emit(&outcomes, project.as_ref(), destination.as_deref())?;
    Ok(Summary::of(outcomes.values()))
}

fn project_info(root: &Path, settings: &Settings, scripts: &[PathBuf]) -> Result<ProjectInfo> {
    let mut info = ProjectInfo::default();
    if settings.project_scan_options.read_gd_project {
        match project::read_project_metadata(root) {
            Ok(metadata) => info.metadata = metadata,
            Err(e) => warn!("{:#}", e),
        }
    }
    if settings.project_scan_options.scene2src_links {
        info.scene_links = project::link_scenes(root, scripts)?;
    }
    Ok(info)
}

/// Everything printed when no output directory is given.
#[derive(Serialize)]
struct Dump<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a ProjectInfo>,
    scripts: BTreeMap<String, &'a ClassDoc>,
}

/// Write one JSON document per script (plus `project.json`) into
/// `destination`, or a single document to stdout.
fn emit(
    outcomes: &BTreeMap<PathBuf, ScanOutcome>,
    project: Option<&ProjectInfo>,
    destination: Option<&Path>,
) -> Result<()> {
    let Some(dir) = destination else {
        let dump = Dump {
            project,
            scripts: outcomes
                .iter()
                .map(|(path, outcome)| (path.to_string_lossy().to_string(), &outcome.tree))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let mut used = HashSet::new();
    for (path, outcome) in outcomes {
        let mut name = derive_output_name(path);
        if !used.insert(name.clone()) {
            name = flatten_path(path);
            used.insert(name.clone());
        }
        let out_path = dir.join(format!("{}.json", name));
        fs::write(&out_path, serde_json::to_string_pretty(&outcome.tree)?)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
    }
    if let Some(project) = project {
        let out_path = dir.join("project.json");
        fs::write(&out_path, serde_json::to_string_pretty(project)?)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
    }
    info!(dir = %dir.display(), files = outcomes.len(), "documents written");
    Ok(())
}

/// Derive the output file name (without extension) from a script path.
/// "scenes/player.gd" → "player"
fn derive_output_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Name for a script whose file stem is already taken.
/// "actors/enemy/mob.gd" → "actors_enemy_mob"
fn flatten_path(path: &Path) -> String {
    path.with_extension("")
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_from_script() {
        assert_eq!(derive_output_name(Path::new("scenes/player.gd")), "player");
        assert_eq!(derive_output_name(Path::new("player.gd")), "player");
    }

    #[test]
    fn output_name_no_extension() {
        assert_eq!(derive_output_name(Path::new("Makefile")), "Makefile");
    }

    #[test]
    fn flattened_names() {
        assert_eq!(flatten_path(Path::new("./actors/enemy/mob.gd")), "actors_enemy_mob");
        assert_eq!(flatten_path(Path::new("/tmp/x/mob.gd")), "tmp_x_mob");
    }

    #[test]
    fn summary_counts() {
        let ok = parser::scan_str("a.gd", "## @tutorial: nope\nsignal s\n", IndentUnit::Tab);
        let gone = parser::scan_file(Path::new("/nonexistent/b.gd"), IndentUnit::Tab);
        let summary = Summary::of([&ok, &gone]);
        assert_eq!(summary, Summary { diagnostics: 2, unreadable: 1 });
    }
}
