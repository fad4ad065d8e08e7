//! Parser module: line sources feeding the doc-comment scanner.

pub mod decl;
pub mod lexical;
pub mod scanner;
pub mod tag;

pub use scanner::Scanner;

use crate::error::{Diagnostic, DocError};
use crate::indent::IndentUnit;
use crate::model::ClassDoc;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

/// Tree of one file and everything reported while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub tree: ClassDoc,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanOutcome {
    /// True when the source could not be read to the end.
    pub fn is_aborted(&self) -> bool {
        self.diagnostics.iter().any(|d| d.error.is_fatal())
    }
}

/// Scan source text held in memory.
pub fn scan_str(path: impl Into<PathBuf>, input: &str, indent: IndentUnit) -> ScanOutcome {
    let mut scanner = Scanner::new(path, indent);
    for line in input.split_inclusive('\n') {
        scanner.feed(line);
    }
    scanner.finish()
}

/// Scan any buffered reader. A read error ends the scan with
/// `SourceUnreadable`; the tree built so far is kept.
pub fn scan_reader<R: BufRead>(path: impl Into<PathBuf>, mut reader: R, indent: IndentUnit) -> ScanOutcome {
    let path = path.into();
    let mut scanner = Scanner::new(path.clone(), indent);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return scanner.finish(),
            Ok(_) => scanner.feed(&line),
            Err(e) => {
                return scanner.abort(DocError::SourceUnreadable(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }
}

pub fn scan_file(path: &Path, indent: IndentUnit) -> ScanOutcome {
    match File::open(path) {
        Ok(file) => scan_reader(path, BufReader::new(file), indent),
        Err(e) => Scanner::new(path, indent).abort(DocError::SourceUnreadable(format!(
            "opening {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Scan many files in parallel. Keyed by path, so the result does not
/// depend on scheduling.
pub fn scan_all(paths: &[PathBuf], indent: IndentUnit) -> BTreeMap<PathBuf, ScanOutcome> {
    let outcomes: BTreeMap<PathBuf, ScanOutcome> = paths
        .par_iter()
        .map(|path| (path.clone(), scan_file(path, indent)))
        .collect();
    let diagnostics: usize = outcomes.values().map(|o| o.diagnostics.len()).sum();
    info!(files = outcomes.len(), diagnostics, "scan finished");
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use tempfile::TempDir;

    #[test]
    fn reader_and_str_agree() {
        let input = "## Doc.\nfunc f():\n\tpass\n";
        let from_str = scan_str("a.gd", input, IndentUnit::Tab);
        let from_reader = scan_reader("a.gd", input.as_bytes(), IndentUnit::Tab);
        assert_eq!(from_str, from_reader);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let out = scan_file(Path::new("/nonexistent/dir/missing.gd"), IndentUnit::Tab);
        assert!(out.is_aborted());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].line, None);
        assert!(!out.tree.has_members());
    }

    /// Yields its data, then fails.
    struct Flaky<'a> {
        data: &'a [u8],
    }

    impl Read for Flaky<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("disk went away"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn read_error_keeps_partial_tree() {
        let reader = BufReader::new(Flaky {
            data: b"signal a\nsignal b\n",
        });
        let out = scan_reader("flaky.gd", reader, IndentUnit::Tab);
        assert_eq!(out.tree.signals().len(), 2);
        assert!(out.is_aborted());
        assert!(matches!(
            out.diagnostics[0].error,
            DocError::SourceUnreadable(_)
        ));
    }

    #[test]
    fn scan_all_is_keyed_by_path() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("b.gd");
        let a = dir.path().join("a.gd");
        std::fs::write(&b, "class_name B\n").unwrap();
        std::fs::write(&a, "class_name A\n").unwrap();
        let out = scan_all(&[b.clone(), a.clone()], IndentUnit::Tab);
        let names: Vec<&str> = out.values().map(|o| o.tree.class_name()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(out[&a].tree.path(), a.as_path());
    }
}
