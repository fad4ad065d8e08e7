//! gddoc: documentation trees from GDScript (Godot 4) doc-comments.
//!
//! [`parser::scan_str`] / [`parser::scan_file`] turn one script into a
//! [`model::ClassDoc`] plus the diagnostics reported on the way;
//! [`parser::scan_all`] does many scripts in parallel.

pub mod config;
pub mod error;
pub mod indent;
pub mod links;
pub mod model;
pub mod parser;
pub mod project;
