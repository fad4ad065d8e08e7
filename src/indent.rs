//! Indentation unit used to scope function and inner-class bodies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width assumed for stray spaces in tab-indented files.
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndentUnit {
    #[default]
    Tab,
    Spaces(usize),
}

impl IndentUnit {
    pub const MIN_SPACES: usize = 2;
    pub const MAX_SPACES: usize = 12;

    pub fn spaces(n: usize) -> Result<Self, String> {
        if (Self::MIN_SPACES..=Self::MAX_SPACES).contains(&n) {
            Ok(IndentUnit::Spaces(n))
        } else {
            Err(format!(
                "indentation of {} spaces is outside {}..={}",
                n,
                Self::MIN_SPACES,
                Self::MAX_SPACES
            ))
        }
    }

    /// Indentation level of a line, counted in units. A hand-built
    /// `Spaces(0)` counts every space as one level.
    pub fn level(&self, line: &str) -> usize {
        let mut tabs = 0;
        let mut spaces = 0;
        for c in line.chars() {
            match c {
                '\t' => tabs += 1,
                ' ' => spaces += 1,
                _ => break,
            }
        }
        match self {
            IndentUnit::Tab => tabs + spaces / TAB_WIDTH,
            IndentUnit::Spaces(n) => tabs + spaces / (*n).max(1),
        }
    }
}

impl FromStr for IndentUnit {
    type Err = String;

    /// Accepts `tabulator`, `tab`, `N spaces` or a bare `N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "tab" || s == "tabulator" || s == "tabs" {
            return Ok(IndentUnit::Tab);
        }
        let count = s
            .strip_suffix("spaces")
            .or_else(|| s.strip_suffix("space"))
            .unwrap_or(s.as_str())
            .trim();
        let n: usize = count
            .parse()
            .map_err(|_| format!("unknown indentation `{}`; use `tabulator` or `N spaces`", s))?;
        IndentUnit::spaces(n)
    }
}

impl TryFrom<String> for IndentUnit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndentUnit> for String {
    fn from(unit: IndentUnit) -> Self {
        unit.to_string()
    }
}

impl fmt::Display for IndentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndentUnit::Tab => write!(f, "tabulator"),
            IndentUnit::Spaces(n) => write!(f, "{} spaces", n),
        }
    }
}
