//! Documentation tree produced by the scanner, one [`ClassDoc`] per file.
//!
//! Entity lists are append-only. They are filled by the scanner during a
//! single pass and exposed read-only afterwards.

use crate::error::DocError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Class name of a script that never declares `class_name`.
pub const NOT_EXPOSED: &str = "not exposed";

/// Declared type of a variable without a type annotation.
pub const UNDEFINED_TYPE: &str = "undefined";

/// Documentation of one script (or of an inner class within it).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDoc {
    path: PathBuf,
    class_name: String,
    extends: Option<String>,
    is_inner_class: bool,
    tags: Vec<Tag>,
    brief_description: String,
    detail_description: String,
    signals: Vec<SignalDoc>,
    enums: Vec<EnumDoc>,
    consts: Vec<VarDoc>,
    vars: Vec<VarDoc>,
    funcs: Vec<FuncDoc>,
    inner_classes: Vec<ClassDoc>,
    /// Verbatim body of an inner class; empty for a file root.
    body: String,
}

impl ClassDoc {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ClassDoc {
            path: path.into(),
            class_name: NOT_EXPOSED.to_string(),
            extends: None,
            is_inner_class: false,
            tags: Vec::new(),
            brief_description: String::new(),
            detail_description: String::new(),
            signals: Vec::new(),
            enums: Vec::new(),
            consts: Vec::new(),
            vars: Vec::new(),
            funcs: Vec::new(),
            inner_classes: Vec::new(),
            body: String::new(),
        }
    }

    /// Create the tree of an inner class. Inner classes must carry a real,
    /// space-free name.
    pub fn inner(path: impl Into<PathBuf>, class_name: &str) -> Result<Self, DocError> {
        let class_name = class_name.trim();
        if class_name.is_empty()
            || class_name == NOT_EXPOSED
            || class_name.chars().any(char::is_whitespace)
        {
            return Err(DocError::InvalidDeclaration(format!(
                "inner class needs a space-free name, got `{}`",
                class_name
            )));
        }
        let mut doc = ClassDoc::new(path);
        doc.class_name = class_name.to_string();
        doc.is_inner_class = true;
        Ok(doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_class_name(&mut self, class_name: &str) {
        self.class_name = class_name.to_string();
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn set_extends(&mut self, extends: &str) {
        self.extends = Some(extends.to_string());
    }

    pub fn is_inner_class(&self) -> bool {
        self.is_inner_class
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn brief_description(&self) -> &str {
        &self.brief_description
    }

    pub fn detail_description(&self) -> &str {
        &self.detail_description
    }

    /// Set the class docstring. Tags are appended to the class tags.
    pub fn set_description(&mut self, brief: &str, detail: &str, tags: Vec<Tag>) {
        self.brief_description = brief.to_string();
        self.detail_description = detail.to_string();
        self.tags.extend(tags);
    }

    pub fn has_description(&self) -> bool {
        !self.brief_description.is_empty()
            || !self.detail_description.is_empty()
            || !self.tags.is_empty()
    }

    pub fn signals(&self) -> &[SignalDoc] {
        &self.signals
    }

    pub fn enums(&self) -> &[EnumDoc] {
        &self.enums
    }

    pub fn consts(&self) -> &[VarDoc] {
        &self.consts
    }

    pub fn vars(&self) -> &[VarDoc] {
        &self.vars
    }

    pub fn funcs(&self) -> &[FuncDoc] {
        &self.funcs
    }

    pub fn inner_classes(&self) -> &[ClassDoc] {
        &self.inner_classes
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: String) {
        self.body = body;
    }

    pub fn add_signal(&mut self, signal: SignalDoc) {
        self.signals.push(signal);
    }

    pub fn add_enum(&mut self, doc: EnumDoc) {
        self.enums.push(doc);
    }

    /// Append a constant or variable to the list matching its kind.
    pub fn add_attribute(&mut self, var: VarDoc) {
        match var.kind {
            VarKind::Const => self.consts.push(var),
            _ => self.vars.push(var),
        }
    }

    pub fn add_func(&mut self, func: FuncDoc) {
        self.funcs.push(func);
    }

    pub fn add_inner_class(&mut self, class: ClassDoc) {
        self.inner_classes.push(class);
    }

    /// True once any member entity has been appended.
    pub fn has_members(&self) -> bool {
        !(self.signals.is_empty()
            && self.enums.is_empty()
            && self.consts.is_empty()
            && self.vars.is_empty()
            && self.funcs.is_empty()
            && self.inner_classes.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Tutorial,
    Deprecated,
    Experimental,
}

/// Lifecycle or reference annotation of a documented entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub kind: TagKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Tag {
    pub fn deprecated() -> Self {
        Tag {
            kind: TagKind::Deprecated,
            url: None,
            label: None,
        }
    }

    pub fn experimental() -> Self {
        Tag {
            kind: TagKind::Experimental,
            url: None,
            label: None,
        }
    }

    /// Tutorial link. The url must already have passed the url check.
    pub fn tutorial(url: &str, label: Option<&str>) -> Self {
        Tag {
            kind: TagKind::Tutorial,
            url: Some(url.to_string()),
            label: label.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalDoc {
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
    /// Parameters declared in `signal name(...)`.
    pub args: Vec<VarDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumDoc {
    /// Empty for anonymous enums.
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub members: Vec<EnumMember>,
}

impl EnumDoc {
    /// Value the next member takes when it has no explicit value, `None`
    /// once the previous value is `i64::MAX`.
    pub fn next_value(&self) -> Option<i64> {
        self.members.last().map_or(Some(0), |m| m.value.checked_add(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
    pub description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Const,
    ExportVar,
    #[serde(rename = "onready_var")]
    OnReadyVar,
    PlainVar,
}

impl FromStr for VarKind {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "const" => Ok(VarKind::Const),
            "export_var" => Ok(VarKind::ExportVar),
            "onready_var" => Ok(VarKind::OnReadyVar),
            "var" | "plain_var" => Ok(VarKind::PlainVar),
            other => Err(DocError::InvalidDeclaration(format!(
                "unknown variable kind `{}`",
                other
            ))),
        }
    }
}

/// A constant, a member variable, or a function/signal parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDoc {
    pub name: String,
    pub data_type: String,
    pub description: String,
    /// Literal initializer as written in the source, if any.
    pub value: Option<String>,
    pub kind: VarKind,
    pub tags: Vec<Tag>,
}

impl VarDoc {
    pub fn new(name: &str, data_type: Option<&str>, value: Option<&str>, kind: VarKind) -> Self {
        VarDoc {
            name: name.to_string(),
            data_type: data_type.unwrap_or(UNDEFINED_TYPE).to_string(),
            description: String::new(),
            value: value.map(str::to_string),
            kind,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FuncDoc {
    pub name: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub args: Vec<VarDoc>,
    pub return_type: Option<String>,
    /// Text of the `Returns:` section.
    pub return_description: String,
    pub is_static: bool,
    /// Verbatim body lines, terminators included.
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_is_empty() {
        let doc = ClassDoc::new("res/player.gd");
        assert_eq!(doc.class_name(), NOT_EXPOSED);
        assert_eq!(doc.extends(), None);
        assert!(!doc.has_members());
        assert!(!doc.has_description());
    }

    #[test]
    fn inner_class_requires_name() {
        assert!(ClassDoc::inner("a.gd", "Inner").is_ok());
        for bad in ["", NOT_EXPOSED, "Two Words"] {
            assert!(matches!(
                ClassDoc::inner("a.gd", bad),
                Err(DocError::InvalidDeclaration(_))
            ));
        }
    }

    #[test]
    fn attributes_route_by_kind() {
        let mut doc = ClassDoc::new("a.gd");
        doc.add_attribute(VarDoc::new("MAX", None, Some("3"), VarKind::Const));
        doc.add_attribute(VarDoc::new("hp", Some("int"), None, VarKind::ExportVar));
        doc.add_attribute(VarDoc::new("speed", None, None, VarKind::PlainVar));
        assert_eq!(doc.consts().len(), 1);
        let names: Vec<_> = doc.vars().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["hp", "speed"]);
        assert_eq!(doc.vars()[1].data_type, UNDEFINED_TYPE);
    }

    #[test]
    fn insertion_order_preserved() {
        let mut doc = ClassDoc::new("a.gd");
        for name in ["c", "a", "b"] {
            doc.add_signal(SignalDoc {
                name: name.to_string(),
                ..Default::default()
            });
            doc.add_func(FuncDoc {
                name: name.to_string(),
                ..Default::default()
            });
        }
        let signals: Vec<_> = doc.signals().iter().map(|s| s.name.as_str()).collect();
        let funcs: Vec<_> = doc.funcs().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(signals, ["c", "a", "b"]);
        assert_eq!(funcs, ["c", "a", "b"]);
    }

    #[test]
    fn var_kind_from_str() {
        assert_eq!("export_var".parse::<VarKind>(), Ok(VarKind::ExportVar));
        assert_eq!("onready_var".parse::<VarKind>(), Ok(VarKind::OnReadyVar));
        assert!(matches!(
            "static_var".parse::<VarKind>(),
            Err(DocError::InvalidDeclaration(_))
        ));
    }

    #[test]
    fn enum_next_value() {
        let mut doc = EnumDoc::default();
        assert_eq!(doc.next_value(), Some(0));
        doc.members.push(EnumMember {
            name: "A".to_string(),
            value: 7,
            ..Default::default()
        });
        assert_eq!(doc.next_value(), Some(8));
        doc.members.push(EnumMember {
            name: "B".to_string(),
            value: i64::MAX,
            ..Default::default()
        });
        assert_eq!(doc.next_value(), None);
    }

    #[test]
    fn var_kind_serializes_to_parsable_names() {
        for kind in [
            VarKind::Const,
            VarKind::ExportVar,
            VarKind::OnReadyVar,
            VarKind::PlainVar,
        ] {
            let value = serde_json::to_value(kind).unwrap();
            let name = value.as_str().unwrap();
            assert_eq!(name.parse::<VarKind>().unwrap(), kind);
        }
        assert_eq!(
            serde_json::to_value(VarKind::OnReadyVar).unwrap(),
            "onready_var"
        );
    }
}
