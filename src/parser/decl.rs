//! Declaration header parsing: `const`, `var`, `signal`, `enum`, `func`
//! and `class` lines, with doc-comments already split off.

use super::lexical::{
    find_unquoted, is_identifier, matching_close, split_top_level, strip_keyword,
};
use crate::error::DocError;
use crate::model::{VarDoc, VarKind};

/// Annotations and qualifiers found in front of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub export: bool,
    pub onready: bool,
    pub is_static: bool,
}

impl Modifiers {
    /// Variable kind implied by the modifiers of a `var` line.
    pub fn var_kind(&self) -> VarKind {
        if self.export {
            VarKind::ExportVar
        } else if self.onready {
            VarKind::OnReadyVar
        } else {
            VarKind::PlainVar
        }
    }
}

/// Export annotations that group the inspector instead of exporting a var.
const EXPORT_GROUPING: &[&str] = &["@export_category", "@export_group", "@export_subgroup"];

/// Strip leading `@annotation(...)` and `static` prefixes.
pub fn strip_modifiers(code: &str) -> (Modifiers, &str) {
    let mut mods = Modifiers::default();
    let mut rest = code.trim_start();
    loop {
        if rest.starts_with('@') {
            let name_len = rest[1..]
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .map_or(rest.len(), |n| n + 1);
            let name = &rest[..name_len];
            if name == "@onready" {
                mods.onready = true;
            } else if name.starts_with("@export") && !EXPORT_GROUPING.contains(&name) {
                mods.export = true;
            }
            let mut after = &rest[name_len..];
            if after.starts_with('(') {
                match matching_close(after, 0) {
                    Some(close) => after = &after[close + 1..],
                    None => after = "",
                }
            }
            rest = after.trim_start();
        } else if let Some(after) = strip_keyword(rest, "static") {
            mods.is_static = true;
            rest = after.trim_start();
        } else {
            return (mods, rest);
        }
    }
}

/// Split result of a `const`, `var`, `signal` or `enum` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub data_type: Option<String>,
    pub value: Option<String>,
    /// Parameters of `signal name(...)`.
    pub params: Vec<VarDoc>,
    /// Property followed by a `get`/`set` accessor block (`var x: int:`).
    pub has_accessors: bool,
    pub modifiers: Modifiers,
}

/// Parse a declaration header for `keyword`.
///
/// `:=` wins over a bare `=`; the type annotation is searched only left of
/// the value. Enums may be anonymous, every other name must be an
/// identifier.
pub fn parse_declaration(code: &str, keyword: &str) -> Result<Declaration, DocError> {
    let (modifiers, rest) = strip_modifiers(code);
    let rest = strip_keyword(rest, keyword)
        .ok_or_else(|| malformed(format!("expected `{}` in `{}`", keyword, code.trim())))?;
    let mut rest = rest.trim();

    let mut decl = Declaration {
        modifiers,
        ..Default::default()
    };

    if keyword == "var" {
        if let Some(stripped) = rest.strip_suffix(':') {
            decl.has_accessors = true;
            rest = stripped.trim_end();
        }
    }

    if keyword == "signal" {
        if let Some(open) = rest.find('(') {
            let close = matching_close(rest, open)
                .ok_or_else(|| malformed(format!("unterminated parameter list in `{}`", code.trim())))?;
            decl.params = parse_params(&rest[open + 1..close])?;
            rest = rest[..open].trim_end();
        }
    }

    let head = if let Some(i) = find_unquoted(rest, ":=") {
        decl.value = Some(non_empty_value(&rest[i + 2..], code)?);
        &rest[..i]
    } else if let Some(i) = find_unquoted(rest, "=") {
        decl.value = Some(non_empty_value(&rest[i + 1..], code)?);
        &rest[..i]
    } else {
        rest
    };

    let name = match head.find(':') {
        Some(j) => {
            let data_type = head[j + 1..].trim();
            if data_type.is_empty() {
                return Err(malformed(format!("missing type after `:` in `{}`", code.trim())));
            }
            decl.data_type = Some(data_type.to_string());
            head[..j].trim()
        }
        None => head.trim(),
    };

    let anonymous_enum = keyword == "enum" && name.is_empty();
    if !anonymous_enum && !is_identifier(name) {
        return Err(malformed(format!("`{}` is not a valid {} name", name, keyword)));
    }
    decl.name = name.to_string();
    Ok(decl)
}

/// Parse a parameter list (without the parentheses) into argument docs.
pub fn parse_params(inner: &str) -> Result<Vec<VarDoc>, DocError> {
    let mut args = Vec::new();
    for piece in split_top_level(inner, ',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let (head, value) = if let Some(i) = find_unquoted(piece, ":=") {
            (&piece[..i], Some(piece[i + 2..].trim()))
        } else if let Some(i) = find_unquoted(piece, "=") {
            (&piece[..i], Some(piece[i + 1..].trim()))
        } else {
            (piece, None)
        };
        let (name, data_type) = match head.split_once(':') {
            Some((name, ty)) => (name.trim(), Some(ty.trim()).filter(|t| !t.is_empty())),
            None => (head.trim(), None),
        };
        if !is_identifier(name) {
            return Err(malformed(format!("`{}` is not a valid parameter", piece)));
        }
        args.push(VarDoc::new(name, data_type, value, VarKind::PlainVar));
    }
    Ok(args)
}

/// Parsed `func name(params) -> Type:` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuncHeader {
    pub name: String,
    pub args: Vec<VarDoc>,
    pub return_type: Option<String>,
    pub is_static: bool,
    /// Statement written after the header colon, e.g. `pass`.
    pub inline_body: Option<String>,
}

pub fn parse_func_header(code: &str) -> Result<FuncHeader, DocError> {
    let (mods, rest) = strip_modifiers(code);
    let rest = strip_keyword(rest, "func")
        .ok_or_else(|| malformed(format!("expected `func` in `{}`", code.trim())))?
        .trim_start();
    let open = rest
        .find('(')
        .ok_or_else(|| malformed(format!("missing `(` in `{}`", code.trim())))?;
    let name = rest[..open].trim();
    if !is_identifier(name) {
        return Err(malformed(format!("`{}` is not a valid function name", name)));
    }
    let close = matching_close(rest, open)
        .ok_or_else(|| malformed(format!("unterminated parameter list in `{}`", code.trim())))?;
    let args = parse_params(&rest[open + 1..close])?;

    let mut tail = rest[close + 1..].trim_start();
    let mut return_type = None;
    if let Some(after_arrow) = tail.strip_prefix("->") {
        let colon = after_arrow
            .find(':')
            .ok_or_else(|| malformed(format!("missing `:` after `{}`", code.trim())))?;
        return_type = Some(after_arrow[..colon].trim().to_string());
        tail = &after_arrow[colon..];
    }
    let body = tail
        .strip_prefix(':')
        .ok_or_else(|| malformed(format!("missing `:` after `{}`", code.trim())))?
        .trim();

    Ok(FuncHeader {
        name: name.to_string(),
        args,
        return_type,
        is_static: mods.is_static,
        inline_body: Some(body.to_string()).filter(|b| !b.is_empty()),
    })
}

/// Split `class Name [extends Base]:` into name and base. The name is
/// validated by the model, not here.
pub fn parse_class_header(code: &str) -> Result<(String, Option<String>), DocError> {
    let (_, rest) = strip_modifiers(code);
    let rest = strip_keyword(rest, "class")
        .ok_or_else(|| malformed(format!("expected `class` in `{}`", code.trim())))?;
    let rest = rest
        .trim()
        .strip_suffix(':')
        .ok_or_else(|| malformed(format!("missing `:` after `{}`", code.trim())))?;
    match find_unquoted(rest, " extends ") {
        Some(i) => {
            let base = rest[i + " extends ".len()..].trim().trim_matches('"');
            Ok((rest[..i].trim().to_string(), Some(base.to_string())))
        }
        None => Ok((rest.trim().to_string(), None)),
    }
}

fn non_empty_value(value: &str, code: &str) -> Result<String, DocError> {
    let value = value.trim();
    if value.is_empty() {
        Err(malformed(format!("missing value after `=` in `{}`", code.trim())))
    } else {
        Ok(value.to_string())
    }
}

fn malformed(msg: String) -> DocError {
    DocError::MalformedDeclarationLine(msg)
}
