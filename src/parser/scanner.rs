//! GDScript doc-comment scanner: a line-by-line state machine.
//!
//! Consumes one source file a line at a time and fills a [`ClassDoc`].
//! Doc-comment blocks (`##`) accumulate in a [`Docstring`] until a code line
//! ends them; the code line is matched against [`DECLARATIONS`] in a fixed
//! order and the matching handler builds the entity that takes the block.
//!
//! Function and inner-class bodies are captured verbatim by indentation.
//! Inner-class bodies are scanned again by a nested scanner.

use super::decl;
use super::lexical::{self, TrailingComment};
use super::tag::parse_tag;
use super::ScanOutcome;
use crate::error::{Diagnostic, DocError};
use crate::indent::IndentUnit;
use crate::links::is_valid_http_url;
use crate::model::*;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

// -- Regex patterns -----------------------------------------------------------

static RE_CLASS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)class_name\s+([A-Za-z_]\w*)").unwrap());

static RE_EXTENDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)extends\s+("[^"]*"|'[^']*'|[A-Za-z_][\w.]*)"#).unwrap()
});

// `NAME` or `NAME = literal`
static RE_ENUM_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*(?:=\s*(\S.*))?$").unwrap());

// `name: text` or `name (type): text` inside an `Args:` section
static RE_ARG_DOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*(?:\([^)]*\))?\s*:\s*(.*)$").unwrap());

// -- Declaration table --------------------------------------------------------

type Handler = fn(&mut Scanner, &CodeLine<'_>) -> State;

/// Declarations that can own a doc-comment block, in matching order.
/// `var` covers the `@export` and `@onready` forms.
const DECLARATIONS: [(&str, Handler); 6] = [
    ("signal", Scanner::declare_signal),
    ("enum", Scanner::declare_enum),
    ("const", Scanner::declare_const),
    ("var", Scanner::declare_var),
    ("func", Scanner::declare_func),
    ("class", Scanner::declare_class),
];

// -- Scanner state ------------------------------------------------------------

enum State {
    Idle,
    BriefDescription,
    DetailDescription,
    Args,
    Returns,
    Enum(OpenEnum),
    /// Body of a function. Without an owner the block is only skipped
    /// (property accessors, malformed headers).
    Func(OpenBody<Option<FuncDoc>>),
    InnerClass(OpenBody<ClassDoc>),
    ExportPending(Resume),
    OnReadyPending(Resume),
}

/// Description block in progress.
#[derive(Debug, Default)]
struct Docstring {
    brief: String,
    detail: String,
    tags: Vec<Tag>,
    /// `(name, text)` pairs from an `Args:` section
    arg_docs: Vec<(String, String)>,
    returns: String,
}

impl Docstring {
    fn is_empty(&self) -> bool {
        self.brief.is_empty()
            && self.detail.trim().is_empty()
            && self.tags.is_empty()
            && self.arg_docs.is_empty()
            && self.returns.is_empty()
    }

    /// Brief and detail joined by a blank line.
    fn description(&self) -> String {
        let detail = self.detail.trim();
        match (self.brief.is_empty(), detail.is_empty()) {
            (false, false) => format!("{}\n\n{}", self.brief, detail),
            (false, true) => self.brief.clone(),
            (true, _) => detail.to_string(),
        }
    }
}

/// Which part of a doc-comment block a `##` line feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Brief,
    Detail,
    Args,
    Returns,
}

impl Section {
    fn state(self) -> State {
        match self {
            Section::Brief => State::BriefDescription,
            Section::Detail => State::DetailDescription,
            Section::Args => State::Args,
            Section::Returns => State::Returns,
        }
    }

    fn resume(self) -> Resume {
        match self {
            Section::Brief => Resume::Brief,
            _ => Resume::Detail,
        }
    }
}

/// State to go back to when a code line does not complete a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Idle,
    Brief,
    Detail,
}

impl Resume {
    fn state(self) -> State {
        match self {
            Resume::Idle => State::Idle,
            Resume::Brief => State::BriefDescription,
            Resume::Detail => State::DetailDescription,
        }
    }
}

struct OpenEnum {
    doc: EnumDoc,
    /// Doc-comment lines waiting for the next member
    member_description: String,
    member_tags: Vec<Tag>,
    /// Header had no `{` yet
    awaiting_brace: bool,
    line: usize,
}

struct OpenBody<T> {
    owner: T,
    /// Indentation level of the header
    marker: usize,
    text: String,
    /// Comment lines at or below `marker`, kept only if the body goes on
    held: String,
    first_line: usize,
}

impl<T> OpenBody<T> {
    fn new(owner: T, marker: usize, first_line: usize) -> Self {
        OpenBody {
            owner,
            marker,
            text: String::new(),
            held: String::new(),
            first_line,
        }
    }

    /// Take `raw` into the body; false when the line ends it.
    fn absorb(&mut self, indent: IndentUnit, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if self.held.is_empty() {
                self.text.push_str(raw);
            } else {
                self.held.push_str(raw);
            }
            return true;
        }
        if indent.level(raw) > self.marker {
            self.text.push_str(&std::mem::take(&mut self.held));
            self.text.push_str(raw);
            return true;
        }
        if trimmed.starts_with('#') && !trimmed.starts_with("##") {
            self.held.push_str(raw);
            return true;
        }
        false
    }
}

/// `func`/`signal` header whose parameter list continues on later lines.
struct Continuation {
    code: String,
    level: usize,
    resume: Resume,
}

/// One code line, doc-comment split off.
struct CodeLine<'a> {
    code: &'a str,
    doc: Option<&'a str>,
    level: usize,
    /// Kind set by a preceding standalone `@export` / `@onready` line.
    forced_kind: Option<VarKind>,
}

enum Line<'a> {
    Blank,
    Comment,
    Doc(&'a str),
    Code { code: &'a str, doc: Option<&'a str> },
}

fn classify(raw: &str) -> Line<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Line::Blank
    } else if trimmed.starts_with("##") {
        Line::Doc(lexical::strip_doc_marker(trimmed))
    } else if trimmed.starts_with('#') {
        Line::Comment
    } else {
        match lexical::split_comment(trimmed) {
            (code, TrailingComment::Doc(doc)) => Line::Code { code, doc: Some(doc) },
            (code, _) => Line::Code { code, doc: None },
        }
    }
}

// -- Public API ---------------------------------------------------------------

/// Single-pass scanner building the documentation tree of one file.
pub struct Scanner {
    tree: ClassDoc,
    indent: IndentUnit,
    url_check: fn(&str) -> bool,
    state: State,
    ctx: Docstring,
    continuation: Option<Continuation>,
    line_no: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Scanner {
    pub fn new(path: impl Into<PathBuf>, indent: IndentUnit) -> Self {
        Scanner::with_tree(ClassDoc::new(path), indent)
    }

    fn with_tree(tree: ClassDoc, indent: IndentUnit) -> Self {
        Scanner {
            tree,
            indent,
            url_check: is_valid_http_url,
            state: State::Idle,
            ctx: Docstring::default(),
            continuation: None,
            line_no: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Replace the `@tutorial` url predicate.
    pub fn with_url_check(mut self, url_check: fn(&str) -> bool) -> Self {
        self.url_check = url_check;
        self
    }

    /// Process the next raw line, terminator included.
    pub fn feed(&mut self, raw: &str) {
        self.line_no += 1;
        let state = std::mem::replace(&mut self.state, State::Idle);
        self.state = self.step(state, raw);
    }

    /// End of input: close open bodies, drop unterminated blocks.
    pub fn finish(mut self) -> ScanOutcome {
        if let Some(cont) = self.continuation.take() {
            self.report(DocError::MalformedDeclarationLine(format!(
                "unterminated parameter list in `{}`",
                cont.code
            )));
        }
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Func(body) => self.close_func(body),
            State::InnerClass(body) => self.close_inner_class(body),
            State::Enum(open) => self.record(
                Some(open.line),
                DocError::MalformedDeclarationLine(format!(
                    "enum `{}` is missing its closing `}}`",
                    open.doc.name
                )),
            ),
            State::ExportPending(_) | State::OnReadyPending(_) => {
                self.report(DocError::MalformedDeclarationLine(
                    "annotation at end of file is not followed by `var`".to_string(),
                ))
            }
            _ => {}
        }
        ScanOutcome {
            tree: self.tree,
            diagnostics: self.diagnostics,
        }
    }

    /// The line source failed: keep what was built, record why.
    pub fn abort(mut self, error: DocError) -> ScanOutcome {
        self.record(None, error);
        ScanOutcome {
            tree: self.tree,
            diagnostics: self.diagnostics,
        }
    }

    // -- Line processing ------------------------------------------------------

    fn step(&mut self, state: State, raw: &str) -> State {
        match state {
            State::Func(mut body) => {
                if body.absorb(self.indent, raw) {
                    State::Func(body)
                } else {
                    self.close_func(body);
                    self.step(State::Idle, raw)
                }
            }
            State::InnerClass(mut body) => {
                if body.absorb(self.indent, raw) {
                    State::InnerClass(body)
                } else {
                    self.close_inner_class(body);
                    self.step(State::Idle, raw)
                }
            }
            State::Enum(open) => self.step_enum(open, raw),
            State::ExportPending(resume) => self.step_pending(VarKind::ExportVar, resume, raw),
            State::OnReadyPending(resume) => self.step_pending(VarKind::OnReadyVar, resume, raw),
            State::Idle => match classify(raw) {
                Line::Blank | Line::Comment | Line::Doc("") => State::Idle,
                Line::Doc(text) => self.on_doc(Section::Brief, text),
                Line::Code { code, doc } => self.on_code(code, doc, raw, Resume::Idle, None),
            },
            State::BriefDescription => self.step_description(Section::Brief, raw),
            State::DetailDescription => self.step_description(Section::Detail, raw),
            State::Args => self.step_description(Section::Args, raw),
            State::Returns => self.step_description(Section::Returns, raw),
        }
    }

    fn step_description(&mut self, section: Section, raw: &str) -> State {
        match classify(raw) {
            Line::Comment => section.state(),
            Line::Doc(text) => self.on_doc(section, text),
            Line::Blank if self.continuation.is_some() => section.state(),
            Line::Blank => self.on_unclaimed(section.resume()),
            Line::Code { code, doc } => self.on_code(code, doc, raw, section.resume(), None),
        }
    }

    /// A `##` line inside (or opening) a description block.
    fn on_doc(&mut self, section: Section, text: &str) -> State {
        if text.is_empty() {
            if section != Section::Brief {
                paragraph_break(&mut self.ctx.detail);
            }
            return State::DetailDescription;
        }
        if text.starts_with("Args:") {
            return State::Args;
        }
        if text.starts_with("Returns:") {
            return State::Returns;
        }
        match parse_tag(text, self.url_check) {
            Some(Ok(tag)) => {
                self.ctx.tags.push(tag);
                return section.state();
            }
            Some(Err(e)) => {
                self.report(e);
                return section.state();
            }
            None => {}
        }
        match section {
            Section::Brief => join_space(&mut self.ctx.brief, text),
            Section::Detail => push_detail(&mut self.ctx.detail, text),
            Section::Args => self.push_arg_doc(text),
            Section::Returns => join_space(&mut self.ctx.returns, text),
        }
        section.state()
    }

    fn push_arg_doc(&mut self, text: &str) {
        if let Some(caps) = RE_ARG_DOC.captures(text) {
            self.ctx
                .arg_docs
                .push((caps[1].to_string(), caps[2].trim().to_string()));
        } else if let Some((_, last)) = self.ctx.arg_docs.last_mut() {
            join_space(last, text);
        } else {
            debug!(line = self.line_no, "ignoring text before first argument: {}", text);
        }
    }

    fn on_code(
        &mut self,
        code: &str,
        doc: Option<&str>,
        raw: &str,
        resume: Resume,
        forced_kind: Option<VarKind>,
    ) -> State {
        if let Some(mut cont) = self.continuation.take() {
            cont.code.push(' ');
            cont.code.push_str(code);
            if lexical::bracket_depth(&cont.code) > 0 {
                self.continuation = Some(cont);
                return resume.state();
            }
            let line = CodeLine {
                code: &cont.code,
                doc,
                level: cont.level,
                forced_kind: None,
            };
            return self.dispatch(&line, cont.resume);
        }
        let line = CodeLine {
            code,
            doc,
            level: self.indent.level(raw),
            forced_kind,
        };
        self.dispatch(&line, resume)
    }

    fn dispatch(&mut self, line: &CodeLine<'_>, resume: Resume) -> State {
        let (mods, rest) = decl::strip_modifiers(line.code);

        // 1. class_name / extends anywhere on the line (not on inner-class headers)
        if lexical::strip_keyword(rest, "class").is_none() {
            self.update_class_tokens(line.code);
        }

        // 2. standalone @export / @onready waiting for its `var`
        if rest.is_empty() && (mods.export || mods.onready) {
            debug!(line = self.line_no, "annotation waits for var");
            return match (mods.export, line.forced_kind) {
                (true, _) | (false, Some(VarKind::ExportVar)) => State::ExportPending(resume),
                _ => State::OnReadyPending(resume),
            };
        }
        if line.forced_kind.is_some() && lexical::strip_keyword(rest, "var").is_none() {
            self.report(DocError::MalformedDeclarationLine(format!(
                "annotation must be followed by `var`, found `{}`",
                line.code
            )));
        }

        // 3. declaration table
        for (keyword, handler) in DECLARATIONS {
            if lexical::strip_keyword(rest, keyword).is_none() {
                continue;
            }
            if (keyword == "func" || keyword == "signal") && lexical::bracket_depth(line.code) > 0 {
                self.continuation = Some(Continuation {
                    code: line.code.to_string(),
                    level: line.level,
                    resume,
                });
                return resume.state();
            }
            return handler(self, line);
        }

        // 4. nothing claimed the block
        self.on_unclaimed(resume)
    }

    /// A non-declaration line ended a doc block. The first such block of a
    /// file becomes the class docstring; later ones stay pending.
    fn on_unclaimed(&mut self, resume: Resume) -> State {
        if resume == Resume::Idle || self.ctx.is_empty() {
            return resume.state();
        }
        if !self.tree.has_members() && !self.tree.has_description() {
            let doc = std::mem::take(&mut self.ctx);
            debug!(line = self.line_no, "class docstring");
            self.tree
                .set_description(&doc.brief, doc.detail.trim(), doc.tags);
            return State::Idle;
        }
        resume.state()
    }

    /// Keywords are matched on the line with string contents blanked out;
    /// names are read back from the original text.
    fn update_class_tokens(&mut self, code: &str) {
        let masked = lexical::mask_strings(code);
        if let Some(m) = RE_CLASS_NAME.captures(&masked).and_then(|caps| caps.get(1)) {
            self.tree.set_class_name(&code[m.range()]);
        }
        if let Some(m) = RE_EXTENDS.captures(&masked).and_then(|caps| caps.get(1)) {
            self.tree
                .set_extends(code[m.range()].trim_matches(|c| c == '"' || c == '\''));
        }
    }

    fn step_pending(&mut self, kind: VarKind, resume: Resume, raw: &str) -> State {
        match classify(raw) {
            Line::Blank | Line::Comment => match kind {
                VarKind::OnReadyVar => State::OnReadyPending(resume),
                _ => State::ExportPending(resume),
            },
            Line::Code { code, doc } => self.on_code(code, doc, raw, resume, Some(kind)),
            Line::Doc(_) => {
                self.report(DocError::MalformedDeclarationLine(
                    "annotation must be followed by `var`".to_string(),
                ));
                self.step(resume.state(), raw)
            }
        }
    }

    // -- Declaration handlers -------------------------------------------------

    /// Take the pending block, folding in the line's inline doc-comment.
    fn take_docstring(&mut self, inline: Option<&str>) -> Docstring {
        let mut doc = std::mem::take(&mut self.ctx);
        if let Some(text) = inline.filter(|t| !t.is_empty()) {
            match parse_tag(text, self.url_check) {
                Some(Ok(tag)) => doc.tags.push(tag),
                Some(Err(e)) => self.report(e),
                None if doc.brief.is_empty() => doc.brief = text.to_string(),
                None => {
                    paragraph_break(&mut doc.detail);
                    push_detail(&mut doc.detail, text);
                }
            }
        }
        doc
    }

    fn declare_signal(&mut self, line: &CodeLine<'_>) -> State {
        let doc = self.take_docstring(line.doc);
        match decl::parse_declaration(line.code, "signal") {
            Ok(d) => {
                debug!(line = self.line_no, signal = %d.name, "append");
                self.tree.add_signal(SignalDoc {
                    name: d.name,
                    description: doc.description(),
                    tags: doc.tags,
                    args: d.params,
                });
            }
            Err(e) => self.report(e),
        }
        State::Idle
    }

    fn declare_enum(&mut self, line: &CodeLine<'_>) -> State {
        let doc = self.take_docstring(line.doc);
        let (_, rest) = decl::strip_modifiers(line.code);
        let (header, tail) = match lexical::find_unquoted(rest, "{") {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };
        let d = match decl::parse_declaration(header, "enum") {
            Ok(d) => d,
            Err(e) => {
                self.report(e);
                return State::Idle;
            }
        };
        let mut open = OpenEnum {
            doc: EnumDoc {
                name: d.name,
                description: doc.description(),
                tags: doc.tags,
                members: Vec::new(),
            },
            member_description: String::new(),
            member_tags: Vec::new(),
            awaiting_brace: tail.is_none(),
            line: self.line_no,
        };
        match tail {
            None => State::Enum(open),
            Some(tail) => match lexical::find_unquoted(tail, "}") {
                Some(close) => {
                    self.add_members(&mut open, &tail[..close], None);
                    self.close_enum(open)
                }
                None => {
                    self.add_members(&mut open, tail, None);
                    State::Enum(open)
                }
            },
        }
    }

    fn declare_const(&mut self, line: &CodeLine<'_>) -> State {
        let doc = self.take_docstring(line.doc);
        match decl::parse_declaration(line.code, "const") {
            Ok(d) => {
                let mut var = VarDoc::new(
                    &d.name,
                    d.data_type.as_deref(),
                    d.value.as_deref(),
                    VarKind::Const,
                );
                var.description = doc.description();
                var.tags = doc.tags;
                debug!(line = self.line_no, constant = %var.name, "append");
                self.tree.add_attribute(var);
            }
            Err(e) => self.report(e),
        }
        State::Idle
    }

    fn declare_var(&mut self, line: &CodeLine<'_>) -> State {
        let doc = self.take_docstring(line.doc);
        match decl::parse_declaration(line.code, "var") {
            Ok(d) => {
                let kind = if d.modifiers.export || d.modifiers.onready {
                    d.modifiers.var_kind()
                } else {
                    line.forced_kind.unwrap_or(VarKind::PlainVar)
                };
                let mut var =
                    VarDoc::new(&d.name, d.data_type.as_deref(), d.value.as_deref(), kind);
                var.description = doc.description();
                var.tags = doc.tags;
                debug!(line = self.line_no, var = %var.name, kind = ?kind, "append");
                self.tree.add_attribute(var);
                if d.has_accessors {
                    return State::Func(OpenBody::new(None, line.level, self.line_no + 1));
                }
            }
            Err(e) => self.report(e),
        }
        State::Idle
    }

    fn declare_func(&mut self, line: &CodeLine<'_>) -> State {
        let doc = self.take_docstring(line.doc);
        let header = match decl::parse_func_header(line.code) {
            Ok(header) => header,
            Err(e) => {
                self.report(e);
                // skip the body so its locals are not taken for members
                return State::Func(OpenBody::new(None, line.level, self.line_no + 1));
            }
        };

        let mut args = header.args;
        for (name, text) in &doc.arg_docs {
            match args.iter_mut().find(|a| &a.name == name) {
                Some(arg) => arg.description = text.clone(),
                None => debug!(line = self.line_no, "no parameter `{}` in `{}`", name, header.name),
            }
        }
        let func = FuncDoc {
            name: header.name,
            description: doc.description(),
            tags: doc.tags,
            args,
            return_type: header.return_type,
            return_description: doc.returns,
            is_static: header.is_static,
            body: String::new(),
        };
        let mut body = OpenBody::new(Some(func), line.level, self.line_no + 1);
        if let Some(stmt) = header.inline_body {
            body.text.push_str(&stmt);
            body.text.push('\n');
        }
        State::Func(body)
    }

    fn declare_class(&mut self, line: &CodeLine<'_>) -> State {
        let doc = self.take_docstring(line.doc);
        let skip = State::Func(OpenBody::new(None, line.level, self.line_no + 1));
        let (name, extends) = match decl::parse_class_header(line.code) {
            Ok(parts) => parts,
            Err(e) => {
                self.report(e);
                return skip;
            }
        };
        let mut class = match ClassDoc::inner(self.tree.path(), &name) {
            Ok(class) => class,
            Err(e) => {
                self.report(e);
                return skip;
            }
        };
        if let Some(base) = extends {
            class.set_extends(&base);
        }
        class.set_description(&doc.brief, doc.detail.trim(), doc.tags);
        State::InnerClass(OpenBody::new(class, line.level, self.line_no + 1))
    }

    // -- Enum bodies ----------------------------------------------------------

    fn step_enum(&mut self, mut open: OpenEnum, raw: &str) -> State {
        match classify(raw) {
            Line::Blank | Line::Comment | Line::Doc("") => State::Enum(open),
            Line::Doc(text) => {
                match parse_tag(text, self.url_check) {
                    Some(Ok(tag)) => open.member_tags.push(tag),
                    Some(Err(e)) => self.report(e),
                    None => join_space(&mut open.member_description, text),
                }
                State::Enum(open)
            }
            Line::Code { code, doc } => {
                let mut code = code;
                if open.awaiting_brace {
                    match code.strip_prefix('{') {
                        Some(rest) => {
                            code = rest;
                            open.awaiting_brace = false;
                        }
                        None => {
                            self.report(DocError::MalformedDeclarationLine(format!(
                                "expected `{{` after enum `{}`",
                                open.doc.name
                            )));
                            return self.step(State::Idle, raw);
                        }
                    }
                }
                match lexical::find_unquoted(code, "}") {
                    Some(close) => {
                        self.add_members(&mut open, &code[..close], doc);
                        self.close_enum(open)
                    }
                    None => {
                        self.add_members(&mut open, code, doc);
                        State::Enum(open)
                    }
                }
            }
        }
    }

    /// Parse the comma-separated members on one line. Pending doc lines go
    /// to the first member, an inline doc-comment to the last.
    fn add_members(&mut self, open: &mut OpenEnum, text: &str, inline: Option<&str>) {
        let mut added = 0;
        for piece in lexical::split_top_level(text, ',') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            match parse_member(piece, open.doc.next_value()) {
                Ok(mut member) => {
                    if added == 0 {
                        member.description = std::mem::take(&mut open.member_description);
                        member.tags = std::mem::take(&mut open.member_tags);
                    }
                    open.doc.members.push(member);
                    added += 1;
                }
                Err(e) => self.report(e),
            }
        }
        if added == 0 {
            return;
        }
        let url_check = self.url_check;
        if let (Some(text), Some(member)) = (inline, open.doc.members.last_mut()) {
            match parse_tag(text, url_check) {
                Some(Ok(tag)) => member.tags.push(tag),
                Some(Err(e)) => self.report(e),
                None if member.description.is_empty() => member.description = text.to_string(),
                None => {
                    member.description.push_str("\n\n");
                    member.description.push_str(text);
                }
            }
        }
    }

    fn close_enum(&mut self, open: OpenEnum) -> State {
        debug!(
            line = self.line_no,
            name = %open.doc.name,
            members = open.doc.members.len(),
            "append enum"
        );
        self.tree.add_enum(open.doc);
        State::Idle
    }

    // -- Bodies ---------------------------------------------------------------

    fn close_func(&mut self, body: OpenBody<Option<FuncDoc>>) {
        if let Some(mut func) = body.owner {
            func.body = trim_trailing_blank_lines(body.text);
            debug!(line = self.line_no, func = %func.name, "append");
            self.tree.add_func(func);
        }
    }

    fn close_inner_class(&mut self, body: OpenBody<ClassDoc>) {
        let text = trim_trailing_blank_lines(body.text);
        let mut nested = Scanner::with_tree(body.owner, self.indent).with_url_check(self.url_check);
        for line in text.split_inclusive('\n') {
            nested.feed(line);
        }
        let outcome = nested.finish();
        let offset = body.first_line - 1;
        self.diagnostics
            .extend(outcome.diagnostics.into_iter().map(|mut diag| {
                diag.line = diag.line.map(|l| l + offset);
                diag
            }));
        let mut class = outcome.tree;
        class.set_body(text);
        debug!(line = self.line_no, class = %class.class_name(), "append inner class");
        self.tree.add_inner_class(class);
    }

    // -- Diagnostics ----------------------------------------------------------

    fn report(&mut self, error: DocError) {
        self.record(Some(self.line_no), error);
    }

    fn record(&mut self, line: Option<usize>, error: DocError) {
        warn!(path = %self.tree.path().display(), line = ?line, "{}", error);
        self.diagnostics.push(Diagnostic {
            path: self.tree.path().to_path_buf(),
            line,
            error,
        });
    }
}

// -- Helper functions ---------------------------------------------------------

fn parse_member(piece: &str, next_value: Option<i64>) -> Result<EnumMember, DocError> {
    let caps = RE_ENUM_MEMBER
        .captures(piece)
        .ok_or_else(|| DocError::MalformedEnumMember(format!("`{}`", piece)))?;
    let value = match caps.get(2) {
        Some(literal) => parse_int_literal(literal.as_str()).ok_or_else(|| {
            DocError::MalformedEnumMember(format!(
                "`{}` needs an integer literal value",
                piece
            ))
        })?,
        None => next_value.ok_or_else(|| {
            DocError::MalformedEnumMember(format!(
                "`{}` overflows the previous member value",
                piece
            ))
        })?,
    };
    Ok(EnumMember {
        name: caps[1].to_string(),
        value,
        ..Default::default()
    })
}

/// Decimal, `0x` hex or `0b` binary, optional sign and `_` separators.
fn parse_int_literal(text: &str) -> Option<i64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

fn join_space(dest: &mut String, text: &str) {
    if !dest.is_empty() {
        dest.push(' ');
    }
    dest.push_str(text);
}

fn push_detail(detail: &mut String, text: &str) {
    if !detail.is_empty() && !detail.ends_with('\n') {
        detail.push(' ');
    }
    detail.push_str(text);
}

fn paragraph_break(detail: &mut String) {
    if !detail.is_empty() && !detail.ends_with("\n\n") {
        detail.push_str("\n\n");
    }
}

/// Drop whitespace-only lines after the last statement of a body.
fn trim_trailing_blank_lines(mut text: String) -> String {
    let end = text.trim_end().len();
    if end == 0 {
        text.clear();
    } else if let Some(nl) = text[end..].find('\n') {
        text.truncate(end + nl + 1);
    }
    text
}
