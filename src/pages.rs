//! Page rendering: one output file per documented declaration.
//!
//! The renderer walks the namespace in pre-order, hands every node with a
//! registered handler to it and writes the result to
//! `<canonical name>.<ext>`. Class members are additionally grouped per class
//! and appended to the class page once the walk is complete.

use crate::model::{NodeId, NodeKind, ParamType, Parameter, Tree};
use crate::naming::{Convention, NameFormatter};
use crate::render::Formatter;
use crate::resolve::Resolver;
use crate::scanner::{DocScanner, Token, TokenKind};
use crate::sections::{AggregatedClass, SectionTree};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Nested includes deeper than this are left as literal text.
const MAX_INCLUDE_DEPTH: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Directories searched by `{{ file }}` includes, after the literal path.
    pub include_dirs: Vec<PathBuf>,
    /// Merge class members into their class page.
    pub aggregate: bool,
    pub convention: Convention,
}

type Handler<'a> = fn(&mut PageRenderer<'a>, NodeId) -> String;

pub struct PageRenderer<'a> {
    tree: &'a Tree,
    root: NodeId,
    resolver: &'a Resolver<'a>,
    formatter: &'a dyn Formatter,
    scanner: &'a DocScanner,
    sections: &'a SectionTree,
    options: &'a Options,
    names: NameFormatter,
    /// Inside a fenced code block of the doc string being rendered.
    in_code: bool,
    /// Index into `aggregated` of the class whose members are being visited.
    current_class: Option<usize>,
    aggregated: Vec<AggregatedClass>,
    /// Names of independent pages, in creation order.
    created_pages: Vec<String>,
}

impl<'a> PageRenderer<'a> {
    pub fn new(
        tree: &'a Tree,
        root: NodeId,
        resolver: &'a Resolver<'a>,
        formatter: &'a dyn Formatter,
        scanner: &'a DocScanner,
        sections: &'a SectionTree,
        options: &'a Options,
    ) -> Self {
        PageRenderer {
            tree,
            root,
            resolver,
            formatter,
            scanner,
            sections,
            options,
            names: NameFormatter::new(options.convention),
            in_code: false,
            current_class: None,
            aggregated: Vec::new(),
            created_pages: Vec::new(),
        }
    }

    /// Names of the pages written so far that are not merged into a class.
    pub fn created_pages(&self) -> &[String] {
        &self.created_pages
    }

    /// Write every page below `output`, then merge aggregated class members.
    pub fn render(&mut self, output: &Path) -> Result<()> {
        let mut order = vec![self.root];
        self.tree.walk(self.root, |id, _| {
            order.push(id);
            true
        });

        for id in order {
            self.walk_node(output, id)?;
        }
        if self.options.aggregate {
            self.merge_classes(output)?;
        }
        Ok(())
    }

    /// Write `index.<ext>` listing the independent pages in section order.
    pub fn render_index(&self, output: &Path) -> Result<PathBuf> {
        let created: HashSet<&str> = self.created_pages.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let pages: Vec<&str> = self
            .sections
            .sorted_symbols()
            .into_iter()
            .filter(|symbol| created.contains(symbol) && seen.insert(*symbol))
            .collect();

        let mut out = self.formatter.start_index(self.tree.namespace_name(self.root));
        out.push_str(&self.formatter.render_index(&pages));
        out.push_str(&self.formatter.end_index());

        let path = output.join(format!("index.{}", self.formatter.file_extension()));
        fs::write(&path, out).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
        Ok(path)
    }

    fn page_path(&self, output: &Path, name: &str) -> PathBuf {
        output.join(format!("{}.{}", name, self.formatter.file_extension()))
    }

    fn walk_node(&mut self, output: &Path, id: NodeId) -> Result<()> {
        let Some(handler) = self.handler_for(id) else {
            return Ok(());
        };
        let name = self.names.full_node_name(self.tree, id);
        debug!("handling {:?} {}", self.tree.node(id).kind, name);

        let body = handler(self, id);
        let path = self.page_path(output, &name);
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;

        if !self.aggregate(id, &name)? {
            self.created_pages.push(name);
        }
        Ok(())
    }

    fn handler_for(&self, id: NodeId) -> Option<Handler<'a>> {
        let node = self.tree.node(id);
        if self.options.convention == Convention::Dotted
            && node.kind.is_callable()
            && !node.introspectable
        {
            return None;
        }
        let handler: Handler<'a> = match node.kind {
            NodeKind::Namespace => Self::handle_namespace,
            NodeKind::DocSection => Self::handle_doc_section,
            NodeKind::Class | NodeKind::Interface => Self::handle_class,
            NodeKind::Enum => Self::handle_enum,
            NodeKind::Constant => Self::handle_constant,
            NodeKind::Function | NodeKind::Method | NodeKind::Callback => Self::handle_function,
            NodeKind::VirtualFunction => Self::handle_virtual_function,
            NodeKind::Signal => Self::handle_signal,
            NodeKind::Property => Self::handle_property,
            NodeKind::Field | NodeKind::Alias | NodeKind::Record => return None,
        };
        Some(handler)
    }

    /// Whether `id` gets a page of its own in this run.
    fn has_page(&self, id: NodeId) -> bool {
        self.tree.node(id).namespace == self.tree.node(self.root).namespace
            && self.handler_for(id).is_some()
    }

    /// Canonical name of `target`, linked only when the page exists.
    fn reference(&self, target: NodeId, link: impl Fn(&str) -> String) -> String {
        let name = self.names.full_node_name(self.tree, target);
        if self.has_page(target) {
            link(&name)
        } else {
            self.formatter.render_other(&name)
        }
    }

    /// Track the aggregation session; true when `id` was merged into a class.
    fn aggregate(&mut self, id: NodeId, name: &str) -> Result<bool> {
        if !self.options.aggregate {
            return Ok(false);
        }
        let tree = self.tree;
        let node = tree.node(id);
        match node.kind {
            NodeKind::Namespace => Ok(false),
            NodeKind::Class | NodeKind::Interface => {
                let order = self
                    .sections
                    .class_symbols(name)
                    .unwrap_or_default()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                self.aggregated.push(AggregatedClass::new(id, order));
                self.current_class = Some(self.aggregated.len() - 1);
                Ok(false)
            }
            kind => {
                if let Some(index) = self.current_class {
                    let class = &mut self.aggregated[index];
                    if node.parent == Some(class.class) {
                        class.add(kind, name.to_string(), id)?;
                        return Ok(true);
                    }
                }
                self.current_class = None;
                Ok(false)
            }
        }
    }

    fn merge_classes(&self, output: &Path) -> Result<()> {
        for class in &self.aggregated {
            let mut out = String::new();
            for (bucket, members) in class.sorted() {
                out.push_str(&self.formatter.render_section(bucket.title()));
                for member in members {
                    let name = self.names.full_node_name(self.tree, member);
                    let path = self.page_path(output, &name);
                    let contents = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    out.push_str(&contents);
                }
            }
            if out.is_empty() {
                continue;
            }

            let name = self.names.full_node_name(self.tree, class.class);
            let path = self.page_path(output, &name);
            let mut file = OpenOptions::new()
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            file.write_all(out.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("merged members into {}", path.display());
        }
        Ok(())
    }

    // -- node handlers --

    fn handle_namespace(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let mut out = self.formatter.start_namespace(&name);
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_namespace());
        out
    }

    fn handle_doc_section(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let mut out = self.formatter.start_doc_section(&name);
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_doc_section());
        out
    }

    fn handle_class(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let mut out = self.formatter.start_class(&name);
        if let Some(base) = self.tree.node(id).base() {
            let base = match self.resolver.resolve_type(base) {
                Some(target) => self.reference(target, |name| self.formatter.render_type_name(name)),
                None => self.formatter.render_other(base),
            };
            out.push_str(&self.formatter.render_hierarchy(&base));
        }
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_class());
        out
    }

    fn handle_enum(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        let name = self.names.full_node_name(tree, id);
        let mut out = self.formatter.start_enum(&name);

        let members = tree.node(id).members();
        if !members.is_empty() {
            out.push_str(&self.formatter.start_members());
            for (index, member) in members.iter().enumerate() {
                let doc = self.render_doc_string(id, &member.doc);
                let member_name = self.member_text(id, index);
                out.push_str(&self.formatter.render_member(&member_name, &doc));
            }
            out.push_str(&self.formatter.end_members());
        }
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_enum());
        out
    }

    fn handle_constant(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        let name = self.names.full_node_name(tree, id);
        let mut out = self.formatter.start_constant(&name, tree.node(id).value());
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_constant());
        out
    }

    fn handle_function(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let params = self.effective_parameters(id);
        let param_names: Vec<&str> = params.iter().map(|p| p.argname.as_str()).collect();

        let mut out = self.formatter.start_function(&name, &param_names);
        out.push_str(&self.render_parameters(id, &params));
        out.push_str(&self.render_return_value(id));
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_function());
        out
    }

    fn handle_virtual_function(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let params = self.effective_parameters(id);

        let mut out = self.formatter.start_virtual_function(&name);
        out.push_str(&self.render_parameters(id, &params));
        out.push_str(&self.render_return_value(id));
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_virtual_function());
        out
    }

    fn handle_signal(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let params = self.effective_parameters(id);

        let mut out = self.formatter.start_signal(&name);
        out.push_str(&self.formatter.render_flags(self.tree.node(id).flags()));
        out.push_str(&self.render_parameters(id, &params));
        out.push_str(&self.render_return_value(id));
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_signal());
        out
    }

    fn handle_property(&mut self, id: NodeId) -> String {
        let name = self.names.full_node_name(self.tree, id);
        let mut out = self.formatter.start_property(&name);
        out.push_str(&self.formatter.render_flags(self.tree.node(id).flags()));
        out.push_str(&self.render_doc(id));
        out.push_str(&self.formatter.end_property());
        out
    }

    /// Declared parameters; signals gain the emitting object in front and
    /// the handler's user data at the end, throwing C functions their
    /// error location.
    fn effective_parameters(&self, id: NodeId) -> Vec<Parameter> {
        let node = self.tree.node(id);
        let mut params = node.parameters().unwrap_or_default().to_vec();
        if node.throws && self.names.convention() == Convention::Prefixed {
            params.push(
                Parameter::new(
                    "error",
                    ParamType::Named("GLib.Error".to_string()),
                    "Return location for a #GError, or %NULL",
                )
                .with_c_type("GError**"),
            );
        }
        if node.kind == NodeKind::Signal {
            let owner = node
                .parent
                .map(|p| self.names.full_node_name(self.tree, p))
                .unwrap_or_default();
            params.insert(
                0,
                Parameter::new(
                    "object",
                    ParamType::Named(owner),
                    "The object that emitted the signal",
                ),
            );
            params.push(
                Parameter::new(
                    "user_data",
                    ParamType::Named("gpointer".to_string()),
                    "user data set when the signal handler was connected.",
                )
                .with_c_type("gpointer"),
            );
        }
        params
    }

    fn render_parameters(&mut self, id: NodeId, params: &[Parameter]) -> String {
        if params.is_empty() {
            return String::new();
        }
        let mut out = self.formatter.start_parameters();
        for param in params {
            debug!("handling parameter {}", param.argname);
            let ty = match &param.ty {
                ParamType::Named(ty) => {
                    Some(self.render_type_ref(self.type_text(ty, param.c_type.as_deref())))
                }
                ParamType::Variadic => None,
            };
            out.push_str(&self.formatter.start_parameter(
                &param.argname,
                ty.as_deref(),
                &param.annotations,
            ));
            out.push_str(&self.render_doc_string(id, &param.doc));
            out.push_str(&self.formatter.end_parameter());
        }
        out.push_str(&self.formatter.end_parameters());
        out
    }

    fn render_return_value(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        let Some(retval) = tree.node(id).return_value() else {
            return String::new();
        };
        let ty = self.render_type_ref(self.type_text(&retval.ty, retval.c_type.as_deref()));
        let doc = self.render_doc_string(id, &retval.doc);
        self.formatter
            .render_return_value(&ty, &retval.annotations, &doc)
    }

    /// The C spelling under the prefixed convention, when recorded.
    fn type_text<'t>(&self, ty: &'t str, c_type: Option<&'t str>) -> &'t str {
        match (self.names.convention(), c_type) {
            (Convention::Prefixed, Some(c_type)) => c_type,
            _ => ty,
        }
    }

    /// Link the identifier inside a type spelling such as `const GtkWidget*`
    /// or `[Gdk.Rectangle]`, keeping the decoration around it.
    fn render_type_ref(&self, text: &str) -> String {
        let f = self.formatter;
        let core = text
            .trim_start_matches("const ")
            .trim_matches(|c: char| matches!(c, '[' | ']' | '*' | ' '));
        let Some(start) = text.find(core).filter(|_| !core.is_empty()) else {
            return f.render_other(text);
        };
        let core_out = match self.resolver.resolve_type(core) {
            Some(target) => self.reference(target, |name| f.render_type_name(name)),
            None => f.render_other(core),
        };
        format!(
            "{}{}{}",
            f.render_other(&text[..start]),
            core_out,
            f.render_other(&text[start + core.len()..])
        )
    }

    /// `Demo.Align.START` under the dotted convention, the C identifier
    /// otherwise.
    fn member_text(&self, enum_id: NodeId, index: usize) -> String {
        let member = &self.tree.node(enum_id).members()[index];
        match (self.names.convention(), &member.c_identifier) {
            (Convention::Prefixed, Some(symbol)) => symbol.clone(),
            _ => format!(
                "{}.{}",
                self.names.full_node_name(self.tree, enum_id),
                member.name.to_uppercase()
            ),
        }
    }

    // -- doc strings --

    fn render_doc(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        self.render_doc_string(id, &tree.node(id).doc)
    }

    /// Render a top-level doc string; code state never leaks between strings.
    fn render_doc_string(&mut self, id: NodeId, text: &str) -> String {
        self.in_code = false;
        let out = self.render_tokens(id, text, 0);
        self.in_code = false;
        out
    }

    fn render_tokens(&mut self, id: NodeId, text: &str, depth: usize) -> String {
        let scanner = self.scanner;
        let mut out = String::new();
        for token in scanner.scan(text) {
            out.push_str(&self.render_token(id, &token, depth));
        }
        out
    }

    fn render_token(&mut self, id: NodeId, token: &Token<'_>, depth: usize) -> String {
        let f = self.formatter;
        match token.kind {
            TokenKind::Other => f.render_other(token.text),
            TokenKind::NewParagraph => f.render_new_paragraph(),
            TokenKind::NewLine => f.render_new_line(),
            TokenKind::CodeStart => {
                self.in_code = true;
                f.render_code_start()
            }
            TokenKind::CodeStartWithLanguage => {
                self.in_code = true;
                f.render_code_start_with_language(token.prop("language_name").unwrap_or_default())
            }
            TokenKind::CodeEnd => {
                self.in_code = false;
                f.render_code_end()
            }
            TokenKind::Note => match token.prop("note_contents") {
                Some(note) if !self.in_code => f.render_note(note.trim_end()),
                _ => f.render_other(token.text),
            },
            TokenKind::Heading => match token.prop("heading") {
                Some(title) if !self.in_code => {
                    let level = token.text.chars().take_while(|&c| c == '#').count();
                    f.render_heading(title.trim_end(), level)
                }
                _ => f.render_other(token.text),
            },
            TokenKind::Include => self.render_include(id, token, depth),
            TokenKind::TypeName => self
                .link_type(token)
                .unwrap_or_else(|| f.render_other(token.text)),
            TokenKind::Property => self
                .find_member(token, NodeKind::Property, "property_name")
                .map(|member| self.reference(member, |name| f.render_property(name)))
                .unwrap_or_else(|| f.render_other(token.text)),
            TokenKind::Signal => self
                .find_member(token, NodeKind::Signal, "signal_name")
                .map(|member| self.reference(member, |name| f.render_signal(name)))
                .unwrap_or_else(|| f.render_other(token.text)),
            TokenKind::EnumValue => self
                .link_enum_value(token)
                .unwrap_or_else(|| f.render_other(token.text)),
            TokenKind::Parameter => self
                .link_parameter(id, token)
                .unwrap_or_else(|| f.render_other(token.text)),
            TokenKind::FunctionCall => self
                .link_function_call(token)
                .unwrap_or_else(|| f.render_other(token.text)),
        }
    }

    fn link_type(&self, token: &Token<'_>) -> Option<String> {
        let target = self.resolver.resolve_type(token.prop("type_name")?)?;
        Some(self.reference(target, |name| self.formatter.render_type_name(name)))
    }

    /// Member named by `#Type:member` / `#Type::member`.
    fn find_member(&self, token: &Token<'_>, kind: NodeKind, key: &str) -> Option<NodeId> {
        let owner = self.resolver.resolve_type(token.prop("type_name")?)?;
        self.tree.find_child(owner, kind, token.prop(key)?)
    }

    /// `%SYMBOL` names an enum member or, failing that, a constant.
    fn link_enum_value(&self, token: &Token<'_>) -> Option<String> {
        let f = self.formatter;
        let symbol = token.prop("member_name")?;
        if let Some((enum_id, index)) = self.resolver.resolve_member(symbol) {
            let text = self.member_text(enum_id, index);
            return Some(self.reference(enum_id, |name| f.render_enum_value(&text, name)));
        }
        let constant = self
            .resolver
            .resolve_symbol(symbol)
            .filter(|&id| self.tree.node(id).kind == NodeKind::Constant)?;
        Some(self.reference(constant, |name| f.render_enum_value(name, name)))
    }

    fn link_parameter(&self, id: NodeId, token: &Token<'_>) -> Option<String> {
        let wanted = token.prop("param_name")?;
        self.effective_parameters(id)
            .iter()
            .find(|p| p.argname == wanted)
            .map(|p| self.formatter.render_parameter(p))
    }

    fn link_function_call(&self, token: &Token<'_>) -> Option<String> {
        let target = self.resolver.resolve_symbol(token.prop("symbol_name")?)?;
        Some(self.reference(target, |name| self.formatter.render_function_call(name)))
    }

    fn render_include(&mut self, id: NodeId, token: &Token<'_>, depth: usize) -> String {
        let name = token.prop("include_name").unwrap_or_default().trim();
        if depth >= MAX_INCLUDE_DEPTH {
            warn!("include of {} nested too deeply, left as text", name);
            return self.formatter.render_other(token.text);
        }

        let contents = self
            .find_include(name)
            .and_then(|path| match fs::read_to_string(&path) {
                Ok(contents) => Some(contents),
                Err(e) => {
                    warn!("could not read {}: {}", path.display(), e);
                    None
                }
            });
        match contents {
            Some(contents) if self.in_code => self.formatter.render_other(&contents),
            Some(contents) => self.render_tokens(id, &contents, depth + 1),
            None => {
                warn!("could not find file {}", name);
                self.formatter.render_other(token.text)
            }
        }
    }

    /// The literal path first, then each include directory in order.
    fn find_include(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        let literal = PathBuf::from(name);
        if literal.is_file() {
            return Some(literal);
        }
        self.options
            .include_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }
}
