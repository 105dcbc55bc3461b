//! GIR front end: turns GObject-Introspection XML into the declaration tree.
//!
//! The main repository is loaded first so it becomes namespace 0; the
//! repositories it includes follow in declaration order.

use crate::model::{
    Annotation, EnumMember, Flag, NodeId, NodeKind, ParamType, Parameter, ReturnValue, Tree,
};
use anyhow::{bail, Context, Result};
use roxmltree::{Document, Node};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const C_NS: &str = "http://www.gtk.org/introspection/c/1.0";
const GLIB_NS: &str = "http://www.gtk.org/introspection/glib/1.0";

/// `<include name="GObject" version="2.0"/>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub name: String,
    pub version: String,
}

impl Include {
    fn file_name(&self) -> String {
        format!("{}-{}.gir", self.name, self.version)
    }
}

/// Load `path` and, transitively, every repository it includes.
///
/// Returns the root node of the main namespace.
pub fn load(path: &Path, include_dirs: &[PathBuf], tree: &mut Tree) -> Result<NodeId> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let (root, includes) =
        parse_str(&text, tree).with_context(|| format!("failed to load {}", path.display()))?;
    load_includes(&includes, include_dirs, tree)?;
    Ok(root)
}

fn load_includes(includes: &[Include], include_dirs: &[PathBuf], tree: &mut Tree) -> Result<()> {
    for include in includes {
        if tree.namespace_index(&include.name).is_some() {
            continue;
        }
        let file_name = include.file_name();
        let Some(path) = include_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|p| p.is_file())
        else {
            warn!("could not find included repository {}", file_name);
            continue;
        };

        debug!("loading included repository {}", path.display());
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let (_, nested) =
            parse_str(&text, tree).with_context(|| format!("failed to load {}", path.display()))?;
        load_includes(&nested, include_dirs, tree)?;
    }
    Ok(())
}

/// Parse one repository into `tree`, returning its namespace root and the
/// repositories it includes (not loaded).
pub fn parse_str(text: &str, tree: &mut Tree) -> Result<(NodeId, Vec<Include>)> {
    let doc = Document::parse(text).context("invalid GIR XML")?;
    let repository = doc.root_element();
    if repository.tag_name().name() != "repository" {
        bail!(
            "expected <repository> root element, found <{}>",
            repository.tag_name().name()
        );
    }

    // <c:include> names C headers, not repositories
    let includes = elements(repository, "include")
        .filter(|el| el.tag_name().namespace() != Some(C_NS))
        .filter_map(|el| {
            Some(Include {
                name: el.attribute("name")?.to_string(),
                version: el.attribute("version").unwrap_or_default().to_string(),
            })
        })
        .collect();

    let namespace = elements(repository, "namespace")
        .next()
        .context("repository has no <namespace>")?;
    let root = load_namespace(namespace, tree)?;
    Ok((root, includes))
}

fn load_namespace(el: Node, tree: &mut Tree) -> Result<NodeId> {
    let name = el.attribute("name").context("<namespace> without a name")?;
    let identifier_prefixes = split_list(el.attribute((C_NS, "identifier-prefixes")))
        .unwrap_or_else(|| vec![name.to_string()]);
    let symbol_prefixes = split_list(el.attribute((C_NS, "symbol-prefixes")))
        .unwrap_or_else(|| vec![name.to_lowercase()]);

    let root = tree.add_namespace(name, identifier_prefixes, symbol_prefixes);
    tree.node_mut(root).doc = doc_of(el);

    for child in el.children().filter(Node::is_element) {
        let Some(child_name) = child.attribute("name") else {
            continue;
        };
        match child.tag_name().name() {
            "class" => {
                let id = add_type(tree, root, child, NodeKind::Class, child_name);
                if let Some(parent) = child.attribute("parent") {
                    tree.node_mut(id).set_base(parent);
                }
            }
            "interface" => {
                add_type(tree, root, child, NodeKind::Interface, child_name);
            }
            "record" | "union" => {
                add_type(tree, root, child, NodeKind::Record, child_name);
            }
            "alias" => {
                add_type(tree, root, child, NodeKind::Alias, child_name);
            }
            "enumeration" | "bitfield" => add_enum(tree, root, child, child_name),
            "function" => {
                add_callable(tree, root, child, NodeKind::Function, child_name);
            }
            "callback" => {
                add_callable(tree, root, child, NodeKind::Callback, child_name);
            }
            "constant" => add_constant(tree, root, child, child_name),
            "docsection" => {
                let id = tree.add_node(root, NodeKind::DocSection, child_name);
                tree.node_mut(id).doc = doc_of(child);
            }
            _ => {}
        }
    }
    Ok(root)
}

/// Classes, interfaces, records and aliases.
fn add_type(tree: &mut Tree, parent: NodeId, el: Node, kind: NodeKind, name: &str) -> NodeId {
    let id = tree.add_node(parent, kind, name);
    tree.node_mut(id).doc = doc_of(el);
    if let Some(c_type) = el
        .attribute((C_NS, "type"))
        .or_else(|| el.attribute((GLIB_NS, "type-name")))
    {
        tree.register_symbol(id, c_type);
    }
    if kind == NodeKind::Alias {
        return id;
    }

    for child in el.children().filter(Node::is_element) {
        let Some(child_name) = child.attribute("name") else {
            continue;
        };
        match (child.tag_name().namespace(), child.tag_name().name()) {
            (_, "constructor") | (_, "function") => {
                add_callable(tree, id, child, NodeKind::Function, child_name);
            }
            (_, "method") => {
                add_callable(tree, id, child, NodeKind::Method, child_name);
            }
            (_, "virtual-method") => {
                add_callable(tree, id, child, NodeKind::VirtualFunction, child_name);
            }
            (Some(GLIB_NS), "signal") => {
                let signal = add_callable(tree, id, child, NodeKind::Signal, child_name);
                let node = tree.node_mut(signal);
                match child.attribute("when") {
                    Some("first") => node.push_flag(Flag::RunFirst),
                    Some("last") => node.push_flag(Flag::RunLast),
                    Some("cleanup") => node.push_flag(Flag::RunCleanup),
                    _ => {}
                }
                if is_set(child, "no-hooks") {
                    node.push_flag(Flag::NoHooks);
                }
            }
            (_, "property") => {
                let prop = tree.add_node(id, NodeKind::Property, child_name);
                let node = tree.node_mut(prop);
                node.doc = doc_of(child);
                node.push_flag(Flag::Readable);
                if is_set(child, "writable") {
                    node.push_flag(Flag::Writable);
                }
                if is_set(child, "construct") {
                    node.push_flag(Flag::Construct);
                }
                if is_set(child, "construct-only") {
                    node.push_flag(Flag::ConstructOnly);
                }
            }
            (_, "field") => {
                let field = tree.add_node(id, NodeKind::Field, child_name);
                tree.node_mut(field).doc = doc_of(child);
            }
            _ => {}
        }
    }
    id
}

fn add_enum(tree: &mut Tree, parent: NodeId, el: Node, name: &str) {
    let id = add_type(tree, parent, el, NodeKind::Enum, name);
    for member in elements(el, "member") {
        let Some(member_name) = member.attribute("name") else {
            continue;
        };
        tree.add_member(
            id,
            EnumMember {
                name: member_name.to_string(),
                c_identifier: member.attribute((C_NS, "identifier")).map(str::to_string),
                doc: doc_of(member),
            },
        );
    }
}

fn add_constant(tree: &mut Tree, parent: NodeId, el: Node, name: &str) {
    let id = tree.add_node(parent, NodeKind::Constant, name);
    if let Some(c_type) = el.attribute((C_NS, "type")) {
        tree.register_symbol(id, c_type);
    }
    let node = tree.node_mut(id);
    node.doc = doc_of(el);
    if let Some(value) = el.attribute("value") {
        node.set_value(value);
    }
}

fn add_callable(tree: &mut Tree, parent: NodeId, el: Node, kind: NodeKind, name: &str) -> NodeId {
    let id = tree.add_node(parent, kind, name);
    // callbacks are C types rather than functions
    if let Some(symbol) = el
        .attribute((C_NS, "identifier"))
        .or_else(|| el.attribute((C_NS, "type")))
    {
        tree.register_symbol(id, symbol);
    }

    let params: Vec<Node> = elements(el, "parameters")
        .flat_map(|list| list.children())
        .filter(|p| {
            p.is_element() && matches!(p.tag_name().name(), "parameter" | "instance-parameter")
        })
        .collect();
    // `length` and `closure` count parameters after the instance parameter
    let indexed: Vec<&str> = params
        .iter()
        .filter(|p| p.tag_name().name() == "parameter")
        .map(|p| p.attribute("name").unwrap_or("..."))
        .collect();

    let node = tree.node_mut(id);
    node.doc = doc_of(el);
    node.introspectable = el.attribute("introspectable") != Some("0");
    node.throws = is_set(el, "throws");
    if let Some(retval) = elements(el, "return-value")
        .next()
        .and_then(|r| return_value(r, &indexed))
    {
        node.set_return_value(retval);
    }

    for param in params {
        let (ty, c_type) = type_of(param);
        let argname = param.attribute("name").unwrap_or("...");
        let mut parameter = Parameter::new(argname, ty, doc_of(param));
        parameter.c_type = c_type;
        parameter.annotations = annotations(param, &indexed);
        node.push_parameter(parameter);
    }
    id
}

/// `None` for `void` returns.
fn return_value(el: Node, indexed: &[&str]) -> Option<ReturnValue> {
    let (ParamType::Named(ty), c_type) = type_of(el) else {
        return None;
    };
    if ty == "none" {
        return None;
    }
    Some(ReturnValue {
        ty,
        c_type,
        doc: doc_of(el),
        annotations: annotations(el, indexed),
    })
}

/// Introspected and C type of a parameter or return value. Arrays read as
/// `[element]`, nested arrays nest the brackets.
fn type_of(el: Node) -> (ParamType, Option<String>) {
    for child in el.children().filter(Node::is_element) {
        let c_type = child.attribute((C_NS, "type")).map(str::to_string);
        match child.tag_name().name() {
            "varargs" => return (ParamType::Variadic, None),
            "type" => {
                let name = child.attribute("name").unwrap_or("none");
                return (ParamType::Named(name.to_string()), c_type);
            }
            "array" => {
                let inner = match type_of(child).0 {
                    ParamType::Named(inner) => inner,
                    ParamType::Variadic => "none".to_string(),
                };
                return (ParamType::Named(format!("[{}]", inner)), c_type);
            }
            _ => {}
        }
    }
    (ParamType::Named("none".to_string()), None)
}

fn annotations(el: Node, indexed: &[&str]) -> Vec<Annotation> {
    let mut out = Vec::new();
    match el.attribute("direction") {
        Some("out") => out.push(Annotation::Out),
        Some("inout") => out.push(Annotation::InOut),
        _ => {}
    }
    if is_set(el, "nullable") {
        out.push(Annotation::Nullable);
    }
    if is_set(el, "allow-none") {
        out.push(Annotation::AllowNone);
    }
    if is_set(el, "optional") {
        out.push(Annotation::Optional);
    }
    match el.attribute("transfer-ownership") {
        Some(mode) if mode != "none" => out.push(Annotation::Transfer(mode.to_string())),
        _ => {}
    }

    if let Some(array) = elements(el, "array").next() {
        let mut detail = Vec::new();
        if let Some(length) = array.attribute("length").and_then(|i| nth(indexed, i)) {
            detail.push(format!("length={}", length));
        }
        if let Some(size) = array.attribute("fixed-size") {
            detail.push(format!("fixed-size={}", size));
        }
        if is_set(array, "zero-terminated") {
            detail.push("zero-terminated=1".to_string());
        }
        out.push(Annotation::Array((!detail.is_empty()).then(|| detail.join(" "))));
    } else if let Some(container) = elements(el, "type").next() {
        let inner: Vec<&str> = elements(container, "type")
            .filter_map(|t| t.attribute("name"))
            .collect();
        if !inner.is_empty() {
            out.push(Annotation::ElementType(inner.join(" ")));
        }
    }

    if let Some(scope) = el.attribute("scope") {
        out.push(Annotation::Scope(scope.to_string()));
    }
    if let Some(closure) = el.attribute("closure") {
        out.push(Annotation::Closure(nth(indexed, closure).map(str::to_string)));
    }
    out
}

fn nth<'a>(indexed: &[&'a str], index: &str) -> Option<&'a str> {
    indexed.get(index.parse::<usize>().ok()?).copied()
}

/// Direct element children with the given local name.
fn elements<'a, 'input: 'a>(
    el: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    el.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

fn doc_of(el: Node) -> String {
    elements(el, "doc")
        .next()
        .and_then(|d| d.text())
        .unwrap_or_default()
        .to_string()
}

fn is_set(el: Node, attr: &str) -> bool {
    el.attribute(attr) == Some("1")
}

fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
