//! Section Trees: the ordering that drives page grouping and the index.
//!
//! ```text
//! <SECTIONS>
//!   <SECTION>
//!     <SYMBOL>Gtk.Button</SYMBOL>
//!     <SYMBOLS>
//!       <SYMBOL>Gtk.Button.new</SYMBOL>
//!     </SYMBOLS>
//!   </SECTION>
//! </SECTIONS>
//! ```

use crate::model::{NodeId, NodeKind, Tree};
use crate::naming::{Convention, NameFormatter};
use anyhow::{bail, Context, Result};
use roxmltree::{Document, Node};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Symbol(String),
    Section(Section),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Name of the page the section is about.
    pub symbol: Option<String>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTree {
    pub entries: Vec<Entry>,
}

impl SectionTree {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let doc = Document::parse(text).context("invalid sections XML")?;
        let root = doc.root_element();
        if root.tag_name().name() != "SECTIONS" {
            bail!(
                "expected <SECTIONS> root element, found <{}>",
                root.tag_name().name()
            );
        }
        Ok(SectionTree {
            entries: parse_entries(root),
        })
    }

    /// Every symbol in document order, section titles included.
    pub fn sorted_symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_symbols(&self.entries, &mut out);
        out
    }

    /// Member symbols listed under the section titled `name`.
    pub fn class_symbols(&self, name: &str) -> Option<Vec<&str>> {
        find_section(&self.entries, name).map(|section| {
            section
                .entries
                .iter()
                .filter_map(|entry| match entry {
                    Entry::Symbol(s) => Some(s.as_str()),
                    Entry::Section(_) => None,
                })
                .collect()
        })
    }

    /// Serialize with two spaces of indentation per nesting level.
    pub fn to_pretty_xml(&self) -> String {
        let mut out = String::from("<SECTIONS>\n");
        write_entries(&self.entries, 1, &mut out);
        out.push_str("</SECTIONS>\n");
        out
    }
}

fn parse_entries(el: Node) -> Vec<Entry> {
    let mut entries = Vec::new();
    for child in el.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "SYMBOL" => entries.push(Entry::Symbol(symbol_text(child))),
            "SECTION" => entries.push(Entry::Section(parse_section(child))),
            _ => {}
        }
    }
    entries
}

fn parse_section(el: Node) -> Section {
    let mut section = Section {
        symbol: None,
        entries: Vec::new(),
    };
    for child in el.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "SYMBOL" if section.symbol.is_none() => section.symbol = Some(symbol_text(child)),
            "SYMBOLS" => section.entries.extend(parse_entries(child)),
            _ => {}
        }
    }
    section
}

fn symbol_text(el: Node) -> String {
    el.text().unwrap_or_default().trim().to_string()
}

fn collect_symbols<'a>(entries: &'a [Entry], out: &mut Vec<&'a str>) {
    for entry in entries {
        match entry {
            Entry::Symbol(s) => out.push(s),
            Entry::Section(section) => {
                if let Some(symbol) = &section.symbol {
                    out.push(symbol);
                }
                collect_symbols(&section.entries, out);
            }
        }
    }
}

fn find_section<'a>(entries: &'a [Entry], name: &str) -> Option<&'a Section> {
    entries.iter().find_map(|entry| match entry {
        Entry::Section(section) if section.symbol.as_deref() == Some(name) => Some(section),
        Entry::Section(section) => find_section(&section.entries, name),
        Entry::Symbol(_) => None,
    })
}

fn write_entries(entries: &[Entry], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for entry in entries {
        match entry {
            Entry::Symbol(s) => {
                out.push_str(&format!("{}<SYMBOL>{}</SYMBOL>\n", indent, xml_escape(s)));
            }
            Entry::Section(section) => {
                out.push_str(&format!("{}<SECTION>\n", indent));
                let inner = "  ".repeat(depth + 1);
                if let Some(symbol) = &section.symbol {
                    out.push_str(&format!(
                        "{}<SYMBOL>{}</SYMBOL>\n",
                        inner,
                        xml_escape(symbol)
                    ));
                }
                if section.entries.is_empty() {
                    out.push_str(&format!("{}<SYMBOLS />\n", inner));
                } else {
                    out.push_str(&format!("{}<SYMBOLS>\n", inner));
                    write_entries(&section.entries, depth + 2, out);
                    out.push_str(&format!("{}</SYMBOLS>\n", inner));
                }
                out.push_str(&format!("{}</SECTION>\n", indent));
            }
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Write a compact Section Tree for the namespace below `root`.
///
/// Namespaces, doc sections, classes and interfaces each open a new
/// top-level section; everything else is a symbol of the open one. Aliases
/// and records are left out together with their children.
pub fn generate(tree: &Tree, root: NodeId, names: NameFormatter) -> String {
    let mut out = String::from("<SECTIONS>");
    let mut open = false;
    let mut visit = |id: NodeId| -> bool {
        let node = tree.node(id);
        if matches!(node.kind, NodeKind::Alias | NodeKind::Record) {
            return false;
        }
        if names.convention() == Convention::Dotted
            && node.kind.is_callable()
            && !node.introspectable
        {
            return false;
        }

        let name = xml_escape(&names.full_node_name(tree, id));
        match node.kind {
            NodeKind::Namespace | NodeKind::DocSection | NodeKind::Class | NodeKind::Interface => {
                if open {
                    out.push_str("</SYMBOLS></SECTION>");
                }
                out.push_str(&format!("<SECTION><SYMBOL>{}</SYMBOL><SYMBOLS>", name));
                open = true;
            }
            _ => out.push_str(&format!("<SYMBOL>{}</SYMBOL>", name)),
        }
        true
    };

    visit(root);
    tree.walk(root, |id, _| visit(id));
    if open {
        out.push_str("</SYMBOLS></SECTION>");
    }
    out.push_str("</SECTIONS>");
    out
}

/// Generate, normalize and write `<namespace>-sections.txt` into `output`.
///
/// The returned tree is the one read back from the compact form, so it
/// behaves exactly like a tree loaded from a hand-written file.
pub fn write_generated(
    tree: &Tree,
    root: NodeId,
    names: NameFormatter,
    output: &Path,
) -> Result<(SectionTree, PathBuf)> {
    let compact = generate(tree, root, names);
    let sections = SectionTree::parse(&compact).context("generated sections are invalid")?;

    let path = output.join(format!("{}-sections.txt", tree.namespace_name(root)));
    fs::write(&path, sections.to_pretty_xml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok((sections, path))
}

/// Member group of an aggregated class page, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Properties,
    Methods,
    Signals,
    VirtualFunctions,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Properties,
        Bucket::Methods,
        Bucket::Signals,
        Bucket::VirtualFunctions,
    ];

    pub fn for_kind(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Property => Some(Bucket::Properties),
            NodeKind::Function | NodeKind::Method => Some(Bucket::Methods),
            NodeKind::Signal => Some(Bucket::Signals),
            NodeKind::VirtualFunction => Some(Bucket::VirtualFunctions),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Bucket::Properties => "Properties",
            Bucket::Methods => "Methods",
            Bucket::Signals => "Signals",
            Bucket::VirtualFunctions => "Virtual Functions",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A class and the members that will be merged into its page.
#[derive(Debug)]
pub struct AggregatedClass {
    pub class: NodeId,
    /// Member names in section order.
    order: Vec<String>,
    buckets: [Vec<(String, NodeId)>; 4],
}

impl AggregatedClass {
    pub fn new(class: NodeId, order: Vec<String>) -> Self {
        AggregatedClass {
            class,
            order,
            buckets: Default::default(),
        }
    }

    pub fn add(&mut self, kind: NodeKind, name: String, id: NodeId) -> Result<()> {
        let Some(bucket) = Bucket::for_kind(kind) else {
            bail!("cannot aggregate {:?} {} into a class page", kind, name);
        };
        self.buckets[bucket.index()].push((name, id));
        Ok(())
    }

    /// Non-empty buckets with members in section order. Members the
    /// section does not list are dropped.
    pub fn sorted(&self) -> Vec<(Bucket, Vec<NodeId>)> {
        Bucket::ALL
            .iter()
            .filter_map(|&bucket| {
                let members = &self.buckets[bucket.index()];
                let mut taken = vec![false; members.len()];
                let mut ids = Vec::new();
                for symbol in &self.order {
                    let found = members
                        .iter()
                        .enumerate()
                        .find(|(i, (name, _))| !taken[*i] && name == symbol);
                    if let Some((i, &(_, id))) = found {
                        taken[i] = true;
                        ids.push(id);
                    }
                }
                (!ids.is_empty()).then_some((bucket, ids))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAND_WRITTEN: &str = r#"
<SECTIONS>
  <SECTION>
    <SYMBOL>Demo</SYMBOL>
    <SYMBOLS>
      <SYMBOL>Demo.init</SYMBOL>
    </SYMBOLS>
  </SECTION>
  <SECTION>
    <SYMBOL>Demo.Foo</SYMBOL>
    <SYMBOLS>
      <SYMBOL>Demo.Foo.baz</SYMBOL>
      <SYMBOL>Demo.Foo.bar</SYMBOL>
    </SYMBOLS>
  </SECTION>
</SECTIONS>
"#;

    fn demo_tree() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let ns = tree.add_namespace("Demo", vec!["Demo".into()], vec!["demo".into()]);
        tree.add_node(ns, NodeKind::Function, "init");
        let foo = tree.add_node(ns, NodeKind::Class, "Foo");
        tree.add_node(foo, NodeKind::Method, "bar");
        tree.add_node(foo, NodeKind::Signal, "changed");
        let record = tree.add_node(ns, NodeKind::Record, "FooClass");
        tree.add_node(record, NodeKind::Function, "hidden");
        tree.add_node(ns, NodeKind::Alias, "Handle");
        let hidden = tree.add_node(ns, NodeKind::Function, "internal");
        tree.node_mut(hidden).introspectable = false;
        (tree, ns)
    }

    #[test]
    fn parses_hand_written_file() {
        let sections = SectionTree::parse(HAND_WRITTEN).unwrap();
        assert_eq!(
            sections.sorted_symbols(),
            vec!["Demo", "Demo.init", "Demo.Foo", "Demo.Foo.baz", "Demo.Foo.bar"]
        );
        assert_eq!(
            sections.class_symbols("Demo.Foo"),
            Some(vec!["Demo.Foo.baz", "Demo.Foo.bar"])
        );
        assert_eq!(sections.class_symbols("Demo.Bar"), None);
    }

    #[test]
    fn rejects_other_roots() {
        assert!(SectionTree::parse("<SECTION/>").is_err());
        assert!(SectionTree::parse("not xml").is_err());
    }

    #[test]
    fn generation_opens_a_section_per_container() {
        let (tree, ns) = demo_tree();
        let compact = generate(&tree, ns, NameFormatter::new(Convention::Dotted));
        assert_eq!(
            compact,
            "<SECTIONS>\
             <SECTION><SYMBOL>Demo</SYMBOL><SYMBOLS><SYMBOL>Demo.init</SYMBOL></SYMBOLS></SECTION>\
             <SECTION><SYMBOL>Demo.Foo</SYMBOL><SYMBOLS>\
             <SYMBOL>Demo.Foo.bar</SYMBOL><SYMBOL>Demo.Foo-changed</SYMBOL>\
             </SYMBOLS></SECTION>\
             </SECTIONS>"
        );
    }

    #[test]
    fn prefixed_generation_keeps_unintrospectable() {
        let (tree, ns) = demo_tree();
        let compact = generate(&tree, ns, NameFormatter::new(Convention::Prefixed));
        assert!(compact.contains("<SYMBOL>demo_internal</SYMBOL>"));
        assert!(!compact.contains("hidden"));
    }

    #[test]
    fn generated_tree_round_trips() {
        let (tree, ns) = demo_tree();
        let dir = tempfile::tempdir().unwrap();
        let (sections, path) =
            write_generated(&tree, ns, NameFormatter::default(), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Demo-sections.txt");

        let reloaded = SectionTree::load(&path).unwrap();
        assert_eq!(reloaded, sections);
        assert_eq!(
            sections.class_symbols("Demo.Foo"),
            Some(vec!["Demo.Foo.bar", "Demo.Foo-changed"])
        );
    }

    #[test]
    fn pretty_output_is_indented() {
        let sections = SectionTree::parse(
            "<SECTIONS><SECTION><SYMBOL>Demo</SYMBOL><SYMBOLS/></SECTION></SECTIONS>",
        )
        .unwrap();
        assert_eq!(
            sections.to_pretty_xml(),
            "<SECTIONS>\n  <SECTION>\n    <SYMBOL>Demo</SYMBOL>\n    <SYMBOLS />\n  </SECTION>\n</SECTIONS>\n"
        );
    }

    #[test]
    fn aggregated_members_follow_section_order() {
        let (mut tree, _) = demo_tree();
        let foo = tree.get(0, "Foo").unwrap();
        let baz = tree.add_node(foo, NodeKind::Method, "baz");
        let bar = tree.find_child(foo, NodeKind::Method, "bar").unwrap();
        let extra = tree.add_node(foo, NodeKind::Method, "unlisted");

        let mut class = AggregatedClass::new(
            foo,
            vec![
                "Demo.Foo.baz".into(),
                "Demo.Foo.missing".into(),
                "Demo.Foo.bar".into(),
            ],
        );
        class.add(NodeKind::Method, "Demo.Foo.bar".into(), bar).unwrap();
        class.add(NodeKind::Method, "Demo.Foo.baz".into(), baz).unwrap();
        class
            .add(NodeKind::Method, "Demo.Foo.unlisted".into(), extra)
            .unwrap();

        assert_eq!(class.sorted(), vec![(Bucket::Methods, vec![baz, bar])]);
    }

    #[test]
    fn only_members_can_be_aggregated() {
        let (tree, _) = demo_tree();
        let foo = tree.get(0, "Foo").unwrap();
        let mut class = AggregatedClass::new(foo, Vec::new());
        assert!(class.add(NodeKind::Enum, "Demo.Align".into(), foo).is_err());
    }
}
