//! Symbol resolution across namespaces.
//!
//! Identifiers found in doc strings are C spellings (`GtkButton`,
//! `gtk_button_new`) or dotted ones (`Gtk.Button`). Each is split into every
//! plausible `(namespace, local name)` pair; the first pair that names a
//! declaration wins, so the namespace order decides ambiguous cases.

use crate::model::{NodeId, Tree};

pub struct Resolver<'t> {
    tree: &'t Tree,
    /// Namespace indices in search order.
    order: Vec<usize>,
}

impl<'t> Resolver<'t> {
    /// Namespaces named in `search_order` come first, in that order; the rest
    /// follow in load order. Unknown names are ignored.
    pub fn new(tree: &'t Tree, search_order: &[String]) -> Self {
        let mut order: Vec<usize> = Vec::new();
        let named = search_order
            .iter()
            .filter_map(|name| tree.namespace_index(name));
        for index in named.chain(0..tree.namespaces().len()) {
            if !order.contains(&index) {
                order.push(index);
            }
        }
        Resolver { tree, order }
    }

    /// Candidate `(namespace, local name)` pairs for a type identifier.
    pub fn split_type<'a>(&self, ident: &'a str) -> Vec<(usize, &'a str)> {
        if ident.is_empty() {
            return Vec::new();
        }
        if let Some((ns_name, local)) = ident.split_once('.') {
            return self
                .tree
                .namespace_index(ns_name)
                .filter(|_| !local.is_empty())
                .map(|ns| vec![(ns, local)])
                .unwrap_or_default();
        }

        let mut matches = Vec::new();
        for &ns in &self.order {
            let mut prefixes: Vec<&str> = self.tree.namespaces()[ns]
                .identifier_prefixes
                .iter()
                .map(String::as_str)
                .collect();
            prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
            for prefix in prefixes {
                if let Some(local) = ident.strip_prefix(prefix).filter(|l| !l.is_empty()) {
                    matches.push((ns, local));
                }
            }
        }
        for &ns in &self.order {
            matches.push((ns, ident));
        }
        matches
    }

    /// Candidate `(namespace, local name)` pairs for a C symbol.
    pub fn split_symbol<'a>(&self, symbol: &'a str) -> Vec<(usize, &'a str)> {
        if symbol.is_empty() {
            return Vec::new();
        }
        let mut matches = Vec::new();
        for &ns in &self.order {
            for prefix in &self.tree.namespaces()[ns].symbol_prefixes {
                let local = symbol
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix('_'))
                    .filter(|l| !l.is_empty());
                if let Some(local) = local {
                    matches.push((ns, local));
                }
            }
        }
        for &ns in &self.order {
            matches.push((ns, symbol));
        }
        matches
    }

    pub fn resolve_type(&self, ident: &str) -> Option<NodeId> {
        self.split_type(ident)
            .into_iter()
            .find_map(|(ns, name)| self.tree.get(ns, name))
    }

    /// Exact C symbol first, then the local name left after the prefix.
    pub fn resolve_symbol(&self, symbol: &str) -> Option<NodeId> {
        let matches = self.split_symbol(symbol);
        matches
            .iter()
            .find_map(|&(ns, _)| self.tree.get_by_symbol(ns, symbol))
            .or_else(|| {
                matches
                    .iter()
                    .find_map(|&(ns, name)| self.tree.get(ns, name))
            })
    }

    /// Enum and member index for an enum member C identifier.
    pub fn resolve_member(&self, symbol: &str) -> Option<(NodeId, usize)> {
        self.order
            .iter()
            .find_map(|&ns| self.tree.member_by_symbol(ns, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    fn two_namespaces() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let gtk = tree.add_namespace("Gtk", vec!["Gtk".into()], vec!["gtk".into()]);
        let button = tree.add_node(gtk, NodeKind::Class, "Button");
        tree.register_symbol(button, "GtkButton");
        let new = tree.add_node(button, NodeKind::Function, "new");
        tree.register_symbol(new, "gtk_button_new");
        tree.add_node(gtk, NodeKind::Class, "Object");

        let gobject = tree.add_namespace("GObject", vec!["G".into()], vec!["g".into()]);
        let object = tree.add_node(gobject, NodeKind::Class, "Object");
        let init = tree.add_node(gobject, NodeKind::Function, "type_init");
        tree.register_symbol(init, "g_type_init");
        (tree, button, object)
    }

    #[test]
    fn resolves_prefixed_type() {
        let (tree, button, object) = two_namespaces();
        let resolver = Resolver::new(&tree, &[]);
        assert_eq!(resolver.resolve_type("GtkButton"), Some(button));
        assert_eq!(resolver.resolve_type("GObject"), Some(object));
    }

    #[test]
    fn resolves_dotted_type() {
        let (tree, button, _) = two_namespaces();
        let resolver = Resolver::new(&tree, &[]);
        assert_eq!(resolver.resolve_type("Gtk.Button"), Some(button));
        assert_eq!(resolver.resolve_type("Nope.Button"), None);
        assert_eq!(resolver.resolve_type("Gtk."), None);
    }

    #[test]
    fn bare_names_follow_search_order() {
        let (tree, _, object) = two_namespaces();
        let gtk_object = tree.get(0, "Object").unwrap();

        let resolver = Resolver::new(&tree, &[]);
        assert_eq!(resolver.resolve_type("Object"), Some(gtk_object));

        let resolver = Resolver::new(&tree, &["GObject".to_string()]);
        assert_eq!(resolver.resolve_type("Object"), Some(object));
    }

    #[test]
    fn unknown_identifiers_are_not_found() {
        let (tree, _, _) = two_namespaces();
        let resolver = Resolver::new(&tree, &[]);
        assert_eq!(resolver.resolve_type("GtkWindow"), None);
        assert_eq!(resolver.resolve_type(""), None);
        assert_eq!(resolver.resolve_symbol("gtk_window_new"), None);
    }

    #[test]
    fn resolves_exact_symbol_before_local_name() {
        let (tree, button, _) = two_namespaces();
        let resolver = Resolver::new(&tree, &[]);
        let new = resolver.resolve_symbol("gtk_button_new").unwrap();
        assert_eq!(tree.node(new).parent, Some(button));
        assert!(resolver.resolve_symbol("g_type_init").is_some());
    }

    #[test]
    fn symbol_found_by_exact_identifier() {
        let (tree, _, _) = two_namespaces();
        let resolver = Resolver::new(&tree, &[]);
        let init = resolver.resolve_symbol("g_type_init").unwrap();
        assert_eq!(tree.node(init).name, "type_init");
    }

    #[test]
    fn symbol_without_c_identifier_uses_local_name() {
        let (mut tree, _, _) = two_namespaces();
        let gtk = tree.namespaces()[0].root;
        let main = tree.add_node(gtk, NodeKind::Function, "main");
        let resolver = Resolver::new(&tree, &[]);
        assert_eq!(resolver.resolve_symbol("gtk_main"), Some(main));
    }

    #[test]
    fn split_symbol_requires_separator() {
        let (tree, _, _) = two_namespaces();
        let resolver = Resolver::new(&tree, &[]);
        let splits = resolver.split_symbol("gtkfoo");
        assert!(splits.iter().all(|&(_, local)| local == "gtkfoo"));
    }
}
