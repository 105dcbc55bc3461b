//! Canonical display names.
//!
//! The same name is used as link text, link target and output file stem, so
//! it must only depend on a node and its ownership chain.

use crate::model::{NodeId, NodeKind, Tree};

/// How fully qualified names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Convention {
    /// `Gtk.Button`, `Gtk.Button.new`, `Gtk.Button-clicked`
    #[default]
    Dotted,
    /// `GtkButton`, `gtk_button_new`, `GtkButton-clicked`
    Prefixed,
}

impl Convention {
    pub fn from_language(language: &str) -> Option<Self> {
        match language.to_ascii_lowercase().as_str() {
            "python" | "dotted" => Some(Convention::Dotted),
            "c" | "prefixed" => Some(Convention::Prefixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NameFormatter {
    convention: Convention,
}

impl NameFormatter {
    pub fn new(convention: Convention) -> Self {
        NameFormatter { convention }
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn full_node_name(&self, tree: &Tree, id: NodeId) -> String {
        let node = tree.node(id);
        let namespace = tree.namespace_name(id);

        match node.kind {
            NodeKind::Namespace | NodeKind::DocSection => node.name.clone(),
            NodeKind::Signal | NodeKind::VirtualFunction | NodeKind::Property | NodeKind::Field => {
                let owner = node
                    .parent
                    .map(|p| tree.node(p).name.as_str())
                    .unwrap_or_default();
                match self.convention {
                    Convention::Dotted => format!("{}.{}-{}", namespace, owner, node.name),
                    Convention::Prefixed => format!("{}{}-{}", namespace, owner, node.name),
                }
            }
            NodeKind::Function | NodeKind::Method => self.callable_path(tree, id),
            NodeKind::Constant => match (self.convention, node.c_symbol.as_deref()) {
                (Convention::Dotted, _) => format!("{}.{}", namespace, node.name),
                (Convention::Prefixed, Some(symbol)) => symbol.to_string(),
                (Convention::Prefixed, None) => {
                    format!("{}_{}", namespace.to_uppercase(), node.name)
                }
            },
            NodeKind::Class
            | NodeKind::Interface
            | NodeKind::Enum
            | NodeKind::Alias
            | NodeKind::Record
            | NodeKind::Callback => match self.convention {
                Convention::Dotted => format!("{}.{}", namespace, node.name),
                Convention::Prefixed => format!("{}{}", namespace, node.name),
            },
        }
    }

    /// Join the callable and every ancestor up to the namespace root.
    fn callable_path(&self, tree: &Tree, id: NodeId) -> String {
        let mut out = tree.node(id).name.clone();
        let mut current = tree.node(id).parent;

        while let Some(ancestor) = current {
            let name = &tree.node(ancestor).name;
            out = match self.convention {
                Convention::Dotted => format!("{}.{}", name, out),
                Convention::Prefixed => format!("{}_{}", name.to_lowercase(), out),
            };
            current = tree.node(ancestor).parent;
        }
        out
    }
}
