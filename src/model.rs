//! Declaration tree: format-agnostic.
//!
//! Nodes live in one arena per run, across every loaded namespace. A node
//! knows its owning namespace and (except for namespace roots) its parent.
//! Kind-specific data is exposed as capabilities: parameters and a return
//! value for callables, flags for properties and signals, a base class for
//! classes, members for enums and a value for constants.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Namespace,
    Class,
    Interface,
    Function,
    Method,
    VirtualFunction,
    Signal,
    Property,
    Field,
    Enum,
    DocSection,
    Alias,
    Record,
    Callback,
    Constant,
}

impl NodeKind {
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            NodeKind::Function
                | NodeKind::Method
                | NodeKind::VirtualFunction
                | NodeKind::Signal
                | NodeKind::Callback
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Named(String),
    Variadic,
}

/// Introspection annotations of a parameter or return value, in gtk-doc
/// spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Ownership transfer other than `none`.
    Transfer(String),
    Nullable,
    AllowNone,
    Optional,
    Out,
    InOut,
    /// `length=n_items`, `fixed-size=4`, `zero-terminated=1`
    Array(Option<String>),
    ElementType(String),
    Scope(String),
    /// Name of the user data parameter, when known.
    Closure(Option<String>),
}

impl Annotation {
    pub fn label(&self) -> String {
        match self {
            Annotation::Transfer(mode) => format!("transfer {}", mode),
            Annotation::Nullable => "nullable".to_string(),
            Annotation::AllowNone => "allow-none".to_string(),
            Annotation::Optional => "optional".to_string(),
            Annotation::Out => "out".to_string(),
            Annotation::InOut => "inout".to_string(),
            Annotation::Array(None) => "array".to_string(),
            Annotation::Array(Some(detail)) => format!("array {}", detail),
            Annotation::ElementType(ty) => format!("element-type {}", ty),
            Annotation::Scope(scope) => format!("scope {}", scope),
            Annotation::Closure(None) => "closure".to_string(),
            Annotation::Closure(Some(data)) => format!("closure {}", data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub argname: String,
    /// Introspected type, e.g. `utf8`, `Gtk.Widget`, `[guint8]`.
    pub ty: ParamType,
    /// C spelling of the type, e.g. `const gchar*`.
    pub c_type: Option<String>,
    pub doc: String,
    pub annotations: Vec<Annotation>,
}

impl Parameter {
    pub fn new(argname: impl Into<String>, ty: ParamType, doc: impl Into<String>) -> Self {
        Parameter {
            argname: argname.into(),
            ty,
            c_type: None,
            doc: doc.into(),
            annotations: Vec::new(),
        }
    }

    pub fn with_c_type(mut self, c_type: impl Into<String>) -> Self {
        self.c_type = Some(c_type.into());
        self
    }
}

/// What a callable returns; `void` returns are not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnValue {
    pub ty: String,
    pub c_type: Option<String>,
    pub doc: String,
    pub annotations: Vec<Annotation>,
}

/// Property access and signal emission flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Readable,
    Writable,
    Construct,
    ConstructOnly,
    RunFirst,
    RunLast,
    RunCleanup,
    NoHooks,
}

impl Flag {
    pub fn label(self) -> &'static str {
        match self {
            Flag::Readable => "Read",
            Flag::Writable => "Write",
            Flag::Construct => "Construct",
            Flag::ConstructOnly => "Construct Only",
            Flag::RunFirst => "Run First",
            Flag::RunLast => "Run Last",
            Flag::RunCleanup => "Run Cleanup",
            Flag::NoHooks => "No Hooks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub c_identifier: Option<String>,
    pub doc: String,
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    /// Index of the owning namespace in [`Tree::namespaces`].
    pub namespace: usize,
    pub parent: Option<NodeId>,
    pub doc: String,
    /// C identifier or C type name.
    pub c_symbol: Option<String>,
    pub introspectable: bool,
    pub throws: bool,
    parameters: Vec<Parameter>,
    return_value: Option<ReturnValue>,
    /// Literal value of a constant.
    value: Option<String>,
    flags: Vec<Flag>,
    base: Option<String>,
    members: Vec<EnumMember>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, name: String, namespace: usize, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            name,
            namespace,
            parent,
            doc: String::new(),
            c_symbol: None,
            introspectable: true,
            throws: false,
            parameters: Vec::new(),
            return_value: None,
            value: None,
            flags: Vec::new(),
            base: None,
            members: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Declared parameters, for callables only.
    pub fn parameters(&self) -> Option<&[Parameter]> {
        self.kind.is_callable().then_some(self.parameters.as_slice())
    }

    pub fn return_value(&self) -> Option<&ReturnValue> {
        self.return_value.as_ref().filter(|_| self.kind.is_callable())
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Base class reference, as written in the repository.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    pub fn push_parameter(&mut self, param: Parameter) {
        self.parameters.push(param);
    }

    pub fn set_return_value(&mut self, retval: ReturnValue) {
        self.return_value = Some(retval);
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn push_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    pub fn set_base(&mut self, base: impl Into<String>) {
        self.base = Some(base.into());
    }

    pub fn push_member(&mut self, member: EnumMember) -> usize {
        self.members.push(member);
        self.members.len() - 1
    }
}

/// Lookup tables for one top-level scope.
#[derive(Debug)]
pub struct Namespace {
    pub name: String,
    pub root: NodeId,
    /// C type prefixes, e.g. `Gtk`.
    pub identifier_prefixes: Vec<String>,
    /// C symbol prefixes, e.g. `gtk`.
    pub symbol_prefixes: Vec<String>,
    by_name: HashMap<String, NodeId>,
    by_symbol: HashMap<String, NodeId>,
    by_member_symbol: HashMap<String, (NodeId, usize)>,
}

#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    namespaces: Vec<Namespace>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_namespace(
        &mut self,
        name: &str,
        identifier_prefixes: Vec<String>,
        symbol_prefixes: Vec<String>,
    ) -> NodeId {
        let index = self.namespaces.len();
        let root = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(NodeKind::Namespace, name.to_string(), index, None));
        self.namespaces.push(Namespace {
            name: name.to_string(),
            root,
            identifier_prefixes,
            symbol_prefixes,
            by_name: HashMap::new(),
            by_symbol: HashMap::new(),
            by_member_symbol: HashMap::new(),
        });
        root
    }

    /// Append a child declaration. Direct children of a namespace root are
    /// also indexed by local name.
    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        let namespace = self.node(parent).namespace;
        self.nodes
            .push(Node::new(kind, name.to_string(), namespace, Some(parent)));
        self.nodes[parent.0].children.push(id);

        let ns = &mut self.namespaces[namespace];
        if ns.root == parent {
            ns.by_name.entry(name.to_string()).or_insert(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Record the C symbol of a node and index it for exact-symbol lookup.
    pub fn register_symbol(&mut self, id: NodeId, symbol: &str) {
        let namespace = self.node(id).namespace;
        self.nodes[id.0].c_symbol = Some(symbol.to_string());
        self.namespaces[namespace]
            .by_symbol
            .entry(symbol.to_string())
            .or_insert(id);
    }

    /// Add an enum member and index its C identifier.
    pub fn add_member(&mut self, enum_id: NodeId, member: EnumMember) -> usize {
        let namespace = self.node(enum_id).namespace;
        let symbol = member.c_identifier.clone();
        let index = self.nodes[enum_id.0].push_member(member);
        if let Some(symbol) = symbol {
            self.namespaces[namespace]
                .by_member_symbol
                .entry(symbol)
                .or_insert((enum_id, index));
        }
        index
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace_index(&self, name: &str) -> Option<usize> {
        self.namespaces.iter().position(|ns| ns.name == name)
    }

    pub fn namespace_name(&self, id: NodeId) -> &str {
        &self.namespaces[self.node(id).namespace].name
    }

    /// Top-level declaration of namespace `ns` with local name `name`.
    pub fn get(&self, ns: usize, name: &str) -> Option<NodeId> {
        self.namespaces.get(ns)?.by_name.get(name).copied()
    }

    /// Declaration of namespace `ns` whose C symbol is exactly `symbol`.
    pub fn get_by_symbol(&self, ns: usize, symbol: &str) -> Option<NodeId> {
        self.namespaces.get(ns)?.by_symbol.get(symbol).copied()
    }

    /// Enum and member index for an enum member C identifier.
    pub fn member_by_symbol(&self, ns: usize, symbol: &str) -> Option<(NodeId, usize)> {
        self.namespaces.get(ns)?.by_member_symbol.get(symbol).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn find_child(&self, id: NodeId, kind: NodeKind, name: &str) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&child| {
            let node = self.node(child);
            node.kind == kind && node.name == name
        })
    }

    /// Pre-order traversal of everything below `root` (not `root` itself).
    ///
    /// The visitor receives the node and its ancestors below `root`; returning
    /// `false` skips the node's subtree.
    pub fn walk<F>(&self, root: NodeId, mut visitor: F)
    where
        F: FnMut(NodeId, &[NodeId]) -> bool,
    {
        let mut chain = Vec::new();
        self.walk_children(root, &mut chain, &mut visitor);
    }

    fn walk_children<F>(&self, id: NodeId, chain: &mut Vec<NodeId>, visitor: &mut F)
    where
        F: FnMut(NodeId, &[NodeId]) -> bool,
    {
        for &child in self.children(id) {
            if visitor(child, chain.as_slice()) {
                chain.push(child);
                self.walk_children(child, chain, visitor);
                chain.pop();
            }
        }
    }
}
