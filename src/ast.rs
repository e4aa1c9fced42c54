//! Arena-based node model for Installer scripts.
//!
//! Every runtime and syntactic value is a [`Node`] stored in a [`Tree`]
//! arena and addressed by [`NodeId`]. The C original threaded raw parent
//! and child pointers through sentinel-terminated arrays; here children
//! are plain `Vec<NodeId>` sequences, the `end()` sentinel disappears into
//! iteration, and the halt/abort/error status values live in the
//! evaluator's fault slot instead of the tree.
//!
//! Ownership invariant: every node except the root appears in exactly one
//! parent's `children` or `symbols` sequence, and `parent` always points
//! at that owner.

use smol_str::SmolStr;

/// Index of a node in its [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Discriminated payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Integer literal or computed integer.
    Number(i32),
    /// String literal or computed string.
    String(SmolStr),
    /// A binding name: formal parameter or left-hand side of `(set ...)`.
    Symbol(SmolStr),
    /// Unresolved identifier occurrence; lookup target.
    SymRef(SmolStr),
    /// Call to a built-in operator.
    Native(OpCode),
    /// Keyword argument such as `(prompt ...)` or `(choices ...)`.
    Option(OptTag),
    /// User-defined procedure definition; formals live in `symbols`.
    Custom(SmolStr),
    /// Call to a user-defined procedure, bound at call time by name.
    CusRef(SmolStr),
    /// Grouping node: a sequence of statements with a local symbol table.
    Contxt,
}

/// A single tree node. Fields are populated selectively by kind.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Source line, used in log prefixes and error reports.
    pub line: u32,
    /// Back-edge to the owner; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Ordered operand / body nodes.
    pub children: Vec<NodeId>,
    /// Symbol nodes defined locally in this node's scope.
    pub symbols: Vec<NodeId>,
}

/// Arena of nodes. Construction either goes through the parser or through
/// the typed builder methods below; either way a node is fully formed the
/// moment it gets an id.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind, line: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            line,
            parent: None,
            children: Vec::new(),
            symbols: Vec::new(),
        });
        id
    }

    pub fn number(&mut self, value: i32, line: u32) -> NodeId {
        self.alloc(NodeKind::Number(value), line)
    }

    pub fn string(&mut self, value: &str, line: u32) -> NodeId {
        self.alloc(NodeKind::String(SmolStr::new(value)), line)
    }

    pub fn symbol(&mut self, name: &str, line: u32) -> NodeId {
        self.alloc(NodeKind::Symbol(SmolStr::new(name)), line)
    }

    pub fn symref(&mut self, name: &str, line: u32) -> NodeId {
        self.alloc(NodeKind::SymRef(SmolStr::new(name)), line)
    }

    pub fn native(&mut self, op: OpCode, line: u32) -> NodeId {
        self.alloc(NodeKind::Native(op), line)
    }

    pub fn option(&mut self, tag: OptTag, line: u32) -> NodeId {
        self.alloc(NodeKind::Option(tag), line)
    }

    pub fn custom(&mut self, name: &str, line: u32) -> NodeId {
        self.alloc(NodeKind::Custom(SmolStr::new(name)), line)
    }

    pub fn cusref(&mut self, name: &str, line: u32) -> NodeId {
        self.alloc(NodeKind::CusRef(SmolStr::new(name)), line)
    }

    pub fn contxt(&mut self, line: u32) -> NodeId {
        self.alloc(NodeKind::Contxt, line)
    }

    /// Append `child` to `parent`'s children, reparenting it. Returns
    /// `parent` so construction chains read top-down.
    pub fn push(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        debug_assert!(
            self.nodes[child.index()].parent.is_none(),
            "node {child} already owned"
        );
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        parent
    }

    /// Append a Symbol node to `owner`'s local symbol table.
    pub fn append_symbol(&mut self, owner: NodeId, sym: NodeId) -> NodeId {
        debug_assert!(
            matches!(self.nodes[sym.index()].kind, NodeKind::Symbol(_)),
            "symbols sequence holds Symbol nodes only"
        );
        self.nodes[sym.index()].parent = Some(owner);
        self.nodes[owner.index()].symbols.push(sym);
        owner
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn line(&self, id: NodeId) -> u32 {
        self.nodes[id.index()].line
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn symbols(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].symbols
    }

    /// Positional argument accessor, skipping interleaved Option nodes.
    /// `n` is 1-based to match the way the operators are documented.
    pub fn arg(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| !matches!(self.kind(*c), NodeKind::Option(_)))
            .nth(n - 1)
    }

    /// Number of positional (non-option) arguments.
    pub fn arg_count(&self, id: NodeId) -> usize {
        self.children(id)
            .iter()
            .filter(|c| !matches!(self.kind(**c), NodeKind::Option(_)))
            .count()
    }

    /// Name payload for the kinds that carry one.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::String(s)
            | NodeKind::Symbol(s)
            | NodeKind::SymRef(s)
            | NodeKind::Custom(s)
            | NodeKind::CusRef(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ============================================================================
// OPERATOR TAGS
// ============================================================================

macro_rules! opcodes {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Tag of a built-in operator. Dispatch is an exhaustive match in
        /// the `ops` module.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OpCode {
            $($variant),+
        }

        impl OpCode {
            /// The keyword as it appears in script source.
            pub fn name(self) -> &'static str {
                match self {
                    $(OpCode::$variant => $name),+
                }
            }

            /// Case-insensitive keyword lookup.
            pub fn from_name(name: &str) -> Option<OpCode> {
                let lower = name.to_ascii_lowercase();
                match lower.as_str() {
                    $($name => Some(OpCode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    // arithmetic and bitwise
    Add => "+",
    Sub => "-",
    Mul => "*",
    Div => "/",
    And => "and",
    Or => "or",
    Xor => "xor",
    Not => "not",
    BitAnd => "bitand",
    BitOr => "bitor",
    BitXor => "bitxor",
    BitNot => "bitnot",
    ShiftLeft => "shiftleft",
    ShiftRight => "shiftright",
    In => "in",
    // comparison
    Eq => "=",
    Gt => ">",
    Gte => ">=",
    Lt => "<",
    Lte => "<=",
    Neq => "<>",
    // control flow
    If => "if",
    While => "while",
    Until => "until",
    Select => "select",
    Procedure => "procedure",
    OnError => "onerror",
    Trap => "trap",
    Exit => "exit",
    Abort => "abort",
    Reboot => "reboot",
    Trace => "trace",
    Retrace => "retrace",
    // strings and paths
    Cat => "cat",
    Fmt => "fmt",
    StrLen => "strlen",
    SubStr => "substr",
    TackOn => "tackon",
    PathOnly => "pathonly",
    FileOnly => "fileonly",
    ExpandPath => "expandpath",
    PatMatch => "patmatch",
    // variables
    Set => "set",
    SymbolSet => "symbolset",
    SymbolVal => "symbolval",
    // prompts
    AskBool => "askbool",
    AskChoice => "askchoice",
    AskDir => "askdir",
    AskDisk => "askdisk",
    AskFile => "askfile",
    AskNumber => "asknumber",
    AskOptions => "askoptions",
    AskString => "askstring",
    // information
    Message => "message",
    Welcome => "welcome",
    Working => "working",
    Complete => "complete",
    User => "user",
    Debug => "debug",
    Transcript => "transcript",
    // probing
    Exists => "exists",
    GetSize => "getsize",
    GetSum => "getsum",
    GetAssign => "getassign",
    GetDevice => "getdevice",
    GetDiskSpace => "getdiskspace",
    GetEnv => "getenv",
    GetVersion => "getversion",
    Database => "database",
    Earlier => "earlier",
    IconInfo => "iconinfo",
    // file operations
    CopyFiles => "copyfiles",
    CopyLib => "copylib",
    Delete => "delete",
    Rename => "rename",
    MakeDir => "makedir",
    MakeAssign => "makeassign",
    Protect => "protect",
    Startup => "startup",
    TextFile => "textfile",
    ToolType => "tooltype",
    Foreach => "foreach",
    // execution
    Execute => "execute",
    Rexx => "rexx",
    Run => "run",
    OpenWbObject => "openwbobject",
    ShowWbObject => "showwbobject",
    CloseWbObject => "closewbobject",
}

// ============================================================================
// OPTION TAGS
// ============================================================================

macro_rules! opttags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Tag of a keyword option form such as `(prompt ...)`. The set is
        /// fixed by the language.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OptTag {
            $($variant),+
        }

        impl OptTag {
            /// The keyword as it appears in script source.
            pub fn name(self) -> &'static str {
                match self {
                    $(OptTag::$variant => $name),+
                }
            }

            /// Case-insensitive keyword lookup.
            pub fn from_name(name: &str) -> Option<OptTag> {
                let lower = name.to_ascii_lowercase();
                match lower.as_str() {
                    $($name => Some(OptTag::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

opttags! {
    All => "all",
    Append => "append",
    Assigns => "assigns",
    Back => "back",
    Choices => "choices",
    Command => "command",
    Compression => "compression",
    Confirm => "confirm",
    Default => "default",
    Delopts => "delopts",
    Dest => "dest",
    Disk => "disk",
    Files => "files",
    Fonts => "fonts",
    GetDefaultTool => "getdefaulttool",
    GetPosition => "getposition",
    GetStack => "getstack",
    GetToolType => "gettooltype",
    Help => "help",
    Infos => "infos",
    Include => "include",
    NewName => "newname",
    NewPath => "newpath",
    NoGauge => "nogauge",
    NoPosition => "noposition",
    NoReq => "noreq",
    Pattern => "pattern",
    Prompt => "prompt",
    Quiet => "quiet",
    Range => "range",
    Safe => "safe",
    SetDefaultTool => "setdefaulttool",
    SetPosition => "setposition",
    SetStack => "setstack",
    SetToolType => "settooltype",
    Source => "source",
    SwapColors => "swapcolors",
    Optional => "optional",
    Resident => "resident",
    Override => "override",
    DynOpt => "dynopt",
    Fail => "fail",
    NoFail => "nofail",
    OkNoDelete => "oknodelete",
    Force => "force",
    AskUser => "askuser",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_reparents() {
        let mut t = Tree::new();
        let root = t.contxt(0);
        let n = t.number(42, 1);
        t.push(root, n);
        assert_eq!(t.parent(n), Some(root));
        assert_eq!(t.children(root), &[n]);
    }

    #[test]
    fn test_arg_skips_options() {
        let mut t = Tree::new();
        let call = t.native(OpCode::Delete, 1);
        let opt = t.option(OptTag::Safe, 1);
        let file = t.string("ram:x", 1);
        t.push(call, opt);
        t.push(call, file);
        assert_eq!(t.arg(call, 1), Some(file));
        assert_eq!(t.arg(call, 2), None);
        assert_eq!(t.arg_count(call), 1);
    }

    #[test]
    fn test_symbol_table_ownership() {
        let mut t = Tree::new();
        let set = t.contxt(3);
        let sym = t.symbol("x", 3);
        t.append_symbol(set, sym);
        assert_eq!(t.symbols(set), &[sym]);
        assert_eq!(t.parent(sym), Some(set));
    }

    #[test]
    fn test_opcode_round_trip() {
        assert_eq!(OpCode::from_name("COPYFILES"), Some(OpCode::CopyFiles));
        assert_eq!(OpCode::from_name("<>"), Some(OpCode::Neq));
        assert_eq!(OpCode::from_name("nosuchop"), None);
        assert_eq!(OpCode::CopyFiles.name(), "copyfiles");
    }

    #[test]
    fn test_opttag_round_trip() {
        assert_eq!(OptTag::from_name("Prompt"), Some(OptTag::Prompt));
        assert_eq!(OptTag::from_name("oknodelete"), Some(OptTag::OkNoDelete));
        assert_eq!(OptTag::from_name("bogus"), None);
    }
}
