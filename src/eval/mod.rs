//! The tree-walking evaluator.
//!
//! `run` drives the top-level Context statement by statement; `resolve`
//! reduces any node to a [`Value`]; `num` / `text` / `tru` coerce on top
//! of it. Faults (halt, abort, script errors) never travel through
//! return values: they land in the evaluator's fault slot, operators
//! consult [`Evaluator::faulted`] before doing expensive work, and `run`
//! deals with whatever reaches the top.

mod env;
mod value;

pub use env::Config;
pub use value::{Value, parse_num};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::ast::{NodeId, NodeKind, Tree};
use crate::dialog::Dialog;
use crate::error::{ErrorCode, Fault};
use crate::host::Host;
use crate::ops;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The script ran to completion (possibly via `(exit)` or a handled
    /// error).
    Complete,
    /// The user aborted, or `(abort)` was reached, or the error handler
    /// itself failed.
    Aborted,
}

/// Procedure call frame: the formals of the active Custom, bound to the
/// actual argument values.
#[derive(Debug)]
struct Frame {
    locals: Vec<(SmolStr, Value)>,
}

/// Hard cap on user-procedure recursion.
const MAX_CALL_DEPTH: usize = 512;

/// One interpreter instance: fault slot, environment, dialog and host
/// handles, plus the tree being evaluated.
pub struct Evaluator<'t> {
    tree: &'t Tree,
    host: Box<dyn Host>,
    dialog: Box<dyn Dialog>,

    /// Global bindings, keyed by lowercased name. Insertion order is
    /// preserved so environment dumps are deterministic.
    globals: IndexMap<SmolStr, Value>,
    /// Procedure-local bindings, one frame per active call.
    frames: Vec<Frame>,
    /// User-defined procedures (and `@onerror`), keyed by lowercased
    /// name.
    customs: FxHashMap<SmolStr, NodeId>,

    /// Most recent result per Native / Custom node.
    cache: Vec<Option<Value>>,

    fault: Option<Fault>,
    /// Set by `(exit)`: stop the run loop without a fault.
    done: bool,
}

impl<'t> Evaluator<'t> {
    /// Build an evaluator over `tree`, seeding the reserved variables
    /// from `config`.
    pub fn new(
        tree: &'t Tree,
        host: Box<dyn Host>,
        dialog: Box<dyn Dialog>,
        config: Config,
    ) -> Self {
        let mut ev = Evaluator {
            tree,
            host,
            dialog,
            globals: IndexMap::new(),
            frames: Vec::new(),
            customs: FxHashMap::default(),
            cache: vec![None; tree.len()],
            fault: None,
            done: false,
        };
        ev.seed(config);
        ev
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn host(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    pub fn dialog(&mut self) -> &mut dyn Dialog {
        self.dialog.as_mut()
    }

    // ------------------------------------------------------------------
    // fault slot
    // ------------------------------------------------------------------

    pub fn faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Raise a script error at `node`, unless a fault is already set.
    pub fn raise(&mut self, node: NodeId, code: ErrorCode, arg: impl Into<String>) {
        if self.fault.is_none() {
            let arg = arg.into();
            debug!(line = self.tree.line(node), ?code, %arg, "raising");
            self.fault = Some(Fault::err(code, self.tree.line(node), arg));
        }
    }

    /// Set the HALT state: a soft cancel that unwinds to `run`.
    pub fn halt(&mut self) {
        if self.fault.is_none() {
            self.fault = Some(Fault::Halt);
        }
    }

    /// Explicit `(abort ...)`.
    pub fn abort(&mut self, message: String) {
        if self.fault.is_none() {
            self.fault = Some(Fault::Abort(message));
        }
    }

    /// Clear the fault slot, returning what was there.
    pub fn clear_fault(&mut self) -> Option<Fault> {
        self.fault.take()
    }

    /// Mark the run as finished (used by `(exit)`).
    pub fn finish(&mut self) {
        self.done = true;
    }

    // ------------------------------------------------------------------
    // core tree walk
    // ------------------------------------------------------------------

    /// Evaluate the top-level Context. Statements run in source order;
    /// the loop stops early on halt, abort, exit, or an unhandled error.
    pub fn run(&mut self, root: NodeId) -> Outcome {
        for i in 0..self.tree.children(root).len() {
            let stmt = self.tree.children(root)[i];
            self.invoke(stmt);

            if self.done {
                return Outcome::Complete;
            }
            match self.fault.take() {
                None => continue,
                Some(Fault::Halt) => {
                    self.dialog.message("Installation aborted", false);
                    return Outcome::Aborted;
                }
                Some(Fault::Abort(msg)) => {
                    if !msg.is_empty() {
                        self.dialog.message(&msg, false);
                    }
                    self.dialog.message("Installation aborted", false);
                    return Outcome::Aborted;
                }
                Some(Fault::Err(err)) => {
                    debug!(%err, "unhandled error reached run");
                    self.set_strvar("@error-msg", err.to_string());
                    if let Some(handler) = self.customs.get("@onerror").copied() {
                        self.call_custom_node(handler, &[]);
                    }
                    // The handler's return value replaces the error; if
                    // the handler itself faulted, give up.
                    return match self.fault.take() {
                        None => Outcome::Complete,
                        Some(_) => Outcome::Aborted,
                    };
                }
            }
        }
        Outcome::Complete
    }

    /// Evaluate a node, recomputing even if a cached result exists.
    /// This is what loop bodies and procedure bodies use.
    pub fn invoke(&mut self, id: NodeId) -> Value {
        self.resolve(id)
    }

    /// Reduce a node to its value. Never fails: after a fault the result
    /// degrades to `Dangle`, and operators are expected to check
    /// [`Evaluator::faulted`].
    pub fn resolve(&mut self, id: NodeId) -> Value {
        if self.faulted() {
            return Value::Dangle;
        }
        trace!(node = %id, kind = ?self.tree.kind(id), "resolve");
        match self.tree.kind(id) {
            NodeKind::Number(n) => Value::Number(*n),
            NodeKind::String(s) => Value::text(s.as_str()),
            NodeKind::Symbol(name) => {
                let name = name.clone();
                self.lookup(&name).cloned().unwrap_or(Value::Dangle)
            }
            NodeKind::SymRef(name) => {
                let name = name.clone();
                match self.lookup(&name).cloned() {
                    Some(v) => v,
                    None => {
                        if self.get_numvar("@strict") != 0 {
                            self.raise(id, ErrorCode::UndefinedVariable, name.as_str());
                        }
                        Value::Dangle
                    }
                }
            }
            NodeKind::Native(op) => {
                let op = *op;
                let value = ops::dispatch(self, id, op);
                self.cache[id.index()] = Some(value.clone());
                value
            }
            NodeKind::Option(_) => self.resolve_option(id),
            NodeKind::CusRef(name) => {
                let name = name.clone();
                self.call_custom(id, &name)
            }
            NodeKind::Custom(_) => self.cache[id.index()].clone().unwrap_or(Value::Dangle),
            NodeKind::Contxt => self.eval_body(id),
        }
    }

    /// Evaluate the children of a grouping node in order; the last value
    /// wins. An empty body dangles.
    pub fn eval_body(&mut self, id: NodeId) -> Value {
        let mut last = Value::Dangle;
        for i in 0..self.tree.children(id).len() {
            if self.faulted() || self.done {
                break;
            }
            let child = self.tree.children(id)[i];
            last = self.invoke(child);
        }
        last
    }

    /// An option's value: its single child, or the concatenation of the
    /// string renderings of several children.
    fn resolve_option(&mut self, id: NodeId) -> Value {
        let children = self.tree.children(id);
        match children.len() {
            0 => Value::Dangle,
            1 => {
                let only = children[0];
                self.resolve(only)
            }
            _ => {
                let mut out = String::new();
                for i in 0..self.tree.children(id).len() {
                    let child = self.tree.children(id)[i];
                    out.push_str(&self.text(child));
                }
                Value::text(out)
            }
        }
    }

    // ------------------------------------------------------------------
    // coercion entry points
    // ------------------------------------------------------------------

    pub fn num(&mut self, id: NodeId) -> i32 {
        self.resolve(id).as_num()
    }

    pub fn text(&mut self, id: NodeId) -> String {
        self.resolve(id).as_text()
    }

    pub fn tru(&mut self, id: NodeId) -> bool {
        self.num(id) != 0
    }

    // ------------------------------------------------------------------
    // procedures
    // ------------------------------------------------------------------

    /// Register a Custom definition under its (lowercased) name.
    pub fn register_custom(&mut self, custom: NodeId) {
        if let NodeKind::Custom(name) = self.tree.kind(custom) {
            let key = SmolStr::new(name.to_ascii_lowercase());
            trace!(%key, "registering procedure");
            self.customs.insert(key, custom);
        }
    }

    /// Look up a registered Custom by name.
    pub fn find_custom(&self, name: &str) -> Option<NodeId> {
        self.customs.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Invoke a user procedure: bind actuals to formals, evaluate the
    /// body, unbind, return the body's last value.
    fn call_custom(&mut self, call: NodeId, name: &str) -> Value {
        let Some(custom) = self.find_custom(name) else {
            if self.get_numvar("@strict") != 0 {
                self.raise(call, ErrorCode::UndefinedVariable, name);
            }
            return Value::Dangle;
        };

        // Resolve actuals before pushing the frame so argument
        // expressions see the caller's scope.
        let argc = self.tree.children(call).len();
        let mut actuals = Vec::with_capacity(argc);
        for i in 0..argc {
            let arg = self.tree.children(call)[i];
            actuals.push(self.resolve(arg));
        }
        self.call_custom_node(custom, &actuals)
    }

    /// Invoke a Custom node directly with pre-resolved arguments.
    pub fn call_custom_node(&mut self, custom: NodeId, actuals: &[Value]) -> Value {
        if self.frames.len() >= MAX_CALL_DEPTH {
            self.raise(custom, ErrorCode::Overflow, "procedure recursion");
            return Value::Dangle;
        }

        if let NodeKind::Custom(name) = self.tree.kind(custom) {
            trace!(procedure = %name, "invoking");
        }
        let formals = self.tree.symbols(custom);
        let mut locals = Vec::with_capacity(formals.len());
        for (i, formal) in formals.iter().enumerate() {
            if let NodeKind::Symbol(fname) = self.tree.kind(*formal) {
                let value = actuals.get(i).cloned().unwrap_or(Value::Dangle);
                locals.push((fname.clone(), value));
            }
        }

        self.frames.push(Frame { locals });
        let result = self.eval_body(custom);
        self.frames.pop();

        self.cache[custom.index()] = Some(result.clone());
        result
    }

    // ------------------------------------------------------------------
    // symbol lookup
    // ------------------------------------------------------------------

    /// Scope lookup: the formals of the active procedure first, then the
    /// global root. Case-insensitive.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(frame) = self.frames.last() {
            if let Some((_, v)) = frame
                .locals
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
            {
                return Some(v);
            }
        }
        self.globals.get(name.to_ascii_lowercase().as_str())
    }

    /// Bind `name`, honoring procedure locals: assigning to a formal of
    /// the active procedure mutates the local, everything else lands in
    /// the global root.
    pub fn bind(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            if let Some(slot) = frame
                .locals
                .iter_mut()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
            {
                slot.1 = value;
                return;
            }
        }
        self.globals
            .insert(SmolStr::new(name.to_ascii_lowercase()), value);
    }

    /// True if `name` is bound anywhere visible from the current scope.
    pub fn is_bound(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Snapshot of the global environment, for dumps and tests.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.globals.iter().map(|(k, v)| (k.as_str(), v))
    }
}
