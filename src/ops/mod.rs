//! Built-in operators, grouped by family.
//!
//! Every operator is a function `fn(&mut Evaluator, NodeId) -> Value`
//! that validates its argument shape, resolves what it needs, performs
//! its effect, and returns the value that becomes the node's cached
//! result. Dispatch is one exhaustive match on the operator tag.
//!
//! Option evaluation is lazy throughout: `get_opt` scans the child list
//! without resolving anything, and an option's children are only
//! resolved when an operator actually reads them.

mod arithmetic;
mod comparison;
mod control;
mod exec;
mod file;
mod information;
mod probe;
mod prompt;
mod strings;
mod symbols;

use crate::ast::{NodeId, NodeKind, OpCode, OptTag};
use crate::dialog::Confirm;
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};

pub(crate) fn dispatch(ev: &mut Evaluator, n: NodeId, op: OpCode) -> Value {
    use OpCode::*;
    match op {
        // arithmetic and bitwise
        Add => arithmetic::add(ev, n),
        Sub => arithmetic::sub(ev, n),
        Mul => arithmetic::mul(ev, n),
        Div => arithmetic::div(ev, n),
        And => arithmetic::and(ev, n),
        Or => arithmetic::or(ev, n),
        Xor => arithmetic::xor(ev, n),
        Not => arithmetic::not(ev, n),
        BitAnd => arithmetic::bit_and(ev, n),
        BitOr => arithmetic::bit_or(ev, n),
        BitXor => arithmetic::bit_xor(ev, n),
        BitNot => arithmetic::bit_not(ev, n),
        ShiftLeft => arithmetic::shift_left(ev, n),
        ShiftRight => arithmetic::shift_right(ev, n),
        In => arithmetic::bit_in(ev, n),
        // comparison
        Eq => comparison::eq(ev, n),
        Gt => comparison::gt(ev, n),
        Gte => comparison::gte(ev, n),
        Lt => comparison::lt(ev, n),
        Lte => comparison::lte(ev, n),
        Neq => comparison::neq(ev, n),
        // control flow
        If => control::if_else(ev, n),
        While => control::while_loop(ev, n),
        Until => control::until_loop(ev, n),
        Select => control::select(ev, n),
        Procedure => control::procedure(ev, n),
        OnError => control::onerror(ev, n),
        Trap => control::trap(ev, n),
        Exit => control::exit(ev, n),
        Abort => control::abort(ev, n),
        Reboot => control::reboot(ev, n),
        Trace | Retrace => control::trace(ev, n),
        // strings and paths
        Cat => strings::cat(ev, n),
        Fmt => strings::fmt(ev, n),
        StrLen => strings::strlen(ev, n),
        SubStr => strings::substr(ev, n),
        TackOn => strings::tackon(ev, n),
        PathOnly => strings::pathonly(ev, n),
        FileOnly => strings::fileonly(ev, n),
        ExpandPath => strings::expandpath(ev, n),
        PatMatch => strings::patmatch(ev, n),
        // variables
        Set => symbols::set(ev, n),
        SymbolSet => symbols::symbolset(ev, n),
        SymbolVal => symbols::symbolval(ev, n),
        // prompts
        AskBool => prompt::askbool(ev, n),
        AskChoice => prompt::askchoice(ev, n),
        AskDir => prompt::askdir(ev, n),
        AskDisk => prompt::askdisk(ev, n),
        AskFile => prompt::askfile(ev, n),
        AskNumber => prompt::asknumber(ev, n),
        AskOptions => prompt::askoptions(ev, n),
        AskString => prompt::askstring(ev, n),
        // information
        Message => information::message(ev, n),
        Welcome => information::welcome(ev, n),
        Working => information::working(ev, n),
        Complete => information::complete(ev, n),
        User => information::user(ev, n),
        Debug => information::debug(ev, n),
        Transcript => information::transcript(ev, n),
        // probing
        Exists => probe::exists(ev, n),
        GetSize => probe::getsize(ev, n),
        GetSum => probe::getsum(ev, n),
        GetAssign => probe::getassign(ev, n),
        GetDevice => probe::getdevice(ev, n),
        GetDiskSpace => probe::getdiskspace(ev, n),
        GetEnv => probe::getenv(ev, n),
        GetVersion => probe::getversion(ev, n),
        Database => probe::database(ev, n),
        Earlier => probe::earlier(ev, n),
        IconInfo => probe::iconinfo(ev, n),
        // file operations
        CopyFiles => file::copyfiles(ev, n),
        CopyLib => file::copylib(ev, n),
        Delete => file::delete(ev, n),
        Rename => file::rename(ev, n),
        MakeDir => file::makedir(ev, n),
        MakeAssign => file::makeassign(ev, n),
        Protect => file::protect(ev, n),
        Startup => file::startup(ev, n),
        TextFile => file::textfile(ev, n),
        ToolType => file::tooltype(ev, n),
        Foreach => file::foreach(ev, n),
        // execution
        Execute => exec::execute(ev, n),
        Rexx => exec::rexx(ev, n),
        Run => exec::run_cmd(ev, n),
        OpenWbObject => exec::openwbobject(ev, n),
        ShowWbObject => exec::showwbobject(ev, n),
        CloseWbObject => exec::closewbobject(ev, n),
    }
}

// ============================================================================
// SHARED OPTION PLUMBING
// ============================================================================

/// Find an option of the given tag among a node's direct children.
/// Nothing is resolved; options stay lazy until read.
pub(crate) fn get_opt(ev: &Evaluator, n: NodeId, tag: OptTag) -> Option<NodeId> {
    ev.tree()
        .children(n)
        .iter()
        .copied()
        .find(|c| matches!(ev.tree().kind(*c), NodeKind::Option(t) if *t == tag))
}

/// Look for a flag keyword inside an `(optional ...)` / `(delopts ...)`
/// container. The flag can appear as a nested option form or as a string
/// (the keyword strings are predefined variables, so bare symbols work
/// too).
pub(crate) fn opt_flag_in(ev: &mut Evaluator, container: Option<NodeId>, tag: OptTag) -> bool {
    let Some(container) = container else {
        return false;
    };
    for i in 0..ev.tree().children(container).len() {
        let child = ev.tree().children(container)[i];
        match ev.tree().kind(child) {
            NodeKind::Option(t) if *t == tag => return true,
            NodeKind::Option(_) => continue,
            _ => {
                if ev.text(child).eq_ignore_ascii_case(tag.name()) {
                    return true;
                }
            }
        }
    }
    false
}

/// `(optional ...)` flag with `(delopts ...)` cancellation.
pub(crate) fn gated_flag(ev: &mut Evaluator, n: NodeId, tag: OptTag) -> bool {
    let delopts = get_opt(ev, n, OptTag::Delopts);
    if opt_flag_in(ev, delopts, tag) {
        return false;
    }
    let optional = get_opt(ev, n, OptTag::Optional);
    opt_flag_in(ev, optional, tag)
}

/// Concatenate the string renderings of all non-option children.
pub(crate) fn concat_args(ev: &mut Evaluator, n: NodeId) -> String {
    let mut out = String::new();
    for i in 0..ev.tree().children(n).len() {
        let child = ev.tree().children(n)[i];
        if matches!(ev.tree().kind(child), NodeKind::Option(_)) {
            continue;
        }
        out.push_str(&ev.text(child));
    }
    out
}

/// Fetch a required text option. In non-strict mode a missing `(prompt)`
/// or `(help)` degrades to the empty string; in strict mode the caller
/// gets `None` after a MissingOption error has been raised.
pub(crate) fn required_text(ev: &mut Evaluator, n: NodeId, tag: OptTag) -> Option<String> {
    match get_opt(ev, n, tag) {
        Some(opt) => Some(ev.resolve(opt).as_text()),
        None => {
            if ev.get_numvar("@strict") == 0
                && matches!(tag, OptTag::Prompt | OptTag::Help)
            {
                Some(String::new())
            } else {
                ev.raise(n, ErrorCode::MissingOption, tag.name());
                None
            }
        }
    }
}

/// Ask the user for confirmation (proceed / skip / abort).
///
/// `@yes`, `@skip` and `@abort` short-circuit the dialog so scripted
/// runs can simulate user behavior. Abort sets HALT; both skip and
/// abort read as "don't".
pub(crate) fn confirm_dialog(ev: &mut Evaluator, message: &str, help: &str) -> bool {
    let yes = ev.get_numvar("@yes") != 0;
    let skip = ev.get_numvar("@skip") != 0;
    let abort = ev.get_numvar("@abort") != 0;

    let answer = if yes || skip || abort {
        if abort {
            Confirm::Abort
        } else if yes {
            Confirm::Proceed
        } else {
            Confirm::Skip
        }
    } else {
        ev.dialog().confirm(message, help)
    };

    match answer {
        Confirm::Proceed => true,
        Confirm::Skip => false,
        Confirm::Abort => {
            ev.halt();
            false
        }
    }
}

/// Outcome of the shared `(confirm [TH])` gate.
pub(crate) enum Gate {
    Proceed,
    Skip,
    Errored,
}

/// The confirmation step common to the mutating file operators: with
/// `(confirm [TH])` present and `@user-level >= TH` (default: expert),
/// show the prompt/help confirmation. `@yes` forces proceed.
pub(crate) fn confirm_gate(ev: &mut Evaluator, n: NodeId) -> Gate {
    let Some(confirm) = get_opt(ev, n, OptTag::Confirm) else {
        return Gate::Proceed;
    };

    let mut threshold = 2;
    if let Some(first) = ev.tree().children(confirm).first().copied() {
        threshold = ev.num(first);
    }
    if ev.get_numvar("@user-level") < threshold || ev.get_numvar("@yes") != 0 {
        return Gate::Proceed;
    }

    let Some(prompt) = required_text(ev, n, OptTag::Prompt) else {
        return Gate::Errored;
    };
    let Some(help) = required_text(ev, n, OptTag::Help) else {
        return Gate::Errored;
    };

    if confirm_dialog(ev, &prompt, &help) {
        Gate::Proceed
    } else {
        Gate::Skip
    }
}

/// A non-safe operation in pretend mode skips its effect and succeeds.
pub(crate) fn pretend_skips(ev: &mut Evaluator, n: NodeId) -> bool {
    get_opt(ev, n, OptTag::Safe).is_none() && ev.get_numvar("@pretend") != 0
}
