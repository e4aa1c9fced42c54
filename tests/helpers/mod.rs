//! Shared plumbing for the integration tests: parse a script, run it
//! against the POSIX host and the headless dialog, inspect the result.

#![allow(dead_code)]

use amiscript::{AutoDialog, Config, Evaluator, FsHost, NodeId, Outcome, Value, parse};

/// Parse `source` and hand the evaluator plus root to `f`.
pub fn with_script<R>(source: &str, f: impl FnOnce(&mut Evaluator, NodeId) -> R) -> R {
    with_script_cfg(source, Config::default(), f)
}

/// Same, with a custom [`Config`].
pub fn with_script_cfg<R>(
    source: &str,
    config: Config,
    f: impl FnOnce(&mut Evaluator, NodeId) -> R,
) -> R {
    let (tree, root) = parse(source).expect("script parses");
    let mut ev = Evaluator::new(
        &tree,
        Box::new(FsHost::new()),
        Box::new(AutoDialog::new()),
        config,
    );
    f(&mut ev, root)
}

/// Run a script to completion and return the outcome.
pub fn run_script(source: &str) -> Outcome {
    with_script(source, |ev, root| ev.run(root))
}

/// Evaluate each top-level statement in order, returning the value of
/// the last one. Panics if the script ends in a fault.
pub fn eval_script(source: &str) -> Value {
    with_script(source, |ev, root| {
        let mut last = Value::Dangle;
        for stmt in ev.tree().children(root) {
            last = ev.invoke(*stmt);
        }
        assert!(
            ev.fault().is_none(),
            "unexpected fault: {:?}",
            ev.fault()
        );
        last
    })
}

/// Numeric result of a script.
pub fn num_of(source: &str) -> i32 {
    eval_script(source).as_num()
}

/// String result of a script.
pub fn text_of(source: &str) -> String {
    eval_script(source).as_text()
}

/// A scratch directory for file-operation tests.
pub fn sandbox() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

/// Path inside a sandbox, as the string form scripts consume.
pub fn path_in(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}
