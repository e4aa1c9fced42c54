//! Reserved variables, startup seeding, and the install log.
//!
//! Two overlapping binding sets share one table: user bindings created by
//! `(set ...)` / `(symbolset ...)`, and the reserved `@`-prefixed
//! variables that configure interpreter behavior. The reserved set is
//! seeded once at construction from [`Config`], which stands in for the
//! CLI / ToolTypes arguments of a full frontend.

use crate::ast::{NodeId, NodeKind};
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};

/// Startup arguments. Field defaults match what an argument-less
/// invocation would see.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    /// Path of the script icon, exported as `@icon`.
    pub icon: String,
    pub log_file: String,
    /// Default user level: 0 novice, 1 average, 2 expert. Clamped to at
    /// least `user_min`.
    pub user_level: i32,
    pub user_min: i32,
    pub language: String,
    pub no_log: bool,
    pub no_pretend: bool,
    /// Strict mode: missing prompts and undefined variables are errors.
    /// The original hardcodes this on for non-Amiga builds.
    pub strict: bool,
    /// Path of the startup file `(startup ...)` edits.
    pub user_startup: String,
    pub default_dest: String,
    /// Reported as `@installer-version`, packed `(major << 16) | minor`.
    pub installer_version: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app_name: "Test App".into(),
            icon: String::new(),
            log_file: "install_log_file".into(),
            user_level: 1,
            user_min: 0,
            language: "english".into(),
            no_log: false,
            no_pretend: false,
            strict: true,
            user_startup: "s:user-startup".into(),
            default_dest: "T:".into(),
            installer_version: (44 << 16) | 10,
        }
    }
}

impl Evaluator<'_> {
    /// Install the reserved bindings. Only called from `new`.
    pub(super) fn seed(&mut self, config: Config) {
        let level = config.user_level.max(config.user_min);

        // Modus.
        self.bind("@no-log", Value::Number(config.no_log as i32));
        self.bind("@no-pretend", Value::Number(config.no_pretend as i32));

        // File names.
        self.bind("@icon", Value::text(config.icon));
        self.bind("@app-name", Value::text(config.app_name));
        self.bind("@log-file", Value::text(config.log_file));

        self.bind("@user-level", Value::Number(level));
        self.bind("@user-min", Value::Number(config.user_min));
        self.bind("@language", Value::text(config.language));

        // Misc numerical values.
        self.bind("@pretend", Value::Number(0));
        self.bind("@installer-version", Value::Number(config.installer_version));
        self.bind("@ioerr", Value::Number(0));
        self.bind("@log", Value::Number(0));
        self.bind("@yes", Value::Number(0));
        self.bind("@skip", Value::Number(0));
        self.bind("@abort", Value::Number(0));
        self.bind("@back", Value::Number(0));
        self.bind("@each-type", Value::Number(0));
        self.bind("@debug", Value::Number(0));
        self.bind("@strict", Value::Number(config.strict as i32));
        self.bind("@effect", Value::Number(0));
        self.bind("@color_1", Value::Number(0));
        self.bind("@color_2", Value::Number(0));

        // Misc string values.
        self.bind("@abort-button", Value::text(""));
        self.bind("@askoptions-help", Value::text(""));
        self.bind("@askchoice-help", Value::text(""));
        self.bind("@asknumber-help", Value::text(""));
        self.bind("@askstring-help", Value::text(""));
        self.bind("@askdisk-help", Value::text(""));
        self.bind("@askfile-help", Value::text(""));
        self.bind("@askdir-help", Value::text(""));
        self.bind("@copylib-help", Value::text(""));
        self.bind("@copyfiles-help", Value::text(""));
        self.bind("@makedir-help", Value::text(""));
        self.bind("@startup-help", Value::text(""));
        self.bind("@default-dest", Value::text(config.default_dest));
        self.bind("@error-msg", Value::text(""));
        self.bind("@execute-dir", Value::text(""));
        self.bind("@special-msg", Value::text(""));
        self.bind("@each-name", Value::text(""));
        self.bind("@user-startup", Value::text(config.user_startup));

        // The (optional ...) keywords double as predefined strings so
        // scripts can write them unquoted.
        for word in ["fail", "nofail", "oknodelete", "force", "askuser"] {
            self.bind(word, Value::text(word));
        }
        self.bind("@null", Value::text("NULL"));
    }

    // ------------------------------------------------------------------
    // reserved variable accessors
    // ------------------------------------------------------------------

    /// Read a numeric variable; 0 when unbound or not a number.
    pub fn get_numvar(&self, name: &str) -> i32 {
        match self.lookup(name) {
            Some(Value::Number(n)) => *n,
            _ => 0,
        }
    }

    /// Read a string variable; empty when unbound or not a string.
    pub fn get_strvar(&self, name: &str) -> String {
        match self.lookup(name) {
            Some(Value::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Update an existing numeric variable. Silently does nothing when
    /// the variable is missing or bound to a string; that robustness is
    /// intentional.
    pub fn set_numvar(&mut self, name: &str, value: i32) {
        if matches!(self.lookup(name), Some(Value::Number(_))) {
            self.bind(name, Value::Number(value));
        }
    }

    /// Update an existing string variable; same silent-failure contract
    /// as [`Evaluator::set_numvar`].
    pub fn set_strvar(&mut self, name: &str, value: impl Into<String>) {
        if matches!(self.lookup(name), Some(Value::Text(_))) {
            self.bind(name, Value::Text(value.into()));
        }
    }

    // ------------------------------------------------------------------
    // install log
    // ------------------------------------------------------------------

    /// Append a line to the install log, prefixed `[<line>:<op>]`, if
    /// `@log` is enabled. Returns false when the log file could not be
    /// written (which also raises).
    pub fn log(&mut self, node: NodeId, message: &str) -> bool {
        if self.get_numvar("@log") == 0 {
            return true;
        }
        let op_name = match self.tree().kind(node) {
            NodeKind::Native(op) => op.name(),
            _ => self.tree().name(node).unwrap_or(""),
        };
        let line = format!("[{}:{}] {}\n", self.tree().line(node), op_name, message);
        let log_file = self.get_strvar("@log-file");
        match self.host().append_file(&log_file, line.as_bytes()) {
            Ok(()) => true,
            Err(_) => {
                self.raise(node, ErrorCode::WriteFile, log_file);
                false
            }
        }
    }
}
