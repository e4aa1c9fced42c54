//! Dialog backend: the typed prompt interface between the evaluator and
//! whatever renders to the user.
//!
//! The evaluator treats every call as a potentially long blocking wait.
//! Each entry point can come back with *abort*, which the caller turns
//! into a HALT at the call site. [`AutoDialog`] is the headless
//! implementation: it proceeds everywhere and hands back defaults, which
//! is what unattended runs and the test suite want.

/// Result of a prompt that produces a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<T> {
    Answer(T),
    Abort,
}

/// Result of `(message ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageChoice {
    Proceed,
    Back,
    Abort,
}

/// Result of a confirmation requester: proceed / skip / abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Proceed,
    Skip,
    Abort,
}

/// Flags for the file / directory requesters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathFlags {
    pub new_path: bool,
    pub disk: bool,
    pub assigns: bool,
}

/// Mode settings negotiated by the welcome dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WelcomeSettings {
    pub level: i32,
    pub log: i32,
    pub pretend: i32,
}

/// Bounds the welcome dialog must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WelcomeLimits {
    pub user_min: i32,
    pub no_pretend: bool,
    pub no_log: bool,
}

/// One row of the copy plan shown by `copyfiles_begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyItem {
    pub dir: bool,
    pub source: String,
    pub dest: String,
}

/// Answer to `copyfiles_begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStart {
    Go,
    Skip,
    Abort,
}

/// The dialog surface the evaluator calls into.
pub trait Dialog {
    fn ask_bool(&mut self, prompt: &str, help: &str, yes: &str, no: &str) -> Response<bool>;

    fn ask_choice(
        &mut self,
        prompt: &str,
        help: &str,
        choices: &[String],
        default: i32,
    ) -> Response<i32>;

    fn ask_options(
        &mut self,
        prompt: &str,
        help: &str,
        choices: &[String],
        default: i32,
    ) -> Response<i32>;

    fn ask_number(&mut self, prompt: &str, help: &str, min: i32, max: i32, default: i32)
    -> Response<i32>;

    fn ask_string(&mut self, prompt: &str, help: &str, default: &str) -> Response<String>;

    fn ask_file(
        &mut self,
        prompt: &str,
        help: &str,
        flags: PathFlags,
        default: &str,
    ) -> Response<String>;

    fn ask_dir(
        &mut self,
        prompt: &str,
        help: &str,
        flags: PathFlags,
        default: &str,
    ) -> Response<String>;

    fn message(&mut self, text: &str, back_allowed: bool) -> MessageChoice;

    /// Confirmation requester used by the gating logic of the file
    /// operators (proceed / skip / abort).
    fn confirm(&mut self, message: &str, help: &str) -> Confirm;

    fn welcome(&mut self, text: &str, settings: &mut WelcomeSettings, limits: WelcomeLimits)
    -> Response<()>;

    fn working(&mut self, text: &str);

    fn complete(&mut self, percent: i32);

    fn copyfiles_begin(&mut self, items: &[CopyItem], confirm: bool) -> CopyStart;

    /// Update the gauge for the file about to be copied. Returning false
    /// aborts the copy.
    fn copyfiles_progress(&mut self, path: &str, nogauge: bool) -> bool;

    fn copyfiles_end(&mut self);
}

/// Headless dialog: proceeds everywhere, returns defaults.
#[derive(Debug, Default)]
pub struct AutoDialog;

impl AutoDialog {
    pub fn new() -> Self {
        Self
    }
}

impl Dialog for AutoDialog {
    fn ask_bool(&mut self, _prompt: &str, _help: &str, _yes: &str, _no: &str) -> Response<bool> {
        Response::Answer(true)
    }

    fn ask_choice(
        &mut self,
        _prompt: &str,
        _help: &str,
        _choices: &[String],
        default: i32,
    ) -> Response<i32> {
        Response::Answer(default)
    }

    fn ask_options(
        &mut self,
        _prompt: &str,
        _help: &str,
        _choices: &[String],
        default: i32,
    ) -> Response<i32> {
        Response::Answer(default)
    }

    fn ask_number(
        &mut self,
        _prompt: &str,
        _help: &str,
        _min: i32,
        _max: i32,
        default: i32,
    ) -> Response<i32> {
        Response::Answer(default)
    }

    fn ask_string(&mut self, _prompt: &str, _help: &str, default: &str) -> Response<String> {
        Response::Answer(default.to_string())
    }

    fn ask_file(
        &mut self,
        _prompt: &str,
        _help: &str,
        _flags: PathFlags,
        default: &str,
    ) -> Response<String> {
        Response::Answer(default.to_string())
    }

    fn ask_dir(
        &mut self,
        _prompt: &str,
        _help: &str,
        _flags: PathFlags,
        default: &str,
    ) -> Response<String> {
        Response::Answer(default.to_string())
    }

    fn message(&mut self, _text: &str, _back_allowed: bool) -> MessageChoice {
        MessageChoice::Proceed
    }

    fn confirm(&mut self, _message: &str, _help: &str) -> Confirm {
        Confirm::Proceed
    }

    fn welcome(
        &mut self,
        _text: &str,
        _settings: &mut WelcomeSettings,
        _limits: WelcomeLimits,
    ) -> Response<()> {
        Response::Answer(())
    }

    fn working(&mut self, _text: &str) {}

    fn complete(&mut self, _percent: i32) {}

    fn copyfiles_begin(&mut self, _items: &[CopyItem], _confirm: bool) -> CopyStart {
        CopyStart::Go
    }

    fn copyfiles_progress(&mut self, _path: &str, _nogauge: bool) -> bool {
        true
    }

    fn copyfiles_end(&mut self) {}
}
