//! String and path operators.

use crate::ast::NodeId;
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};
use crate::host::Pattern;
use crate::ops::concat_args;

/// `(cat s1 s2 ...)`: concatenation.
pub(crate) fn cat(ev: &mut Evaluator, n: NodeId) -> Value {
    Value::text(concat_args(ev, n))
}

/// `(fmt "format" args...)`: C-style formatting with `%s`, `%d`,
/// `%ld`, `%x`, `%c` and `%%`.
pub(crate) fn fmt(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(fmt_node) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let spec = ev.text(fmt_node);

    let mut out = String::with_capacity(spec.len());
    let mut next_arg = 2;
    let mut chars = spec.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        // Swallow an optional 'l' length modifier.
        let mut conv = chars.next();
        if conv == Some('l') {
            conv = chars.next();
        }
        match conv {
            Some('%') => out.push('%'),
            Some('s') => {
                let text = ev
                    .tree()
                    .arg(n, next_arg)
                    .map(|a| ev.text(a))
                    .unwrap_or_default();
                out.push_str(&text);
                next_arg += 1;
            }
            Some('d') => {
                let v = ev.tree().arg(n, next_arg).map_or(0, |a| ev.num(a));
                out.push_str(&v.to_string());
                next_arg += 1;
            }
            Some('x') | Some('X') => {
                let v = ev.tree().arg(n, next_arg).map_or(0, |a| ev.num(a));
                out.push_str(&format!("{v:x}"));
                next_arg += 1;
            }
            Some('c') => {
                let v = ev.tree().arg(n, next_arg).map_or(0, |a| ev.num(a));
                if let Some(c) = char::from_u32(v as u32) {
                    out.push(c);
                }
                next_arg += 1;
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    Value::text(out)
}

/// `(strlen s)`
pub(crate) fn strlen(ev: &mut Evaluator, n: NodeId) -> Value {
    let len = ev
        .tree()
        .arg(n, 1)
        .map_or(0, |a| ev.text(a).chars().count() as i32);
    Value::Number(len)
}

/// `(substr s start [len])`: zero-based start; clamped at both ends.
pub(crate) fn substr(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(s_node) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let s = ev.text(s_node);
    let chars: Vec<char> = s.chars().collect();

    let start = ev.tree().arg(n, 2).map_or(0, |a| ev.num(a)).max(0) as usize;
    if start >= chars.len() {
        return Value::text("");
    }
    let len = match ev.tree().arg(n, 3) {
        Some(a) => ev.num(a).max(0) as usize,
        None => chars.len() - start,
    };
    let end = (start + len).min(chars.len());
    Value::text(chars[start..end].iter().collect::<String>())
}

/// `(tackon path file)`: Amiga path join.
pub(crate) fn tackon(ev: &mut Evaluator, n: NodeId) -> Value {
    let path = ev.tree().arg(n, 1).map(|a| ev.text(a)).unwrap_or_default();
    let file = ev.tree().arg(n, 2).map(|a| ev.text(a)).unwrap_or_default();
    Value::text(h_tackon(&path, &file))
}

/// `(pathonly p)`: the directory part of a path.
pub(crate) fn pathonly(ev: &mut Evaluator, n: NodeId) -> Value {
    let path = ev.tree().arg(n, 1).map(|a| ev.text(a)).unwrap_or_default();
    Value::text(h_pathonly(&path))
}

/// `(fileonly p)`: the file part of a path. Paths that end in a
/// separator are not files and raise.
pub(crate) fn fileonly(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let path = ev.text(arg);
    match h_fileonly(&path) {
        Some(file) => Value::text(file),
        None => {
            ev.raise(n, ErrorCode::NotAFile, path);
            Value::text("")
        }
    }
}

/// `(expandpath p)`: full path of a possibly relative one.
pub(crate) fn expandpath(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let path = ev.text(arg);
    match ev.host().expand_path(&path) {
        Some(full) => Value::text(full),
        None => Value::text(""),
    }
}

/// `(patmatch pattern string)`: 1 when the Amiga pattern matches.
pub(crate) fn patmatch(ev: &mut Evaluator, n: NodeId) -> Value {
    let pat = ev.tree().arg(n, 1).map(|a| ev.text(a)).unwrap_or_default();
    let input = ev.tree().arg(n, 2).map(|a| ev.text(a)).unwrap_or_default();
    match Pattern::compile(&pat) {
        Ok(p) => Value::Number(p.matches(&input) as i32),
        Err(_) => {
            ev.raise(n, ErrorCode::Overflow, pat);
            Value::Number(0)
        }
    }
}

// ============================================================================
// PATH HELPERS (shared with the file operators)
// ============================================================================

/// Join an Amiga path and a trailing component. A path ending in `:` or
/// `/` takes the component directly; otherwise a `/` goes between.
pub(crate) fn h_tackon(path: &str, file: &str) -> String {
    if path.is_empty() {
        return file.to_string();
    }
    if file.is_empty() {
        return path.to_string();
    }
    if path.ends_with(':') || path.ends_with('/') {
        format!("{path}{file}")
    } else {
        format!("{path}/{file}")
    }
}

/// File part of a path: everything after the last separator. `None`
/// when the path is empty or names a directory / volume.
pub(crate) fn h_fileonly(path: &str) -> Option<&str> {
    if path.is_empty() || path.ends_with('/') || path.ends_with(':') {
        return None;
    }
    let cut = path.rfind(['/', ':']).map_or(0, |i| i + 1);
    Some(&path[cut..])
}

/// Directory part of a path: up to the last `/` (exclusive) or `:`
/// (inclusive).
pub(crate) fn h_pathonly(path: &str) -> String {
    match path.rfind(['/', ':']) {
        Some(i) if path.as_bytes()[i] == b':' => path[..=i].to_string(),
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sys:utils", "more", "sys:utils/more")]
    #[case("sys:", "more", "sys:more")]
    #[case("dir/", "file", "dir/file")]
    #[case("", "file", "file")]
    #[case("dir", "", "dir")]
    fn test_tackon(#[case] path: &str, #[case] file: &str, #[case] expected: &str) {
        assert_eq!(h_tackon(path, file), expected);
    }

    #[rstest]
    #[case("sys:dir/file", Some("file"))]
    #[case("sys:file", Some("file"))]
    #[case("file", Some("file"))]
    #[case("sys:dir/", None)]
    #[case("sys:", None)]
    #[case("", None)]
    fn test_fileonly(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(h_fileonly(path), expected);
    }

    #[rstest]
    #[case("sys:dir/file", "sys:dir")]
    #[case("sys:file", "sys:")]
    #[case("a/b/c", "a/b")]
    #[case("file", "")]
    fn test_pathonly(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(h_pathonly(path), expected);
    }
}
