//! Environment probing operators.

use crate::ast::{NodeId, OptTag};
use crate::error::ErrorCode;
use crate::eval::{Evaluator, Value};
use crate::ops::get_opt;

/// `(exists path [(noreq)])`: 0 none, 1 file, 2 dir. `(noreq)` only
/// suppresses the insert-volume requester, which this host never shows.
pub(crate) fn exists(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let path = ev.text(arg);
    let kind = ev.host().exists(&path);
    Value::Number(kind.as_num())
}

/// `(getsize file)`
pub(crate) fn getsize(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let path = ev.text(arg);
    match ev.host().file_size(&path) {
        Ok(size) => Value::Number(size as i32),
        Err(_) => {
            ev.raise(n, ErrorCode::ReadFile, path);
            Value::Number(0)
        }
    }
}

/// `(getsum file)`: Adler-32 checksum, for comparison purposes.
pub(crate) fn getsum(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::Number(0);
    };
    let path = ev.text(arg);
    match ev.host().read_file(&path) {
        Ok(data) => {
            let mut alfa: u32 = 1;
            let mut beta: u32 = 0;
            for byte in data {
                alfa = (alfa + byte as u32) % 65521;
                beta = (alfa + beta) % 65521;
            }
            Value::Number(((beta << 16) | alfa) as i32)
        }
        Err(_) => {
            ev.raise(n, ErrorCode::ReadFile, path);
            Value::Number(0)
        }
    }
}

/// `(getassign name [opts])`: resolve a logical name. The option
/// string selects volumes (`v`), assigns (`a`), devices (`d`).
pub(crate) fn getassign(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let name = ev.text(arg);
    if name.is_empty() {
        return Value::text("");
    }
    let mask = match ev.tree().arg(n, 2) {
        Some(opt) => {
            let mask = ev.text(opt);
            if mask.is_empty() {
                // The CBM installer fails on an empty option string.
                return Value::text("");
            }
            mask
        }
        None => String::new(),
    };
    match ev.host().get_assign(&name, &mask) {
        Some(path) => Value::text(path),
        None => Value::text(""),
    }
}

/// `(getdevice path)`: name of the device a path resides on.
pub(crate) fn getdevice(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let path = ev.text(arg);
    match ev.host().get_device(&path) {
        Some(device) => Value::text(device),
        None => Value::text(""),
    }
}

/// `(getdiskspace path [unit])`: free space; `K`, `M`, `G` select the
/// unit. Unknown volumes report -1.
pub(crate) fn getdiskspace(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::Number(-1);
    };
    let path = ev.text(arg);
    let Some(mut free) = ev.host().get_disk_space(&path) else {
        return Value::Number(-1);
    };
    if let Some(unit) = ev.tree().arg(n, 2) {
        let unit = ev.text(unit);
        match unit.chars().next() {
            Some('K') | Some('k') => free >>= 10,
            Some('M') | Some('m') => free >>= 20,
            Some('G') | Some('g') => free >>= 30,
            _ => {}
        }
    }
    Value::Number(free.min(i32::MAX as i64) as i32)
}

/// `(getenv name)`
pub(crate) fn getenv(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::text("");
    };
    let name = ev.text(arg);
    match ev.host().getenv(&name) {
        Some(value) => Value::text(value),
        None => Value::text(""),
    }
}

/// `(getversion [name] [(resident)])`: probe resident module, `$VER:`
/// file tag, library, then device; 0 when everything fails.
pub(crate) fn getversion(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        // Without arguments this reports the running Exec version on
        // Amiga, which has no counterpart here.
        return Value::Number(0);
    };
    let name = ev.text(arg);

    let mut version = None;
    if get_opt(ev, n, OptTag::Resident).is_some() {
        version = ev.host().read_resident(&name);
    }
    if version.is_none() {
        version = ev.host().read_version_from_file(&name).ok().flatten();
    }
    if version.is_none() {
        let prefixed = format!("LIBS:{name}");
        version = ev.host().read_version_from_file(&prefixed).ok().flatten();
    }
    if version.is_none() {
        version = ev.host().read_library(&name);
    }
    if version.is_none() {
        version = ev.host().read_device(&name);
    }
    Value::Number(version.unwrap_or(0))
}

/// `(database feature [checkvalue])`: host information. With a check
/// value the result is `"1"` / `"0"` instead of the value itself.
pub(crate) fn database(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(arg) = ev.tree().arg(n, 1) else {
        return Value::text("Unknown");
    };
    let feature = ev.text(arg);
    let value = match feature.as_str() {
        "cpu" => ev.host().cpu_name(),
        "os" => ev.host().os_name(),
        "graphics-mem" => ev.host().chip_mem().to_string(),
        "total-mem" => ev.host().total_mem().to_string(),
        _ => "Unknown".to_string(),
    };

    match ev.tree().arg(n, 2) {
        Some(check) => {
            let expected = ev.text(check);
            Value::text(if value == expected { "1" } else { "0" })
        }
        None => Value::text(value),
    }
}

/// `(earlier file1 file2)`: 1 when file1 is older than file2.
pub(crate) fn earlier(ev: &mut Evaluator, n: NodeId) -> Value {
    let (Some(a), Some(b)) = (ev.tree().arg(n, 1), ev.tree().arg(n, 2)) else {
        return Value::Number(0);
    };
    let first = ev.text(a);
    let second = ev.text(b);

    let old = match ev.host().mtime(&first) {
        Ok(t) => t,
        Err(_) => {
            ev.raise(n, ErrorCode::Read, first);
            return Value::Number(0);
        }
    };
    let new = match ev.host().mtime(&second) {
        Ok(t) => t,
        Err(_) => {
            ev.raise(n, ErrorCode::Read, second);
            return Value::Number(0);
        }
    };
    Value::Number((old < new) as i32)
}

/// `(iconinfo (dest ...) (gettooltype KEY VAR) (getdefaulttool VAR)
/// (getstack VAR) (getposition VARX VARY))`: populate variables from
/// an icon's metadata.
pub(crate) fn iconinfo(ev: &mut Evaluator, n: NodeId) -> Value {
    let Some(dest) = get_opt(ev, n, OptTag::Dest) else {
        ev.raise(n, ErrorCode::MissingOption, "dest");
        return Value::Number(0);
    };
    let file = ev.resolve(dest).as_text();
    let meta = match ev.host().icon_read(&file) {
        Ok(meta) => meta,
        Err(_) => {
            ev.raise(n, ErrorCode::ReadFile, file);
            return Value::Number(0);
        }
    };

    if let Some(opt) = get_opt(ev, n, OptTag::GetToolType) {
        // Children come in (key, variable) pairs.
        let count = ev.tree().children(opt).len();
        let mut i = 0;
        while i + 1 < count {
            let key_node = ev.tree().children(opt)[i];
            let var_node = ev.tree().children(opt)[i + 1];
            i += 2;
            let key = ev.text(key_node);
            let var = ev.text(var_node);
            if var.is_empty() {
                continue;
            }
            let value = meta.find_tooltype(&key).unwrap_or("").to_string();
            ev.bind(&var, Value::Text(value));
        }
    }

    if let Some(opt) = get_opt(ev, n, OptTag::GetDefaultTool) {
        let tool = meta.default_tool.clone().unwrap_or_default();
        for i in 0..ev.tree().children(opt).len() {
            let var_node = ev.tree().children(opt)[i];
            let var = ev.text(var_node);
            if !var.is_empty() {
                ev.bind(&var, Value::text(tool.clone()));
            }
        }
    }

    if let Some(opt) = get_opt(ev, n, OptTag::GetStack) {
        let stack = meta.stack.to_string();
        for i in 0..ev.tree().children(opt).len() {
            let var_node = ev.tree().children(opt)[i];
            let var = ev.text(var_node);
            if !var.is_empty() {
                ev.bind(&var, Value::text(stack.clone()));
            }
        }
    }

    if let Some(opt) = get_opt(ev, n, OptTag::GetPosition) {
        let (x, y) = meta.position.unwrap_or((0, 0));
        for (i, value) in [x, y].into_iter().enumerate() {
            if let Some(var_node) = ev.tree().children(opt).get(i).copied() {
                let var = ev.text(var_node);
                if !var.is_empty() {
                    ev.bind(&var, Value::text(value.to_string()));
                }
            }
        }
    }

    Value::Number(1)
}
