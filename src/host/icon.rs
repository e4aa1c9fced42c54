//! Icon metadata: the mutable parts of a Workbench `.info` file.
//!
//! The interpreter only ever touches four aspects of an icon: the default
//! tool, the stack size, the position, and the tooltype list. On Amiga
//! these live in a binary `DiskObject`; the POSIX host persists them as a
//! small line-based sidecar so `(tooltype)` and `(iconinfo)` still round
//! trip.

/// Which default icon to fabricate when none exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Drawer,
    Project,
    Tool,
}

/// Sentinel meaning "no position stored"; matches `NO_ICON_POSITION`.
pub const NO_POSITION: i32 = i32::MIN;

/// The mutable metadata of one icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconMeta {
    pub default_tool: Option<String>,
    pub stack: i32,
    /// Current position, or `None` when the icon floats freely.
    pub position: Option<(i32, i32)>,
    /// Tooltype entries, each `KEY`, `KEY=` or `KEY=VALUE`.
    pub tooltypes: Vec<String>,
}

impl IconMeta {
    pub fn new(kind: IconKind) -> Self {
        IconMeta {
            default_tool: match kind {
                IconKind::Project => Some(String::new()),
                _ => None,
            },
            stack: 4096,
            position: None,
            tooltypes: Vec::new(),
        }
    }

    /// Find the value of a tooltype by key, case-insensitively.
    ///
    /// A naked `KEY` entry yields `Some("")`, like `FindToolType`.
    pub fn find_tooltype(&self, key: &str) -> Option<&str> {
        self.tooltypes.iter().find_map(|entry| {
            let (k, v) = split_tooltype(entry);
            k.eq_ignore_ascii_case(key).then_some(v)
        })
    }

    /// Set or replace a tooltype. An empty value keeps the bare key
    /// without an assignment, per `(settooltype KEY "")`.
    pub fn set_tooltype(&mut self, key: &str, value: &str) {
        let entry = if value.is_empty() {
            key.to_string()
        } else {
            format!("{key}={value}")
        };
        for slot in &mut self.tooltypes {
            if split_tooltype(slot).0.eq_ignore_ascii_case(key) {
                *slot = entry;
                return;
            }
        }
        self.tooltypes.push(entry);
    }

    /// Remove a tooltype by key. Missing keys are not an error.
    pub fn delete_tooltype(&mut self, key: &str) {
        self.tooltypes
            .retain(|entry| !split_tooltype(entry).0.eq_ignore_ascii_case(key));
    }

    /// Serialize to the sidecar text format.
    pub fn to_sidecar(&self) -> String {
        let mut out = String::new();
        if let Some(tool) = &self.default_tool {
            out.push_str("defaulttool ");
            out.push_str(tool);
            out.push('\n');
        }
        out.push_str(&format!("stack {}\n", self.stack));
        if let Some((x, y)) = self.position {
            out.push_str(&format!("position {x} {y}\n"));
        }
        for tt in &self.tooltypes {
            out.push_str("tooltype ");
            out.push_str(tt);
            out.push('\n');
        }
        out
    }

    /// Parse the sidecar text format. Unknown lines are ignored.
    pub fn from_sidecar(text: &str) -> Self {
        let mut meta = IconMeta {
            default_tool: None,
            stack: 4096,
            position: None,
            tooltypes: Vec::new(),
        };
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("defaulttool ") {
                meta.default_tool = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("stack ") {
                meta.stack = rest.trim().parse().unwrap_or(4096);
            } else if let Some(rest) = line.strip_prefix("position ") {
                let mut it = rest.split_whitespace();
                if let (Some(x), Some(y)) = (it.next(), it.next()) {
                    if let (Ok(x), Ok(y)) = (x.parse(), y.parse()) {
                        meta.position = Some((x, y));
                    }
                }
            } else if let Some(rest) = line.strip_prefix("tooltype ") {
                meta.tooltypes.push(rest.to_string());
            }
        }
        meta
    }
}

fn split_tooltype(entry: &str) -> (&str, &str) {
    match entry.split_once('=') {
        Some((k, v)) => (k, v),
        None => (entry, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooltype_set_and_find() {
        let mut icon = IconMeta::new(IconKind::Tool);
        icon.set_tooltype("DONOTWAIT", "");
        icon.set_tooltype("CX_PRIORITY", "5");
        assert_eq!(icon.find_tooltype("donotwait"), Some(""));
        assert_eq!(icon.find_tooltype("CX_PRIORITY"), Some("5"));
        icon.set_tooltype("cx_priority", "9");
        assert_eq!(icon.find_tooltype("CX_PRIORITY"), Some("9"));
        assert_eq!(icon.tooltypes.len(), 2);
    }

    #[test]
    fn test_tooltype_delete() {
        let mut icon = IconMeta::new(IconKind::Tool);
        icon.set_tooltype("A", "1");
        icon.set_tooltype("B", "2");
        icon.delete_tooltype("a");
        assert_eq!(icon.find_tooltype("A"), None);
        assert_eq!(icon.find_tooltype("B"), Some("2"));
    }

    #[test]
    fn test_sidecar_round_trip() {
        let mut icon = IconMeta::new(IconKind::Project);
        icon.default_tool = Some("SYS:Utilities/MultiView".into());
        icon.stack = 8192;
        icon.position = Some((120, 40));
        icon.set_tooltype("FILETYPE", "text");
        let back = IconMeta::from_sidecar(&icon.to_sidecar());
        assert_eq!(back, icon);
    }
}
