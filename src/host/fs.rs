//! POSIX host implementation on top of `std::fs`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::time::UNIX_EPOCH;

use super::icon::{IconKind, IconMeta};
use super::{Host, PathKind};

/// Suffix appended to a file path to reach its icon sidecar.
const INFO_SUFFIX: &str = ".info";

// Amiga protection bits. The low four are stored inverted: a set bit
// means the operation is *denied*.
const P_WRITE: u32 = 1 << 2;
const P_DELETE: u32 = 1 << 0;

/// Host backed by the local file system.
///
/// Logical assigns have no POSIX counterpart, so they live in an
/// in-memory table: `(makeassign ...)` followed by `(getassign ...)`
/// behaves, while nothing leaks past the process.
#[derive(Debug, Default)]
pub struct FsHost {
    assigns: HashMap<String, String>,
}

impl FsHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for FsHost {
    fn exists(&mut self, path: &str) -> PathKind {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathKind::Dir,
            Ok(meta) if meta.is_file() => PathKind::File,
            _ => PathKind::None,
        }
    }

    fn read_dir(&mut self, path: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn copy_file(&mut self, src: &str, dst: &str) -> io::Result<()> {
        fs::copy(src, dst).map(|_| ())
    }

    fn remove_file(&mut self, path: &str) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&mut self, path: &str) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn rename(&mut self, old: &str, new: &str) -> io::Result<()> {
        fs::rename(old, new)
    }

    fn make_dir(&mut self, path: &str) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn get_perm(&mut self, path: &str) -> io::Result<u32> {
        let meta = fs::metadata(path)?;
        // Only the write/delete denial can be represented faithfully.
        let mut mask = 0;
        if meta.permissions().readonly() {
            mask |= P_WRITE | P_DELETE;
        }
        Ok(mask)
    }

    fn set_perm(&mut self, path: &str, mask: u32) -> io::Result<()> {
        let meta = fs::metadata(path)?;
        let mut perm = meta.permissions();
        perm.set_readonly(mask & (P_WRITE | P_DELETE) != 0);
        fs::set_permissions(path, perm)
    }

    fn is_writable(&mut self, path: &str) -> bool {
        match fs::metadata(path) {
            Ok(meta) => !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    fn make_writable(&mut self, path: &str) -> io::Result<()> {
        let meta = fs::metadata(path)?;
        let mut perm = meta.permissions();
        perm.set_readonly(false);
        fs::set_permissions(path, perm)
    }

    fn file_size(&mut self, path: &str) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn mtime(&mut self, path: &str) -> io::Result<i64> {
        let time = fs::metadata(path)?.modified()?;
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(secs)
    }

    fn read_file(&mut self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&mut self, path: &str, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    fn append_file(&mut self, path: &str, data: &[u8]) -> io::Result<()> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data)
    }

    fn get_disk_space(&mut self, _path: &str) -> Option<i64> {
        None
    }

    fn get_device(&mut self, _path: &str) -> Option<String> {
        None
    }

    fn get_assign(&mut self, name: &str, mask: &str) -> Option<String> {
        // Only the assign table exists here; volume and device lookups
        // have nothing to resolve against.
        if !mask.is_empty() && !mask.contains('a') {
            return None;
        }
        self.assigns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn make_assign(&mut self, name: &str, target: Option<&str>) -> bool {
        let key = self
            .assigns
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned();
        match (target, key) {
            (Some(t), Some(k)) => {
                self.assigns.insert(k, t.to_string());
                true
            }
            (Some(t), None) => {
                self.assigns.insert(name.to_string(), t.to_string());
                true
            }
            (None, Some(k)) => {
                self.assigns.remove(&k);
                true
            }
            (None, None) => false,
        }
    }

    fn relabel_volume(&mut self, _old: &str, _new: &str) -> bool {
        true
    }

    fn icon_read(&mut self, path: &str) -> io::Result<IconMeta> {
        let sidecar = info_path(path);
        let text = fs::read_to_string(&sidecar)?;
        Ok(IconMeta::from_sidecar(&text))
    }

    fn icon_write(&mut self, path: &str, meta: &IconMeta) -> io::Result<()> {
        let sidecar = info_path(path);
        fs::write(sidecar, meta.to_sidecar())
    }

    fn icon_default(&mut self, kind: IconKind) -> IconMeta {
        IconMeta::new(kind)
    }

    fn expand_path(&mut self, path: &str) -> Option<String> {
        fs::canonicalize(path)
            .ok()
            .map(|p| p.to_string_lossy().into_owned())
    }

    fn reboot(&mut self) {
        // Nothing sensible to do off-Amiga.
    }

    fn execute(&mut self, command: &str) -> io::Result<i32> {
        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()?;
        Ok(status.code().unwrap_or(-1))
    }

    fn getenv(&mut self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn cpu_name(&mut self) -> String {
        std::env::consts::ARCH.to_string()
    }

    fn os_name(&mut self) -> String {
        "Unknown".to_string()
    }

    fn chip_mem(&mut self) -> i64 {
        524288
    }

    fn total_mem(&mut self) -> i64 {
        524288
    }
}

/// Append the `.info` suffix unless the path already names a sidecar.
fn info_path(path: &str) -> String {
    if path.ends_with(INFO_SUFFIX) {
        path.to_string()
    } else {
        format!("{path}{INFO_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_table() {
        let mut host = FsHost::new();
        assert!(host.make_assign("MYA", Some("Work:Tools")));
        assert_eq!(host.get_assign("mya", "a"), Some("Work:Tools".into()));
        assert_eq!(host.get_assign("mya", ""), Some("Work:Tools".into()));
        assert_eq!(host.get_assign("mya", "v"), None);
        assert!(host.make_assign("MYA", None));
        assert!(!host.make_assign("MYA", None));
        assert_eq!(host.get_assign("MYA", ""), None);
    }

    #[test]
    fn test_exists_and_file_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut host = FsHost::new();
        let file = dir.path().join("a.txt").to_string_lossy().into_owned();
        assert_eq!(host.exists(&file), PathKind::None);
        host.write_file(&file, b"hello").expect("write");
        assert_eq!(host.exists(&file), PathKind::File);
        assert_eq!(host.file_size(&file).expect("size"), 5);
        host.append_file(&file, b" world").expect("append");
        assert_eq!(host.read_file(&file).expect("read"), b"hello world");
    }

    #[test]
    fn test_icon_sidecar_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut host = FsHost::new();
        let path = dir.path().join("Tool").to_string_lossy().into_owned();
        let mut meta = host.icon_default(IconKind::Tool);
        meta.set_tooltype("DONOTWAIT", "");
        host.icon_write(&path, &meta).expect("icon write");
        let back = host.icon_read(&path).expect("icon read");
        assert_eq!(back, meta);
    }
}
