//! Host adapter: the narrow interface through which the evaluator touches
//! the outside world.
//!
//! On Amiga the implementation would use native `dos.library` and
//! `icon.library` calls; [`FsHost`] is the POSIX fallback. Amiga-only
//! surfaces (assigns, devices, volume relabel, resident/library/device
//! version probes, reboot) degrade to fixed values or an in-memory table,
//! so scripts that rely on them still terminate.

mod fs;
mod icon;
mod pattern;
mod version;

pub use fs::FsHost;
pub use icon::{IconKind, IconMeta, NO_POSITION};
pub use pattern::{Pattern, PatternError};
pub use version::{pack, scan_version, unpack};

use std::io;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    None,
    File,
    Dir,
}

impl PathKind {
    /// The numeric value `(exists)` reports: 0 / 1 / 2.
    pub fn as_num(self) -> i32 {
        match self {
            PathKind::None => 0,
            PathKind::File => 1,
            PathKind::Dir => 2,
        }
    }
}

/// Everything the evaluator needs from the operating system.
///
/// All paths are passed as strings: Installer scripts compute them with
/// string operators, and Amiga paths are not `std::path` material anyway.
pub trait Host {
    /// File / dir / nothing probe.
    fn exists(&mut self, path: &str) -> PathKind;

    /// Directory entry names, in listing order. No `.` / `..`.
    fn read_dir(&mut self, path: &str) -> io::Result<Vec<String>>;

    fn copy_file(&mut self, src: &str, dst: &str) -> io::Result<()>;
    fn remove_file(&mut self, path: &str) -> io::Result<()>;
    fn remove_dir(&mut self, path: &str) -> io::Result<()>;
    fn rename(&mut self, old: &str, new: &str) -> io::Result<()>;

    /// Create a single directory level; parents must exist.
    fn make_dir(&mut self, path: &str) -> io::Result<()>;

    /// Amiga protection mask (`hsparwed`, low four bits inverted).
    fn get_perm(&mut self, path: &str) -> io::Result<u32>;
    fn set_perm(&mut self, path: &str, mask: u32) -> io::Result<()>;

    /// `access(W_OK)` style probe used by the FORCE/ASKUSER matrix.
    fn is_writable(&mut self, path: &str) -> bool;
    /// Lift write protection so an overwrite or delete can succeed.
    fn make_writable(&mut self, path: &str) -> io::Result<()>;

    fn file_size(&mut self, path: &str) -> io::Result<u64>;
    /// Modification time in whole seconds since the epoch.
    fn mtime(&mut self, path: &str) -> io::Result<i64>;

    fn read_file(&mut self, path: &str) -> io::Result<Vec<u8>>;
    fn write_file(&mut self, path: &str, data: &[u8]) -> io::Result<()>;
    fn append_file(&mut self, path: &str, data: &[u8]) -> io::Result<()>;

    /// Scan a file for a `$VER:` tag; `Ok(None)` when the file has none.
    fn read_version_from_file(&mut self, path: &str) -> io::Result<Option<i32>> {
        let data = self.read_file(path)?;
        Ok(scan_version(&data))
    }

    /// Version of a resident module; `None` off-Amiga.
    fn read_resident(&mut self, _name: &str) -> Option<i32> {
        None
    }

    /// Version of an openable library; `None` off-Amiga.
    fn read_library(&mut self, _name: &str) -> Option<i32> {
        None
    }

    /// Version of an openable device; `None` off-Amiga.
    fn read_device(&mut self, _name: &str) -> Option<i32> {
        None
    }

    /// Free space in bytes on the volume holding `path`.
    fn get_disk_space(&mut self, path: &str) -> Option<i64>;

    /// Name of the device a path resides on.
    fn get_device(&mut self, path: &str) -> Option<String>;

    /// Resolve a logical name. `mask` selects assigns / volumes / devices
    /// with the letters `a`, `v`, `d`; empty means assigns only.
    fn get_assign(&mut self, name: &str, mask: &str) -> Option<String>;

    /// Create (`Some(target)`) or remove (`None`) a logical assign.
    fn make_assign(&mut self, name: &str, target: Option<&str>) -> bool;

    fn relabel_volume(&mut self, old: &str, new: &str) -> bool;

    fn icon_read(&mut self, path: &str) -> io::Result<IconMeta>;
    fn icon_write(&mut self, path: &str, meta: &IconMeta) -> io::Result<()>;
    fn icon_default(&mut self, kind: IconKind) -> IconMeta;

    /// Full path of a possibly relative one.
    fn expand_path(&mut self, path: &str) -> Option<String>;

    fn reboot(&mut self);

    /// Run a command line, returning its exit code.
    fn execute(&mut self, command: &str) -> io::Result<i32>;

    fn getenv(&mut self, name: &str) -> Option<String>;

    fn cpu_name(&mut self) -> String;
    fn os_name(&mut self) -> String;
    fn chip_mem(&mut self) -> i64;
    fn total_mem(&mut self) -> i64;
}
