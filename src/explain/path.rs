//! Why a pathname could not be resolved.
//!
//! The path is walked again now, one directory at a time, looking for the
//! first component that explains the error. The file system may have
//! changed since the call failed; when nothing fits, callers fall back to
//! the generic cause.

use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::buffer::BoundedBuffer;
use crate::host::{self, FileKind};

const NAME_MAX: usize = 255;
const PATH_MAX: usize = 4096;

pub const READ: u32 = 4;
pub const WRITE: u32 = 2;
pub const EXEC: u32 = 1;

/// What a call needs from the file its pathname names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lookup {
    /// Permission bits the call needs on the file itself.
    pub access: u32,
    /// The call makes or removes the final name, so the parent must be
    /// writable.
    pub modifies_parent: bool,
    /// The final component must be a directory.
    pub want_dir: bool,
    /// A symbolic link in the final position is not followed.
    pub no_follow: bool,
}

/// Directories the walk passes through before the final component.
fn directories(path: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = path
        .ancestors()
        .skip(1)
        .map(|p| if p.as_os_str().is_empty() { PathBuf::from(".") } else { p.to_path_buf() })
        .collect();
    dirs.reverse();
    dirs.dedup();
    dirs
}

fn final_meta(path: &Path, lookup: &Lookup) -> std::io::Result<Metadata> {
    if lookup.no_follow { fs::symlink_metadata(path) } else { fs::metadata(path) }
}

fn quoted(buf: &mut BoundedBuffer, path: &Path) {
    buf.put_quoted(path.as_os_str().as_bytes());
}

fn permission_words(bits: u32, is_dir: bool) -> &'static str {
    match (bits & READ != 0, bits & WRITE != 0, bits & EXEC != 0) {
        (true, true, true) => "read, write and execute",
        (true, true, false) => "read and write",
        (true, false, true) if is_dir => "read and search",
        (true, false, true) => "read and execute",
        (false, true, true) if is_dir => "write and search",
        (false, true, true) => "write and execute",
        (true, false, false) => "read",
        (false, true, false) => "write",
        (false, false, true) if is_dir => "search",
        _ => "execute",
    }
}

pub fn explain_enoent(buf: &mut BoundedBuffer, path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        buf.puts("the pathname argument is the empty string");
        return true;
    }
    for dir in directories(path) {
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return false,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if fs::symlink_metadata(&dir).is_ok() {
                    buf.puts("the ");
                    quoted(buf, &dir);
                    buf.puts(" component of the pathname is a symbolic link to a file that does not exist");
                } else {
                    buf.puts("the ");
                    quoted(buf, &dir);
                    buf.puts(" directory does not exist");
                }
                return true;
            }
            Err(_) => break,
        }
    }
    if fs::symlink_metadata(path).is_ok() && fs::metadata(path).is_err() {
        buf.puts("the named file is a symbolic link to a file that does not exist");
        return true;
    }
    buf.puts("the named file does not exist");
    true
}

pub fn explain_enotdir(buf: &mut BoundedBuffer, path: &Path, lookup: &Lookup) -> bool {
    for dir in directories(path) {
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(meta) => {
                buf.puts("the ");
                quoted(buf, &dir);
                buf.puts(" component of the pathname is a ");
                buf.puts(FileKind::of(&meta).describe());
                buf.puts(", not a directory");
                return true;
            }
            Err(_) => return false,
        }
    }
    if lookup.want_dir {
        if let Ok(meta) = final_meta(path, lookup) {
            if !meta.is_dir() {
                buf.puts("the named file is a ");
                buf.puts(FileKind::of(&meta).describe());
                buf.puts(", not a directory");
                return true;
            }
        }
    }
    false
}

pub fn explain_eacces(buf: &mut BoundedBuffer, path: &Path, lookup: &Lookup) -> bool {
    let dirs = directories(path);
    for dir in &dirs {
        let Ok(meta) = fs::metadata(dir) else {
            return false;
        };
        if meta.is_dir() && !host::permits(&meta, EXEC) {
            buf.puts("the process does not have search permission to the ");
            quoted(buf, dir);
            buf.puts(" directory");
            return true;
        }
    }
    if lookup.modifies_parent {
        if let Some(parent) = dirs.last() {
            if let Ok(meta) = fs::metadata(parent) {
                if !host::permits(&meta, WRITE) {
                    buf.puts("the process does not have write permission to the ");
                    quoted(buf, parent);
                    buf.puts(" directory");
                    return true;
                }
            }
        }
    }
    if lookup.access != 0 {
        if let Ok(meta) = final_meta(path, lookup) {
            if !host::permits(&meta, lookup.access) {
                buf.puts("the process does not have ");
                buf.puts(permission_words(lookup.access, meta.is_dir()));
                buf.puts(" permission to the named ");
                buf.puts(if meta.is_dir() { "directory" } else { "file" });
                return true;
            }
        }
    }
    false
}

pub fn explain_enametoolong(buf: &mut BoundedBuffer, path: &Path) -> bool {
    let len = path.as_os_str().len();
    if len >= PATH_MAX {
        buf.puts("the pathname is ");
        buf.put_uint(len as u64);
        buf.puts(" bytes long, longer than the PATH_MAX limit of ");
        buf.put_uint(PATH_MAX as u64);
        return true;
    }
    let Some(long) = path.components().find(|c| c.as_os_str().len() > NAME_MAX) else {
        return false;
    };
    buf.puts("a component of the pathname is ");
    buf.put_uint(long.as_os_str().len() as u64);
    buf.puts(" bytes long, longer than the NAME_MAX limit of ");
    buf.put_uint(NAME_MAX as u64);
    true
}

pub fn explain_eloop(buf: &mut BoundedBuffer, path: &Path, lookup: &Lookup) -> bool {
    if lookup.no_follow {
        if let Ok(meta) = fs::symlink_metadata(path) {
            if meta.file_type().is_symlink() {
                buf.puts("the named file is a symbolic link and O_NOFOLLOW was specified");
                return true;
            }
        }
    }
    buf.puts("too many symbolic links were encountered while resolving the pathname");
    true
}

pub fn explain_erofs(buf: &mut BoundedBuffer, path: &Path) -> bool {
    let probe = if fs::symlink_metadata(path).is_ok() {
        path.to_path_buf()
    } else {
        directories(path).pop().unwrap_or_else(|| PathBuf::from("."))
    };
    buf.puts("the named file is on a read-only file system");
    if !host::is_read_only_mount(&probe) {
        buf.puts(", although it is not mounted read-only now");
    }
    true
}

/// The pathname-related causes every call shares.
pub fn explain(buf: &mut BoundedBuffer, errnum: i32, path: &Path, lookup: &Lookup) -> bool {
    match errnum {
        libc::ENOENT => explain_enoent(buf, path),
        libc::ENOTDIR => explain_enotdir(buf, path, lookup),
        libc::EACCES => explain_eacces(buf, path, lookup),
        libc::ENAMETOOLONG => explain_enametoolong(buf, path),
        libc::ELOOP => explain_eloop(buf, path, lookup),
        libc::EROFS => explain_erofs(buf, path),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn render(f: impl FnOnce(&mut BoundedBuffer) -> bool) -> (bool, String) {
        let mut storage = [0u8; 512];
        let mut buf = BoundedBuffer::new(&mut storage);
        let hit = f(&mut buf);
        (hit, buf.as_str().to_string())
    }

    #[test]
    fn test_missing_final_component() {
        let (hit, text) = render(|b| explain_enoent(b, Path::new("/nonexistent")));
        assert!(hit);
        assert_eq!(text, "the named file does not exist");
    }

    #[test]
    fn test_missing_directory_component() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let path = missing.join("file");
        let (_, text) = render(|b| explain_enoent(b, &path));
        assert_eq!(text, format!("the \"{}\" directory does not exist", missing.display()));
    }

    #[test]
    fn test_file_used_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"").unwrap();
        let (hit, text) = render(|b| explain_enotdir(b, &file.join("x"), &Lookup::default()));
        assert!(hit);
        assert!(text.ends_with("component of the pathname is a regular file, not a directory"));
    }

    #[test]
    fn test_want_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"").unwrap();
        let lookup = Lookup { want_dir: true, ..Lookup::default() };
        let (_, text) = render(|b| explain_enotdir(b, &file, &lookup));
        assert_eq!(text, "the named file is a regular file, not a directory");
    }

    #[test]
    fn test_unreadable_file() {
        if host::has_capability(host::Capability::DacOverride) {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secret");
        std::fs::write(&file, b"").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o200)).unwrap();
        let lookup = Lookup { access: READ, ..Lookup::default() };
        let (hit, text) = render(|b| explain_eacces(b, &file, &lookup));
        assert!(hit);
        assert_eq!(text, "the process does not have read permission to the named file");
    }

    #[test]
    fn test_name_too_long() {
        let long = "a".repeat(300);
        let (hit, text) = render(|b| explain_enametoolong(b, Path::new(&long)));
        assert!(hit);
        assert!(text.contains("NAME_MAX limit of 255"));
    }

    #[test]
    fn test_relative_walk_starts_at_cwd() {
        assert_eq!(directories(Path::new("a/b")), vec![PathBuf::from("."), PathBuf::from("a")]);
        assert_eq!(directories(Path::new("/x")), vec![PathBuf::from("/")]);
    }
}
