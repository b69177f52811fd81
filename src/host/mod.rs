//! Read-only queries against the state of this process and its host.
//!
//! Explanations look at the world as it is *now*, which may differ from
//! when the call failed. Every query here is cheap and side-effect free,
//! and reports "don't know" rather than failing.

use std::ffi::CString;
use std::fs::Metadata;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

mod procfs;
mod users;

pub use procfs::ProcFs;
pub use users::{group_name, user_name};

/// File types as reported by `st_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
    Symlink,
    Unknown,
}

impl FileKind {
    pub fn from_mode(mode: u32) -> Self {
        match mode & libc::S_IFMT as u32 {
            m if m == libc::S_IFREG as u32 => FileKind::Regular,
            m if m == libc::S_IFDIR as u32 => FileKind::Directory,
            m if m == libc::S_IFCHR as u32 => FileKind::CharDevice,
            m if m == libc::S_IFBLK as u32 => FileKind::BlockDevice,
            m if m == libc::S_IFIFO as u32 => FileKind::Fifo,
            m if m == libc::S_IFSOCK as u32 => FileKind::Socket,
            m if m == libc::S_IFLNK as u32 => FileKind::Symlink,
            _ => FileKind::Unknown,
        }
    }

    pub fn of(meta: &Metadata) -> Self {
        Self::from_mode(meta.mode())
    }

    pub fn describe(self) -> &'static str {
        match self {
            FileKind::Regular => "regular file",
            FileKind::Directory => "directory",
            FileKind::CharDevice => "character special device",
            FileKind::BlockDevice => "block special device",
            FileKind::Fifo => "named pipe",
            FileKind::Socket => "socket",
            FileKind::Symlink => "symbolic link",
            FileKind::Unknown => "file",
        }
    }
}

/// Capabilities the explanations care about, by kernel bit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Chown = 0,
    DacOverride = 1,
    DacReadSearch = 2,
    Fowner = 3,
    LinuxImmutable = 9,
    NetAdmin = 12,
    SysRawio = 17,
    SysAdmin = 21,
    SysResource = 24,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Chown => "CAP_CHOWN",
            Capability::DacOverride => "CAP_DAC_OVERRIDE",
            Capability::DacReadSearch => "CAP_DAC_READ_SEARCH",
            Capability::Fowner => "CAP_FOWNER",
            Capability::LinuxImmutable => "CAP_LINUX_IMMUTABLE",
            Capability::NetAdmin => "CAP_NET_ADMIN",
            Capability::SysRawio => "CAP_SYS_RAWIO",
            Capability::SysAdmin => "CAP_SYS_ADMIN",
            Capability::SysResource => "CAP_SYS_RESOURCE",
        }
    }
}

/// Whether this process holds `cap` in its effective set.
pub fn has_capability(cap: Capability) -> bool {
    let caps = ProcFs::system().map(|procfs| procfs.effective_capabilities());
    match caps {
        Some(Ok(mask)) => mask & (1u64 << cap as u32) != 0,
        Some(Err(e)) => {
            log::debug!("falling back to euid for {}: {e:#}", cap.name());
            effective_ids().0 == 0
        }
        None => effective_ids().0 == 0,
    }
}

pub fn effective_ids() -> (u32, u32) {
    // SAFETY: geteuid and getegid cannot fail and touch no memory.
    unsafe { (libc::geteuid(), libc::getegid()) }
}

/// Whether `gid` is the effective group or one of the supplementary groups.
pub fn in_group(gid: u32) -> bool {
    if effective_ids().1 == gid {
        return true;
    }
    // SAFETY: a zero-length query only returns the group count.
    let count = unsafe { libc::getgroups(0, std::ptr::null_mut()) };
    if count <= 0 {
        return false;
    }
    let mut groups = vec![0 as libc::gid_t; count as usize];
    // SAFETY: `groups` holds `count` entries.
    let n = unsafe { libc::getgroups(count, groups.as_mut_ptr()) };
    n > 0 && groups[..n as usize].contains(&gid)
}

/// Permission bits (any of 4, 2, 1) this process would be granted on a file.
pub fn permits(meta: &Metadata, want: u32) -> bool {
    if has_capability(Capability::DacOverride) {
        // execute still needs at least one x bit on non-directories
        return want & 1 == 0 || meta.is_dir() || meta.mode() & 0o111 != 0;
    }
    let (euid, _) = effective_ids();
    let mode = meta.mode();
    let bits = if meta.uid() == euid {
        (mode >> 6) & 7
    } else if in_group(meta.gid()) {
        (mode >> 3) & 7
    } else {
        mode & 7
    };
    bits & want == want
}

pub fn fstat(fd: i32) -> Option<libc::stat> {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    // SAFETY: fstat only writes into `st`, which is read only on success.
    let rc = unsafe { libc::fstat(fd, st.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: fstat succeeded and filled the structure.
    Some(unsafe { st.assume_init() })
}

pub fn fd_kind(fd: i32) -> Option<FileKind> {
    fstat(fd).map(|st| FileKind::from_mode(st.st_mode as u32))
}

pub fn fd_is_open(fd: i32) -> bool {
    // SAFETY: F_GETFD takes no argument and has no side effects.
    fd >= 0 && unsafe { libc::fcntl(fd, libc::F_GETFD) } != -1
}

/// The `O_*` status flags of an open descriptor.
pub fn fd_status_flags(fd: i32) -> Option<i32> {
    if fd < 0 {
        return None;
    }
    // SAFETY: F_GETFL takes no argument and has no side effects.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    (flags != -1).then_some(flags)
}

pub fn fd_path(fd: i32) -> Option<PathBuf> {
    if fd < 0 {
        return None;
    }
    ProcFs::system()?.fd_path(fd)
}

pub fn is_tty(fd: i32) -> bool {
    // SAFETY: isatty only inspects the descriptor.
    fd >= 0 && unsafe { libc::isatty(fd) } == 1
}

/// Soft `RLIMIT_NOFILE`.
pub fn open_file_limit() -> Option<u64> {
    let mut rl = libc::rlimit { rlim_cur: 0, rlim_max: 0 };
    // SAFETY: getrlimit writes into `rl` only.
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rl) } != 0 {
        return None;
    }
    (rl.rlim_cur != libc::RLIM_INFINITY).then_some(rl.rlim_cur as u64)
}

/// Whether the file system holding `path` is mounted read-only.
pub fn is_read_only_mount(path: &Path) -> bool {
    let Ok(cpath) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let mut sv = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: `cpath` is NUL terminated and statvfs only writes into `sv`.
    if unsafe { libc::statvfs(cpath.as_ptr(), sv.as_mut_ptr()) } != 0 {
        return false;
    }
    // SAFETY: statvfs succeeded.
    let sv = unsafe { sv.assume_init() };
    sv.f_flag & libc::ST_RDONLY != 0
}

/// Whether this process leads its session.
pub fn is_session_leader() -> bool {
    // SAFETY: getsid(0) and getpid have no side effects.
    unsafe { libc::getsid(0) == libc::getpid() }
}

pub fn interface_exists(name: &[u8]) -> bool {
    let Ok(cname) = CString::new(name) else {
        return false;
    };
    // SAFETY: `cname` is NUL terminated.
    unsafe { libc::if_nametoindex(cname.as_ptr()) != 0 }
}
