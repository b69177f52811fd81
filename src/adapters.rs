//! Command-line arguments to [`Call`]s.
//!
//! Each call's arguments are given in the order the C prototype takes them.
//! Numbers are C literals; flag arguments also accept symbolic names joined
//! with `|`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use errexplain::codec::{self, Symbol};
use errexplain::ioctl::{self, IoctlCall};
use errexplain::{Call, Explanation, ForeignPtr, errno, tables};

const CALLS: &[Symbol] = &[
    Symbol::new("open", 0),
    Symbol::new("close", 1),
    Symbol::new("read", 2),
    Symbol::new("write", 3),
    Symbol::new("stat", 4),
    Symbol::new("lstat", 5),
    Symbol::new("access", 6),
    Symbol::new("unlink", 7),
    Symbol::new("mkdir", 8),
    Symbol::new("rmdir", 9),
    Symbol::new("chdir", 10),
    Symbol::new("chmod", 11),
    Symbol::new("chown", 12),
    Symbol::new("dup", 13),
    Symbol::new("dup2", 14),
    Symbol::new("ioctl", 15),
];

const POINTERS: &[Symbol] = &[Symbol::new("NULL", 0)];

pub fn call_names() -> impl Iterator<Item = &'static str> {
    CALLS.iter().map(|s| s.name)
}

/// `-e` value: a symbol such as `ENOENT` or a number.
pub fn parse_errno(text: &str) -> Result<i32> {
    let value = codec::parse_bits(text, &errno::ERRNO_SYMBOLS)
        .with_context(|| format!("invalid errno \"{text}\""))?;
    match i32::try_from(value) {
        Ok(errnum) => Ok(errnum),
        Err(_) => bail!("errno \"{text}\" is out of range"),
    }
}

struct Arguments<'a> {
    call: &'static str,
    args: &'a [String],
    next: usize,
}

impl<'a> Arguments<'a> {
    fn new(call: &'static str, args: &'a [String]) -> Self {
        Self { call, args, next: 0 }
    }

    fn take(&mut self, name: &str) -> Result<&'a str> {
        let Some(text) = self.args.get(self.next) else {
            bail!("{}: missing the {name} argument", self.call);
        };
        self.next += 1;
        Ok(text)
    }

    fn has_more(&self) -> bool {
        self.next < self.args.len()
    }

    fn path(&mut self, name: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(self.take(name)?))
    }

    fn bits(&mut self, name: &str, table: &[Symbol]) -> Result<u64> {
        let call = self.call;
        let text = self.take(name)?;
        codec::parse_bits(text, table).with_context(|| format!("{call}: invalid {name} \"{text}\""))
    }

    fn number(&mut self, name: &str) -> Result<u64> {
        self.bits(name, &[])
    }

    fn fildes(&mut self, name: &str) -> Result<i32> {
        let value = self.number(name)?;
        match i32::try_from(value as i64) {
            Ok(fd) => Ok(fd),
            Err(_) => bail!("{}: {name} {value} is out of range", self.call),
        }
    }

    /// A 32-bit mask or mode.
    fn word(&mut self, name: &str, table: &[Symbol]) -> Result<u32> {
        let value = self.bits(name, table)?;
        match u32::try_from(value) {
            Ok(word) => Ok(word),
            Err(_) => bail!("{}: {name} {value:#x} is out of range", self.call),
        }
    }

    /// uid/gid; `-1` means "leave unchanged".
    fn id(&mut self, name: &str) -> Result<u32> {
        let value = self.number(name)?;
        match u32::try_from(value) {
            Ok(id) => Ok(id),
            Err(_) if value as i64 == -1 => Ok(u32::MAX),
            Err(_) => bail!("{}: {name} {} is out of range", self.call, value as i64),
        }
    }

    fn pointer(&mut self, name: &str) -> Result<ForeignPtr> {
        Ok(ForeignPtr::new(self.bits(name, POINTERS)?))
    }

    fn finish(&self) -> Result<()> {
        if self.has_more() {
            bail!("{}: too many arguments, expected {}", self.call, self.next);
        }
        Ok(())
    }
}

fn lookup_call(name: &str) -> Result<&'static str> {
    if let Some(sym) = codec::find_by_name(name, CALLS) {
        return Ok(sym.name);
    }
    match codec::fuzzy_find(name, CALLS) {
        Some(sym) => bail!("unknown system call \"{name}\", did you mean \"{}\"?", sym.name),
        None => bail!("unknown system call \"{name}\""),
    }
}

/// Parse `args` for the call called `name` and explain `errnum` for it.
pub fn explain(name: &str, args: &[String], errnum: i32, capacity: usize) -> Result<Explanation> {
    let call_name = lookup_call(name)?;
    let mut a = Arguments::new(call_name, args);
    let pathname: PathBuf;
    let call = match call_name {
        "open" => {
            pathname = a.path("pathname")?;
            let flags = a.word("flags", tables::OPEN_FLAG_NAMES)? as i32;
            let mode = if a.has_more() { a.word("mode", &[])? } else { 0 };
            Call::Open { pathname: &pathname, flags, mode }
        }
        "close" => Call::Close { fildes: a.fildes("fildes")? },
        "read" | "write" => {
            let fildes = a.fildes("fildes")?;
            let data = a.pointer("data")?;
            let data_size = a.number("data_size")?;
            let Ok(data_size) = usize::try_from(data_size) else {
                bail!("{call_name}: data_size {data_size} is out of range");
            };
            if call_name == "read" {
                Call::Read { fildes, data, data_size }
            } else {
                Call::Write { fildes, data, data_size }
            }
        }
        "stat" | "lstat" => {
            pathname = a.path("pathname")?;
            let buf = if a.has_more() { a.pointer("buf")? } else { ForeignPtr::NULL };
            if call_name == "stat" {
                Call::Stat { pathname: &pathname, buf }
            } else {
                Call::Lstat { pathname: &pathname, buf }
            }
        }
        "access" => {
            pathname = a.path("pathname")?;
            let mode = a.word("mode", tables::ACCESS_MODES)? as i32;
            Call::Access { pathname: &pathname, mode }
        }
        "unlink" => {
            pathname = a.path("pathname")?;
            Call::Unlink { pathname: &pathname }
        }
        "mkdir" => {
            pathname = a.path("pathname")?;
            let mode = if a.has_more() { a.word("mode", &[])? } else { 0o777 };
            Call::Mkdir { pathname: &pathname, mode }
        }
        "rmdir" => {
            pathname = a.path("pathname")?;
            Call::Rmdir { pathname: &pathname }
        }
        "chdir" => {
            pathname = a.path("pathname")?;
            Call::Chdir { pathname: &pathname }
        }
        "chmod" => {
            pathname = a.path("pathname")?;
            let mode = a.word("mode", &[])?;
            Call::Chmod { pathname: &pathname, mode }
        }
        "chown" => {
            pathname = a.path("pathname")?;
            let owner = a.id("owner")?;
            let group = a.id("group")?;
            Call::Chown { pathname: &pathname, owner, group }
        }
        "dup" => Call::Dup { oldfd: a.fildes("oldfd")? },
        "dup2" => {
            let oldfd = a.fildes("oldfd")?;
            let newfd = a.fildes("newfd")?;
            Call::Dup2 { oldfd, newfd }
        }
        "ioctl" => {
            let fildes = a.fildes("fildes")?;
            let text = a.take("request")?;
            let request = ioctl::parse_request(text)
                .with_context(|| format!("ioctl: invalid request \"{text}\""))?;
            let data = if a.has_more() { a.pointer("data")? } else { ForeignPtr::NULL };
            Call::Ioctl(IoctlCall::new(fildes, request, data))
        }
        other => bail!("no argument parser for \"{other}\""),
    };
    a.finish()?;
    log::debug!("explaining {} for {}", errnum, call.name());
    Ok(Explanation::new(errnum, &call, capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_every_call_has_a_parser() {
        for name in call_names() {
            let err = explain(name, &[], libc::EINVAL, 3000).unwrap_err();
            assert!(err.to_string().contains("missing"), "{name}: {err}");
        }
    }

    #[test]
    fn test_parse_errno() {
        assert_eq!(parse_errno("ENOENT").unwrap(), libc::ENOENT);
        assert_eq!(parse_errno("enoent").unwrap(), libc::ENOENT);
        assert_eq!(parse_errno("13").unwrap(), libc::EACCES);
        let err = parse_errno("ENOENTT").unwrap_err();
        assert!(format!("{err:#}").contains("did you mean \"ENOENT\""));
    }

    #[test]
    fn test_unknown_call_suggests() {
        let err = explain("mkdr", &args(&["/x"]), libc::EEXIST, 3000).unwrap_err();
        assert_eq!(err.to_string(), "unknown system call \"mkdr\", did you mean \"mkdir\"?");
    }

    #[test]
    fn test_open_by_name() {
        let e = explain("open", &args(&["/nonexistent", "O_RDONLY"]), libc::ENOENT, 3000).unwrap();
        assert_eq!(e.call, "open(pathname = \"/nonexistent\", flags = O_RDONLY)");
        assert_eq!(e.errno_name, Some("ENOENT"));
    }

    #[test]
    fn test_flag_typo_rejected() {
        let err =
            explain("open", &args(&["/x", "O_RDONLY|O_CREATE"]), libc::ENOENT, 3000).unwrap_err();
        assert!(format!("{err:#}").contains("did you mean \"O_CREAT\""));
    }

    #[test]
    fn test_too_many_arguments() {
        let err = explain("close", &args(&["3", "4"]), libc::EBADF, 3000).unwrap_err();
        assert!(err.to_string().contains("too many arguments"));
    }

    #[test]
    fn test_negative_fildes() {
        let e = explain("close", &args(&["-1"]), libc::EBADF, 3000).unwrap();
        assert_eq!(e.call, "close(fildes = -1)");
    }

    #[test]
    fn test_out_of_range_numbers_rejected() {
        let err = explain("close", &args(&["4294967299"]), libc::EBADF, 3000).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
        let err = explain("chmod", &args(&["/x", "0x100000000"]), libc::EPERM, 3000).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
        let err =
            explain("chown", &args(&["/x", "4294967296", "0"]), libc::EPERM, 3000).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_chown_minus_one_kept() {
        let e = explain("chown", &args(&["/nonexistent", "-1", "-1"]), libc::ENOENT, 3000).unwrap();
        assert_eq!(e.call, "chown(pathname = \"/nonexistent\", owner = -1, group = -1)");
    }

    #[test]
    fn test_ioctl_null_data() {
        let e =
            explain("ioctl", &args(&["9999", "0xDEADBEEF", "NULL"]), libc::ENOTTY, 3000).unwrap();
        assert_eq!(e.call, "ioctl(fildes = 9999, request = 0xDEADBEEF, data = NULL)");
    }
}
