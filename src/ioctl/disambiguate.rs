//! Predicates that tell colliding requests apart by looking at the file
//! descriptor the call was made on.

use super::{Descriptor, Disambiguation, IoctlCall};
use crate::host::{self, FileKind};

fn by_kind(call: &IoctlCall, want: FileKind) -> Disambiguation {
    match host::fd_kind(call.fildes) {
        Some(kind) if kind == want => Disambiguation::Use,
        Some(_) => Disambiguation::DoNotUse,
        None => Disambiguation::Undecided,
    }
}

/// Terminal-style requests: only character devices answer them.
pub fn is_char_device(_desc: &Descriptor, call: &IoctlCall) -> Disambiguation {
    by_kind(call, FileKind::CharDevice)
}

pub fn is_socket(_desc: &Descriptor, call: &IoctlCall) -> Disambiguation {
    by_kind(call, FileKind::Socket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ForeignPtr;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    static ANY: Descriptor = Descriptor::new("ANY", 0);

    #[test]
    fn test_socket_fd() {
        let (a, _b) = UnixStream::pair().unwrap();
        let call = IoctlCall::new(a.as_raw_fd(), 0, ForeignPtr::NULL);
        assert_eq!(is_socket(&ANY, &call), Disambiguation::Use);
        assert_eq!(is_char_device(&ANY, &call), Disambiguation::DoNotUse);
    }

    #[test]
    fn test_char_device_fd() {
        let null = std::fs::File::open("/dev/null").unwrap();
        let call = IoctlCall::new(null.as_raw_fd(), 0, ForeignPtr::NULL);
        assert_eq!(is_char_device(&ANY, &call), Disambiguation::Use);
        assert_eq!(is_socket(&ANY, &call), Disambiguation::DoNotUse);
    }

    #[test]
    fn test_closed_fd_is_undecided() {
        let call = IoctlCall::new(-1, 0, ForeignPtr::NULL);
        assert_eq!(is_socket(&ANY, &call), Disambiguation::Undecided);
    }
}
