use super::{Descriptor, Disambiguation, IoctlCall, catalogue};

/// How a descriptor was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The only named entry with this number.
    Unique,
    /// No named entry; the raw request is all there is.
    Unknown,
    /// Several entries, narrowed to one by their predicates.
    Decided,
    /// Several entries nothing could tell apart; the first was taken.
    Ambiguous,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub descriptor: &'a Descriptor,
    pub outcome: Outcome,
}

/// Stand-in for requests the catalogue does not know.
pub static UNKNOWN: Descriptor = Descriptor::new("", 0).only_if(false);

/// Pick the descriptor for `call` from the process-wide catalogue.
pub fn resolve(call: &IoctlCall) -> Resolved<'static> {
    resolve_in(catalogue(), call)
}

/// Pick the descriptor for `call` from `entries`, in order.
pub fn resolve_in<'a>(entries: &[&'a Descriptor], call: &IoctlCall) -> Resolved<'a> {
    let candidates: Vec<&'a Descriptor> = entries
        .iter()
        .copied()
        .filter(|d| d.number == call.request && d.name.is_some())
        .collect();

    match candidates.as_slice() {
        [] => {
            return Resolved {
                descriptor: &UNKNOWN,
                outcome: Outcome::Unknown,
            };
        }
        [only] => {
            return Resolved {
                descriptor: *only,
                outcome: Outcome::Unique,
            };
        }
        _ => {}
    }

    let mut survivors = Vec::with_capacity(candidates.len());
    for &candidate in &candidates {
        let verdict = match candidate.disambiguate {
            Some(predicate) => predicate(candidate, call),
            None => Disambiguation::Undecided,
        };
        match verdict {
            Disambiguation::Use => {
                return Resolved {
                    descriptor: candidate,
                    outcome: Outcome::Decided,
                };
            }
            Disambiguation::DoNotUse => {}
            Disambiguation::Undecided => survivors.push(candidate),
        }
    }

    match survivors.as_slice() {
        [only] => Resolved {
            descriptor: *only,
            outcome: Outcome::Decided,
        },
        _ => {
            // Every candidate rejected falls back to the first of them.
            let descriptor = survivors.first().copied().unwrap_or(candidates[0]);
            log::debug!(
                "request {:#x} on fd {} is ambiguous among {} entries, using {}",
                call.request,
                call.fildes,
                candidates.len(),
                descriptor.name.unwrap_or("?"),
            );
            Resolved {
                descriptor,
                outcome: Outcome::Ambiguous,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioctl::disambiguate;
    use crate::probe::ForeignPtr;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    static TTY_SIDE: Descriptor =
        Descriptor::new("TTY_SIDE", 0x7001).with_disambiguate(disambiguate::is_char_device);
    static SOCK_SIDE: Descriptor =
        Descriptor::new("SOCK_SIDE", 0x7001).with_disambiguate(disambiguate::is_socket);
    static FIRST: Descriptor = Descriptor::new("FIRST", 0x7002);
    static SECOND: Descriptor = Descriptor::new("SECOND", 0x7002);
    static GONE: Descriptor = Descriptor::new("GONE", 0x7003).only_if(false);
    static LONE: Descriptor = Descriptor::new("LONE", 0x7004);

    fn table() -> Vec<&'static Descriptor> {
        vec![&TTY_SIDE, &SOCK_SIDE, &FIRST, &SECOND, &GONE, &LONE]
    }

    #[test]
    fn test_socket_predicate_wins_over_order() {
        let (a, _b) = UnixStream::pair().unwrap();
        let call = IoctlCall::new(a.as_raw_fd(), 0x7001, ForeignPtr::NULL);
        let resolved = resolve_in(&table(), &call);
        assert_eq!(resolved.descriptor.name, Some("SOCK_SIDE"));
        assert_eq!(resolved.outcome, Outcome::Decided);
    }

    #[test]
    fn test_char_device_predicate() {
        let null = std::fs::File::open("/dev/null").unwrap();
        let call = IoctlCall::new(null.as_raw_fd(), 0x7001, ForeignPtr::NULL);
        assert_eq!(resolve_in(&table(), &call).descriptor.name, Some("TTY_SIDE"));
    }

    #[test]
    fn test_unique_and_unknown() {
        let call = IoctlCall::new(0, 0x7004, ForeignPtr::NULL);
        let resolved = resolve_in(&table(), &call);
        assert_eq!(resolved.descriptor.name, Some("LONE"));
        assert_eq!(resolved.outcome, Outcome::Unique);

        let call = IoctlCall::new(0, 0x7fff, ForeignPtr::NULL);
        let resolved = resolve_in(&table(), &call);
        assert_eq!(resolved.outcome, Outcome::Unknown);
        assert!(resolved.descriptor.name.is_none());
    }

    #[test]
    fn test_placeholder_never_selected() {
        let call = IoctlCall::new(0, 0x7003, ForeignPtr::NULL);
        assert_eq!(resolve_in(&table(), &call).outcome, Outcome::Unknown);
    }

    // First-in-order is a compatibility default, not a statement that the
    // first entry is the right answer.
    #[test]
    fn test_undecided_tie_takes_first_in_order() {
        let call = IoctlCall::new(0, 0x7002, ForeignPtr::NULL);
        let resolved = resolve_in(&table(), &call);
        assert_eq!(resolved.descriptor.name, Some("FIRST"));
        assert_eq!(resolved.outcome, Outcome::Ambiguous);

        let reversed: Vec<&'static Descriptor> = vec![&SECOND, &FIRST];
        assert_eq!(resolve_in(&reversed, &call).descriptor.name, Some("SECOND"));
    }

    #[test]
    fn test_all_rejected_takes_first_candidate() {
        let file = tempfile::tempfile().unwrap();
        let call = IoctlCall::new(file.as_raw_fd(), 0x7001, ForeignPtr::NULL);
        let resolved = resolve_in(&table(), &call);
        assert_eq!(resolved.descriptor.name, Some("TTY_SIDE"));
        assert_eq!(resolved.outcome, Outcome::Ambiguous);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let (a, _b) = UnixStream::pair().unwrap();
        let call = IoctlCall::new(a.as_raw_fd(), 0x541b, ForeignPtr::NULL);
        let first = resolve(&call);
        for _ in 0..10 {
            assert!(std::ptr::eq(resolve(&call).descriptor, first.descriptor));
        }
    }

    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[test]
    fn test_catalogue_collision_at_0x541b() {
        let (a, _b) = UnixStream::pair().unwrap();
        let socket = IoctlCall::new(a.as_raw_fd(), 0x541b, ForeignPtr::NULL);
        assert_eq!(resolve(&socket).descriptor.name, Some("SIOCINQ"));

        let null = std::fs::File::open("/dev/null").unwrap();
        let tty = IoctlCall::new(null.as_raw_fd(), 0x541b, ForeignPtr::NULL);
        assert_eq!(resolve(&tty).descriptor.name, Some("TIOCINQ"));

        let file = tempfile::tempfile().unwrap();
        let plain = IoctlCall::new(file.as_raw_fd(), 0x541b, ForeignPtr::NULL);
        let resolved = resolve(&plain);
        assert_eq!(resolved.descriptor.name, Some("FIONREAD"));
        assert_eq!(resolved.outcome, Outcome::Decided);
    }
}
