use crate::buffer::BoundedBuffer;
use crate::host::{self, Capability};

/// Say that the process lacks `cap`, if it does.
pub fn missing(buf: &mut BoundedBuffer, cap: Capability) -> bool {
    if host::has_capability(cap) {
        return false;
    }
    buf.puts("the process does not have the ");
    buf.puts(cap.name());
    buf.puts(" capability");
    true
}
