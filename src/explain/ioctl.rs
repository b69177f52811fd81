use super::args;
use crate::buffer::BoundedBuffer;
use crate::ioctl::{self, IoctlCall, Outcome};

pub(super) fn signature(buf: &mut BoundedBuffer, call: &IoctlCall) {
    let resolved = ioctl::resolve(call);
    args::begin(buf, "ioctl");
    args::arg(buf, true, "fildes");
    args::fildes(buf, call.fildes);
    args::arg(buf, false, "request");
    resolved.descriptor.render_name(buf, call);
    args::arg(buf, false, "data");
    resolved.descriptor.render_data(buf, call);
    args::end(buf);
}

pub(super) fn cause(buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) {
    let resolved = ioctl::resolve(call);
    resolved.descriptor.render_explanation(buf, errnum, call);
    if resolved.outcome == Outcome::Ambiguous {
        log::debug!("explanation of {:#x} may describe the wrong request", call.request);
    }
}

/// What an ioctl wrote back through its data pointer.
///
/// Writes nothing, and returns false, unless `errnum` is 0 or one of the
/// errors after which the request still fills in its output.
pub fn returned(buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) -> bool {
    ioctl::resolve(call).descriptor.render_returned(buf, errnum, call)
}
