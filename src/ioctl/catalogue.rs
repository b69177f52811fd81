use std::sync::LazyLock;

use super::{Descriptor, block, file, socket, terminal};

static CATALOGUE: LazyLock<Vec<&'static Descriptor>> = LazyLock::new(|| {
    let sections =
        [file::DESCRIPTORS, terminal::DESCRIPTORS, socket::DESCRIPTORS, block::DESCRIPTORS];
    let catalogue: Vec<&'static Descriptor> = sections.into_iter().flatten().collect();
    for d in catalogue.iter().filter(|d| d.size_mismatch()) {
        log::warn!(
            "{:?}: request {:#x} encodes a different size than it transfers",
            d.name,
            d.number
        );
    }
    log::debug!(
        "ioctl catalogue: {} entries, {} unavailable here",
        catalogue.len(),
        catalogue.iter().filter(|d| d.name.is_none()).count()
    );
    catalogue
});

/// Every known request, in resolution order.
///
/// Built on first use and never changed afterwards.
pub fn catalogue() -> &'static [&'static Descriptor] {
    &CATALOGUE
}
