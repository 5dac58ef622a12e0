//! Payload catalog: the name → byte-range index persisted inside the image.

pub mod codec;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Byte range of one committed payload, absolute within the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEntry {
    pub offset: u32,
    pub size: u32,
}

impl PayloadEntry {
    /// First byte past the payload.
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

/// Name → range mapping. A `BTreeMap` keeps iteration (and therefore the
/// JSON encoding) deterministic; ranges are disjoint, so no fold over the
/// entries depends on their order anyway.
pub type PayloadCatalog = BTreeMap<String, PayloadEntry>;

/// First free byte after every committed payload, or `region_end` for an
/// empty catalog.
#[must_use]
pub fn allocation_point(catalog: &PayloadCatalog, region_end: u64) -> u64 {
    catalog
        .values()
        .map(PayloadEntry::end)
        .max()
        .unwrap_or(region_end)
}
