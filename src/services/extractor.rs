//! Payload extractor service.
//!
//! Read-only resolution of catalog entries; payload bytes are returned as
//! borrowed subslices of the image, never copied.

use crate::domain::catalog::{codec, PayloadCatalog};
use crate::domain::pe::layout::PeLayout;
use crate::infra::error::{PayloadError, PayloadResult};

pub struct PayloadExtractorService;

impl Default for PayloadExtractorService {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadExtractorService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve `name` to its committed bytes.
    ///
    /// # Errors
    /// `NotFound` if the name was never committed; header errors from the
    /// locator on malformed images.
    pub fn lookup<'a>(&self, image: &'a [u8], name: &str) -> PayloadResult<&'a [u8]> {
        let entries = self.catalog(image)?;
        let entry = entries
            .get(name)
            .ok_or_else(|| PayloadError::NotFound(name.to_string()))?;

        let end = entry.end();
        if end > image.len() as u64 {
            return Err(PayloadError::CatalogDecodeError(format!(
                "entry {name:?} range [0x{:x}, 0x{end:x}) past end of {} byte image",
                entry.offset,
                image.len()
            )));
        }
        Ok(&image[entry.offset as usize..end as usize])
    }

    /// All committed payload names.
    pub fn list_names(&self, image: &[u8]) -> PayloadResult<Vec<String>> {
        Ok(self.catalog(image)?.into_keys().collect())
    }

    /// The full name → range mapping.
    pub fn catalog(&self, image: &[u8]) -> PayloadResult<PayloadCatalog> {
        let layout = PeLayout::parse(image)?;
        let directory = layout.security_directory(image)?;

        let region_end = directory.end();
        if region_end > image.len() as u64 {
            return Err(PayloadError::SecurityDirectoryOutOfBounds(format!(
                "directory range [0x{:x}, 0x{region_end:x}) past end of {} byte image",
                directory.offset,
                image.len()
            )));
        }
        codec::decode_trailer(image, region_end)
    }
}
