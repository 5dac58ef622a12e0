//! Payload embedder service.
//!
//! Splices one named payload into the trailing space of the Security Data
//! Directory, rewrites the catalog trailer behind it, and refreshes the image
//! checksum. The input buffer is never touched: a commit either returns a
//! fully assembled new image or an error.

use crate::domain::catalog::{self, codec, PayloadEntry};
use crate::domain::pe::checksum::update_checksum;
use crate::domain::pe::layout::PeLayout;
use crate::infra::error::{PayloadError, PayloadResult};

pub struct PayloadEmbedderService;

impl Default for PayloadEmbedderService {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadEmbedderService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Append one named payload and commit an updated catalog.
    ///
    /// Previously committed payloads keep their exact byte ranges; only the
    /// old trailer is replaced. The new security directory size and the image
    /// checksum are patched before the buffer is returned.
    ///
    /// # Errors
    /// Header errors from the locator, `InvalidName`/`DuplicateKey` for bad
    /// names, `SecurityDirectoryOutOfBounds` for a directory range past the
    /// end of the image, and `PayloadTooLarge` when a range no longer fits
    /// the directory's 32-bit fields.
    pub fn commit(&self, image: &[u8], name: &str, payload: &[u8]) -> PayloadResult<Vec<u8>> {
        if name.is_empty() {
            return Err(PayloadError::InvalidName("name must be non-empty".into()));
        }

        let layout = PeLayout::parse(image)?;
        let mut directory = layout.security_directory(image)?;

        // An image that was never signed carries an all-zero directory entry.
        // Point it at the end of the file once; afterwards only the size
        // field is ever rewritten.
        let initialize_directory = directory.is_unset();
        if initialize_directory {
            directory.offset = u32::try_from(image.len()).map_err(|_| {
                PayloadError::PayloadTooLarge(format!(
                    "image of {} bytes exceeds the directory's u32 offset field",
                    image.len()
                ))
            })?;
            log::debug!(
                "security directory unset; initializing offset to end of image (0x{:x})",
                directory.offset
            );
        }

        let region_end = directory.end();
        if region_end > image.len() as u64 {
            return Err(PayloadError::SecurityDirectoryOutOfBounds(format!(
                "directory range [0x{:x}, 0x{region_end:x}) past end of {} byte image",
                directory.offset,
                image.len()
            )));
        }
        // A directory starting inside the header fields we patch would let
        // the splice corrupt the very entry describing it.
        let header_end = (layout.security_dir_offset() + 8) as u64;
        if !initialize_directory && u64::from(directory.offset) < header_end {
            return Err(PayloadError::SecurityDirectoryOutOfBounds(format!(
                "directory offset 0x{:x} overlaps the PE headers",
                directory.offset
            )));
        }

        let mut entries = codec::decode_trailer(image, region_end)?;
        if entries.contains_key(name) {
            return Err(PayloadError::DuplicateKey(name.to_string()));
        }

        let allocation = catalog::allocation_point(&entries, region_end);
        if allocation > region_end {
            return Err(PayloadError::CatalogDecodeError(format!(
                "catalog entry ends at 0x{allocation:x}, past the directory end 0x{region_end:x}"
            )));
        }

        let body_end = allocation + payload.len() as u64;
        let entry = PayloadEntry {
            offset: u32::try_from(allocation).map_err(|_| too_large(allocation))?,
            size: u32::try_from(payload.len()).map_err(|_| too_large(payload.len() as u64))?,
        };
        entries.insert(name.to_string(), entry);

        let trailer = codec::encode_trailer(&entries, body_end)?;
        let new_end = body_end + trailer.len() as u64;
        // The end offset itself must stay addressable through the u32
        // directory fields.
        u32::try_from(new_end).map_err(|_| too_large(new_end))?;
        let new_size = (new_end - u64::from(directory.offset)) as u32;

        // Exact casts: allocation <= region_end <= image.len().
        let allocation = allocation as usize;
        let region_end = region_end as usize;

        let mut out = Vec::with_capacity(
            image.len() - (region_end - allocation) + payload.len() + trailer.len(),
        );
        out.extend_from_slice(&image[..allocation]);
        out.extend_from_slice(payload);
        out.extend_from_slice(&trailer);
        out.extend_from_slice(&image[region_end..]);

        if initialize_directory {
            layout.write_security_directory_offset(&mut out, directory.offset)?;
        }
        layout.write_security_directory_size(&mut out, new_size)?;
        update_checksum(&mut out, layout.checksum_offset())?;

        log::debug!(
            "committed {name:?}: {} bytes at 0x{:x}, directory now [0x{:x}, 0x{new_end:x})",
            payload.len(),
            entry.offset,
            directory.offset
        );
        Ok(out)
    }
}

fn too_large(value: u64) -> PayloadError {
    PayloadError::PayloadTooLarge(format!(
        "offset 0x{value:x} exceeds the directory's 32-bit fields"
    ))
}
