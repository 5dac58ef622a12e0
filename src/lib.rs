//! PE Payload Library
//!
//! Embeds and retrieves named binary payloads in the trailing space of a PE
//! image's Security Data Directory (the Authenticode certificate area),
//! keeping the image loadable: committed payloads are never moved, the
//! directory size is maintained, and the PE checksum is recomputed after
//! every change.
//!
//! The core operations work on in-memory buffers and do no I/O; the
//! `*_file` functions below wrap them for the common load-transform-store
//! case.

pub mod domain;
pub mod infra;
pub mod services;

use std::path::Path;

pub use domain::catalog::{PayloadCatalog, PayloadEntry};
pub use domain::pe::is_pe_image;
pub use infra::error::{PayloadError, PayloadResult};
pub use services::{PayloadEmbedderService, PayloadExtractorService};

/// Embed one named payload into a PE file on disk.
pub fn embed_payload_file<P: AsRef<Path>>(
    input_path: P,
    output_path: P,
    name: &str,
    payload: &[u8],
) -> PayloadResult<()> {
    log::info!(
        "Embedding payload {name:?} ({} bytes) into {:?}",
        payload.len(),
        input_path.as_ref()
    );

    let image = std::fs::read(&input_path)
        .map_err(|e| PayloadError::IoError(format!("Failed to read input file: {e}")))?;

    let embedder = PayloadEmbedderService::new();
    let committed = embedder.commit(&image, name, payload)?;

    std::fs::write(&output_path, committed)
        .map_err(|e| PayloadError::IoError(format!("Failed to write output file: {e}")))?;

    log::info!("Saved result to {:?}", output_path.as_ref());
    Ok(())
}

/// Read one named payload back from a PE file on disk.
pub fn read_payload_file<P: AsRef<Path>>(path: P, name: &str) -> PayloadResult<Vec<u8>> {
    let image = std::fs::read(&path)
        .map_err(|e| PayloadError::IoError(format!("Failed to read file: {e}")))?;

    let extractor = PayloadExtractorService::new();
    let payload = extractor.lookup(&image, name)?;
    Ok(payload.to_vec())
}

/// List the payload names committed to a PE file on disk.
pub fn list_payload_file<P: AsRef<Path>>(path: P) -> PayloadResult<Vec<String>> {
    let image = std::fs::read(&path)
        .map_err(|e| PayloadError::IoError(format!("Failed to read file: {e}")))?;

    let extractor = PayloadExtractorService::new();
    extractor.list_names(&image)
}
