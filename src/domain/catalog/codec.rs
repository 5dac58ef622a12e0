//! Catalog trailer codec.
//!
//! Trailer layout, discoverable backward from the end of the security
//! directory: `[zero padding]["PAYLOAD\0\0"][JSON map][u32 LE length]`.
//! The length field covers the magic token and the map, not the padding and
//! not itself.

use crate::domain::catalog::PayloadCatalog;
use crate::infra::error::{PayloadError, PayloadResult};

/// Magic token marking the start of a catalog trailer.
pub const PAYLOAD_MAGIC: &[u8; 9] = b"PAYLOAD\0\0";

/// Size of the trailing length field.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Encode `catalog` as a trailer to be written at absolute offset `body_end`.
///
/// Zero padding is inserted before the magic token so that
/// `body_end + trailer.len()` lands on an 8-byte boundary: the certificate
/// table must end 8-byte aligned, and the trailer is the last thing in it.
pub fn encode_trailer(catalog: &PayloadCatalog, body_end: u64) -> PayloadResult<Vec<u8>> {
    let encoded =
        serde_json::to_vec(catalog).map_err(|e| PayloadError::CatalogEncodeError(e.to_string()))?;

    let blob_len = PAYLOAD_MAGIC.len() + encoded.len();
    if u32::try_from(blob_len).is_err() {
        return Err(PayloadError::PayloadTooLarge(format!(
            "catalog blob of {blob_len} bytes exceeds the u32 length field"
        )));
    }

    let unpadded_end = body_end + (blob_len + LENGTH_FIELD_SIZE) as u64;
    let padding = ((8 - unpadded_end % 8) % 8) as usize;

    let mut trailer = Vec::with_capacity(padding + blob_len + LENGTH_FIELD_SIZE);
    trailer.extend(std::iter::repeat_n(0u8, padding));
    trailer.extend_from_slice(PAYLOAD_MAGIC);
    trailer.extend_from_slice(&encoded);
    trailer.extend_from_slice(&(blob_len as u32).to_le_bytes());
    Ok(trailer)
}

/// Decode the catalog whose trailer ends at `region_end`.
///
/// A missing or unrecognized trailer is the empty catalog — the state of an
/// image nothing was ever committed to. A recognized magic token followed by
/// unparsable content is a hard error. The buffer is never written to.
pub fn decode_trailer(data: &[u8], region_end: u64) -> PayloadResult<PayloadCatalog> {
    let Ok(region_end) = usize::try_from(region_end) else {
        return Ok(PayloadCatalog::new());
    };
    if region_end > data.len() || region_end < LENGTH_FIELD_SIZE {
        return Ok(PayloadCatalog::new());
    }

    let length_bytes = &data[region_end - LENGTH_FIELD_SIZE..region_end];
    let length = u32::from_le_bytes([
        length_bytes[0],
        length_bytes[1],
        length_bytes[2],
        length_bytes[3],
    ]) as usize;

    if length < PAYLOAD_MAGIC.len() {
        return Ok(PayloadCatalog::new());
    }
    let Some(start) = (region_end - LENGTH_FIELD_SIZE).checked_sub(length) else {
        // Length field points before the start of the buffer.
        return Ok(PayloadCatalog::new());
    };
    if &data[start..start + PAYLOAD_MAGIC.len()] != PAYLOAD_MAGIC {
        return Ok(PayloadCatalog::new());
    }

    let body = &data[start + PAYLOAD_MAGIC.len()..region_end - LENGTH_FIELD_SIZE];
    serde_json::from_slice(body).map_err(|e| PayloadError::CatalogDecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::PayloadEntry;

    fn sample_catalog() -> PayloadCatalog {
        let mut catalog = PayloadCatalog::new();
        catalog.insert(
            "license".into(),
            PayloadEntry {
                offset: 0x200,
                size: 3,
            },
        );
        catalog.insert(
            "blob".into(),
            PayloadEntry {
                offset: 0x208,
                size: 0x40,
            },
        );
        catalog
    }

    #[test]
    fn test_roundtrip() {
        let catalog = sample_catalog();
        let body_end = 0x248u64;
        let trailer = encode_trailer(&catalog, body_end).unwrap();

        let mut region = vec![0u8; body_end as usize];
        region.extend_from_slice(&trailer);
        let decoded = decode_trailer(&region, region.len() as u64).unwrap();
        assert_eq!(decoded, catalog);
    }

    #[test]
    fn test_alignment_for_any_body_end() {
        let catalog = sample_catalog();
        for body_end in 0..16u64 {
            let trailer = encode_trailer(&catalog, body_end).unwrap();
            assert_eq!(
                (body_end + trailer.len() as u64) % 8,
                0,
                "unaligned region end for body_end {body_end}"
            );
        }
    }

    #[test]
    fn test_padding_not_counted_in_length() {
        let trailer = encode_trailer(&PayloadCatalog::new(), 1).unwrap();
        let length = u32::from_le_bytes([
            trailer[trailer.len() - 4],
            trailer[trailer.len() - 3],
            trailer[trailer.len() - 2],
            trailer[trailer.len() - 1],
        ]) as usize;
        // magic + "{}", independent of however much padding was prepended
        assert_eq!(length, PAYLOAD_MAGIC.len() + 2);
    }

    #[test]
    fn test_missing_trailer_is_empty_catalog() {
        let data = vec![0xABu8; 64];
        assert!(decode_trailer(&data, 64).unwrap().is_empty());
    }

    #[test]
    fn test_short_region_is_empty_catalog() {
        let data = vec![0u8; 2];
        assert!(decode_trailer(&data, 2).unwrap().is_empty());
    }

    #[test]
    fn test_length_pointing_before_buffer_is_empty_catalog() {
        let mut data = vec![0u8; 32];
        data[28..32].copy_from_slice(&0xFFFF_0000u32.to_le_bytes());
        assert!(decode_trailer(&data, 32).unwrap().is_empty());
    }

    #[test]
    fn test_magic_with_garbage_body_is_hard_error() {
        let garbage = b"{definitely not json";
        let mut data = Vec::new();
        data.extend_from_slice(PAYLOAD_MAGIC);
        data.extend_from_slice(garbage);
        let length = (PAYLOAD_MAGIC.len() + garbage.len()) as u32;
        data.extend_from_slice(&length.to_le_bytes());

        let err = decode_trailer(&data, data.len() as u64).unwrap_err();
        assert!(matches!(err, PayloadError::CatalogDecodeError(_)));
    }

    #[test]
    fn test_region_end_past_buffer_is_empty_catalog() {
        let data = vec![0u8; 16];
        assert!(decode_trailer(&data, 1024).unwrap().is_empty());
    }
}
