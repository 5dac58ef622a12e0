//! PE image checksum.
//!
//! Reimplements the checksum the Microsoft linker stores in the optional
//! header: a folded sum of 32-bit little-endian words over the whole file,
//! excluding the checksum field itself, plus the file length.

use crate::infra::error::{PayloadError, PayloadResult};

/// Compute the image checksum.
///
/// The buffer is viewed as consecutive little-endian 32-bit words; a final
/// partial word is zero-extended in a scratch buffer, never by growing the
/// input. The word holding the checksum field is skipped. The running sum is
/// folded after every addition, reduced to 16 bits, and the original
/// (unpadded) byte length is added last.
#[must_use]
pub fn compute_checksum(data: &[u8], checksum_offset: usize) -> u32 {
    let skip_index = checksum_offset / 4;
    let mut sum: u64 = 0;

    for (index, chunk) in data.chunks(4).enumerate() {
        if index == skip_index {
            continue;
        }
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum += u64::from(u32::from_le_bytes(word));
        sum = (sum & 0xFFFF_FFFF) + (sum >> 32);
    }

    sum = (sum & 0xFFFF) + (sum >> 16);
    sum += sum >> 16;
    sum &= 0xFFFF;
    (sum + data.len() as u64) as u32
}

/// Recompute the checksum and write it into the image, little-endian.
///
/// Runs as the last step after any structural change; the buffer is not
/// modified anywhere else.
pub fn update_checksum(data: &mut [u8], checksum_offset: usize) -> PayloadResult<()> {
    if checksum_offset + 4 > data.len() {
        return Err(PayloadError::Truncated(format!(
            "checksum field at 0x{checksum_offset:x} past end of {} byte image",
            data.len()
        )));
    }
    let checksum = compute_checksum(data, checksum_offset);
    data[checksum_offset..checksum_offset + 4].copy_from_slice(&checksum.to_le_bytes());
    Ok(())
}
