//! PE (Portable Executable) domain: header layout arithmetic and the image
//! checksum. Only the handful of header fields this crate needs are parsed;
//! section tables and certificate contents stay opaque.

pub mod checksum;
pub mod layout;

pub use checksum::{compute_checksum, update_checksum};
pub use layout::{is_pe_image, OptionalHeaderKind, PeLayout, SecurityDirectory};
