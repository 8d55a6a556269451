//! RFC 1035 §4 wire format.
//!
//! Decoding never panics: every length read from the buffer is checked
//! against the bytes actually available, and compression pointers must point
//! strictly backwards so that name expansion always terminates.

mod decoder;
mod encoder;

pub use decoder::{decode, decode_prefix};
pub use encoder::{encode, encode_with_length_prefix};

/// Size of the fixed message header.
pub const HEADER_LEN: usize = 12;

/// Largest message a classic (non-EDNS) UDP exchange may carry.
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

pub(crate) const POINTER_MASK: u8 = 0xC0;
pub(crate) const MAX_LABEL_LEN: usize = 63;
pub(crate) const MAX_NAME_LEN: usize = 255;
pub(crate) const MAX_POINTER_OFFSET: usize = 0x3FFF;

impl crate::Message {
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::DomainError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::DomainError> {
        decode(bytes)
    }
}
