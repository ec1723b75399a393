//! HS256 token signing, decoding and verification.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod key;

pub use claims::Claims;
pub use decoder::TokenDecoder;
pub use encoder::{IssuedToken, TokenEncoder, TokenPair};
pub use key::SigningKey;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;

/// Segment encoding: URL-safe alphabet with padding.
pub(crate) const SEGMENT_ENCODING: GeneralPurpose = base64::engine::general_purpose::URL_SAFE;

/// Segment decoding: URL-safe alphabet, padding optional.
pub(crate) const SEGMENT_DECODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
