use std::{fmt, ops};

use encoding_rs::Decoder;

/// Implements `Debug` for `encoding_rs::Decoder`.
pub(crate) struct DebuggableDecoder(Decoder);

impl fmt::Debug for DebuggableDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("encoding()", self.encoding())
            .finish()
    }
}

impl From<Decoder> for DebuggableDecoder {
    fn from(value: Decoder) -> Self {
        Self(value)
    }
}

impl ops::Deref for DebuggableDecoder {
    type Target = Decoder;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::DerefMut for DebuggableDecoder {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Returns the capacity to reserve before decoding `src_len` more bytes.
///
/// `encoding_rs` returns `None` only when the worst case overflows `usize`; falling back to a
/// smaller reservation is fine because the decode loops grow the string on `OutputFull`.
pub(crate) fn utf8_capacity(worst_case: Option<usize>, src_len: usize) -> usize {
    worst_case.unwrap_or(src_len).max(MIN_RESERVE)
}

/// Room for at least one UTF-8 character, so that every decode call can make progress.
const MIN_RESERVE: usize = 4;
