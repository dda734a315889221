//! Streaming text decoder for encoding_rs
//!
//! This crate provides [`TextDecoderStream`], a backpressured transform stream that decodes byte
//! chunks in any WHATWG encoding supported by [`encoding_rs`] into UTF-8 text chunks. Characters
//! split across chunk boundaries are reassembled, a leading byte-order mark is stripped once, and
//! malformed input is either replaced with U+FFFD or reported as an error.
//!
//! ```rust
//! use encoding_rs_stream::{DecoderOptions, StreamError, TextDecoderStream};
//! use futures::{join, stream, StreamExt as _};
//!
//! # futures::executor::block_on(async {
//! let (writable, readable) = TextDecoderStream::with_options("utf-8", DecoderOptions::new())?
//!     .into_split();
//!
//! let chunks = stream::iter([vec![0xe2, 0x82], vec![0xac, b'1', b'0']]).map(Ok::<_, StreamError>);
//! let (sent, text) = join!(
//!     chunks.forward(writable),
//!     readable.map(|chunk| chunk.unwrap()).collect::<String>(),
//! );
//! sent?;
//! assert_eq!(text, "€10");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```
//!
//! The incremental engine behind the stream is also available on its own as [`TextDecoder`], and
//! [`DecodingWriter`] adapts it to [`std::io::Write`] for blocking use.
//!
//! ```rust
//! use encoding_rs_stream::{DecoderOptions, TextDecoder};
//!
//! let mut decoder = TextDecoder::for_label("utf-16be", DecoderOptions::new().fatal(true))?;
//! let mut text = decoder.decode(&[0xfe, 0xff, 0xd8])?;
//! text += &decoder.decode(&[0x3d, 0xde, 0x02])?;
//! text += &decoder.flush()?;
//! assert_eq!(text, "😂");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod decoder;
mod error;
mod io;
mod stream;

mod util;

pub use config::{
    resolve_label, DecoderConfig, DecoderOptions, DEFAULT_HIGH_WATER_MARK, DEFAULT_LABEL,
    MAX_HIGH_WATER_MARK,
};
pub use decoder::TextDecoder;
pub use error::{ClosedStreamError, ConfigurationError, DecodeError, StreamError};
pub use io::DecodingWriter;
pub use stream::{DecoderReadable, DecoderWritable, StreamState, TextDecoderStream};

#[cfg(test)]
mod tests;
