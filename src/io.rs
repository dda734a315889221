use std::{fmt, io};

use super::{DecodeError, TextDecoder};

/// A writer that decodes the bytes written to it and appends the text to a [`fmt::Write`]
/// destination, such as a `String`.
///
/// This is the blocking counterpart of [`TextDecoderStream`]: it has no readable side to apply
/// backpressure, so every call to `write` decodes the whole buffer and pushes the result into
/// the destination immediately.
///
/// A fatal decoder reports malformed input as [`std::io::Error`] of kind `InvalidData` wrapping
/// a [`DecodeError`]. The error is non-fatal to this writer: the decoder starts over from a clean
/// state and subsequent writes are decoded as usual. Call [`finish`](DecodingWriter::finish) at
/// the end of the input to decode any incomplete trailing character.
///
/// [`TextDecoderStream`]: crate::TextDecoderStream
///
/// # Examples
///
/// ```rust
/// use std::io::Write as _;
///
/// use encoding_rs_stream::{DecoderOptions, DecodingWriter, TextDecoder};
///
/// let decoder = TextDecoder::for_label("euc-kr", DecoderOptions::new())?;
/// let mut writer = DecodingWriter::new(String::new(), decoder);
///
/// writer.write_all(&[0xc7, 0xd1, 0xb1])?;
/// writer.write_all(&[0xdb])?;
/// let (dst, result) = writer.finish();
/// result?;
/// assert_eq!(dst, "한글");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DecodingWriter<W> {
    writer: W,
    decoder: TextDecoder,
}

impl<W: fmt::Write> DecodingWriter<W> {
    /// Creates a new decoding writer from a text destination and a decoder.
    pub fn new(writer: W, decoder: TextDecoder) -> Self {
        Self { writer, decoder }
    }

    /// Returns a reference to the underlying destination.
    pub fn writer_ref(&self) -> &W {
        &self.writer
    }

    /// Returns a reference to the underlying decoder.
    pub fn decoder_ref(&self) -> &TextDecoder {
        &self.decoder
    }

    /// Notifies the decoder of the end of input, returning the underlying destination and any
    /// error reported for an incomplete trailing character.
    pub fn finish(self) -> (W, io::Result<()>) {
        let Self {
            mut writer,
            decoder,
        } = self;
        let result = match decoder.flush() {
            Ok(tail) => write_text(&mut writer, &tail),
            Err(e) => Err(e.wrap()),
        };
        (writer, result)
    }
}

impl<W: fmt::Write> io::Write for DecodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = self.decoder.decode(buf).map_err(DecodeError::wrap)?;
        write_text(&mut self.writer, &text)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // pending bytes of an incomplete character can only be resolved by `finish`
        Ok(())
    }
}

fn write_text(writer: &mut impl fmt::Write, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writer
        .write_str(text)
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "failed to write decoded text"))
}
