use encoding_rs::{CoderResult, DecoderResult, Encoding};

use super::{util, ConfigurationError, DecodeError, DecoderConfig, DecoderOptions};

/// An incremental decoder that turns byte chunks into UTF-8 text.
///
/// Each call to [`decode`](TextDecoder::decode) returns the text for every character completed
/// so far and keeps the bytes of a trailing incomplete character until the next call, so
/// splitting the input at arbitrary byte positions never changes the concatenated output. Call
/// [`flush`](TextDecoder::flush) once at the end of the input to resolve any incomplete
/// character left over.
///
/// Malformed input is replaced with U+FFFD unless the decoder was configured as `fatal`, in which
/// case the offending call fails with [`DecodeError`] and the decoder starts over from a clean
/// state with the next call.
///
/// # Examples
///
/// ```rust
/// use encoding_rs_stream::{DecoderOptions, TextDecoder};
///
/// let mut decoder = TextDecoder::for_label("utf-8", DecoderOptions::new())?;
///
/// assert_eq!(decoder.decode(&[0xef, 0xbb, 0xbf, b'1', 0xe2, 0x82])?, "1");
/// assert_eq!(decoder.decode(&[0xac, b'2', 0xe2])?, "€2");
/// assert_eq!(decoder.flush()?, "\u{fffd}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TextDecoder {
    decoder: util::DebuggableDecoder,
    config: DecoderConfig,
    /// Number of bytes supplied so far, used to report absolute error offsets.
    position: u64,
}

impl TextDecoder {
    /// Creates a new decoder from a resolved configuration.
    pub fn new(config: &DecoderConfig) -> Self {
        let charset = config.charset();
        let decoder = if config.ignore_bom() {
            charset.new_decoder_without_bom_handling()
        } else {
            charset.new_decoder_with_bom_removal()
        };
        Self {
            decoder: decoder.into(),
            config: config.clone(),
            position: 0,
        }
    }

    /// Resolves `label` and creates a new decoder for it.
    pub fn for_label(label: &str, options: DecoderOptions) -> Result<Self, ConfigurationError> {
        DecoderConfig::new(label, options).map(|config| Self::new(&config))
    }

    /// Returns the canonical lowercase name of the encoding, e.g. `"utf-8"`.
    pub fn encoding(&self) -> &str {
        self.config.encoding()
    }

    /// Returns the underlying `encoding_rs` encoding.
    pub fn charset(&self) -> &'static Encoding {
        self.config.charset()
    }

    pub fn fatal(&self) -> bool {
        self.config.fatal()
    }

    pub fn ignore_bom(&self) -> bool {
        self.config.ignore_bom()
    }

    /// Returns the number of input bytes supplied to this decoder so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Decodes a chunk of input, returning the text of every character completed by it.
    ///
    /// An empty chunk yields an empty string and leaves any pending bytes untouched. In fatal
    /// mode, a malformed sequence fails the whole call without returning any of its text, and
    /// the bytes pending from earlier calls are discarded.
    pub fn decode(&mut self, input: &[u8]) -> Result<String, DecodeError> {
        if input.is_empty() {
            return Ok(String::new());
        }

        let ret = if self.config.fatal() {
            self.decode_strict(input, false)
        } else {
            Ok(self.decode_lossy(input, false))
        };
        match &ret {
            Ok(text) => tracing::trace!(
                encoding = self.encoding(),
                input = input.len(),
                output = text.len(),
                "decoded chunk"
            ),
            Err(e) => {
                tracing::debug!(encoding = self.encoding(), offset = e.offset(), "malformed input");
                self.discard_state();
            }
        }
        self.position += input.len() as u64;
        ret
    }

    /// Notifies the decoder of the end of input, returning the text of anything still pending.
    ///
    /// A dangling incomplete character becomes a single U+FFFD, or an error in fatal mode.
    pub fn flush(mut self) -> Result<String, DecodeError> {
        if self.config.fatal() {
            self.decode_strict(&[], true)
        } else {
            Ok(self.decode_lossy(&[], true))
        }
    }

    fn decode_lossy(&mut self, mut src: &[u8], last: bool) -> String {
        let mut dst = String::with_capacity(util::utf8_capacity(
            self.decoder.max_utf8_buffer_length(src.len()),
            src.len(),
        ));
        loop {
            let (result, consumed, _) = self.decoder.decode_to_string(src, &mut dst, last);
            src = &src[consumed..];
            match result {
                CoderResult::InputEmpty => return dst,
                CoderResult::OutputFull => dst.reserve(util::utf8_capacity(
                    self.decoder.max_utf8_buffer_length(src.len()),
                    src.len(),
                )),
            }
        }
    }

    fn decode_strict(&mut self, src: &[u8], last: bool) -> Result<String, DecodeError> {
        let mut dst = String::with_capacity(util::utf8_capacity(
            self.decoder
                .max_utf8_buffer_length_without_replacement(src.len()),
            src.len(),
        ));
        let mut consumed = 0;
        loop {
            let (result, n) =
                self.decoder
                    .decode_to_string_without_replacement(&src[consumed..], &mut dst, last);
            consumed += n;
            match result {
                DecoderResult::InputEmpty => return Ok(dst),
                DecoderResult::OutputFull => {
                    let rem = src.len() - consumed;
                    dst.reserve(util::utf8_capacity(
                        self.decoder.max_utf8_buffer_length_without_replacement(rem),
                        rem,
                    ));
                }
                DecoderResult::Malformed(malformed, extra) => {
                    // the malformed bytes may have begun in an earlier chunk
                    let end = (self.position + consumed as u64).saturating_sub(extra.into());
                    return Err(DecodeError::new(
                        end.saturating_sub(malformed.into()),
                        malformed.into(),
                    ));
                }
            }
        }
    }

    /// Replaces the underlying decoder with a fresh one. A BOM is only ever stripped at the very
    /// beginning of the stream, so the replacement never strips one.
    fn discard_state(&mut self) {
        self.decoder = self
            .config
            .charset()
            .new_decoder_without_bom_handling()
            .into();
    }
}
