use std::{error, fmt, io};

/// The error type reported when an encoding label cannot be resolved.
///
/// This is the only error that construction can produce; once a [`DecoderConfig`] exists, its
/// encoding is known to be supported. Labels are matched case-insensitively after trimming ASCII
/// whitespace, and the labels of the WHATWG `replacement` encoding are rejected just as
/// `TextDecoder` rejects them.
///
/// [`DecoderConfig`]: crate::DecoderConfig
///
/// # Examples
///
/// ```rust
/// use encoding_rs_stream::TextDecoderStream;
///
/// let err = TextDecoderStream::new("no-such-charset").unwrap_err();
/// assert_eq!(err.label(), "no-such-charset");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigurationError {
    label: String,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported encoding label: {:?}", self.label)
    }
}

impl error::Error for ConfigurationError {}

impl ConfigurationError {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
        }
    }

    /// Returns the label as it was supplied by the caller.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// The error type reported by a fatal decoder when it encounters a malformed byte sequence.
///
/// The offset is counted from the first byte ever supplied to the decoder, not from the start of
/// the chunk that triggered the error, so a sequence that began in an earlier chunk reports the
/// position where it actually began.
///
/// [`DecodingWriter`] reports this error in the form of [`std::io::Error`] wrapping an instance of
/// this type, which can be recovered by [`DecodeError::wrapped_in`].
///
/// [`DecodingWriter`]: crate::DecodingWriter
///
/// # Examples
///
/// ```rust
/// use encoding_rs_stream::{DecoderConfig, DecoderOptions, TextDecoder};
///
/// let config = DecoderConfig::new("utf-8", DecoderOptions::new().fatal(true))?;
/// let mut decoder = TextDecoder::new(&config);
///
/// assert_eq!(decoder.decode(b"abc")?, "abc");
/// let err = decoder.decode(&[b'd', 0xff, b'e']).unwrap_err();
/// assert_eq!(err.offset(), 4);
/// assert_eq!(err.malformed_len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    offset: u64,
    malformed_len: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "encountered a malformed byte sequence at byte offset {}",
            self.offset
        )
    }
}

impl error::Error for DecodeError {}

impl DecodeError {
    /// Creates a new error value.
    pub(crate) fn new(offset: u64, malformed_len: usize) -> Self {
        Self {
            offset,
            malformed_len,
        }
    }

    /// Wraps `self` in a [`std::io::Error`].
    pub(crate) fn wrap(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }

    /// Returns the stream offset of the first byte of the malformed sequence.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the length of the malformed sequence in bytes.
    ///
    /// When the input ends in the middle of a character, this counts the dangling bytes.
    #[inline]
    pub fn malformed_len(&self) -> usize {
        self.malformed_len
    }

    /// Returns a reference to the `DecodeError` value wrapped by a [`std::io::Error`] if it
    /// contains an inner error whose type is `DecodeError`, or returns `None` otherwise.
    #[inline]
    pub fn wrapped_in(io_error: &io::Error) -> Option<&Self> {
        match io_error.get_ref() {
            Some(e) => e.downcast_ref::<Self>(),
            None => None,
        }
    }
}

/// The error type reported when an operation is attempted on a stream endpoint that has already
/// reached a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosedStreamError(());

impl fmt::Display for ClosedStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream is already closed, errored, or cancelled")
    }
}

impl error::Error for ClosedStreamError {}

impl ClosedStreamError {
    pub(crate) fn new() -> Self {
        Self(())
    }
}

/// The error type reported by the endpoints of a [`TextDecoderStream`].
///
/// A single failure is usually observed on both sides of the pair: the write that triggered a
/// [`Decode`](StreamError::Decode) error fails with it, and the reader receives a clone of it.
///
/// [`TextDecoderStream`]: crate::TextDecoderStream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// A fatal decoder encountered a malformed byte sequence.
    Decode(DecodeError),
    /// The writable side was aborted with the given reason.
    Aborted(String),
    /// The readable side was cancelled by the consumer.
    Cancelled,
    /// The endpoint had already reached a terminal state.
    Closed(ClosedStreamError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => fmt::Display::fmt(e, f),
            Self::Aborted(reason) => write!(f, "stream was aborted: {}", reason),
            Self::Cancelled => write!(f, "stream was cancelled by the reader"),
            Self::Closed(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl error::Error for StreamError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Closed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for StreamError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<ClosedStreamError> for StreamError {
    fn from(value: ClosedStreamError) -> Self {
        Self::Closed(value)
    }
}
