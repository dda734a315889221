use encoding_rs::Encoding;

use super::ConfigurationError;

/// The label used when the caller does not name an encoding.
pub const DEFAULT_LABEL: &str = "utf-8";

/// The default number of decoded chunks the readable side may buffer before writes stop being
/// acknowledged.
pub const DEFAULT_HIGH_WATER_MARK: usize = 1;

/// The largest high-water mark a stream can be built with; larger values are clamped to it.
pub const MAX_HIGH_WATER_MARK: usize = (usize::MAX >> 2) - 1;

/// Construction options for a decoder, applied on top of an encoding label.
///
/// ```rust
/// use encoding_rs_stream::DecoderOptions;
///
/// let options = DecoderOptions::new().fatal(true).high_water_mark(4);
/// assert!(options.is_fatal());
/// assert!(!options.is_ignore_bom());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
    fatal: bool,
    ignore_bom: bool,
    high_water_mark: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            fatal: false,
            ignore_bom: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

impl DecoderOptions {
    /// Creates the default options: replacement mode, BOM stripping, and a high-water mark of
    /// one chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes malformed input an error instead of replacing it with U+FFFD.
    pub fn fatal(mut self, fatal: bool) -> Self {
        self.fatal = fatal;
        self
    }

    /// Keeps a leading byte-order mark in the output instead of stripping it.
    pub fn ignore_bom(mut self, ignore_bom: bool) -> Self {
        self.ignore_bom = ignore_bom;
        self
    }

    /// Sets how many decoded chunks the readable side may hold before writes wait for the reader.
    ///
    /// Zero means every write waits until its output (if any) has been read. Values above
    /// [`MAX_HIGH_WATER_MARK`] are clamped to it.
    pub fn high_water_mark(mut self, chunks: usize) -> Self {
        self.high_water_mark = chunks.min(MAX_HIGH_WATER_MARK);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn is_ignore_bom(&self) -> bool {
        self.ignore_bom
    }

    pub fn get_high_water_mark(&self) -> usize {
        self.high_water_mark
    }
}

/// A resolved, immutable decoder configuration.
///
/// Creating a `DecoderConfig` is the single point where an encoding label is validated; every
/// decoder and stream built from it is guaranteed a supported encoding.
///
/// # Examples
///
/// ```rust
/// use encoding_rs_stream::{DecoderConfig, DecoderOptions};
///
/// let config = DecoderConfig::new(" Latin1 ", DecoderOptions::new())?;
/// assert_eq!(config.encoding(), "windows-1252");
/// assert_eq!(config.charset(), encoding_rs::WINDOWS_1252);
///
/// assert!(DecoderConfig::new("replacement", DecoderOptions::new()).is_err());
/// # Ok::<(), encoding_rs_stream::ConfigurationError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    charset: &'static Encoding,
    name: String,
    options: DecoderOptions,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::from_encoding(encoding_rs::UTF_8, DecoderOptions::default())
    }
}

impl DecoderConfig {
    /// Resolves `label` and combines it with `options`.
    pub fn new(label: &str, options: DecoderOptions) -> Result<Self, ConfigurationError> {
        let charset = resolve_label(label)?;
        Ok(Self::from_encoding(charset, options))
    }

    /// Builds a configuration for an already resolved encoding.
    ///
    /// The `replacement` encoding has no decoder behavior worth streaming and is rejected by
    /// [`DecoderConfig::new`]; passing it here yields a decoder that emits one U+FFFD for any
    /// non-empty input.
    pub fn from_encoding(charset: &'static Encoding, options: DecoderOptions) -> Self {
        Self {
            charset,
            name: charset.name().to_ascii_lowercase(),
            options,
        }
    }

    /// Returns the canonical lowercase name of the resolved encoding, e.g. `"utf-8"`.
    #[inline]
    pub fn encoding(&self) -> &str {
        &self.name
    }

    /// Returns the resolved `encoding_rs` encoding.
    #[inline]
    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    #[inline]
    pub fn fatal(&self) -> bool {
        self.options.fatal
    }

    #[inline]
    pub fn ignore_bom(&self) -> bool {
        self.options.ignore_bom
    }

    #[inline]
    pub fn high_water_mark(&self) -> usize {
        self.options.high_water_mark
    }

    /// Returns the options this configuration was built with.
    #[inline]
    pub fn options(&self) -> DecoderOptions {
        self.options
    }
}

/// Resolves a WHATWG encoding label, case-insensitively and ignoring surrounding ASCII
/// whitespace.
pub fn resolve_label(label: &str) -> Result<&'static Encoding, ConfigurationError> {
    Encoding::for_label_no_replacement(label.as_bytes())
        .ok_or_else(|| ConfigurationError::new(label))
}
