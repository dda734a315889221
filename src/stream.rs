use std::{
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use futures::{channel::mpsc, future, ready, stream::FusedStream, Sink, Stream, StreamExt as _};

use super::{
    ClosedStreamError, ConfigurationError, DecoderConfig, DecoderOptions, StreamError, TextDecoder,
};

/// The life-cycle state of a [`TextDecoderStream`] pair.
///
/// A pair starts `Idle`, becomes `Active` on the first write or read, and ends in exactly one of
/// the three terminal states, which it never leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Active,
    /// The writable side was closed and the decoder flushed successfully.
    Closed,
    /// A fatal decode error or an abort terminated the pair.
    Errored,
    /// The readable side was cancelled or dropped.
    Cancelled,
}

impl StreamState {
    /// Returns `true` if the state is `Closed`, `Errored`, or `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored | Self::Cancelled)
    }
}

/// A transform stream that decodes the byte chunks written to its writable side into text chunks
/// read from its readable side.
///
/// The writable side owns a [`TextDecoder`] and runs every accepted chunk through it; non-empty
/// results are queued for the readable side. Once the readable side holds more than the
/// configured high-water mark of chunks, writes are not acknowledged until the reader catches
/// up. Closing the writable side flushes the decoder and ends the readable side after the last
/// chunk; aborting it or hitting a fatal decode error errors the readable side instead, and
/// cancelling the readable side makes every pending and future write fail.
///
/// The two endpoints implement [`Sink`] and [`Stream`] and may be split off with
/// [`into_split`](TextDecoderStream::into_split) to be driven from different tasks.
///
/// # Examples
///
/// ```rust
/// use encoding_rs_stream::TextDecoderStream;
///
/// # futures::executor::block_on(async {
/// let mut stream = TextDecoderStream::new("shift_jis")?;
///
/// stream.writable().write([0x93, 0xfa]).await?;
/// assert_eq!(stream.readable().read().await?, Some("日".to_owned()));
///
/// stream.writable().write([0x96]).await?;
/// stream.writable().write([0x7b]).await?;
/// stream.writable().close().await?;
/// assert_eq!(stream.readable().read().await?, Some("本".to_owned()));
/// assert_eq!(stream.readable().read().await?, None);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct TextDecoderStream {
    config: DecoderConfig,
    writable: DecoderWritable,
    readable: DecoderReadable,
}

impl TextDecoderStream {
    /// Creates a new stream pair for `label` with the default options.
    pub fn new(label: &str) -> Result<Self, ConfigurationError> {
        Self::with_options(label, DecoderOptions::default())
    }

    /// Creates a new stream pair for `label` with the specified options.
    pub fn with_options(label: &str, options: DecoderOptions) -> Result<Self, ConfigurationError> {
        DecoderConfig::new(label, options).map(Self::from_config)
    }

    /// Creates a new stream pair from a resolved configuration.
    pub fn from_config(config: DecoderConfig) -> Self {
        // a sender is parked once the queue holds more than `buffer` messages
        let (tx, rx) = mpsc::channel(config.high_water_mark());
        let shared = Arc::new(Shared::new(config.charset().name()));
        tracing::debug!(
            encoding = config.encoding(),
            fatal = config.fatal(),
            ignore_bom = config.ignore_bom(),
            high_water_mark = config.high_water_mark(),
            "created text decoder stream"
        );
        Self {
            writable: DecoderWritable {
                decoder: Some(TextDecoder::new(&config)),
                staged: None,
                closing: false,
                tx,
                shared: Arc::clone(&shared),
            },
            readable: DecoderReadable {
                rx,
                shared,
                finished: false,
            },
            config,
        }
    }

    /// Returns the canonical lowercase name of the encoding, e.g. `"utf-8"`.
    pub fn encoding(&self) -> &str {
        self.config.encoding()
    }

    pub fn fatal(&self) -> bool {
        self.config.fatal()
    }

    pub fn ignore_bom(&self) -> bool {
        self.config.ignore_bom()
    }

    pub fn high_water_mark(&self) -> usize {
        self.config.high_water_mark()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn state(&self) -> StreamState {
        self.readable.shared.state()
    }

    /// Returns the writable side, which accepts byte chunks.
    pub fn writable(&mut self) -> &mut DecoderWritable {
        &mut self.writable
    }

    /// Returns the readable side, which yields decoded text chunks.
    pub fn readable(&mut self) -> &mut DecoderReadable {
        &mut self.readable
    }

    /// Separates the pair into its writable and readable sides.
    pub fn into_split(self) -> (DecoderWritable, DecoderReadable) {
        (self.writable, self.readable)
    }
}

/// The writable side of a [`TextDecoderStream`].
///
/// Dropping this value before closing it aborts the pair.
#[derive(Debug)]
pub struct DecoderWritable {
    /// `None` once the decoder has been flushed or discarded.
    decoder: Option<TextDecoder>,
    /// Decoded text accepted by `start_send` but not yet handed over to the channel.
    staged: Option<String>,
    closing: bool,
    tx: mpsc::Sender<String>,
    shared: Arc<Shared>,
}

impl DecoderWritable {
    /// Decodes a chunk and queues the resulting text, waiting while the readable side is above
    /// its high-water mark.
    ///
    /// Fails with [`StreamError::Decode`] on malformed input in fatal mode, with
    /// [`StreamError::Cancelled`] once the readable side has been cancelled, and with
    /// [`StreamError::Closed`] after any other terminal state.
    pub async fn write(&mut self, chunk: impl AsRef<[u8]>) -> Result<(), StreamError> {
        future::poll_fn(|cx| self.poll_write_ready(cx)).await?;
        self.start_write(chunk.as_ref())?;
        future::poll_fn(|cx| self.poll_write_flush(cx)).await
    }

    /// Flushes the decoder, queues any trailing text, and ends the readable side.
    pub async fn close(&mut self) -> Result<(), StreamError> {
        future::poll_fn(|cx| self.poll_close_inner(cx)).await
    }

    /// Discards the decoder without flushing it and errors the readable side with `reason`.
    pub fn abort(&mut self, reason: impl Into<String>) -> Result<(), StreamError> {
        self.check_open()?;
        self.fail(StreamError::Aborted(reason.into()));
        Ok(())
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    fn check_open(&mut self) -> Result<(), StreamError> {
        match self.shared.state() {
            StreamState::Cancelled => Err(self.release(StreamError::Cancelled)),
            s if s.is_terminal() => Err(self.release(ClosedStreamError::new().into())),
            _ if self.closing => Err(ClosedStreamError::new().into()),
            _ => Ok(()),
        }
    }

    fn poll_write_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), StreamError>> {
        self.check_open()?;
        ready!(self.poll_push_staged(cx))?;
        self.poll_channel_ready(cx)
    }

    fn start_write(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.check_open()?;
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(ClosedStreamError::new().into());
        };
        self.shared.activate();
        match decoder.decode(chunk) {
            Ok(text) => {
                self.stage(text);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn poll_write_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), StreamError>> {
        self.check_open()?;
        ready!(self.poll_push_staged(cx))?;
        // the write is acknowledged once the queue is back at or below the high-water mark
        self.poll_channel_ready(cx)
    }

    fn poll_close_inner(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), StreamError>> {
        if !self.closing {
            self.check_open()?;
            self.closing = true;
            if let Some(decoder) = self.decoder.take() {
                match decoder.flush() {
                    Ok(tail) => self.stage(tail),
                    Err(e) => return Poll::Ready(Err(self.fail(e.into()))),
                }
            }
        } else {
            match self.shared.state() {
                StreamState::Cancelled => return Poll::Ready(Err(StreamError::Cancelled)),
                s if s.is_terminal() => return Poll::Ready(Err(ClosedStreamError::new().into())),
                _ => {}
            }
        }

        ready!(self.poll_push_staged(cx))?;
        self.tx.close_channel();
        self.shared.terminate(Status::Closed);
        Poll::Ready(Ok(()))
    }

    fn stage(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        match &mut self.staged {
            // only reachable when `start_send` is called twice without `poll_ready`
            Some(staged) => staged.push_str(&text),
            None => self.staged = Some(text),
        }
    }

    /// Moves the staged text into the channel, waiting for a free slot.
    fn poll_push_staged(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), StreamError>> {
        while let Some(text) = self.staged.take() {
            match self.tx.poll_ready(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(_)) => return Poll::Ready(Err(self.disconnected())),
                Poll::Pending => {
                    self.staged = Some(text);
                    return Poll::Pending;
                }
            }
            if let Err(e) = self.tx.try_send(text) {
                if e.is_disconnected() {
                    return Poll::Ready(Err(self.disconnected()));
                }
                self.staged = Some(e.into_inner());
            }
        }
        Poll::Ready(Ok(()))
    }

    fn poll_channel_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), StreamError>> {
        match ready!(self.tx.poll_ready(cx)) {
            Ok(()) => Poll::Ready(Ok(())),
            Err(_) => Poll::Ready(Err(self.disconnected())),
        }
    }

    /// Handles the receiver having gone away.
    fn disconnected(&mut self) -> StreamError {
        self.shared.terminate(Status::Cancelled);
        self.release(StreamError::Cancelled)
    }

    /// Moves the pair into the errored state and ends the readable side.
    fn fail(&mut self, error: StreamError) -> StreamError {
        self.shared.terminate(Status::Errored(error.clone()));
        self.tx.close_channel();
        self.release(error)
    }

    fn release(&mut self, error: StreamError) -> StreamError {
        self.decoder = None;
        self.staged = None;
        error
    }
}

impl<B: AsRef<[u8]>> Sink<B> for DecoderWritable {
    type Error = StreamError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut().poll_write_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: B) -> Result<(), Self::Error> {
        self.get_mut().start_write(item.as_ref())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut().poll_write_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut().poll_close_inner(cx)
    }
}

impl Drop for DecoderWritable {
    fn drop(&mut self) {
        if !self.shared.state().is_terminal() {
            self.fail(StreamError::Aborted("writable side dropped".to_owned()));
        }
    }
}

/// The readable side of a [`TextDecoderStream`].
///
/// Dropping this value before reaching the end of the stream cancels the pair.
#[derive(Debug)]
pub struct DecoderReadable {
    rx: mpsc::Receiver<String>,
    shared: Arc<Shared>,
    /// `true` once end-of-stream, an error, or a cancellation has been observed.
    finished: bool,
}

impl DecoderReadable {
    /// Waits for the next decoded chunk, returning `None` at the end of the stream.
    ///
    /// An error from the writable side is reported once; every call after the end of the stream
    /// or an error fails with [`StreamError::Closed`].
    pub async fn read(&mut self) -> Result<Option<String>, StreamError> {
        future::poll_fn(|cx| self.poll_read(cx)).await
    }

    /// Stops reading, discards any queued text, and makes the writable side fail.
    ///
    /// Fails if the pair has already ended: with the writable side's error if it has not been
    /// read yet, or with [`StreamError::Closed`] otherwise. Text queued before a close stays
    /// readable in that case.
    pub fn cancel(&mut self) -> Result<(), StreamError> {
        if self.finished {
            return Err(ClosedStreamError::new().into());
        }
        if let Err(e) = self.shared.try_terminate(Status::Cancelled) {
            // the pending error is reported here instead of by the next read
            if !matches!(e, StreamError::Closed(_)) {
                self.finish();
            }
            return Err(e);
        }
        self.finish();
        while self.rx.try_recv().is_ok() {}
        Ok(())
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    fn poll_read(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<String>, StreamError>> {
        if self.finished {
            return Poll::Ready(Err(ClosedStreamError::new().into()));
        }
        // an error discards whatever is still queued
        if let Some(e) = self.shared.error() {
            self.finish();
            return Poll::Ready(Err(e));
        }
        self.shared.activate();
        match ready!(self.rx.poll_next_unpin(cx)) {
            Some(text) => Poll::Ready(Ok(Some(text))),
            None => {
                self.finish();
                Poll::Ready(self.shared.error().map_or(Ok(None), Err))
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.rx.close();
    }
}

impl Stream for DecoderReadable {
    type Item = Result<String, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        this.poll_read(cx).map(Result::transpose)
    }
}

impl FusedStream for DecoderReadable {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl Drop for DecoderReadable {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.terminate(Status::Cancelled);
        }
    }
}

/// The state shared by the two sides of a pair.
#[derive(Debug)]
struct Shared {
    encoding: &'static str,
    status: Mutex<Status>,
}

#[derive(Debug)]
enum Status {
    Idle,
    Active,
    Closed,
    Errored(StreamError),
    Cancelled,
}

impl Shared {
    fn new(encoding: &'static str) -> Self {
        Self {
            encoding,
            status: Mutex::new(Status::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> StreamState {
        match *self.lock() {
            Status::Idle => StreamState::Idle,
            Status::Active => StreamState::Active,
            Status::Closed => StreamState::Closed,
            Status::Errored(_) => StreamState::Errored,
            Status::Cancelled => StreamState::Cancelled,
        }
    }

    fn error(&self) -> Option<StreamError> {
        match &*self.lock() {
            Status::Errored(e) => Some(e.clone()),
            _ => None,
        }
    }

    fn activate(&self) {
        let mut status = self.lock();
        if let Status::Idle = *status {
            *status = Status::Active;
        }
    }

    /// Enters a terminal state unless one has already been reached.
    fn terminate(&self, next: Status) {
        let _ = self.try_terminate(next);
    }

    /// Enters a terminal state, or returns the error an operation on the ended pair fails with.
    fn try_terminate(&self, next: Status) -> Result<(), StreamError> {
        let mut status = self.lock();
        match &*status {
            Status::Idle | Status::Active => {}
            Status::Errored(e) => return Err(e.clone()),
            Status::Closed | Status::Cancelled => return Err(ClosedStreamError::new().into()),
        }
        match &next {
            Status::Errored(e) => {
                tracing::debug!(encoding = self.encoding, error = %e, "text decoder stream errored")
            }
            Status::Closed => tracing::debug!(encoding = self.encoding, "text decoder stream closed"),
            Status::Cancelled => {
                tracing::debug!(encoding = self.encoding, "text decoder stream cancelled")
            }
            Status::Idle | Status::Active => debug_assert!(false, "not a terminal state"),
        }
        *status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::{executor::block_on, join, pin_mut, poll, stream, SinkExt, StreamExt as _};

    use super::{DecoderOptions, StreamError, StreamState, TextDecoderStream};

    fn pair(label: &str, options: DecoderOptions) -> TextDecoderStream {
        TextDecoderStream::with_options(label, options).unwrap()
    }

    #[test]
    fn exposes_configuration() {
        let s = pair("UTF-16", DecoderOptions::new().fatal(true).high_water_mark(3));
        assert_eq!(s.encoding(), "utf-16le");
        assert!(s.fatal());
        assert!(!s.ignore_bom());
        assert_eq!(s.high_water_mark(), 3);
        assert_eq!(s.state(), StreamState::Idle);

        let err = TextDecoderStream::new("utf-7").unwrap_err();
        assert_eq!(err.label(), "utf-7");
    }

    #[test]
    fn split_character_is_emitted_once_complete() {
        block_on(async {
            let mut s = pair("utf-8", DecoderOptions::new());
            s.writable().write([0xe2, 0x82]).await.unwrap();
            assert_eq!(s.state(), StreamState::Active);
            s.writable().write([0xac]).await.unwrap();
            s.writable().close().await.unwrap();
            assert_eq!(s.state(), StreamState::Closed);

            assert_eq!(s.readable().read().await.unwrap().as_deref(), Some("€"));
            assert_eq!(s.readable().read().await.unwrap(), None);
            assert!(matches!(s.readable().read().await, Err(StreamError::Closed(_))));
            assert!(matches!(
                s.writable().write(b"x").await,
                Err(StreamError::Closed(_))
            ));
            assert!(matches!(
                s.writable().close().await,
                Err(StreamError::Closed(_))
            ));
        });
    }

    #[test]
    fn close_emits_trailing_replacement() {
        block_on(async {
            let mut s = pair("utf-8", DecoderOptions::new().high_water_mark(4));
            s.writable().write([b'x', 0xe2]).await.unwrap();
            s.writable().close().await.unwrap();

            let (_, readable) = s.into_split();
            let chunks: Vec<_> = readable.collect().await;
            assert_eq!(chunks, vec![Ok("x".to_owned()), Ok("\u{fffd}".to_owned())]);
        });
    }

    #[test]
    fn writes_wait_above_high_water_mark() {
        block_on(async {
            let (mut w, mut r) =
                pair("utf-8", DecoderOptions::new().high_water_mark(1)).into_split();

            w.write(b"a").await.unwrap();
            {
                let write = w.write(b"b");
                pin_mut!(write);
                assert!(poll!(write.as_mut()).is_pending());
                assert_eq!(r.read().await.unwrap().as_deref(), Some("a"));
                assert!(write.await.is_ok());
            }
            // chunks that only carry over bytes never occupy the queue
            w.write([0xe2]).await.unwrap();
            w.write([0x82]).await.unwrap();
            assert_eq!(r.read().await.unwrap().as_deref(), Some("b"));
        });
    }

    #[test]
    fn zero_high_water_mark_waits_for_every_chunk() {
        block_on(async {
            let (mut w, mut r) =
                pair("utf-8", DecoderOptions::new().high_water_mark(0)).into_split();

            let write = w.write(b"a");
            pin_mut!(write);
            assert!(poll!(write.as_mut()).is_pending());
            assert_eq!(r.read().await.unwrap().as_deref(), Some("a"));
            assert!(write.await.is_ok());
        });
    }

    #[test]
    fn cancel_fails_pending_and_later_writes() {
        block_on(async {
            let (mut w, mut r) =
                pair("utf-8", DecoderOptions::new().high_water_mark(0)).into_split();

            {
                let write = w.write(b"a");
                pin_mut!(write);
                assert!(poll!(write.as_mut()).is_pending());
                r.cancel().unwrap();
                assert_eq!(write.await, Err(StreamError::Cancelled));
            }
            assert_eq!(w.state(), StreamState::Cancelled);
            assert_eq!(w.write(b"b").await, Err(StreamError::Cancelled));
            assert_eq!(w.close().await, Err(StreamError::Cancelled));
            assert_eq!(w.abort("late"), Err(StreamError::Cancelled));

            assert!(matches!(r.read().await, Err(StreamError::Closed(_))));
            assert!(matches!(r.cancel(), Err(StreamError::Closed(_))));
        });
    }

    #[test]
    fn fatal_decode_error_errors_both_sides() {
        block_on(async {
            let (mut w, mut r) = pair("utf-8", DecoderOptions::new().fatal(true)).into_split();

            w.write(b"a").await.unwrap();
            let err = match w.write([0xff]).await {
                Err(StreamError::Decode(e)) => e,
                ret => panic!("assertion failed: {:?}", ret),
            };
            assert_eq!(err.offset(), 1);
            assert_eq!(w.state(), StreamState::Errored);

            // the queued "a" is discarded along with the decoder
            assert_eq!(r.read().await, Err(StreamError::Decode(err)));
            assert!(matches!(r.read().await, Err(StreamError::Closed(_))));
            assert!(matches!(w.write(b"b").await, Err(StreamError::Closed(_))));
        });
    }

    #[test]
    fn fatal_flush_error_errors_readable_side() {
        block_on(async {
            let (mut w, mut r) = pair("utf-8", DecoderOptions::new().fatal(true)).into_split();

            w.write([b'o', b'k', 0xe2, 0x82]).await.unwrap();
            let err = match w.close().await {
                Err(StreamError::Decode(e)) => e,
                ret => panic!("assertion failed: {:?}", ret),
            };
            assert_eq!((err.offset(), err.malformed_len()), (2, 2));
            assert_eq!(r.read().await, Err(StreamError::Decode(err)));
            assert_eq!(r.state(), StreamState::Errored);
        });
    }

    #[test]
    fn abort_errors_readable_side() {
        block_on(async {
            let (mut w, mut r) = pair("utf-8", DecoderOptions::new()).into_split();

            w.write(b"abc").await.unwrap();
            w.abort("upstream failed").unwrap();
            assert_eq!(
                r.read().await,
                Err(StreamError::Aborted("upstream failed".to_owned()))
            );
            assert!(matches!(w.abort("again"), Err(StreamError::Closed(_))));
            assert!(matches!(w.write(b"d").await, Err(StreamError::Closed(_))));
        });
    }

    #[test]
    fn dropping_one_side_terminates_the_other() {
        block_on(async {
            let (w, mut r) = pair("utf-8", DecoderOptions::new()).into_split();
            drop(w);
            assert!(matches!(r.read().await, Err(StreamError::Aborted(_))));

            let (mut w, r) = pair("utf-8", DecoderOptions::new()).into_split();
            drop(r);
            assert_eq!(w.write(b"a").await, Err(StreamError::Cancelled));
            assert_eq!(w.state(), StreamState::Cancelled);
        });
    }

    #[test]
    fn first_read_pull_activates_the_pair() {
        block_on(async {
            let mut s = pair("utf-8", DecoderOptions::new());
            {
                let read = s.readable().read();
                pin_mut!(read);
                assert!(poll!(read.as_mut()).is_pending());
            }
            assert_eq!(s.state(), StreamState::Active);
        });
    }

    #[test]
    fn composes_with_sink_and_stream_combinators() {
        let text = "Hello, 世界! ¿Qué tal? 😂";
        let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();

        block_on(async {
            let (w, r) = pair("utf-16be", DecoderOptions::new().fatal(true)).into_split();
            let chunks =
                stream::iter(bytes.chunks(3).map(<[u8]>::to_vec)).map(Ok::<_, StreamError>);
            let (sent, received) = join!(chunks.forward(w), r.collect::<Vec<_>>());
            sent.unwrap();
            let decoded: Result<String, _> = received.into_iter().collect();
            assert_eq!(decoded.unwrap(), text);
        });
    }

    #[test]
    fn sink_feed_then_close() {
        block_on(async {
            let (mut w, r) =
                pair("windows-1252", DecoderOptions::new().high_water_mark(8)).into_split();
            w.feed(&b"caf"[..]).await.unwrap();
            w.feed(&[0xe9][..]).await.unwrap();
            SinkExt::<&[u8]>::close(&mut w).await.unwrap();
            let received: Vec<_> = r.collect().await;
            assert_eq!(received, vec![Ok("caf".to_owned()), Ok("é".to_owned())]);
        });
    }

    #[test]
    fn cancel_after_the_pair_ended_fails() {
        block_on(async {
            let (mut w, mut r) = pair("utf-8", DecoderOptions::new().fatal(true)).into_split();
            let err = match w.write([0xff]).await {
                Err(StreamError::Decode(e)) => e,
                ret => panic!("assertion failed: {:?}", ret),
            };
            assert_eq!(r.cancel(), Err(StreamError::Decode(err)));
            assert_eq!(r.state(), StreamState::Errored);
            assert!(matches!(r.read().await, Err(StreamError::Closed(_))));

            let (mut w, mut r) = pair("utf-8", DecoderOptions::new()).into_split();
            w.write(b"abc").await.unwrap();
            w.close().await.unwrap();
            assert!(matches!(r.cancel(), Err(StreamError::Closed(_))));
            assert_eq!(r.state(), StreamState::Closed);
            assert_eq!(r.read().await.unwrap().as_deref(), Some("abc"));
            assert_eq!(r.read().await.unwrap(), None);
        });
    }

    #[test]
    fn oversized_high_water_mark_builds_a_pair() {
        block_on(async {
            let mut s = pair("utf-8", DecoderOptions::new().high_water_mark(usize::MAX));
            assert_eq!(s.high_water_mark(), crate::MAX_HIGH_WATER_MARK);
            for chunk in ["a", "b", "c"] {
                s.writable().write(chunk).await.unwrap();
            }
            s.writable().close().await.unwrap();
            let (_, readable) = s.into_split();
            let received: Vec<_> = readable.collect().await;
            assert_eq!(received.len(), 3);
        });
    }
}
