//! Drives a decoder from a byte source.
//!
//! [`decode_source`] pumps a source through a decoder on the calling thread.
//! [`spawn_decoder`] runs the same loop on a dedicated thread and forwards
//! events over a channel, so rendering never stalls ingestion.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decoder::{Decoder, DecoderStats};
use crate::event::Event;
use crate::pixel::PixelFormat;
use crate::source::{ByteSource, DEFAULT_CHUNK_SIZE, SourceError};

/// Current summary schema version.
pub const SUMMARY_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("failed to start decoder thread: {0}")]
    Spawn(std::io::Error),
    #[error("decoder thread panicked")]
    WorkerPanicked,
}

/// Outcome of decoding one stream.
///
/// # Examples
/// ```
/// use linecap_core::{Decoder, StreamSummary};
///
/// let mut decoder = Decoder::new();
/// decoder.push_slice(&[0x00, 0x01, 0x00, 0x04, 0x00, 0x02, 0x00, 0x00]);
/// let summary = StreamSummary::from_decoder(&decoder);
/// assert_eq!(summary.stats.frames_started, 1);
/// assert_eq!(summary.pending_bytes, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Summary schema version (not the binary version).
    pub summary_version: u32,
    #[serde(flatten)]
    pub stats: DecoderStats,
    /// Bytes of a command or pixel left incomplete when the stream ended.
    pub pending_bytes: usize,
    /// Frame in progress when the stream ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame: Option<FrameInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub frame: u64,
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
    /// Line the cursor was on.
    pub line_index: usize,
}

impl StreamSummary {
    pub fn from_decoder(decoder: &Decoder) -> Self {
        Self {
            summary_version: SUMMARY_VERSION,
            stats: decoder.stats().clone(),
            pending_bytes: decoder.pending().map(|p| p.bytes()).unwrap_or(0),
            last_frame: decoder.frame().map(|frame| FrameInfo {
                frame: decoder.frame_seq(),
                width: frame.width(),
                height: frame.height(),
                format: frame.format(),
                line_index: frame.line_index(),
            }),
        }
    }
}

/// Pump `source` through `decoder` until the stream ends or `sink` breaks.
///
/// The decoder keeps any partial state at the end; the summary reports it as
/// `pending_bytes`.
///
/// # Examples
/// ```
/// use std::ops::ControlFlow;
///
/// use linecap_core::{Decoder, SliceSource, decode_source};
///
/// let bytes = [0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x02];
/// let mut decoder = Decoder::new();
/// let mut events = Vec::new();
/// let summary = decode_source(SliceSource::new(&bytes), &mut decoder, |event| {
///     events.push(event);
///     ControlFlow::Continue(())
/// })?;
/// assert_eq!(events.len(), 2);
/// assert_eq!(summary.stats.lines_completed, 1);
/// # Ok::<(), linecap_core::StreamError>(())
/// ```
pub fn decode_source<S, F>(
    source: S,
    decoder: &mut Decoder,
    sink: F,
) -> Result<StreamSummary, StreamError>
where
    S: ByteSource,
    F: FnMut(Event) -> ControlFlow<()>,
{
    decode_source_until(source, decoder, &AtomicBool::new(false), sink)
}

/// Like [`decode_source`], but also returns once `stop` is set.
///
/// The flag is checked before every read, so a source that keeps reporting
/// "no data yet" still lets the loop exit.
///
/// # Examples
/// ```
/// use std::ops::ControlFlow;
/// use std::sync::atomic::AtomicBool;
///
/// use linecap_core::{Decoder, SliceSource, decode_source_until};
///
/// let stop = AtomicBool::new(true);
/// let mut decoder = Decoder::new();
/// let summary = decode_source_until(SliceSource::new(&[0x00, 0x02]), &mut decoder, &stop, |_| {
///     ControlFlow::Continue(())
/// })?;
/// assert_eq!(summary.stats.bytes_total, 0);
/// # Ok::<(), linecap_core::StreamError>(())
/// ```
pub fn decode_source_until<S, F>(
    mut source: S,
    decoder: &mut Decoder,
    stop: &AtomicBool,
    mut sink: F,
) -> Result<StreamSummary, StreamError>
where
    S: ByteSource,
    F: FnMut(Event) -> ControlFlow<()>,
{
    let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
    'stream: loop {
        if stop.load(Ordering::Relaxed) {
            debug!("decoder stop requested");
            break;
        }
        let Some(len) = source.next_chunk(&mut buf)? else {
            break;
        };
        for &byte in &buf[..len] {
            if let Some(event) = decoder.push(byte) {
                if sink(event).is_break() {
                    debug!("event consumer stopped the stream");
                    break 'stream;
                }
            }
        }
    }
    Ok(StreamSummary::from_decoder(decoder))
}

/// Decoder running on its own thread.
pub struct DecoderHandle {
    events: Receiver<Event>,
    stop: Arc<AtomicBool>,
    worker: JoinHandle<Result<StreamSummary, StreamError>>,
}

impl DecoderHandle {
    /// Events in parse order. The channel closes when the stream ends.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Ask the decoder thread to finish after its current read.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stop consuming and wait for the decoder thread.
    ///
    /// Events not yet received are dropped. The thread exits after its
    /// current read returns, so a source with a read timeout never holds it;
    /// a source that blocks forever does.
    pub fn join(self) -> Result<StreamSummary, StreamError> {
        let Self {
            events,
            stop,
            worker,
        } = self;
        stop.store(true, Ordering::Relaxed);
        drop(events);
        worker.join().map_err(|_| StreamError::WorkerPanicked)?
    }
}

/// Start a fresh decoder on a dedicated thread reading from `source`.
///
/// # Examples
/// ```
/// use linecap_core::{ReaderSource, spawn_decoder};
///
/// let bytes = vec![0x00, 0x01, 0x00, 0x0A, 0x00, 0x08, 0x00];
/// let handle = spawn_decoder(ReaderSource::new(std::io::Cursor::new(bytes)))?;
/// let events: Vec<_> = handle.events().iter().collect();
/// assert_eq!(events.len(), 1);
/// let summary = handle.join()?;
/// assert_eq!(summary.stats.frames_started, 1);
/// # Ok::<(), linecap_core::StreamError>(())
/// ```
pub fn spawn_decoder<S>(source: S) -> Result<DecoderHandle, StreamError>
where
    S: ByteSource + Send + 'static,
{
    let (tx, events) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);
    let worker = thread::Builder::new()
        .name("linecap-decoder".to_string())
        .spawn(move || {
            let mut decoder = Decoder::new();
            decode_source_until(source, &mut decoder, &worker_stop, |event| {
                match tx.send(event) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            })
        })
        .map_err(StreamError::Spawn)?;
    Ok(DecoderHandle {
        events,
        stop,
        worker,
    })
}
