// Encode/decode orchestration.
//
// Encode: compress -> header -> FEC -> layout.
// Decode: unlayout -> FEC (first codeword) -> header -> FEC (rest) ->
// decompress -> length check.
//
// The header travels inside the first codeword, so decode corrects that
// block on its own before it knows how many codewords follow.

use crate::compress::{self, CompressOptions};
use crate::error::{Error, Result};
use crate::fec::{self, CODEWORD_LEN, FecOutput};
use crate::matrix::{self, LayoutError, Matrix, ModuleDepth, Point};
use crate::metadata::{ContentType, HEADER_LEN, MetadataHeader};

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compress,
    Fec,
    Layout,
    Unlayout,
    Header,
    Decompress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// Stages finished so far, this one included.
    pub completed: usize,
    pub total: usize,
}

/// Receives one event per finished stage.
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

struct Tracker<'a> {
    sink: &'a mut dyn ProgressSink,
    completed: usize,
    total: usize,
}

impl<'a> Tracker<'a> {
    fn new(sink: &'a mut dyn ProgressSink, total: usize) -> Self {
        Self {
            sink,
            completed: 0,
            total,
        }
    }

    fn done(&mut self, stage: Stage) {
        self.completed += 1;
        self.sink.report(ProgressEvent {
            stage,
            completed: self.completed,
            total: self.total,
        });
    }
}

// ---------------------------------------------------------------------------
// Options / results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Matrix side; `None` picks the smallest that fits.
    pub side: Option<usize>,
    pub depth: ModuleDepth,
    pub compress: CompressOptions,
    /// Header timestamp; `None` uses the current time.
    pub timestamp: Option<u32>,
    /// Header id; `None` draws a random one.
    pub id: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Decode an unrecognised content type code as binary instead of
    /// failing with `UnknownContentType`.
    pub unknown_type_as_binary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeStats {
    pub original_size: usize,
    pub compressed_size: usize,
    /// FEC codewords emitted.
    pub codewords: usize,
    /// Codeword stream length in bytes.
    pub stream_size: usize,
    pub side: usize,
    /// Stream bytes the matrix could hold.
    pub capacity: usize,
}

#[derive(Debug, Clone)]
pub struct Encoded {
    pub matrix: Matrix,
    pub header: MetadataHeader,
    pub stats: EncodeStats,
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub payload: Vec<u8>,
    pub content_type: ContentType,
    /// Symbol errors repaired by FEC across all codewords.
    pub corrected_errors: usize,
    pub header: MetadataHeader,
}

/// A payload turned into its FEC-protected byte stream.
#[derive(Debug, Clone)]
pub struct Codewords {
    pub stream: Vec<u8>,
    pub header: MetadataHeader,
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode into a matrix of exactly `matrix_side` modules per edge.
pub fn encode(payload: &[u8], content_type: ContentType, matrix_side: usize) -> Result<Matrix> {
    let opts = EncodeOptions {
        side: Some(matrix_side),
        ..EncodeOptions::default()
    };
    Ok(encode_with(payload, content_type, &opts, &mut NoProgress)?.matrix)
}

/// Encode into the smallest matrix that holds the payload.
pub fn encode_auto(payload: &[u8], content_type: ContentType) -> Result<Matrix> {
    Ok(encode_with(payload, content_type, &EncodeOptions::default(), &mut NoProgress)?.matrix)
}

pub fn encode_with(
    payload: &[u8],
    content_type: ContentType,
    opts: &EncodeOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Encoded> {
    if let Some(side) = opts.side {
        validate_side(side)?;
    }
    let mut tracker = Tracker::new(progress, 3);
    let Codewords { stream, header } = build_codewords(payload, content_type, opts, &mut tracker)?;

    let depth = opts.depth.validated()?;
    let matrix = match opts.side {
        Some(side) => matrix::layout_with_side(&stream, side, depth)?,
        None => matrix::layout(&stream, depth)?,
    };
    tracker.done(Stage::Layout);

    let side = matrix.side();
    let stats = EncodeStats {
        original_size: payload.len(),
        compressed_size: header.compressed_size as usize,
        codewords: stream.len() / CODEWORD_LEN,
        stream_size: stream.len(),
        side,
        capacity: matrix::capacity(side, depth),
    };
    log::debug!("encode: {stats:?}");
    Ok(Encoded {
        matrix,
        header,
        stats,
    })
}

/// Compress, frame and FEC-encode a payload without laying it out.
pub fn encode_codewords(
    payload: &[u8],
    content_type: ContentType,
    opts: &EncodeOptions,
) -> Result<Codewords> {
    let mut sink = NoProgress;
    let mut tracker = Tracker::new(&mut sink, 2);
    build_codewords(payload, content_type, opts, &mut tracker)
}

fn build_codewords(
    payload: &[u8],
    content_type: ContentType,
    opts: &EncodeOptions,
    tracker: &mut Tracker<'_>,
) -> Result<Codewords> {
    let compressed = compress::compress_with_options(payload, content_type, &opts.compress);
    tracker.done(Stage::Compress);

    let mut header = MetadataHeader::new(content_type, payload.len(), compressed.len())?;
    if let Some(timestamp) = opts.timestamp {
        header.timestamp = timestamp;
    }
    if let Some(id) = opts.id {
        header.id = id;
    }

    let mut framed = Vec::with_capacity(HEADER_LEN + compressed.len());
    framed.extend_from_slice(&header.to_bytes());
    framed.extend_from_slice(&compressed);
    let stream = fec::encode(&framed);
    tracker.done(Stage::Fec);

    Ok(Codewords { stream, header })
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode a matrix given the finder centres located on its rendering.
pub fn decode(matrix: &Matrix, corners: &[Point]) -> Result<Decoded> {
    decode_with(matrix, corners, &DecodeOptions::default(), &mut NoProgress)
}

pub fn decode_with(
    matrix: &Matrix,
    corners: &[Point],
    opts: &DecodeOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Decoded> {
    let mut tracker = Tracker::new(progress, 4);
    let stream = matrix::unlayout(matrix, corners)?;
    tracker.done(Stage::Unlayout);
    recover(&stream, opts, &mut tracker)
}

/// Decode a raw codeword stream. Bytes past the codewords the header
/// declares are ignored.
pub fn decode_codewords(stream: &[u8], opts: &DecodeOptions) -> Result<Decoded> {
    let mut sink = NoProgress;
    let mut tracker = Tracker::new(&mut sink, 3);
    recover(stream, opts, &mut tracker)
}

/// Correct the first codeword and parse the header it carries.
fn decode_head(stream: &[u8], opts: &DecodeOptions) -> Result<(FecOutput, MetadataHeader)> {
    let first = stream
        .get(..CODEWORD_LEN)
        .ok_or(Error::CodewordStreamTruncated {
            needed: CODEWORD_LEN,
            available: stream.len(),
        })?;
    let head = fec::decode(first)?;
    if head.uncorrectable {
        return Err(Error::UncorrectableBlock {
            blocks: vec![0],
            corrected_errors: 0,
        });
    }
    let header = if opts.unknown_type_as_binary {
        MetadataHeader::decode_lenient(&head.data)?.0
    } else {
        MetadataHeader::decode(&head.data)?
    };
    Ok((head, header))
}

fn recover(stream: &[u8], opts: &DecodeOptions, tracker: &mut Tracker<'_>) -> Result<Decoded> {
    let (head, header) = decode_head(stream, opts)?;
    tracker.done(Stage::Header);

    let framed_len = header.framed_len();
    let needed = fec::encoded_len(framed_len);
    let body = stream
        .get(CODEWORD_LEN..needed)
        .ok_or(Error::CodewordStreamTruncated {
            needed,
            available: stream.len(),
        })?;
    let rest = fec::decode(body)?;
    let corrected_errors = head.corrected_errors + rest.corrected_errors;
    if rest.uncorrectable {
        return Err(Error::UncorrectableBlock {
            blocks: rest.failed_blocks().into_iter().map(|i| i + 1).collect(),
            corrected_errors,
        });
    }
    if corrected_errors > 0 {
        log::debug!(
            "decode: corrected {corrected_errors} symbol errors across {} codewords",
            needed / CODEWORD_LEN
        );
    }
    tracker.done(Stage::Fec);

    let mut message = head.data;
    message.extend_from_slice(&rest.data);
    let compressed = &message[HEADER_LEN..framed_len];
    let payload = compress::decompress(compressed, header.content_type)?;
    tracker.done(Stage::Decompress);

    let expected = header.original_size as usize;
    if payload.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: payload.len(),
        });
    }

    Ok(Decoded {
        payload,
        content_type: header.content_type,
        corrected_errors,
        header,
    })
}

/// Read only the metadata header, correcting the first codeword. Returns
/// the header and the symbol errors corrected in that codeword.
pub fn read_header(
    matrix: &Matrix,
    corners: &[Point],
    opts: &DecodeOptions,
) -> Result<(MetadataHeader, usize)> {
    let stream = matrix::unlayout(matrix, corners)?;
    let (head, header) = decode_head(&stream, opts)?;
    Ok((header, head.corrected_errors))
}

/// Finder centres for decoding a matrix that was never rasterized: one
/// pixel per module, no margin.
pub fn module_corners(matrix: &Matrix) -> [Point; 4] {
    matrix::geometry::pixel_corners(matrix.side(), 1.0, 0.0)
}

/// Rejects a side before any work is done.
pub fn validate_side(side: usize) -> Result<()> {
    if !(matrix::MIN_SIDE..=matrix::MAX_SIDE).contains(&side) {
        return Err(LayoutError::SideOutOfRange { side }.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
