use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use audiopus::coder::Decoder as OpusDecoder;
use audiopus::packet::Packet;
use audiopus::{Channels, MutSignals, SampleRate};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioDecoder, AudioFrame};
use crate::common::errors::{Error, Result};
use crate::ebml::registry::ids;
use crate::ebml::{Element, ElementId, ElementRange, Reader, Searcher};
use crate::source::{BufferSource, ByteSource};

/// Clusters kept decoded behind the active one before trimming.
const MAX_PRIOR_CLUSTERS: usize = 3;

/// Keep roughly this much audio decoded ahead of the play head.
const PREFETCH_AHEAD_SECS: f64 = 10.0;

const WORKER_TICK: Duration = Duration::from_millis(10);

/// Starved pulls tolerated before reporting `buffering` to the host.
const BUFFERING_AFTER_ATTEMPTS: u32 = 10;

/// An Opus frame spans at most 60 ms.
const OPUS_FRAME_SECS: f64 = 0.06;

/// An index entry mapping a time to a cluster byte offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuePoint {
    /// Absolute byte offset of the cluster element.
    pub pos: u64,
    /// Start time in seconds.
    pub time: f64,
    /// Seconds until the next cue (or until the end of the stream).
    pub duration: f64,
}

struct SeekRequest {
    pending: bool,
    target: f64,
}

struct DecoderContext {
    ready: bool,

    duration: f64,
    /// Track number of the Opus audio track.
    track: u64,
    sampling_rate: f64,
    channels: usize,
    cues: Arc<Vec<CuePoint>>,

    opus: Option<OpusDecoder>,
    /// Interleaved scratch for one decoded frame.
    pcm: Vec<f32>,
    /// Next sample (per channel) to copy out of the scratch.
    pcm_index: usize,
    /// Samples (per channel) currently held by the scratch.
    pcm_size: usize,

    /// Ordered window of decoded cluster block lists.
    clusters: Vec<Vec<Element>>,
    /// Cue index of `clusters[0]`.
    current_cluster: usize,
    /// Offset into the window of the cluster being consumed.
    active_cluster: usize,
    /// Offset into that cluster's block list.
    active_block: usize,
}

impl DecoderContext {
    fn new() -> Self {
        Self {
            ready: false,
            duration: 0.0,
            track: 0,
            sampling_rate: 0.0,
            channels: 0,
            cues: Arc::new(Vec::new()),
            opus: None,
            pcm: Vec::new(),
            pcm_index: 0,
            pcm_size: 0,
            clusters: Vec::new(),
            current_cluster: 0,
            active_cluster: 0,
            active_block: 0,
        }
    }

    /// Discard clusters more than [`MAX_PRIOR_CLUSTERS`] behind the active
    /// one, shifting the window indices together.
    fn trim_clusters(&mut self) {
        if self.active_cluster > MAX_PRIOR_CLUSTERS {
            let extra = self.active_cluster - MAX_PRIOR_CLUSTERS;
            self.clusters.drain(..extra);
            self.current_cluster += extra;
            self.active_cluster -= extra;
        }
    }
}

struct DecoderShared {
    context: Mutex<DecoderContext>,
    seeking: Mutex<SeekRequest>,
    /// Playback position in seconds, stored as `f64` bits.
    position: AtomicU64,
    sample_attempts: AtomicU32,
    terminate: AtomicBool,
}

/// Streaming WebM/Opus decoder.
///
/// Spawns a prefetch worker that owns the byte source: the worker loads the
/// headers and cue index, services seek requests and keeps the cluster
/// window filled; all I/O happens there. The pull side only touches
/// in-memory state and never blocks on the network.
pub struct WebmDecoder {
    shared: Arc<DecoderShared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl WebmDecoder {
    pub fn new(source: Box<dyn ByteSource>) -> Self {
        let shared = Arc::new(DecoderShared {
            context: Mutex::new(DecoderContext::new()),
            seeking: Mutex::new(SeekRequest {
                pending: false,
                target: 0.0,
            }),
            position: AtomicU64::new(0f64.to_bits()),
            sample_attempts: AtomicU32::new(0),
            terminate: AtomicBool::new(false),
        });

        let worker_shared = shared.clone();
        let reader = Reader::new(source);
        let worker = thread::Builder::new()
            .name("webm-prefetch".to_string())
            .spawn(move || worker_loop(worker_shared, reader));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("failed to spawn prefetch worker: {}", e);
                shared.terminate.store(true, Ordering::Release);
                None
            }
        };

        Self { shared, worker }
    }

    fn position_secs(&self) -> f64 {
        f64::from_bits(self.shared.position.load(Ordering::Relaxed))
    }

    fn starved(&self, buffering: &mut bool) {
        let attempts = self.shared.sample_attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempts > BUFFERING_AFTER_ATTEMPTS {
            *buffering = true;
        }
    }
}

impl AudioDecoder for WebmDecoder {
    fn sample_rate(&self) -> f64 {
        let context = self.shared.context.lock();
        if context.ready {
            context.sampling_rate
        } else {
            0.0
        }
    }

    fn duration(&self) -> f64 {
        let context = self.shared.context.lock();
        if context.ready {
            context.duration
        } else {
            0.0
        }
    }

    fn position(&self) -> f64 {
        self.position_secs()
    }

    fn seek(&self, time: f64) {
        let mut seeking = self.shared.seeking.lock();
        self.shared.position.store(time.to_bits(), Ordering::Relaxed);
        seeking.target = time;
        seeking.pending = true;
    }

    fn sample(&self, out: &mut [AudioFrame], active: &mut bool, buffering: &mut bool) {
        // A failed stream plays silence.
        if self.shared.terminate.load(Ordering::Acquire) {
            out.fill(AudioFrame::SILENCE);
            *active = true;
            *buffering = false;
            return;
        }

        // Keep active while the headers are still loading.
        if !self.shared.context.lock().ready {
            out.fill(AudioFrame::SILENCE);
            *active = true;
            *buffering = false;
            self.starved(buffering);
            return;
        }

        let seeking = self.shared.seeking.lock();
        let mut context = self.shared.context.lock();

        let mut pos = 0usize;
        while pos < out.len() {
            if context.current_cluster + context.active_cluster >= context.cues.len() {
                out[pos..].fill(AudioFrame::SILENCE);
                *active = false;
                *buffering = false;
                return;
            }

            if seeking.pending || context.active_cluster >= context.clusters.len() {
                out[pos..].fill(AudioFrame::SILENCE);
                *active = true;
                *buffering = false;
                self.starved(buffering);
                return;
            }

            if context.pcm_index >= context.pcm_size {
                // Step over blocks until one yields PCM or the window runs
                // dry.
                while context.active_cluster < context.clusters.len() {
                    if context.active_block
                        >= context.clusters[context.active_cluster].len()
                    {
                        context.active_cluster += 1;
                        context.active_block = 0;
                        context.trim_clusters();
                        continue;
                    }

                    let outcome = {
                        let DecoderContext {
                            clusters,
                            active_cluster,
                            active_block,
                            track,
                            opus,
                            pcm,
                            pcm_index,
                            pcm_size,
                            ..
                        } = &mut *context;
                        let block = &clusters[*active_cluster][*active_block];
                        parse_block(block, *track, opus, pcm, pcm_index, pcm_size)
                    };
                    context.active_block += 1;

                    match outcome {
                        Ok(true) => {}
                        Ok(false) => {
                            out[pos..].fill(AudioFrame::SILENCE);
                            *active = false;
                            *buffering = false;
                            return;
                        }
                        Err(e) => {
                            error!("block decode failed: {}", e);
                            self.shared.terminate.store(true, Ordering::Release);
                            out[pos..].fill(AudioFrame::SILENCE);
                            *active = false;
                            *buffering = false;
                            return;
                        }
                    }
                    break;
                }
            }

            if context.pcm_index < context.pcm_size {
                let copy = (context.pcm_size - context.pcm_index).min(out.len() - pos);
                let channels = context.channels;
                for i in 0..copy {
                    let base = (context.pcm_index + i) * channels;
                    let l = context.pcm[base];
                    let r = if channels > 1 { context.pcm[base + 1] } else { l };
                    out[pos + i] = AudioFrame::new(l, r);
                }
                context.pcm_index += copy;
                pos += copy;

                let elapsed = copy as f64 / context.sampling_rate;
                let position = self.position_secs() + elapsed;
                self.shared
                    .position
                    .store(position.to_bits(), Ordering::Relaxed);
                *buffering = false;
            }
        }

        *active = context.current_cluster + context.active_cluster < context.cues.len();
        self.shared.sample_attempts.store(0, Ordering::Relaxed);
    }
}

impl Drop for WebmDecoder {
    fn drop(&mut self) {
        self.shared.terminate.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Consume one block element during the pull.
///
/// `Ok(true)` advances to the next block (PCM may or may not have been
/// produced), `Ok(false)` aborts the stream for this pull, `Err` is fatal.
fn parse_block(
    block: &Element,
    track: u64,
    opus: &mut Option<OpusDecoder>,
    pcm: &mut [f32],
    pcm_index: &mut usize,
    pcm_size: &mut usize,
) -> Result<bool> {
    match block.id {
        // Cluster-local timestamp: nothing decoded yet.
        ids::TIMECODE => {
            *pcm_index = 0;
            *pcm_size = 0;
            Ok(true)
        }
        ids::SIMPLE_BLOCK => {
            let data = match block.as_binary() {
                Some(data) => data,
                None => return Ok(false),
            };

            // Track number VLQ, then 2 bytes of timecode offset and 1 of
            // flags precede the Opus payload.
            let mut sub = Reader::new(BufferSource::new(data));
            let mut pos = 0u64;
            let block_track = sub.read_int(&mut pos)?;

            if block_track as u64 != track {
                return Ok(true);
            }

            let payload_start = pos as usize + 3;
            if data.len() < payload_start {
                return Err(Error::Malformed(format!(
                    "simple block of {} bytes at {}",
                    data.len(),
                    block.pos
                )));
            }

            let opus = match opus {
                Some(opus) => opus,
                None => return Ok(false),
            };
            let packet = Packet::try_from(&data[payload_start..])
                .map_err(|e| Error::Opus(e.to_string()))?;
            let signals =
                MutSignals::try_from(&mut pcm[..]).map_err(|e| Error::Opus(e.to_string()))?;
            let samples = opus
                .decode_float(Some(packet), signals, false)
                .map_err(|e| Error::Opus(e.to_string()))?;

            *pcm_index = 0;
            *pcm_size = samples;
            Ok(true)
        }
        ids::BLOCK_GROUP => Ok(true),
        _ => {
            warn!("invalid audio block: {}", block.name);
            Ok(false)
        }
    }
}

fn worker_loop(shared: Arc<DecoderShared>, mut reader: Reader<Box<dyn ByteSource>>) {
    if let Err(e) = worker_run(&shared, &mut reader) {
        error!("decoder worker failed: {}", e);
        shared.terminate.store(true, Ordering::Release);
    }
}

fn worker_run(shared: &Arc<DecoderShared>, reader: &mut Reader<Box<dyn ByteSource>>) -> Result<()> {
    if reader.length()? == 0 {
        return Err(Error::Malformed("decoder stream is empty".to_string()));
    }

    let cues = load_headers(shared, reader)?;

    while !shared.terminate.load(Ordering::Acquire) {
        handle_seek(shared, reader, &cues)?;
        prefetch_ahead(shared, reader, &cues)?;
        thread::sleep(WORKER_TICK);
    }
    Ok(())
}

fn ticks_to_secs(time_scale: u64, raw: f64) -> f64 {
    raw * time_scale as f64 / 1_000_000_000.0
}

/// Index of the last cue starting at or before `time`.
fn cue_before(cues: &[CuePoint], time: f64) -> usize {
    cues.partition_point(|c| c.time <= time).saturating_sub(1)
}

/// Parse SeekHead, Info, Tracks and Cues, initialize the Opus decoder and
/// mark the context ready.
fn load_headers(
    shared: &Arc<DecoderShared>,
    reader: &mut Reader<Box<dyn ByteSource>>,
) -> Result<Arc<Vec<CuePoint>>> {
    let top = reader.range_all()?;
    let mut top_search = Searcher::new(top);
    let segment = top_search.get(reader, ids::SEGMENT)?;
    let (segment_from, segment_to) = segment
        .master_range()
        .ok_or_else(|| Error::Malformed("segment is not a master element".to_string()))?;

    // Seek index: (target id, absolute position) per Seek entry.
    let mut segment_search = Searcher::new(ElementRange::new(segment_from, segment_to));
    let seek_head = segment_search.get(reader, ids::SEEK_HEAD)?;
    let seek_head_range = ElementRange::of(seek_head)
        .ok_or_else(|| Error::Malformed("seek head is not a master element".to_string()))?;

    let entries: Vec<Element> = reader.iter(seek_head_range).collect::<Result<_>>()?;
    let mut seek_items: Vec<(ElementId, u64)> = Vec::new();
    for entry in &entries {
        if entry.id != ids::SEEK {
            continue;
        }
        let range = match ElementRange::of(entry) {
            Some(range) => range,
            None => continue,
        };

        let mut search = Searcher::new(range);
        let target = search
            .get(reader, ids::SEEK_ID)?
            .as_binary()
            .ok_or_else(|| Error::Malformed("seek id is not binary".to_string()))?
            .to_vec();
        let position = search
            .get(reader, ids::SEEK_POSITION)?
            .as_uint()
            .ok_or_else(|| Error::Malformed("seek position is not an integer".to_string()))?;

        // The SeekID payload is itself a wire-format element id.
        let mut id_reader = Reader::new(BufferSource::new(target));
        let mut id_pos = 0;
        let id = id_reader.read_id(&mut id_pos)?;

        seek_items.push((id, segment_from + position));
    }

    let mut info: Option<(u64, f64)> = None;
    let mut track: Option<(u64, f64, u64)> = None;
    let mut raw_cues: Vec<(u64, u64)> = Vec::new();

    for (_, position) in seek_items {
        let mut pos = position;
        let element = reader.read_element(&mut pos)?;
        match element.id {
            ids::INFO => info = Some(parse_info(reader, &element)?),
            ids::TRACKS => track = parse_tracks(reader, &element)?,
            ids::CUES => raw_cues = parse_cues(reader, &element, segment_from)?,
            _ => {}
        }

        if info.is_some() && track.is_some() && !raw_cues.is_empty() {
            break;
        }
    }

    let (time_scale, raw_duration) = info.ok_or(Error::MissingElement("Info"))?;
    let (track_number, sampling_rate, channel_count) = track
        .ok_or_else(|| Error::Malformed("stream does not have an opus audio track".to_string()))?;
    if raw_cues.is_empty() {
        return Err(Error::Malformed("stream does not have any cues".to_string()));
    }

    let duration = ticks_to_secs(time_scale, raw_duration);
    let mut cues = Vec::with_capacity(raw_cues.len());
    for (i, &(raw_time, pos)) in raw_cues.iter().enumerate() {
        let start = ticks_to_secs(time_scale, raw_time as f64);
        let end = match raw_cues.get(i + 1) {
            Some(&(next_time, _)) => ticks_to_secs(time_scale, next_time as f64),
            None => duration,
        };
        cues.push(CuePoint {
            pos,
            time: start,
            duration: end - start,
        });
    }
    let cues = Arc::new(cues);

    let channels = channel_count.clamp(1, 2) as usize;
    let opus = create_opus(sampling_rate, channels)?;
    let frame_capacity = (sampling_rate * OPUS_FRAME_SECS).round() as usize;

    info!(
        "webm stream ready: {:.1}s, {} Hz, {} ch, {} cues",
        duration,
        sampling_rate,
        channels,
        cues.len()
    );

    let mut context = shared.context.lock();
    context.duration = duration;
    context.track = track_number;
    context.sampling_rate = sampling_rate;
    context.channels = channels;
    context.cues = cues.clone();
    context.opus = Some(opus);
    context.pcm = vec![0.0; frame_capacity * channels];
    context.ready = true;

    Ok(cues)
}

fn parse_info(reader: &mut Reader<Box<dyn ByteSource>>, info: &Element) -> Result<(u64, f64)> {
    let range = ElementRange::of(info)
        .ok_or_else(|| Error::Malformed("info is not a master element".to_string()))?;
    let mut search = Searcher::new(range);

    let time_scale = search
        .get(reader, ids::TIMECODE_SCALE)?
        .as_uint()
        .ok_or(Error::MissingElement("TimecodeScale"))?;
    let duration = search
        .get(reader, ids::DURATION)?
        .as_float()
        .ok_or(Error::MissingElement("Duration"))?;

    Ok((time_scale, duration))
}

/// Find the first Opus track entry; `None` when there is none.
fn parse_tracks(
    reader: &mut Reader<Box<dyn ByteSource>>,
    tracks: &Element,
) -> Result<Option<(u64, f64, u64)>> {
    let range = ElementRange::of(tracks)
        .ok_or_else(|| Error::Malformed("tracks is not a master element".to_string()))?;
    let entries: Vec<Element> = reader.iter(range).collect::<Result<_>>()?;

    for entry in &entries {
        if entry.id != ids::TRACK_ENTRY {
            continue;
        }
        let entry_range = match ElementRange::of(entry) {
            Some(range) => range,
            None => continue,
        };

        let mut search = Searcher::new(entry_range);
        match search.get(reader, ids::CODEC_ID) {
            Ok(codec) if codec.as_str() == Some("A_OPUS") => {}
            _ => continue,
        }

        let number = match search.get(reader, ids::TRACK_NUMBER).map(|e| e.as_uint()) {
            Ok(Some(number)) => number,
            _ => continue,
        };
        let audio_range = match search.get(reader, ids::AUDIO).map(ElementRange::of) {
            Ok(Some(range)) => range,
            _ => continue,
        };

        let mut audio_search = Searcher::new(audio_range);
        let sampling_rate = match audio_search
            .get(reader, ids::SAMPLING_FREQUENCY)
            .map(|e| e.as_float())
        {
            Ok(Some(rate)) => rate,
            _ => continue,
        };
        let channels = match audio_search.get(reader, ids::CHANNELS).map(|e| e.as_uint()) {
            Ok(Some(channels)) => channels,
            _ => continue,
        };

        return Ok(Some((number, sampling_rate, channels)));
    }

    Ok(None)
}

/// Collect `(raw time, absolute cluster position)` per cue point.
fn parse_cues(
    reader: &mut Reader<Box<dyn ByteSource>>,
    cues: &Element,
    segment_from: u64,
) -> Result<Vec<(u64, u64)>> {
    let range = ElementRange::of(cues)
        .ok_or_else(|| Error::Malformed("cues is not a master element".to_string()))?;
    let points: Vec<Element> = reader.iter(range).collect::<Result<_>>()?;

    let mut items = Vec::with_capacity(points.len());
    for point in &points {
        if point.id != ids::CUE_POINT {
            continue;
        }
        let point_range = match ElementRange::of(point) {
            Some(range) => range,
            None => continue,
        };

        let mut search = Searcher::new(point_range);
        let time = search
            .get(reader, ids::CUE_TIME)?
            .as_uint()
            .ok_or(Error::MissingElement("CueTime"))?;
        let positions_range = ElementRange::of(search.get(reader, ids::CUE_TRACK_POSITIONS)?)
            .ok_or(Error::MissingElement("CueTrackPositions"))?;

        let mut positions_search = Searcher::new(positions_range);
        let cluster_position = positions_search
            .get(reader, ids::CUE_CLUSTER_POSITION)?
            .as_uint()
            .ok_or(Error::MissingElement("CueClusterPosition"))?;

        items.push((time, segment_from + cluster_position));
    }

    Ok(items)
}

fn create_opus(sampling_rate: f64, channels: usize) -> Result<OpusDecoder> {
    let rate = match sampling_rate as u32 {
        8000 => SampleRate::Hz8000,
        12000 => SampleRate::Hz12000,
        16000 => SampleRate::Hz16000,
        24000 => SampleRate::Hz24000,
        _ => SampleRate::Hz48000,
    };
    let channels = if channels == 1 {
        Channels::Mono
    } else {
        Channels::Stereo
    };
    OpusDecoder::new(rate, channels).map_err(|e| Error::Opus(e.to_string()))
}

/// Service a pending seek request, if any.
fn handle_seek(
    shared: &Arc<DecoderShared>,
    reader: &mut Reader<Box<dyn ByteSource>>,
    cues: &Arc<Vec<CuePoint>>,
) -> Result<()> {
    let target = {
        let mut seeking = shared.seeking.lock();
        if !seeking.pending {
            return Ok(());
        }
        seeking.pending = false;
        seeking.target
    };

    let cue_index = cue_before(cues, target);
    let cue = cues[cue_index];
    let fraction = (target - cue.time) / cue.duration;
    debug!("seek to {:.3}s: cue {} + {:.2}", target, cue_index, fraction);

    if fraction >= 1.0 {
        // Past the end of the stream.
        let mut context = shared.context.lock();
        context.clusters.clear();
        context.current_cluster = cues.len();
        context.active_cluster = 0;
        context.active_block = 0;
        context.pcm_size = 0;
        return Ok(());
    }

    {
        let mut context = shared.context.lock();
        let window = context.current_cluster..context.current_cluster + context.clusters.len();
        if window.contains(&cue_index) {
            // Already decoded; just move the play head.
            context.active_cluster = cue_index - context.current_cluster;
            context.active_block =
                (fraction * context.clusters[context.active_cluster].len() as f64) as usize;
            context.trim_clusters();
            context.pcm_size = 0;
            return Ok(());
        }

        context.clusters.clear();
        context.pcm_size = 0;
    }

    // Not cached: load the cluster outside the lock.
    let blocks = read_cluster_at(reader, cue.pos)?;

    let mut context = shared.context.lock();
    context.active_block = (fraction * blocks.len() as f64) as usize;
    context.clusters.push(blocks);
    context.current_cluster = cue_index;
    context.active_cluster = 0;
    Ok(())
}

/// Load the next cluster once the play head is within
/// [`PREFETCH_AHEAD_SECS`] of it.
fn prefetch_ahead(
    shared: &Arc<DecoderShared>,
    reader: &mut Reader<Box<dyn ByteSource>>,
    cues: &Arc<Vec<CuePoint>>,
) -> Result<()> {
    let load_next = {
        let context = shared.context.lock();
        context.current_cluster + context.clusters.len()
    };
    if load_next >= cues.len() {
        return Ok(());
    }

    let cue = cues[load_next];
    let position = f64::from_bits(shared.position.load(Ordering::Relaxed));
    if cue.time >= position + PREFETCH_AHEAD_SECS {
        return Ok(());
    }

    let blocks = read_cluster_at(reader, cue.pos)?;

    // Trimming keeps `current_cluster + clusters.len()` stable, so the
    // append still lands at `load_next` even if the pull trimmed meanwhile.
    shared.context.lock().clusters.push(blocks);
    Ok(())
}

/// Read the cluster element at `pos` and collect its child elements in
/// order. A partial cluster is returned if a block fails to parse.
fn read_cluster_at(reader: &mut Reader<Box<dyn ByteSource>>, pos: u64) -> Result<Vec<Element>> {
    let mut p = pos;
    let cluster = reader.read_element(&mut p)?;
    let range = ElementRange::of(&cluster).ok_or_else(|| {
        Error::Malformed(format!("cue target {} is not a cluster", cluster.name))
    })?;

    let mut blocks = Vec::with_capacity(100);
    for item in reader.iter(range) {
        match item {
            Ok(element) => blocks.push(element),
            Err(e) => {
                warn!("cluster read failed: {}", e);
                break;
            }
        }
    }
    Ok(blocks)
}

/// Builders for a minimal in-memory WebM stream: EBML header, then a
/// Segment holding SeekHead, Info, Tracks, Cues and one cluster per
/// requested time, each with a Timecode and one 20 ms Opus silence block.
#[cfg(test)]
pub(crate) mod fixture {
    use super::*;

    /// 20 ms of Opus silence (CELT, fullband).
    pub const SILENCE_PACKET: &[u8] = &[0xF8, 0xFF, 0xFE];

    const TIME_SCALE: u64 = 1_000_000; // 1 ms ticks

    fn vint(value: u64, width: usize) -> Vec<u8> {
        assert!(value < (1u64 << (7 * width)) - 1);
        let mut bytes = vec![0u8; width];
        let mut v = value;
        for b in bytes.iter_mut().rev() {
            *b = (v & 0xFF) as u8;
            v >>= 8;
        }
        bytes[0] |= 0x80 >> (width - 1);
        bytes
    }

    fn id_bytes(id: ElementId) -> Vec<u8> {
        let bytes = id.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap();
        bytes[start..].to_vec()
    }

    fn el(id: ElementId, payload: &[u8]) -> Vec<u8> {
        let mut out = id_bytes(id);
        out.extend(vint(payload.len() as u64, 2));
        out.extend(payload);
        out
    }

    fn uint(id: ElementId, value: u64) -> Vec<u8> {
        el(id, &value.to_be_bytes())
    }

    fn float(id: ElementId, value: f64) -> Vec<u8> {
        el(id, &value.to_be_bytes())
    }

    fn seek_head(items: &[(ElementId, u64)]) -> Vec<u8> {
        let mut payload = Vec::new();
        for &(id, pos) in items {
            let mut entry = el(ids::SEEK_ID, &id_bytes(id));
            entry.extend(uint(ids::SEEK_POSITION, pos));
            payload.extend(el(ids::SEEK, &entry));
        }
        el(ids::SEEK_HEAD, &payload)
    }

    fn info(duration_ticks: f64) -> Vec<u8> {
        let mut payload = uint(ids::TIMECODE_SCALE, TIME_SCALE);
        payload.extend(float(ids::DURATION, duration_ticks));
        el(ids::INFO, &payload)
    }

    fn tracks() -> Vec<u8> {
        let mut audio = float(ids::SAMPLING_FREQUENCY, 48_000.0);
        audio.extend(uint(ids::CHANNELS, 2));

        let mut entry = uint(ids::TRACK_NUMBER, 1);
        entry.extend(el(ids::CODEC_ID, b"A_OPUS"));
        entry.extend(el(ids::AUDIO, &audio));

        el(ids::TRACKS, &el(ids::TRACK_ENTRY, &entry))
    }

    fn cues(items: &[(u64, u64)]) -> Vec<u8> {
        let mut payload = Vec::new();
        for &(ticks, pos) in items {
            let mut point = uint(ids::CUE_TIME, ticks);
            point.extend(el(
                ids::CUE_TRACK_POSITIONS,
                &uint(ids::CUE_CLUSTER_POSITION, pos),
            ));
            payload.extend(el(ids::CUE_POINT, &point));
        }
        el(ids::CUES, &payload)
    }

    fn cluster(ticks: u64) -> Vec<u8> {
        let mut block = vec![0x81, 0x00, 0x00, 0x00]; // track 1, timecode 0, flags
        block.extend_from_slice(SILENCE_PACKET);

        let mut payload = uint(ids::TIMECODE, ticks);
        payload.extend(el(ids::SIMPLE_BLOCK, &block));
        el(ids::CLUSTER, &payload)
    }

    /// Assemble a stream with one cluster per entry of
    /// `cluster_times_secs`.
    pub fn build_stream(cluster_times_secs: &[f64], duration_secs: f64) -> Vec<u8> {
        let ticks: Vec<u64> = cluster_times_secs
            .iter()
            .map(|t| (t * 1000.0).round() as u64)
            .collect();

        let info = info(duration_secs * 1000.0);
        let tracks = tracks();
        let clusters: Vec<Vec<u8>> = ticks.iter().map(|&t| cluster(t)).collect();

        // Offsets are relative to the segment data start. Fixed-width
        // integers keep SeekHead and Cues sizes independent of the
        // values, so sizing with zeros first is exact.
        let seek_head_len = seek_head(&[(ids::INFO, 0), (ids::TRACKS, 0), (ids::CUES, 0)])
            .len() as u64;
        let cues_len = cues(&ticks.iter().map(|&t| (t, 0)).collect::<Vec<_>>()).len() as u64;

        let info_off = seek_head_len;
        let tracks_off = info_off + info.len() as u64;
        let cues_off = tracks_off + tracks.len() as u64;

        let mut cluster_offs = Vec::new();
        let mut off = cues_off + cues_len;
        for c in &clusters {
            cluster_offs.push(off);
            off += c.len() as u64;
        }

        let cue_items: Vec<(u64, u64)> = ticks
            .iter()
            .zip(&cluster_offs)
            .map(|(&t, &pos)| (t, pos))
            .collect();
        let cues = cues(&cue_items);
        assert_eq!(cues.len() as u64, cues_len);

        let seek_head = seek_head(&[
            (ids::INFO, info_off),
            (ids::TRACKS, tracks_off),
            (ids::CUES, cues_off),
        ]);
        assert_eq!(seek_head.len() as u64, seek_head_len);

        let mut segment_payload = seek_head;
        segment_payload.extend(info);
        segment_payload.extend(tracks);
        segment_payload.extend(cues);
        for c in clusters {
            segment_payload.extend(c);
        }

        let mut stream = el(ids::EBML, &el(0x4282, b"webm"));
        stream.extend(el(ids::SEGMENT, &segment_payload));
        stream
    }
}
