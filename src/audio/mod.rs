//! Host-facing audio types: the stereo frame and the real-time pull
//! contract decoders implement.

/// Single frame of audio consisting of left and right channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFrame {
    pub l: f32,
    pub r: f32,
}

impl AudioFrame {
    pub const SILENCE: AudioFrame = AudioFrame { l: 0.0, r: 0.0 };

    pub fn new(l: f32, r: f32) -> Self {
        Self { l, r }
    }
}

/// A seekable stream of decoded stereo audio.
///
/// `sample` is called from the host's audio thread at its own cadence with
/// tight deadlines; implementations must not block on I/O there. The other
/// methods may be called from any thread.
pub trait AudioDecoder: Send + Sync {
    /// Sample rate of the stream, or `0.0` while the stream is loading.
    fn sample_rate(&self) -> f64;

    /// Duration of the stream in seconds, or `0.0` while loading.
    fn duration(&self) -> f64;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Move playback to `time` (seconds).
    ///
    /// Never blocks. If the stream is still loading, the target is
    /// remembered and applied once it is ready.
    fn seek(&self, time: f64);

    /// Fill `out` with decoded frames, advancing the position by the time
    /// elapsed.
    ///
    /// `active` is set `false` once the stream has ended; `buffering` is
    /// set when the call was starved and the host should treat it as such.
    fn sample(&self, out: &mut [AudioFrame], active: &mut bool, buffering: &mut bool);
}
