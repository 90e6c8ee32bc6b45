//! WebM/Opus container decoding.
//!
//! [`WebmDecoder`] parses the container headers and cue index from a byte
//! source, keeps a bounded window of clusters decoded ahead of the play
//! head on a background worker, and serves stereo PCM through the
//! [`AudioDecoder`](crate::audio::AudioDecoder) pull interface.

pub mod decoder;

pub use decoder::{CuePoint, WebmDecoder};
