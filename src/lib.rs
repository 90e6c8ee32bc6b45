//! Streaming WebM/Opus audio decoding with cue-indexed seeking.
//!
//! The pipeline reads an EBML (WebM) container from a pluggable
//! [`ByteSource`](source::ByteSource) — an in-memory buffer, a local file,
//! or an HTTP resource fetched with range requests — parses the container
//! headers and cue index, prefetches and decodes Opus clusters on a
//! background worker, and serves interleaved stereo PCM through the
//! real-time [`AudioDecoder`](audio::AudioDecoder) pull interface.
//!
//! The [`youtube`] module resolves a playable media URL for a video id
//! (including player-script signature descrambling) and exposes a
//! [`Player`](youtube::Player) that transparently prefers a local on-disk
//! cache over the network.

pub mod audio;
pub mod common;
pub mod config;
pub mod ebml;
pub mod source;
pub mod webm;
pub mod youtube;

pub use audio::{AudioDecoder, AudioFrame};
pub use common::errors::{Error, Result};
pub use config::Config;
pub use source::{BufferSource, ByteSource, FileSource, HttpSource};
pub use webm::WebmDecoder;
pub use youtube::{Player, VideoData, YouTube};
