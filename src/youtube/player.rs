use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use tracing::{error, info};

use crate::audio::{AudioDecoder, AudioFrame};
use crate::source::{ByteSource, FileSource, HttpSource};
use crate::webm::WebmDecoder;

use super::YouTube;

/// Starved pulls tolerated while the stream is still being resolved.
const BUFFERING_AFTER_ATTEMPTS: u32 = 3;

/// Playable audio stream for a video id.
///
/// A setup thread resolves the stream: the local cache file is used when
/// present, otherwise the media URL is resolved and streamed over HTTP
/// while a background download fills the cache for next time. Until the
/// decoder is up, the pull interface plays silence and `seek` targets are
/// remembered.
pub struct Player {
    shared: Arc<PlayerShared>,
    setup: Option<thread::JoinHandle<()>>,
}

struct PlayerShared {
    decoder: RwLock<Option<WebmDecoder>>,
    /// Seek target remembered until the stream is ready, as `f64` bits.
    start_pos: AtomicU64,
    sample_attempts: AtomicU32,
    terminate: AtomicBool,
}

impl Player {
    pub fn new(id: &str, youtube: Arc<YouTube>) -> Self {
        let shared = Arc::new(PlayerShared {
            decoder: RwLock::new(None),
            start_pos: AtomicU64::new(0f64.to_bits()),
            sample_attempts: AtomicU32::new(0),
            terminate: AtomicBool::new(false),
        });

        let setup_shared = shared.clone();
        let id = id.to_string();
        let setup = thread::Builder::new()
            .name("yt-player".to_string())
            .spawn(move || setup_stream(setup_shared, id, youtube));

        let setup = match setup {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("failed to spawn player setup: {}", e);
                None
            }
        };

        Self { shared, setup }
    }

    fn start_pos(&self) -> f64 {
        f64::from_bits(self.shared.start_pos.load(Ordering::Relaxed))
    }
}

impl AudioDecoder for Player {
    fn sample_rate(&self) -> f64 {
        match &*self.shared.decoder.read() {
            Some(decoder) => decoder.sample_rate(),
            None => 0.0,
        }
    }

    fn duration(&self) -> f64 {
        match &*self.shared.decoder.read() {
            Some(decoder) => decoder.duration(),
            None => 0.0,
        }
    }

    fn position(&self) -> f64 {
        match &*self.shared.decoder.read() {
            Some(decoder) => decoder.position(),
            None => self.start_pos(),
        }
    }

    fn seek(&self, time: f64) {
        match &*self.shared.decoder.read() {
            Some(decoder) => decoder.seek(time),
            None => self
                .shared
                .start_pos
                .store(time.to_bits(), Ordering::Relaxed),
        }
    }

    fn sample(&self, out: &mut [AudioFrame], active: &mut bool, buffering: &mut bool) {
        let decoder = self.shared.decoder.read();
        match &*decoder {
            Some(decoder) => decoder.sample(out, active, buffering),
            None => {
                out.fill(AudioFrame::SILENCE);
                *active = true;
                let attempts = self.shared.sample_attempts.fetch_add(1, Ordering::Relaxed) + 1;
                *buffering = attempts > BUFFERING_AFTER_ATTEMPTS;
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shared.terminate.store(true, Ordering::Release);
        if let Some(setup) = self.setup.take() {
            let _ = setup.join();
        }
    }
}

fn setup_stream(shared: Arc<PlayerShared>, id: String, youtube: Arc<YouTube>) {
    let local_path = youtube.config().cache_dir().join(format!("{}.webm", id));

    let source: Box<dyn ByteSource> = if local_path.exists() {
        info!("playing {} from {}", id, local_path.display());
        match FileSource::open(&local_path) {
            Ok(source) => Box::new(source),
            Err(e) => {
                error!("failed to open cached media for {}: {}", id, e);
                return;
            }
        }
    } else {
        let url = match youtube.resolve_playback_url(&id) {
            Ok(url) => url,
            Err(e) => {
                error!("failed to resolve playback url for {}: {}", id, e);
                return;
            }
        };
        if shared.terminate.load(Ordering::Acquire) {
            return;
        }

        youtube.download_cache(&url, &local_path);
        match HttpSource::with_user_agent(&url, &youtube.config().user_agent) {
            Ok(source) => Box::new(source),
            Err(e) => {
                error!("failed to open media url for {}: {}", id, e);
                return;
            }
        }
    };

    let decoder = WebmDecoder::new(source);
    let start = f64::from_bits(shared.start_pos.load(Ordering::Relaxed));
    if start > 0.0 {
        decoder.seek(start);
    }
    *shared.decoder.write() = Some(decoder);
}
