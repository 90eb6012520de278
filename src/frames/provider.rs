use std::collections::{HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::ViewerConfig;
use crate::error::{PipelineError, Result};
use crate::frames::cache::FrameCache;
use crate::frames::decoder::FrameDecoder;
use crate::image_pipeline::{RenderedFrame, WindowLevel};

/// On-demand frame access for one loaded dataset.
///
/// `get` decodes synchronously on a cache miss; `prefetch` hands the frames
/// after the requested one to a background worker. The worker lives as long
/// as the provider and is cancelled and joined on drop.
pub struct FrameProvider {
    shared: Option<Arc<Shared>>,
    worker: Option<JoinHandle<()>>,
    prefetch_ahead: u32,
}

struct Shared {
    decoder: Box<dyn FrameDecoder>,
    frame_count: u32,
    cache: FrameCache,
    queue: Mutex<PrefetchQueue>,
    render: Mutex<RenderSettings>,
    cancelled: AtomicBool,
    idle: Duration,
}

#[derive(Default)]
struct PrefetchQueue {
    pending: VecDeque<u32>,
    /// Indices that are pending or being decoded by the worker.
    queued: HashSet<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
struct RenderSettings {
    window: Option<WindowLevel>,
    /// Bumped whenever `window` changes; frames decoded under an older
    /// generation are discarded instead of cached.
    generation: u64,
}

impl FrameProvider {
    pub fn new<D: FrameDecoder>(decoder: D, config: &ViewerConfig) -> Self {
        let frame_count = decoder.frame_count();
        if frame_count == 0 {
            log::debug!("Dataset has no frames; using an inert frame provider");
            return Self::inert();
        }

        let shared = Arc::new(Shared {
            decoder: Box::new(decoder),
            frame_count,
            cache: FrameCache::new(config.cache_capacity),
            queue: Mutex::new(PrefetchQueue::default()),
            render: Mutex::new(RenderSettings::default()),
            cancelled: AtomicBool::new(false),
            idle: config.worker_idle,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("frame-prefetch".to_string())
            .spawn(move || run_worker(worker_shared))
            .map_err(|err| log::warn!("Unable to start prefetch worker: {err}"))
            .ok();

        Self {
            shared: Some(shared),
            worker,
            prefetch_ahead: config.prefetch_ahead,
        }
    }

    /// A provider with no frames: `get` always misses and `prefetch` does
    /// nothing.
    pub fn inert() -> Self {
        Self {
            shared: None,
            worker: None,
            prefetch_ahead: 0,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.shared.as_ref().map_or(0, |shared| shared.frame_count)
    }

    /// Returns frame `index`, decoding it on the calling thread when it is not
    /// cached. Out-of-range indices and decode failures yield `None`.
    pub fn get(&self, index: u32) -> Option<Arc<RenderedFrame>> {
        let shared = self.shared.as_ref()?;
        if index >= shared.frame_count {
            return None;
        }

        if let Some(frame) = shared.cache.get(index) {
            return Some(frame);
        }

        let settings = shared.settings();
        match shared.decode(index, settings.window) {
            Ok(frame) => {
                let frame = Arc::new(frame);
                shared.store(settings.generation, index, Arc::clone(&frame));
                Some(frame)
            }
            Err(err) => {
                log::warn!("Unable to decode frame {index}: {err}");
                None
            }
        }
    }

    /// Queues the frames following `index` for background decode. Never
    /// waits on a decode.
    pub fn prefetch(&self, index: u32) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };

        let first = index.saturating_add(1);
        let last = index
            .saturating_add(self.prefetch_ahead)
            .min(shared.frame_count.saturating_sub(1));
        if first > last {
            return;
        }

        let mut queue = shared.lock_queue();
        for candidate in first..=last {
            if queue.queued.contains(&candidate) || shared.cache.contains(candidate) {
                continue;
            }
            queue.queued.insert(candidate);
            queue.pending.push_back(candidate);
        }
    }

    /// Switches the VOI window for all later decodes. Cached and queued
    /// frames rendered with the previous window are dropped.
    pub fn set_window(&self, window: Option<WindowLevel>) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };

        {
            let mut render = shared.lock_render();
            if render.window == window {
                return;
            }
            render.window = window;
            render.generation += 1;
            shared.cache.clear();
        }

        let mut queue = shared.lock_queue();
        queue.pending.clear();
        queue.queued.clear();
    }

    pub fn window(&self) -> Option<WindowLevel> {
        self.shared
            .as_ref()
            .and_then(|shared| shared.settings().window)
    }

    pub fn is_cached(&self, index: u32) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.cache.contains(index))
    }

    /// Cached frame indices, most recently used first.
    pub fn cached_indices(&self) -> Vec<u32> {
        self.shared
            .as_ref()
            .map(|shared| shared.cache.indices())
            .unwrap_or_default()
    }
}

impl Drop for FrameProvider {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            shared.cancelled.store(true, Ordering::Release);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Prefetch worker terminated abnormally");
            }
        }
    }
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, PrefetchQueue> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_render(&self) -> MutexGuard<'_, RenderSettings> {
        self.render
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn settings(&self) -> RenderSettings {
        *self.lock_render()
    }

    fn decode(&self, index: u32, window: Option<WindowLevel>) -> Result<RenderedFrame> {
        panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(index, window)))
            .unwrap_or_else(|_| {
                Err(PipelineError::Decode(format!(
                    "decoder panicked on frame {index}"
                )))
            })
    }

    /// Caches `frame` unless the window changed while it was being decoded.
    fn store(&self, generation: u64, index: u32, frame: Arc<RenderedFrame>) {
        let render = self.lock_render();
        if render.generation == generation {
            self.cache.insert(index, frame);
        } else {
            log::trace!("Discarding frame {index} decoded with a stale window");
        }
    }

    /// Clears the queued marker of a finished job. A window change in the
    /// meantime reset the queue, and the marker may belong to a re-queued job.
    fn finish(&self, index: u32, generation: u64) {
        let render = self.lock_render();
        if render.generation == generation {
            self.lock_queue().queued.remove(&index);
        }
    }
}

fn run_worker(shared: Arc<Shared>) {
    log::debug!("Prefetch worker started for {} frame(s)", shared.frame_count);

    while !shared.cancelled.load(Ordering::Acquire) {
        let next = shared.lock_queue().pending.pop_front();
        let Some(index) = next else {
            thread::sleep(shared.idle);
            continue;
        };

        let settings = shared.settings();
        if !shared.cache.contains(index) {
            match shared.decode(index, settings.window) {
                Ok(frame) => shared.store(settings.generation, index, Arc::new(frame)),
                Err(err) => log::debug!("Prefetch of frame {index} failed: {err}"),
            }
        }

        shared.finish(index, settings.generation);
    }

    log::debug!("Prefetch worker stopped");
}
