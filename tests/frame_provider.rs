use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cinescope::error::{PipelineError, Result};
use cinescope::frames::{FrameDecoder, FrameProvider};
use cinescope::image_pipeline::{RenderedFrame, WindowLevel};
use cinescope::ViewerConfig;

/// Decoder whose frames are a single grey pixel equal to the frame index.
#[derive(Clone, Default)]
struct Scripted {
    frames: u32,
    calls: Arc<AtomicUsize>,
    /// Decodes spin until this is set.
    gate: Option<Arc<AtomicBool>>,
    /// Decodes in progress right now.
    active: Arc<AtomicUsize>,
    delay: Duration,
    failing: Option<u32>,
    panicking: Option<u32>,
}

impl Scripted {
    fn new(frames: u32) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FrameDecoder for Scripted {
    fn frame_count(&self) -> u32 {
        self.frames
    }

    fn decode(&self, index: u32, _window: Option<WindowLevel>) -> Result<RenderedFrame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            while !gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        }
        thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panicking == Some(index) {
            panic!("corrupt frame {index}");
        }
        if self.failing == Some(index) {
            return Err(PipelineError::Decode(format!("frame {index} is truncated")));
        }

        let shade = index as u8;
        Ok(RenderedFrame {
            width: 1,
            height: 1,
            rgba: vec![shade, shade, shade, 255],
        })
    }
}

fn config(cache_capacity: usize, prefetch_ahead: u32) -> ViewerConfig {
    ViewerConfig {
        cache_capacity,
        prefetch_ahead,
        worker_idle: Duration::from_millis(1),
        ..ViewerConfig::default()
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn sorted(mut indices: Vec<u32>) -> Vec<u32> {
    indices.sort_unstable();
    indices
}

#[test]
fn cache_keeps_the_most_recently_used_frames() {
    let decoder = Scripted::new(5);
    let provider = FrameProvider::new(decoder.clone(), &config(2, 0));

    for index in 0..3 {
        let frame = provider.get(index).expect("frame decodes");
        assert_eq!(frame.rgba[0], index as u8);
    }
    assert_eq!(sorted(provider.cached_indices()), vec![1, 2]);
    assert_eq!(decoder.calls(), 3);

    assert!(provider.get(1).is_some());
    assert_eq!(decoder.calls(), 3, "cached frame must not be decoded again");

    // Frame 1 was just used, so frame 2 is the one evicted.
    assert!(provider.get(0).is_some());
    assert_eq!(decoder.calls(), 4);
    assert_eq!(provider.cached_indices(), vec![0, 1]);
}

#[test]
fn cache_never_exceeds_capacity() {
    let decoder = Scripted::new(40);
    let provider = FrameProvider::new(decoder.clone(), &config(4, 0));

    let pattern = [0, 7, 3, 7, 12, 0, 39, 3, 3, 21, 7, 0];
    for index in pattern {
        assert!(provider.get(index).is_some());
        assert!(provider.cached_indices().len() <= 4);
        assert!(provider.is_cached(index));
    }
    assert_eq!(provider.cached_indices(), vec![0, 7, 21, 3]);
}

#[test]
fn prefetch_does_not_wait_for_decodes() {
    let gate = Arc::new(AtomicBool::new(false));
    let decoder = Scripted {
        gate: Some(Arc::clone(&gate)),
        ..Scripted::new(10)
    };
    let provider = FrameProvider::new(decoder.clone(), &config(8, 3));

    let started = Instant::now();
    provider.prefetch(0);
    provider.prefetch(0);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!provider.is_cached(1));

    gate.store(true, Ordering::SeqCst);
    assert!(wait_until(Duration::from_secs(5), || {
        (1..=3).all(|index| provider.is_cached(index))
    }));
    assert!(!provider.is_cached(0));
    assert!(!provider.is_cached(4));
    assert_eq!(decoder.calls(), 3, "queued twice but decoded once");

    assert_eq!(provider.get(2).map(|frame| frame.rgba[0]), Some(2));
    assert_eq!(decoder.calls(), 3);
}

#[test]
fn prefetch_skips_frames_already_cached() {
    let decoder = Scripted::new(6);
    let provider = FrameProvider::new(decoder.clone(), &config(8, 2));

    assert!(provider.get(1).is_some());
    assert!(provider.get(2).is_some());
    provider.prefetch(0);

    // Nothing was queued, so the worker has nothing to decode.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(decoder.calls(), 2);
}

#[test]
fn failed_decode_yields_none_and_is_retried() {
    let decoder = Scripted {
        failing: Some(2),
        ..Scripted::new(4)
    };
    let provider = FrameProvider::new(decoder.clone(), &config(4, 0));

    assert!(provider.get(2).is_none());
    assert!(!provider.is_cached(2));
    assert!(provider.get(2).is_none());
    assert_eq!(decoder.calls(), 2);

    assert!(provider.get(3).is_some());
}

#[test]
fn panicking_decoder_yields_none() {
    let decoder = Scripted {
        panicking: Some(1),
        ..Scripted::new(3)
    };
    let provider = FrameProvider::new(decoder.clone(), &config(4, 1));

    assert!(provider.get(1).is_none());

    // The worker survives the same panic during prefetch.
    provider.prefetch(0);
    assert!(wait_until(Duration::from_secs(5), || decoder.calls() >= 2));
    assert!(provider.get(2).is_some());
}

#[test]
fn drop_waits_for_the_worker() {
    let decoder = Scripted {
        delay: Duration::from_millis(20),
        ..Scripted::new(50)
    };
    let provider = FrameProvider::new(decoder.clone(), &config(64, 40));

    provider.prefetch(0);
    assert!(wait_until(Duration::from_secs(5), || {
        decoder.active.load(Ordering::SeqCst) > 0
    }));

    drop(provider);
    assert_eq!(decoder.active.load(Ordering::SeqCst), 0);
    assert!(decoder.calls() < 40, "cancelled before draining the queue");
}

#[test]
fn window_change_renders_with_the_new_window() {
    let decoder = Scripted::new(3);
    let provider = FrameProvider::new(decoder.clone(), &config(4, 0));

    assert!(provider.get(0).is_some());
    let window = WindowLevel::new(40.0, 80.0);
    provider.set_window(Some(window));
    assert_eq!(provider.window(), Some(window));
    assert!(provider.cached_indices().is_empty());

    // Setting the same window again keeps the cache.
    assert!(provider.get(0).is_some());
    provider.set_window(Some(window));
    assert_eq!(provider.cached_indices(), vec![0]);
}

#[test]
fn get_races_the_worker_on_the_same_frame() {
    let gate = Arc::new(AtomicBool::new(false));
    let decoder = Scripted {
        gate: Some(Arc::clone(&gate)),
        ..Scripted::new(10)
    };
    let provider = FrameProvider::new(decoder.clone(), &config(8, 1));
    let active = || decoder.active.load(Ordering::SeqCst);

    // The worker picks up frame 5 and blocks inside the decoder.
    provider.prefetch(4);
    assert!(wait_until(Duration::from_secs(5), || active() == 1));

    thread::scope(|scope| {
        let reader = scope.spawn(|| provider.get(5));
        assert!(wait_until(Duration::from_secs(5), || active() == 2));

        gate.store(true, Ordering::SeqCst);
        let frame = reader.join().expect("reader thread");
        assert_eq!(frame.map(|frame| frame.rgba[0]), Some(5));
    });

    assert!(wait_until(Duration::from_secs(5), || active() == 0));
    assert!(provider.is_cached(5));
    assert_eq!(decoder.calls(), 2);
}

#[test]
fn cache_stays_bounded_while_prefetching() {
    let decoder = Scripted {
        delay: Duration::from_millis(1),
        ..Scripted::new(60)
    };
    let provider = FrameProvider::new(decoder.clone(), &config(4, 12));

    for index in 0..60 {
        assert_eq!(provider.get(index).map(|frame| frame.rgba[0]), Some(index as u8));
        provider.prefetch(index);
        assert!(provider.cached_indices().len() <= 4);
    }
    assert!(provider.cached_indices().len() <= 4);
}
