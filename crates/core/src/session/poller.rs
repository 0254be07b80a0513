use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::capture::domain::capture_source::CaptureSource;
use crate::detection::domain::face_engine::FaceEngine;
use crate::session::updates::Update;

/// Owns the live detection loop worker.
///
/// At most one of these exists per session; the controller stops the old
/// one before spawning a new one. The worker acquires the camera and waits
/// for engine readiness before its first attempt, then runs one detection
/// attempt per tick. A tick that fires while an attempt is still running is
/// dropped, not queued, so slow detection never builds a backlog.
pub(crate) struct PollingSession {
    generation: u64,
    cancel: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PollingSession {
    pub fn spawn(
        generation: u64,
        source: Box<dyn CaptureSource>,
        engine: Arc<Mutex<Box<dyn FaceEngine>>>,
        updates: Sender<Update>,
        interval: Duration,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(false));
        let cancel_flag = cancel.clone();
        let paused_flag = paused.clone();
        let handle = thread::spawn(move || {
            run_poll_loop(
                source,
                engine,
                updates,
                cancel_flag,
                paused_flag,
                generation,
                interval,
            );
        });
        Self {
            generation,
            cancel,
            paused,
            handle: Some(handle),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Skip detection attempts without releasing the camera.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Stop the worker and wait for it to release the camera. Idempotent.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("polling worker panicked");
            }
        }
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_poll_loop(
    mut source: Box<dyn CaptureSource>,
    engine: Arc<Mutex<Box<dyn FaceEngine>>>,
    updates: Sender<Update>,
    cancel: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    generation: u64,
    interval: Duration,
) {
    if let Err(e) = source.acquire() {
        let _ = updates.send(Update::PollFailed {
            generation,
            message: e.to_string(),
        });
        return;
    }

    // Model load can take arbitrarily long; no tick runs before it is done.
    let ready = engine
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .ensure_ready();
    if let Err(e) = ready {
        let _ = updates.send(Update::PollFailed {
            generation,
            message: e.to_string(),
        });
        source.release();
        return;
    }

    let ticker = crossbeam_channel::tick(interval);
    loop {
        if ticker.recv().is_err() {
            break;
        }
        // A tick that fired during a slow attempt is dropped, not queued.
        while ticker.try_recv().is_ok() {}

        if cancel.load(Ordering::Relaxed) {
            break;
        }
        if paused.load(Ordering::Relaxed) {
            continue;
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                let _ = updates.send(Update::PollFailed {
                    generation,
                    message: e.to_string(),
                });
                break;
            }
        };

        let attempt = engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .detect(&frame);
        let outcome = match attempt {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("detection attempt failed: {e}");
                None
            }
        };

        if updates.send(Update::Detection { generation, outcome }).is_err() {
            break;
        }
    }

    source.release();
}
