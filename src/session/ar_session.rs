//! AR session: owns the bridge, spawns and joins the worker threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use image::GrayImage;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::engine::{EngineCommands, MappingEngineBridge};
use crate::geometry::AnchorTransform;
use crate::mask::refine_with_tolerance;
use crate::tracking::PoseCorrector;

use super::mailbox::Mailbox;
use super::messages::{FrameMatches, RefineRequest};

/// Worker receive timeout; bounds how long shutdown waits on an idle worker.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// State shared between the session facade and its workers.
struct Shared {
    bridge: MappingEngineBridge,
    shutdown: AtomicBool,
    corrections: Mailbox<AnchorTransform>,
    masks: Mailbox<GrayImage>,
}

/// One live AR session.
///
/// Camera-frame work (mask refinement, PnP correction) is submitted from
/// the capture side and executed on background workers; the render thread
/// polls the mailboxes and drives the bridge directly. Requests supersede
/// each other: a worker that falls behind drains its queue and only serves
/// the newest request (last-write-wins).
pub struct ArSession {
    shared: Arc<Shared>,
    refine_tx: Sender<RefineRequest>,
    refine_rx: Receiver<RefineRequest>,
    frame_tx: Sender<FrameMatches>,
    frame_rx: Receiver<FrameMatches>,
    workers: Vec<JoinHandle<()>>,
}

impl ArSession {
    /// Create a session over the given engine command surface and spawn the
    /// worker threads. The bridge starts uninitialized; call
    /// [`bridge`](Self::bridge)`.initialize(..)` from the render thread once
    /// a surface exists.
    pub fn new(engine: Box<dyn EngineCommands>, config: SessionConfig) -> Self {
        let shared = Arc::new(Shared {
            bridge: MappingEngineBridge::new(engine),
            shutdown: AtomicBool::new(false),
            corrections: Mailbox::new(),
            masks: Mailbox::new(),
        });

        // Capacity 1: the queues hold at most the request being worked on
        // plus one pending; submit_* drops the oldest pending on overflow.
        let (refine_tx, refine_rx) = bounded::<RefineRequest>(1);
        let (frame_tx, frame_rx) = bounded::<FrameMatches>(1);

        let workers = vec![
            Self::spawn_mask_worker(shared.clone(), refine_rx.clone(), config.flood_tolerance),
            Self::spawn_pose_worker(
                shared.clone(),
                frame_rx.clone(),
                PoseCorrector::with_min_correspondences(config.min_correspondences),
            ),
        ];

        Self {
            shared,
            refine_tx,
            refine_rx,
            frame_tx,
            frame_rx,
            workers,
        }
    }

    fn spawn_mask_worker(
        shared: Arc<Shared>,
        rx: Receiver<RefineRequest>,
        tolerance: u8,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            info!("mask refinement worker started");
            while !shared.shutdown.load(Ordering::SeqCst) {
                let Ok(mut req) = rx.recv_timeout(RECV_TIMEOUT) else {
                    continue;
                };
                // Only the newest tap matters.
                while let Ok(newer) = rx.try_recv() {
                    req = newer;
                }
                let mask = refine_with_tolerance(
                    &req.image,
                    &req.current_mask,
                    req.seed,
                    req.mode,
                    tolerance,
                );
                if shared.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                shared.masks.publish(mask);
            }
            debug!("mask refinement worker exiting");
        })
    }

    fn spawn_pose_worker(
        shared: Arc<Shared>,
        rx: Receiver<FrameMatches>,
        corrector: PoseCorrector,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            info!("pose correction worker started");
            while !shared.shutdown.load(Ordering::SeqCst) {
                let Ok(mut matches) = rx.recv_timeout(RECV_TIMEOUT) else {
                    continue;
                };
                while let Ok(newer) = rx.try_recv() {
                    matches = newer;
                }
                // The bridge re-validates the handle under its own lock, so
                // a correction landing after destroy() is a no-op rather
                // than a write into a dead engine.
                if let Some(correction) = corrector.track_and_correct(
                    &shared.bridge,
                    &matches.points2d,
                    &matches.points3d,
                    &matches.intrinsics,
                ) {
                    shared.corrections.publish(correction);
                }
            }
            debug!("pose correction worker exiting");
        })
    }

    /// The engine bridge. The render thread calls lifecycle, draw, and
    /// depth-feed operations through this; the bridge serializes them
    /// against the workers.
    pub fn bridge(&self) -> &MappingEngineBridge {
        &self.shared.bridge
    }

    /// Queue a mask-refinement tap; supersedes any pending tap.
    pub fn submit_refinement(&self, request: RefineRequest) {
        submit_latest(&self.refine_tx, &self.refine_rx, request);
    }

    /// Queue a frame's matched correspondences for pose correction;
    /// supersedes any pending frame.
    pub fn submit_frame_matches(&self, matches: FrameMatches) {
        submit_latest(&self.frame_tx, &self.frame_rx, matches);
    }

    /// Latest corrected anchor transform, if a new one arrived since the
    /// last call. Never blocks.
    pub fn take_correction(&self) -> Option<AnchorTransform> {
        self.shared.corrections.take()
    }

    /// Latest refined mask, if a new one arrived since the last call.
    pub fn take_refined_mask(&self) -> Option<GrayImage> {
        self.shared.masks.take()
    }

    /// Mapping quality in [0, 1]; lock-free, callable from any thread.
    pub fn mapping_quality(&self) -> f32 {
        self.shared.bridge.mapping_quality()
    }

    /// Stop the workers and wait for them. Idempotent.
    pub fn shutdown(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for ArSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Push into a bounded channel, evicting the oldest pending entry when full
/// so the newest request always wins.
fn submit_latest<T>(tx: &Sender<T>, rx: &Receiver<T>, value: T) {
    match tx.try_send(value) {
        Ok(()) => {}
        Err(TrySendError::Full(value)) => {
            let _ = rx.try_recv();
            let _ = tx.try_send(value);
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!("worker channel closed, dropping request");
        }
    }
}
