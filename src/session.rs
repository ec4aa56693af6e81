//! Capture session state machine
//!
//! Coordinates continuous scanning, frame locking once a plate is found,
//! OCR processing and reset. The session is single-threaded and
//! cooperative: the periodic detection tick and the OCR completion are the
//! only suspension points, and the state enum plus a monotonically
//! increasing cycle id are the sole mutual exclusion. Late OCR results are
//! checked against the current cycle and discarded when stale.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::{GrayImage, RgbaImage};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::{Frame, FrameSource};
use crate::config::AppConfig;
use crate::error::{CycleError, OcrError};
use crate::ocr::{normalize, OcrEngine};
use crate::vision::ocr_preprocess::prepare_for_ocr;
use crate::vision::PlateDetector;

/// Lifecycle of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No timer active, no source engaged
    Idle,
    /// Periodic detection ticks are running
    Scanning,
    /// A frame is retained and OCR is scheduled
    Locked,
    /// OCR is in flight against the locked frame
    Processing,
    /// A result (or error) is available; reset re-arms scanning
    Done,
}

/// The one resource whose lifetime spans multiple cycles
struct LockedCycle {
    id: u64,
    frame: Frame,
    char_zone: RgbaImage,
}

/// Scan session controller
pub struct Session<S: FrameSource> {
    source: S,
    engine: Arc<dyn OcrEngine>,
    detector: PlateDetector,
    config: AppConfig,
    state: SessionState,
    cycle: u64,
    locked: Option<LockedCycle>,
    cancel: CancellationToken,
    outcome: Option<Result<String, CycleError>>,
}

impl<S: FrameSource> Session<S> {
    pub fn new(source: S, engine: Arc<dyn OcrEngine>, config: AppConfig) -> Self {
        let detector = PlateDetector::new(config.detection.clone(), config.crop.clone());
        Self {
            source,
            engine,
            detector,
            config,
            state: SessionState::Idle,
            cycle: 0,
            locked: None,
            cancel: CancellationToken::new(),
            outcome: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Result of the last completed cycle, available in `Done`
    pub fn outcome(&self) -> Option<&Result<String, CycleError>> {
        self.outcome.as_ref()
    }

    pub fn has_locked_frame(&self) -> bool {
        self.locked.is_some()
    }

    /// Idle → Scanning
    pub fn start(&mut self) {
        if self.state != SessionState::Idle {
            return;
        }
        self.cancel = CancellationToken::new();
        self.outcome = None;
        self.state = SessionState::Scanning;
        info!("session started, scanning");
    }

    /// One detection pass over the latest frame. No-ops unless scanning.
    pub fn tick(&mut self) {
        if self.state != SessionState::Scanning {
            debug!(state = ?self.state, "tick ignored");
            return;
        }

        let frame = match self.source.latest_frame() {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%err, "skipping cycle");
                return;
            }
        };
        if frame.is_empty() {
            debug!("empty frame, skipping cycle");
            return;
        }

        match self.detector.detect(&frame) {
            Ok(detection) => {
                self.cycle += 1;
                info!(
                    cycle = self.cycle,
                    score = detection.candidate.score,
                    "plate found, locking frame"
                );
                self.locked = Some(LockedCycle {
                    id: self.cycle,
                    frame,
                    char_zone: detection.char_zone,
                });
                self.state = SessionState::Locked;
            }
            Err(CycleError::NoPlateFound) | Err(CycleError::DegenerateGeometry) => {
                debug!("no usable plate this cycle");
            }
            Err(err) => {
                debug!(%err, "cycle aborted");
            }
        }
    }

    /// Locked → Processing → Done: run OCR against the retained frame.
    pub async fn process(&mut self) {
        if self.state != SessionState::Locked {
            debug!(state = ?self.state, "process ignored");
            return;
        }
        let Some(locked) = self.locked.as_ref() else {
            warn!("locked state without a retained frame, rescanning");
            self.state = SessionState::Scanning;
            return;
        };

        let id = locked.id;
        let prepared = prepare_for_ocr(&locked.char_zone, &self.config.ocr.preprocess);
        self.export_artifact(&prepared, &locked.frame);
        self.state = SessionState::Processing;

        let engine = Arc::clone(&self.engine);
        let settings = self.config.ocr.clone();
        let cancel = self.cancel.clone();
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                warn!(cycle = id, "OCR cancelled");
                return;
            }
            result = engine.recognize(&prepared, &settings) => result,
        };
        self.apply_ocr_result(id, result);
    }

    /// Apply an OCR completion, discarding it when it no longer belongs to
    /// the current cycle.
    fn apply_ocr_result(&mut self, cycle: u64, result: Result<String, OcrError>) {
        let current = self.locked.as_ref().map(|l| l.id);
        if self.state != SessionState::Processing || current != Some(cycle) {
            warn!(cycle, state = ?self.state, "discarding stale OCR result");
            return;
        }

        match result {
            Ok(raw) => {
                let plate = normalize::normalize_plate(&raw, &self.config.ocr.ignore_words);
                info!(cycle, %plate, "plate recognized");
                self.outcome = Some(Ok(plate));
            }
            Err(err) => {
                warn!(cycle, %err, "OCR failed");
                self.outcome = Some(Err(CycleError::Ocr(err)));
            }
        }
        self.state = SessionState::Done;
    }

    /// Done → Scanning: discard the retained frame and re-arm scanning.
    pub fn reset(&mut self) {
        if self.state != SessionState::Done {
            return;
        }
        self.locked = None;
        self.outcome = None;
        self.state = SessionState::Scanning;
        info!("session reset, scanning");
    }

    /// Any state → Idle. Cancels in-flight OCR and drops the retained frame.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.locked = None;
        self.state = SessionState::Idle;
        info!("session stopped");
    }

    fn export_artifact(&self, image: &GrayImage, frame: &Frame) {
        if !self.config.output.save_artifact {
            return;
        }
        let dir = self
            .config
            .output
            .artifact_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let path = dir.join(format!("plate_{}.png", frame.unix_millis()));
        match image.save(&path) {
            Ok(()) => info!(path = %path.display(), "character zone exported"),
            Err(err) => warn!(%err, "failed to export character zone"),
        }
    }

    /// Drive the session until a result is available or the scan budget
    /// runs out.
    pub async fn run(&mut self) -> SessionState {
        self.start();
        let mut ticker = time::interval(Duration::from_millis(self.config.session.tick_interval_ms));
        let settle = Duration::from_millis(self.config.session.settle_delay_ms);
        let mut fruitless_ticks = 0u32;

        loop {
            match self.state {
                SessionState::Scanning => {
                    if fruitless_ticks >= self.config.session.max_scan_ticks {
                        info!(
                            ticks = fruitless_ticks,
                            "no plate found within the scan budget"
                        );
                        self.stop();
                        break;
                    }
                    ticker.tick().await;
                    self.tick();
                    fruitless_ticks += 1;
                }
                SessionState::Locked => {
                    time::sleep(settle).await;
                    self.process().await;
                }
                SessionState::Processing | SessionState::Done | SessionState::Idle => break,
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, OcrSettings};
    use async_trait::async_trait;
    use image::Rgba;

    struct TestSource {
        frame: Frame,
    }

    impl FrameSource for TestSource {
        fn latest_frame(&mut self) -> Result<Frame, CycleError> {
            Ok(self.frame.clone())
        }
    }

    struct NotReadySource;

    impl FrameSource for NotReadySource {
        fn latest_frame(&mut self) -> Result<Frame, CycleError> {
            Err(CycleError::SourceNotReady)
        }
    }

    struct ScriptedEngine {
        text: &'static str,
    }

    #[async_trait]
    impl OcrEngine for ScriptedEngine {
        async fn recognize(
            &self,
            _image: &GrayImage,
            _settings: &OcrSettings,
        ) -> Result<String, OcrError> {
            Ok(self.text.to_string())
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl OcrEngine for FailingEngine {
        async fn recognize(
            &self,
            _image: &GrayImage,
            _settings: &OcrSettings,
        ) -> Result<String, OcrError> {
            Err(OcrError::EngineFailed {
                code: 1,
                stderr: "engine exploded".to_string(),
            })
        }
    }

    fn plate_frame() -> Frame {
        let mut img = RgbaImage::from_pixel(640, 480, Rgba([15, 15, 15, 255]));
        for y in 100..182 {
            for x in 100..346 {
                img.put_pixel(x, y, Rgba([235, 235, 235, 255]));
            }
        }
        Frame::new(img.into_raw(), 640, 480)
    }

    fn blank_frame() -> Frame {
        let img = RgbaImage::from_pixel(640, 480, Rgba([15, 15, 15, 255]));
        Frame::new(img.into_raw(), 640, 480)
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.output.save_artifact = false;
        config
    }

    fn plate_session(engine: Arc<dyn OcrEngine>) -> Session<TestSource> {
        Session::new(
            TestSource {
                frame: plate_frame(),
            },
            engine,
            test_config(),
        )
    }

    #[test]
    fn test_tick_ignored_when_idle() {
        let mut session = plate_session(Arc::new(ScriptedEngine { text: "ABC1D23" }));
        session.tick();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_locked_frame());
    }

    #[test]
    fn test_scanning_locks_on_plate_and_suppresses_ticks() {
        let mut session = plate_session(Arc::new(ScriptedEngine { text: "ABC1D23" }));
        session.start();
        assert_eq!(session.state(), SessionState::Scanning);

        session.tick();
        assert_eq!(session.state(), SessionState::Locked);
        assert!(session.has_locked_frame());

        // A residual tick must not start a second cycle.
        session.tick();
        assert_eq!(session.state(), SessionState::Locked);
    }

    #[test]
    fn test_no_plate_keeps_scanning() {
        let mut session = Session::new(
            TestSource {
                frame: blank_frame(),
            },
            Arc::new(ScriptedEngine { text: "ABC1D23" }) as Arc<dyn OcrEngine>,
            test_config(),
        );
        session.start();
        session.tick();
        assert_eq!(session.state(), SessionState::Scanning);
        assert!(!session.has_locked_frame());
    }

    #[test]
    fn test_source_not_ready_skips_cycle() {
        let mut session = Session::new(
            NotReadySource,
            Arc::new(ScriptedEngine { text: "ABC1D23" }) as Arc<dyn OcrEngine>,
            test_config(),
        );
        session.start();
        session.tick();
        assert_eq!(session.state(), SessionState::Scanning);
    }

    #[tokio::test]
    async fn test_process_produces_normalized_outcome() {
        let mut session = plate_session(Arc::new(ScriptedEngine {
            text: "BRASIL ABC1D23",
        }));
        session.start();
        session.tick();
        session.process().await;

        assert_eq!(session.state(), SessionState::Done);
        match session.outcome() {
            Some(Ok(plate)) => assert_eq!(plate, "ABC1D23"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ocr_failure_surfaces_error() {
        let mut session = plate_session(Arc::new(FailingEngine));
        session.start();
        session.tick();
        session.process().await;

        assert_eq!(session.state(), SessionState::Done);
        assert!(matches!(
            session.outcome(),
            Some(Err(CycleError::Ocr(OcrError::EngineFailed { .. })))
        ));
    }

    #[tokio::test]
    async fn test_reset_returns_to_scanning() {
        let mut session = plate_session(Arc::new(ScriptedEngine { text: "ABC1D23" }));
        session.start();
        session.tick();
        session.process().await;
        assert_eq!(session.state(), SessionState::Done);

        session.reset();
        assert_eq!(session.state(), SessionState::Scanning);
        assert!(!session.has_locked_frame());
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_stop_from_locked_drops_frame() {
        let mut session = plate_session(Arc::new(ScriptedEngine { text: "ABC1D23" }));
        session.start();
        session.tick();
        assert!(session.has_locked_frame());

        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_locked_frame());
    }

    #[tokio::test]
    async fn test_process_after_stop_is_ignored() {
        let mut session = plate_session(Arc::new(ScriptedEngine { text: "ABC1D23" }));
        session.start();
        session.tick();
        session.stop();

        session.process().await;
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_stale_ocr_result_discarded() {
        let mut session = plate_session(Arc::new(ScriptedEngine { text: "ABC1D23" }));
        session.start();
        session.tick();
        let stale_cycle = 1;
        session.stop();

        // A completion arriving after stop must not mutate the session.
        session.apply_ocr_result(stale_cycle, Ok("ABC1D23".to_string()));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.outcome().is_none());
    }

    #[tokio::test]
    async fn test_artifact_exported_on_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.output.save_artifact = true;
        config.output.artifact_dir = Some(dir.path().to_path_buf());

        let mut session = Session::new(
            TestSource {
                frame: plate_frame(),
            },
            Arc::new(ScriptedEngine { text: "ABC1D23" }) as Arc<dyn OcrEngine>,
            config,
        );
        session.start();
        session.tick();
        session.process().await;

        let artifacts: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy().into_owned();
                name.starts_with("plate_") && name.ends_with(".png")
            })
            .collect();
        assert_eq!(artifacts.len(), 1);
    }

    #[tokio::test]
    async fn test_run_completes_with_result() {
        let mut config = test_config();
        config.session.tick_interval_ms = 1;
        config.session.settle_delay_ms = 1;
        let mut session = Session::new(
            TestSource {
                frame: plate_frame(),
            },
            Arc::new(ScriptedEngine { text: "ABC1D23" }) as Arc<dyn OcrEngine>,
            config,
        );
        let state = session.run().await;
        assert_eq!(state, SessionState::Done);
        assert!(matches!(session.outcome(), Some(Ok(_))));
    }

    #[tokio::test]
    async fn test_run_gives_up_without_plate() {
        let mut config = test_config();
        config.session.tick_interval_ms = 1;
        config.session.max_scan_ticks = 3;
        let mut session = Session::new(
            TestSource {
                frame: blank_frame(),
            },
            Arc::new(ScriptedEngine { text: "ABC1D23" }) as Arc<dyn OcrEngine>,
            config,
        );
        let state = session.run().await;
        assert_eq!(state, SessionState::Idle);
        assert!(session.outcome().is_none());
    }
}
