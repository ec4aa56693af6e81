//! Error taxonomy for the scan pipeline.

use thiserror::Error;

/// Failure from the external OCR engine.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to encode image for the OCR engine: {0}")]
    ImageEncode(#[from] image::ImageError),
    #[error("failed to launch the OCR engine: {0}")]
    EngineSpawn(#[source] std::io::Error),
    #[error("OCR engine exited with code {code}: {stderr}")]
    EngineFailed { code: i32, stderr: String },
    #[error("OCR engine produced non-UTF-8 output")]
    InvalidOutput,
}

/// Per-cycle failures. None of these are fatal to a session; every variant
/// maps to a defined state transition in the session controller.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("frame source is not ready")]
    SourceNotReady,
    #[error("captured frame has no content")]
    EmptyFrame,
    #[error("no plate-shaped region found")]
    NoPlateFound,
    #[error("candidate corners are degenerate, cannot rectify")]
    DegenerateGeometry,
    #[error("text recognition failed: {0}")]
    Ocr(#[from] OcrError),
}
