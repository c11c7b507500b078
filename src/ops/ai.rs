// ============================================================================
// AI GENERATION — background worker around a pluggable blocking backend
// ============================================================================
//
// The engine never talks to a network itself. A `GenerationBackend` performs
// the blocking request/response cycle (bounded by its own transport timeout);
// `submit_generation` runs it on a dedicated thread and hands back a handle
// the interactive loop polls. The worker never touches shared editor state.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::ops::transform::scale_image;

/// Default transport timeout when the user has not configured one.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoint settings taken from the active model profile.
#[derive(Clone, Debug, Default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    pub count: u32,
    pub timeout: Duration,
    pub endpoint: EndpointConfig,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, endpoint: EndpointConfig) -> Self {
        Self {
            prompt: prompt.into(),
            count: 1,
            timeout: DEFAULT_GENERATION_TIMEOUT,
            endpoint,
        }
    }
}

/// Categorized failure surfaced to the user; none of these crash the editor.
#[derive(Clone, Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("the service returned no images")]
    EmptyResult,
}

/// The blocking client. Implementations own transport, request schema and
/// decoding; the engine treats all of that as a black box.
pub trait GenerationBackend: Send + 'static {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<RgbaImage>, GenerationError>;
}

impl<F> GenerationBackend for F
where
    F: Fn(&GenerationRequest) -> Result<Vec<RgbaImage>, GenerationError> + Send + 'static,
{
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<RgbaImage>, GenerationError> {
        self(request)
    }
}

/// Poll result for an in-flight request.
pub enum GenerationStatus {
    Pending,
    Done(Vec<RgbaImage>),
    Failed(GenerationError),
}

/// Handle to one background generation request.
pub struct GenerationHandle {
    rx: mpsc::Receiver<Result<Vec<RgbaImage>, GenerationError>>,
}

impl GenerationHandle {
    /// Non-blocking poll. Returns `Pending` until the worker finishes, then
    /// yields the outcome once; a vanished worker reports as a network error.
    pub fn poll(&mut self) -> GenerationStatus {
        match self.rx.try_recv() {
            Ok(Ok(images)) => GenerationStatus::Done(images),
            Ok(Err(e)) => GenerationStatus::Failed(e),
            Err(mpsc::TryRecvError::Empty) => GenerationStatus::Pending,
            Err(mpsc::TryRecvError::Disconnected) => {
                GenerationStatus::Failed(GenerationError::Network("worker vanished".into()))
            }
        }
    }

    /// Block until the outcome arrives (tests, CLI usage).
    pub fn wait(self) -> Result<Vec<RgbaImage>, GenerationError> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Network("worker vanished".into())),
        }
    }
}

/// Spawn one worker thread for `request`. The request is not preemptible;
/// the backend's own timeout bounds it. One request per user action — the
/// caller disables re-submission while a handle is outstanding.
pub fn submit_generation<B: GenerationBackend>(
    backend: B,
    request: GenerationRequest,
) -> GenerationHandle {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("generation-worker".into())
        .spawn(move || {
            log::info!(
                "generation: prompt {:?} (count {}, timeout {:?})",
                request.prompt,
                request.count,
                request.timeout
            );
            let result = backend.generate(&request);
            if let Err(ref e) = result {
                log::warn!("generation failed: {e}");
            }
            // Receiver may be gone if the user closed the dialog; fine.
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        // Sender drops with the closure; the handle reports the vanished
        // worker on its next poll.
        log::error!("could not spawn generation worker: {e}");
    }
    GenerationHandle { rx }
}

/// Place the first generated image onto a canvas-sized buffer: scaled to fit
/// with aspect ratio preserved, centered, background-filled margins.
pub fn fit_generated_image(
    img: &RgbaImage,
    canvas_w: u32,
    canvas_h: u32,
    background: Rgba<u8>,
) -> RgbaImage {
    let canvas_w = canvas_w.max(1);
    let canvas_h = canvas_h.max(1);
    let sx = canvas_w as f32 / img.width() as f32;
    let sy = canvas_h as f32 / img.height() as f32;
    let s = sx.min(sy);
    let fit_w = ((img.width() as f32 * s).round() as u32).clamp(1, canvas_w);
    let fit_h = ((img.height() as f32 * s).round() as u32).clamp(1, canvas_h);
    let scaled = scale_image(img, fit_w, fit_h);

    let mut out = RgbaImage::from_pixel(canvas_w, canvas_h, background);
    let ox = (canvas_w - fit_w) / 2;
    let oy = (canvas_h - fit_h) / 2;
    for (x, y, &px) in scaled.enumerate_pixels() {
        out.put_pixel(ox + x, oy + y, px);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::WHITE;

    fn request() -> GenerationRequest {
        GenerationRequest::new("a red square", EndpointConfig::default())
    }

    #[test]
    fn worker_delivers_images() {
        let backend = |_req: &GenerationRequest| {
            Ok(vec![RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))])
        };
        let images = submit_generation(backend, request()).wait().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].width(), 4);
    }

    #[test]
    fn worker_reports_categorized_failure() {
        let backend = |_req: &GenerationRequest| Err(GenerationError::EmptyResult);
        let err = submit_generation(backend, request()).wait().unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResult));
    }

    #[test]
    fn poll_sees_pending_then_done() {
        let (block_tx, block_rx) = mpsc::channel::<()>();
        let backend = move |_req: &GenerationRequest| {
            block_rx.recv().ok();
            Ok(vec![RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]))])
        };
        let mut handle = submit_generation(backend, request());
        assert!(matches!(handle.poll(), GenerationStatus::Pending));
        block_tx.send(()).unwrap();
        loop {
            match handle.poll() {
                GenerationStatus::Pending => thread::yield_now(),
                GenerationStatus::Done(images) => {
                    assert_eq!(images.len(), 1);
                    break;
                }
                GenerationStatus::Failed(e) => panic!("unexpected failure: {e}"),
            }
        }
    }

    #[test]
    fn fit_preserves_aspect_and_centers() {
        // 100×50 source onto a 60×60 canvas: fits to 60×30, centered at y=15.
        let img = RgbaImage::from_pixel(100, 50, Rgba([0, 0, 255, 255]));
        let out = fit_generated_image(&img, 60, 60, WHITE);
        assert_eq!((out.width(), out.height()), (60, 60));
        assert_eq!(*out.get_pixel(30, 5), WHITE);
        assert_eq!(*out.get_pixel(30, 30), Rgba([0, 0, 255, 255]));
    }
}
