use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::capture::domain::capture_state::{CaptureState, CaptureStateError};
use crate::capture::domain::image_source::{Acquisition, ImageSource};
use crate::capture::domain::image_store::ImageStore;
use crate::capture::domain::tag_session::TagSession;
use crate::config::service_config::ServiceConfig;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::presentation::{AlertGate, Presenter};
use crate::recognition::domain::result_mapper::{classify_to_tags, detect_faces_to_tags};
use crate::recognition::domain::visual_recognizer::VisualRecognizer;
use crate::shared::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::shared::error::ApplicationError;
use crate::shared::tag::Tag;

impl From<CaptureStateError> for ApplicationError {
    fn from(err: CaptureStateError) -> Self {
        ApplicationError::ServiceError(err.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Also run face detection and append its tags after the classification tags.
    pub detect_faces: bool,
    /// Upper bound for the whole submission, both calls included.
    pub timeout: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            detect_faces: true,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<&ServiceConfig> for CaptureOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            detect_faces: config.detect_faces,
            timeout: config.timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// The service answered; these tags are now displayed.
    Tagged(Vec<Tag>),
    /// The user backed out of the image source. Nothing changed.
    SourceCancelled,
    /// `cancel()` was called before the service answered.
    Cancelled,
}

/// Capture pipeline: acquire → persist → recognize → map → publish.
///
/// The session starts out with the sample tags so a presenter has something
/// to render before the first capture.
///
/// One capture at a time. A capture requested while another is in flight is
/// rejected with `CaptureInProgress` and leaves the running one untouched;
/// call `cancel()` first to replace it. Every other failure clears the tags
/// and is raised once through the alert gate.
pub struct CaptureUseCase {
    recognizer: Box<dyn VisualRecognizer>,
    store: Arc<dyn ImageStore>,
    presenter: Arc<dyn Presenter>,
    session: Arc<RwLock<TagSession>>,
    alerts: AlertGate,
    logger: Mutex<Box<dyn PipelineLogger>>,
    options: CaptureOptions,
    in_flight: AtomicBool,
    cancel_token: Mutex<Option<CancellationToken>>,
}

impl CaptureUseCase {
    pub fn new(
        recognizer: Box<dyn VisualRecognizer>,
        store: Box<dyn ImageStore>,
        presenter: Arc<dyn Presenter>,
        options: CaptureOptions,
    ) -> Self {
        Self {
            recognizer,
            store: Arc::from(store),
            presenter,
            session: Arc::new(RwLock::new(TagSession::with_sample_tags())),
            alerts: AlertGate::new(),
            logger: Mutex::new(Box::new(NullPipelineLogger)),
            options,
            in_flight: AtomicBool::new(false),
            cancel_token: Mutex::new(None),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Mutex::new(logger);
        self
    }

    pub fn with_session(mut self, session: TagSession) -> Self {
        self.session = Arc::new(RwLock::new(session));
        self
    }

    /// Shared handle to the presented state, for the presentation layer.
    pub fn session(&self) -> Arc<RwLock<TagSession>> {
        Arc::clone(&self.session)
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.read_session().tags().to_vec()
    }

    pub fn state(&self) -> CaptureState {
        self.read_session().state()
    }

    /// Flips a tag between label and percentage; returns the new text.
    pub fn toggle(&self, index: usize) -> Option<String> {
        self.write_session().toggle(index).map(str::to_string)
    }

    pub fn dismiss_alert(&self) {
        self.alerts.dismiss();
    }

    /// Aborts the in-flight capture, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match lock(&self.cancel_token).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Emits the pipeline logger's summary.
    pub fn log_summary(&self) {
        lock(&self.logger).summary();
    }

    /// Runs one capture from `source` through to displayed tags or an alert.
    ///
    /// The source and the store run on the blocking pool; decoding and
    /// writing a full-size photo must not stall the runtime.
    pub async fn capture(
        &self,
        mut source: Box<dyn ImageSource>,
    ) -> Result<CaptureOutcome, ApplicationError> {
        let guard = self.begin()?;

        let acquire = tokio::task::spawn_blocking(move || source.acquire());
        let acquired = tokio::select! {
            _ = guard.token.cancelled() => return Ok(self.finish_cancelled()),
            joined = acquire => joined.unwrap_or_else(|e| {
                Err(ApplicationError::ServiceError(format!("image source failed: {e}")))
            }),
        };

        let bytes = match acquired {
            Ok(Acquisition::Image(bytes)) => bytes,
            Ok(Acquisition::Cancelled) => {
                log::info!("Image selection cancelled");
                return Ok(CaptureOutcome::SourceCancelled);
            }
            Err(e) => {
                self.alerts.raise(&e, self.presenter.as_ref());
                return Err(e);
            }
        };

        self.run(&guard.token, bytes).await
    }

    /// Runs a capture from image bytes that were acquired elsewhere.
    pub async fn submit(&self, bytes: Vec<u8>) -> Result<CaptureOutcome, ApplicationError> {
        let guard = self.begin()?;
        self.run(&guard.token, bytes).await
    }

    /// Claims the in-flight slot and installs a fresh cancellation token.
    fn begin(&self) -> Result<InFlightGuard<'_>, ApplicationError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Capture rejected: another capture is in flight");
            return Err(ApplicationError::CaptureInProgress);
        }
        let token = CancellationToken::new();
        *lock(&self.cancel_token) = Some(token.clone());
        Ok(InFlightGuard {
            use_case: self,
            token,
        })
    }

    async fn run(
        &self,
        token: &CancellationToken,
        bytes: Vec<u8>,
    ) -> Result<CaptureOutcome, ApplicationError> {
        log::info!("Capture started ({} bytes)", bytes.len());
        self.transition(CaptureState::ImageAcquired)?;

        let store = Arc::clone(&self.store);
        let started = Instant::now();
        let persist = tokio::task::spawn_blocking(move || store.persist(&bytes));
        let persisted = tokio::select! {
            _ = token.cancelled() => return Ok(self.finish_cancelled()),
            joined = persist => joined.unwrap_or_else(|e| Err(io::Error::other(e))),
        };
        self.record_timing("persist", started);
        let image_path = match persisted {
            Ok(path) => path,
            Err(e) => {
                let error = ApplicationError::ServiceError(format!("failed to store photo: {e}"));
                return Err(self.fail(error));
            }
        };

        {
            let mut session = self.write_session();
            session.clear();
            session.set_busy(true);
        }
        self.transition(CaptureState::Submitting)?;
        self.publish();

        let result = tokio::select! {
            _ = token.cancelled() => None,
            result = tokio::time::timeout(self.options.timeout, self.recognize(&image_path)) => {
                Some(result.unwrap_or_else(|_| {
                    Err(ApplicationError::ServiceError("request timed out".to_string()))
                }))
            }
        };

        match result {
            None => Ok(self.finish_cancelled()),
            Some(Ok(tags)) => {
                lock(&self.logger).metric("tag_count", tags.len() as f64);
                log::info!("Capture produced {} tags", tags.len());
                {
                    let mut session = self.write_session();
                    session.replace(tags.clone());
                    session.set_busy(false);
                }
                self.transition(CaptureState::TagsReady)?;
                self.publish();
                self.transition(CaptureState::Idle)?;
                Ok(CaptureOutcome::Tagged(tags))
            }
            Some(Err(e)) => Err(self.fail(e)),
        }
    }

    /// Returns to `Idle` without an alert. Tags cleared for the submission stay cleared.
    fn finish_cancelled(&self) -> CaptureOutcome {
        log::info!("Capture cancelled");
        if self.reset_to_idle() {
            self.presenter.state_changed(CaptureState::Idle);
            self.publish();
        }
        CaptureOutcome::Cancelled
    }

    /// Forces the session back to `Idle`; returns whether it was elsewhere.
    fn reset_to_idle(&self) -> bool {
        let mut session = self.write_session();
        if session.state() == CaptureState::Idle {
            return false;
        }
        session.clear();
        session.reset_state();
        true
    }

    /// Issues classification (and face detection if enabled) concurrently
    /// and merges the tags once both have settled.
    async fn recognize(&self, image: &Path) -> Result<Vec<Tag>, ApplicationError> {
        let classify = self.timed("classify", self.recognizer.classify(image));

        let (classified, faces) = if self.options.detect_faces {
            let detect = self.timed("detect_faces", self.recognizer.detect_faces(image));
            let (classified, faces) = tokio::join!(classify, detect);
            (classified, Some(faces))
        } else {
            (classify.await, None)
        };

        let mut tags = Vec::new();
        let mut any_data = false;

        if let Ok(class_tags) = classify_to_tags(classified?.as_ref()) {
            any_data = true;
            tags.extend(class_tags);
        }

        match faces {
            Some(Ok(response)) => {
                if let Ok(face_tags) = detect_faces_to_tags(response.as_ref()) {
                    any_data = true;
                    tags.extend(face_tags);
                }
            }
            Some(Err(e)) => log::warn!("Face detection failed: {e}"),
            None => {}
        }

        if any_data {
            Ok(tags)
        } else {
            Err(ApplicationError::EmptyResult)
        }
    }

    async fn timed<T>(&self, stage: &str, fut: impl Future<Output = T>) -> T {
        let started = Instant::now();
        let output = fut.await;
        self.record_timing(stage, started);
        output
    }

    fn record_timing(&self, stage: &str, started: Instant) {
        let ms = started.elapsed().as_secs_f64() * 1000.0;
        lock(&self.logger).timing(stage, ms);
    }

    /// Clears the tags, passes through `Failed` back to `Idle`, and raises
    /// the error once.
    fn fail(&self, error: ApplicationError) -> ApplicationError {
        {
            let mut session = self.write_session();
            session.clear();
            session.set_busy(false);
        }
        if let Err(e) = self.transition(CaptureState::Failed) {
            log::error!("{e}");
            self.write_session().reset_state();
        }
        self.publish();
        self.alerts.raise(&error, self.presenter.as_ref());
        if let Err(e) = self.transition(CaptureState::Idle) {
            log::error!("{e}");
            self.write_session().reset_state();
        }
        error
    }

    fn transition(&self, next: CaptureState) -> Result<(), CaptureStateError> {
        self.write_session().advance(next)?;
        self.presenter.state_changed(next);
        Ok(())
    }

    /// Pushes the current tags and busy flag to the presenter, outside the lock.
    fn publish(&self) {
        let (tags, busy) = {
            let session = self.read_session();
            (session.tags().to_vec(), session.is_busy())
        };
        self.presenter.tags_changed(&tags);
        self.presenter.busy_changed(busy);
    }

    fn read_session(&self) -> RwLockReadGuard<'_, TagSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, TagSession> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the single in-flight slot for the duration of a capture.
///
/// A capture future dropped mid-flight (outer timeout, `select!`, aborted
/// task) never reaches its own cleanup, so the guard puts the session back
/// to `Idle` when it is released early.
struct InFlightGuard<'a> {
    use_case: &'a CaptureUseCase,
    token: CancellationToken,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let use_case = self.use_case;
        *lock(&use_case.cancel_token) = None;
        if use_case.reset_to_idle() {
            log::warn!("Capture dropped before completion, session reset");
            use_case.presenter.state_changed(CaptureState::Idle);
            use_case.publish();
        }
        use_case.in_flight.store(false, Ordering::Release);
    }
}
