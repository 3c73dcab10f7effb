//! Reference-counted tracker lifecycle.

use super::pipeline::TrackerBackend;
use super::runner::Worker;
use super::StopSignal;
use crate::capture::TrackerConfig;
use crate::telemetry::{SnapshotStream, TelemetryPublisher, TelemetrySnapshot};
use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Point-in-time view of the lifecycle counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleStats {
    /// Active consumers.
    pub refcount: usize,
    /// Whether a worker is currently attached.
    pub running: bool,
    /// Workers started since the service was created.
    pub starts: u64,
    /// Workers stopped since the service was created.
    pub stops: u64,
}

struct WorkerHandle {
    stop: StopSignal,
    thread: JoinHandle<()>,
}

#[derive(Default)]
struct LifecycleState {
    refcount: usize,
    worker: Option<WorkerHandle>,
    /// Stopped worker that may still be tearing down. The next worker
    /// joins it before probing, so two never hold the camera at once.
    retired: Option<JoinHandle<()>>,
    starts: u64,
    stops: u64,
}

struct ServiceInner {
    config: TrackerConfig,
    backend: Arc<dyn TrackerBackend>,
    publisher: Arc<TelemetryPublisher>,
    state: Mutex<LifecycleState>,
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = state.worker.take() {
            worker.stop.raise();
        }
    }
}

/// Shared face-telemetry feed.
///
/// One background worker runs while at least one consumer holds the
/// service acquired; all consumers read the same published snapshots.
/// Cloning the service is cheap and yields another handle to the same
/// feed.
///
/// ```no_run
/// use std::sync::Arc;
/// use face_telemetry::{SyntheticBackend, TelemetryService, TrackerConfig};
/// use face_telemetry::worker::StopSignal;
///
/// let service = TelemetryService::new(TrackerConfig::default(), Arc::new(SyntheticBackend::default()));
/// let session = service.session();
/// for snapshot in session.stream(10, StopSignal::new()).take(20).flatten() {
///     println!("{:?}", snapshot.stress_index());
/// }
/// ```
#[derive(Clone)]
pub struct TelemetryService {
    inner: Arc<ServiceInner>,
}

impl TelemetryService {
    /// Creates an idle service; no worker runs until the first acquire.
    pub fn new(config: TrackerConfig, backend: Arc<dyn TrackerBackend>) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                config,
                backend,
                publisher: Arc::new(TelemetryPublisher::new()),
                state: Mutex::new(LifecycleState::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, LifecycleState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a consumer, starting the worker if none is attached.
    ///
    /// Never waits for a previous worker to finish; the new worker thread
    /// does that before touching the camera.
    pub fn acquire(&self) {
        let failure = {
            let mut state = self.state();
            state.refcount += 1;
            debug!(refcount = state.refcount, "Telemetry acquired");
            if state.worker.is_some() {
                return;
            }

            let predecessor = state.retired.take();
            match self.spawn_worker(predecessor) {
                Ok(handle) => {
                    state.worker = Some(handle);
                    state.starts += 1;
                    return;
                }
                Err(e) => e,
            }
        };

        // Lifecycle lock released; the next acquire retries the spawn
        error!(error = %failure, "Failed to spawn tracking worker");
        self.inner.publisher.writer().publish(TelemetrySnapshot::unavailable(
            Utc::now(),
            format!("failed to start tracking worker: {}", failure),
        ));
    }

    /// Unregisters a consumer, stopping the worker after the last one.
    ///
    /// Returns without waiting for the worker thread; it notices the stop
    /// signal at its next check and releases its resources on its own.
    /// Releasing with no consumers registered does nothing.
    pub fn release(&self) {
        let mut state = self.state();
        if state.refcount == 0 {
            debug!("Telemetry released with no consumers");
            return;
        }
        state.refcount -= 1;
        if state.refcount == 0 {
            if let Some(worker) = state.worker.take() {
                worker.stop.raise();
                state.retired = Some(worker.thread);
                state.stops += 1;
                info!("Last consumer released, stopping tracking worker");
            }
        }
        debug!(refcount = state.refcount, "Telemetry released");
    }

    /// Acquires the service for the lifetime of the returned guard.
    pub fn session(&self) -> TelemetrySession {
        self.acquire();
        TelemetrySession {
            service: self.clone(),
        }
    }

    /// Latest published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.inner.publisher.latest()
    }

    /// Pull-paced stream of the latest snapshot.
    pub fn stream(&self, fps: u32, cancel: StopSignal) -> SnapshotStream {
        SnapshotStream::new(Arc::clone(&self.inner.publisher), fps, cancel)
    }

    /// The publisher every worker of this service writes to.
    pub fn publisher(&self) -> Arc<TelemetryPublisher> {
        Arc::clone(&self.inner.publisher)
    }

    /// Current lifecycle counters.
    pub fn stats(&self) -> LifecycleStats {
        let state = self.state();
        LifecycleStats {
            refcount: state.refcount,
            running: state.worker.is_some(),
            starts: state.starts,
            stops: state.stops,
        }
    }

    /// Starts a worker thread.
    ///
    /// The thread joins `predecessor` first and only then opens its
    /// publisher generation, so the slot lock is never taken under the
    /// lifecycle lock.
    fn spawn_worker(
        &self,
        predecessor: Option<JoinHandle<()>>,
    ) -> std::io::Result<WorkerHandle> {
        let stop = StopSignal::new();
        let worker_stop = stop.clone();
        let config = self.inner.config.clone();
        let publisher = Arc::clone(&self.inner.publisher);
        let backend = Arc::clone(&self.inner.backend);

        let thread = thread::Builder::new()
            .name("face-tracker".into())
            .spawn(move || {
                if let Some(previous) = predecessor {
                    if previous.join().is_err() {
                        error!("Previous tracking worker panicked");
                    }
                }
                if worker_stop.is_raised() {
                    return;
                }

                let writer = publisher.writer();
                let generation = writer.generation();
                info!(generation, "Tracking worker started");
                let worker = Worker::new(config, writer, worker_stop);
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| worker.run(backend.as_ref())));
                if outcome.is_err() {
                    error!(generation, "Tracking worker panicked");
                }
            })?;

        Ok(WorkerHandle { stop, thread })
    }
}

/// RAII consumer registration; releases the service when dropped.
pub struct TelemetrySession {
    service: TelemetryService,
}

impl TelemetrySession {
    /// Latest published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.service.latest()
    }

    /// Pull-paced stream of the latest snapshot.
    pub fn stream(&self, fps: u32, cancel: StopSignal) -> SnapshotStream {
        self.service.stream(fps, cancel)
    }
}

impl Drop for TelemetrySession {
    fn drop(&mut self) {
        self.service.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Camera, CameraError, CaptureConfig, MockCamera};
    use crate::landmarks::{
        DetectorError, FaceGeometry, LandmarkDetector, ScriptedDetector, ScriptedResult,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Camera that refuses to open while another handle holds the device.
    struct ExclusiveCamera {
        inner: MockCamera,
        in_use: Arc<AtomicBool>,
        held: bool,
    }

    impl Camera for ExclusiveCamera {
        fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
            if self.in_use.swap(true, Ordering::SeqCst) {
                return Err(CameraError::DeviceNotFound("device busy".into()));
            }
            self.held = true;
            self.inner.open(config)
        }

        fn capture(&mut self) -> Result<crate::capture::Frame, CameraError> {
            self.inner.capture()
        }

        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        fn close(&mut self) {
            self.inner.close();
            if std::mem::take(&mut self.held) {
                self.in_use.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Detector that takes a fixed time per call.
    struct SlowDetector {
        inner: ScriptedDetector,
        delay: Duration,
    }

    impl LandmarkDetector for SlowDetector {
        fn detect(
            &mut self,
            frame: &crate::capture::Frame,
            timestamp_ms: u64,
        ) -> ScriptedResult {
            thread::sleep(self.delay);
            self.inner.detect(frame, timestamp_ms)
        }

        fn close(&mut self) {
            self.inner.close();
        }
    }

    /// Backend recording every camera/detector it hands out.
    #[derive(Default)]
    struct TestBackend {
        camera_missing: bool,
        /// Transient capture failures injected after each open.
        capture_failures: u32,
        /// Shared device flag; set for a single-handle camera.
        exclusive: Option<Arc<AtomicBool>>,
        detect_delay: Option<Duration>,
        script: Vec<ScriptedResult>,
        camera_opens: AtomicUsize,
        opened: AtomicUsize,
        closed_flags: Mutex<Vec<Arc<AtomicBool>>>,
    }

    impl TestBackend {
        fn with_script(script: Vec<ScriptedResult>) -> Self {
            Self {
                script,
                ..Default::default()
            }
        }

        fn all_closed(&self) -> bool {
            self.closed_flags
                .lock()
                .unwrap()
                .iter()
                .all(|f| f.load(Ordering::Acquire))
        }
    }

    impl TrackerBackend for TestBackend {
        fn open_camera(&self, config: &CaptureConfig) -> Result<Box<dyn Camera>, CameraError> {
            self.camera_opens.fetch_add(1, Ordering::SeqCst);
            let mut mock = if self.camera_missing {
                MockCamera::unavailable("no camera")
            } else {
                MockCamera::new()
            };
            mock.fail_next(self.capture_failures);

            let mut camera: Box<dyn Camera> = match &self.exclusive {
                Some(in_use) => Box::new(ExclusiveCamera {
                    inner: mock,
                    in_use: Arc::clone(in_use),
                    held: false,
                }),
                None => Box::new(mock),
            };
            camera.open(config)?;
            Ok(camera)
        }

        fn open_detector(
            &self,
            _config: &TrackerConfig,
        ) -> Result<Box<dyn LandmarkDetector>, DetectorError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let detector = ScriptedDetector::new(self.script.clone());
            self.closed_flags.lock().unwrap().push(detector.closed_flag());
            Ok(match self.detect_delay {
                Some(delay) => Box::new(SlowDetector {
                    inner: detector,
                    delay,
                }),
                None => Box::new(detector),
            })
        }
    }

    fn fast_config() -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.capture = CaptureConfig::with_dimensions(64, 48);
        config.capture.fps = 100;
        config.degraded_interval_ms = 20;
        config
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    fn blinking_script() -> Vec<ScriptedResult> {
        let closed = FaceGeometry {
            ear: 0.1,
            ..FaceGeometry::default()
        };
        let open = FaceGeometry::default();
        vec![
            Ok(Some(closed.landmarks(64, 48))),
            Ok(Some(open.landmarks(64, 48))),
        ]
    }

    #[test]
    fn test_balanced_acquire_release_single_worker() {
        let backend = Arc::new(TestBackend::with_script(vec![Ok(None)]));
        let service = TelemetryService::new(fast_config(), backend.clone());

        for _ in 0..5 {
            service.acquire();
        }
        let stats = service.stats();
        assert_eq!(stats.refcount, 5);
        assert!(stats.running);
        assert_eq!(stats.starts, 1);

        for _ in 0..5 {
            service.release();
        }
        // Extra release is a no-op
        service.release();

        let stats = service.stats();
        assert_eq!(
            stats,
            LifecycleStats {
                refcount: 0,
                running: false,
                starts: 1,
                stops: 1,
            }
        );
        assert!(wait_until(Duration::from_secs(5), || backend.all_closed()));
        assert!(backend.opened.load(Ordering::SeqCst) <= 1);
    }

    #[test]
    fn test_release_without_acquire_is_noop() {
        let backend = Arc::new(TestBackend::default());
        let service = TelemetryService::new(fast_config(), backend);

        service.release();
        assert_eq!(service.stats(), LifecycleStats::default());
    }

    #[test]
    fn test_worker_publishes_snapshots() {
        let backend = Arc::new(TestBackend::with_script(blinking_script()));
        let service = TelemetryService::new(fast_config(), backend);
        let session = service.session();

        assert!(wait_until(Duration::from_secs(5), || {
            session
                .latest()
                .and_then(|s| s.blink_per_minute())
                .is_some_and(|bpm| bpm >= 2)
        }));
        let snapshot = session.latest().unwrap();
        assert!(snapshot.error().is_none());
        assert!(snapshot.jaw_openness().is_some());
    }

    #[test]
    fn test_degraded_worker_reports_error() {
        let backend = Arc::new(TestBackend {
            camera_missing: true,
            ..Default::default()
        });
        let service = TelemetryService::new(fast_config(), backend.clone());
        service.acquire();

        assert!(wait_until(Duration::from_secs(5), || service
            .latest()
            .is_some_and(|s| s.error().is_some())));
        let snapshot = service.latest().unwrap();
        assert!(snapshot.error().unwrap().contains("camera not available"));
        assert!(snapshot.stress_index().is_none());
        assert_eq!(backend.opened.load(Ordering::SeqCst), 0);

        // Keeps reporting while degraded
        let count = service.publisher().published_count();
        assert!(wait_until(Duration::from_secs(5), || {
            service.publisher().published_count() > count
        }));

        service.release();
        assert!(!service.stats().running);
    }

    #[test]
    fn test_session_guard_releases_on_drop() {
        let backend = Arc::new(TestBackend::with_script(vec![Ok(None)]));
        let service = TelemetryService::new(fast_config(), backend);

        {
            let _a = service.session();
            let _b = service.session();
            assert_eq!(service.stats().refcount, 2);
        }
        assert_eq!(service.stats().refcount, 0);
        assert!(!service.stats().running);
    }

    #[test]
    fn test_restart_starts_from_fresh_history() {
        let backend = Arc::new(TestBackend::with_script(blinking_script()));
        let service = TelemetryService::new(fast_config(), backend.clone());
        let bpm = |service: &TelemetryService| {
            service.latest().and_then(|s| s.blink_per_minute()).unwrap_or(0)
        };

        service.acquire();
        assert!(wait_until(Duration::from_secs(10), || bpm(&service) >= 10));
        service.release();
        assert!(wait_until(Duration::from_secs(5), || backend.all_closed()));

        // Old events would keep the count at 10+ for a minute
        service.acquire();
        assert!(wait_until(Duration::from_secs(5), || bpm(&service) < 10));
        assert_eq!(service.stats().starts, 2);
        assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
        service.release();
    }

    #[test]
    fn test_dropping_service_stops_worker() {
        let backend = Arc::new(TestBackend::with_script(vec![Ok(None)]));
        let service = TelemetryService::new(fast_config(), backend.clone());
        service.acquire();
        assert!(wait_until(Duration::from_secs(5), || {
            backend.opened.load(Ordering::SeqCst) == 1
        }));

        drop(service);
        assert!(wait_until(Duration::from_secs(5), || backend.all_closed()));
    }

    #[test]
    fn test_quick_restart_waits_for_previous_worker() {
        let face = FaceGeometry::default().landmarks(64, 48);
        let backend = Arc::new(TestBackend {
            exclusive: Some(Arc::new(AtomicBool::new(false))),
            detect_delay: Some(Duration::from_millis(300)),
            script: vec![Ok(Some(face))],
            ..Default::default()
        });
        let service = TelemetryService::new(fast_config(), backend.clone());

        service.acquire();
        thread::sleep(Duration::from_millis(500));
        service.release();
        // Old worker is still inside a detection call here
        service.acquire();

        assert!(wait_until(Duration::from_secs(5), || {
            backend.opened.load(Ordering::SeqCst) == 2
        }));
        let count = service.publisher().published_count();
        assert!(wait_until(Duration::from_secs(5), || {
            service.publisher().published_count() > count
        }));
        let snapshot = service.latest().unwrap();
        assert!(snapshot.error().is_none(), "got {:?}", snapshot.error());
        assert!(snapshot.jaw_openness().is_some());
        assert_eq!(backend.camera_opens.load(Ordering::SeqCst), 2);
        service.release();
    }

    #[test]
    fn test_transient_frame_failures_are_retried() {
        let face = FaceGeometry::default().landmarks(64, 48);
        let mut config = fast_config();
        config.frame_retry_ms = 10;
        let backend = Arc::new(TestBackend {
            capture_failures: 5,
            script: vec![Ok(Some(face))],
            ..Default::default()
        });
        let service = TelemetryService::new(config, backend.clone());
        service.acquire();

        let mut saw_error = false;
        let measured = wait_until(Duration::from_secs(5), || {
            let latest = service.latest();
            saw_error |= latest.as_ref().is_some_and(|s| s.error().is_some());
            latest.is_some_and(|s| s.jaw_openness().is_some())
        });
        assert!(measured);
        assert!(!saw_error);
        assert_eq!(backend.camera_opens.load(Ordering::SeqCst), 1);
        service.release();
    }

    #[test]
    fn test_failed_detection_publishes_a_miss() {
        let backend = Arc::new(TestBackend::with_script(vec![Err(
            DetectorError::DetectionFailed("inference error".into()),
        )]));
        let service = TelemetryService::new(fast_config(), backend);
        service.acquire();

        assert!(wait_until(Duration::from_secs(5), || {
            service.publisher().published_count() >= 5
        }));
        let snapshot = service.latest().unwrap();
        assert!(snapshot.error().is_none());
        assert!(snapshot.jaw_openness().is_none());
        assert!(snapshot.blink_per_minute().is_none());
        assert!(snapshot.stress_index().is_none());
        assert!(!snapshot.is_ok());
        service.release();
    }

    #[test]
    fn test_frames_paced_to_target_rate() {
        let mut config = fast_config();
        config.capture.fps = 20;
        let backend = Arc::new(TestBackend::with_script(vec![Ok(None)]));
        let service = TelemetryService::new(config, backend);

        service.acquire();
        thread::sleep(Duration::from_millis(1000));
        let published = service.publisher().published_count();
        service.release();

        // 50 ms per tick over one second
        assert!(
            (8..=23).contains(&published),
            "published {} snapshots in 1 s at 20 fps",
            published
        );
    }

    #[test]
    fn test_acquire_restarts_missing_worker() {
        let backend = Arc::new(TestBackend::with_script(vec![Ok(None)]));
        let service = TelemetryService::new(fast_config(), backend);

        // Consumer registered but no worker attached, as after a failed spawn
        service.state().refcount = 1;
        assert!(!service.stats().running);

        service.acquire();
        let stats = service.stats();
        assert_eq!(stats.refcount, 2);
        assert!(stats.running);
        assert_eq!(stats.starts, 1);

        service.release();
        service.release();
        assert!(!service.stats().running);
    }
}
