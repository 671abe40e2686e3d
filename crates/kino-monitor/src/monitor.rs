//! Bitrate Monitor - reports which quality level is on screen
//!
//! Lifecycle:
//! - `Uninitialized`: construction was rejected, nothing runs
//! - `Loading`: the master playlist is being fetched
//! - `IdleNoData`: the playlist had no usable levels, nothing is reported
//! - `Polling`: the surface is sampled every poll interval
//! - `Stopped`: terminal, entered through [`BitrateMonitor::stop`]
//!
//! Loading and polling run on one spawned task. `stop` can race the manifest
//! fetch, so the task only enters `Polling` through an atomic check that the
//! monitor is still `Loading`.
//!
//! Each tick checks the phase, samples the surface and invokes the callback
//! while holding the notify gate. `stop` flips the phase under the same gate,
//! so once it returns no callback is running or will run. A callback must
//! therefore not call `stop` (or drop its monitor) itself.

use crate::{
    error::Error,
    manifest::{load_manifest_table, HttpManifestLoader, ManifestLoader},
    surface::PlaybackSurface,
    tracker::LevelTracker,
    types::{MonitorConfig, MonitorPhase, QualityLevel},
    Result,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Receives each newly detected quality level
pub type QualityCallback = Arc<dyn Fn(QualityLevel) + Send + Sync>;

/// Collects monitor inputs. Surface, manifest URL and callback are required.
pub struct BitrateMonitorBuilder {
    surface: Option<Arc<dyn PlaybackSurface>>,
    manifest_url: Option<String>,
    on_change: Option<QualityCallback>,
    config: MonitorConfig,
    poll_interval: Option<Duration>,
    loader: Option<Arc<dyn ManifestLoader>>,
}

impl BitrateMonitorBuilder {
    fn new() -> Self {
        Self {
            surface: None,
            manifest_url: None,
            on_change: None,
            config: MonitorConfig::default(),
            poll_interval: None,
            loader: None,
        }
    }

    pub fn surface(mut self, surface: impl PlaybackSurface + 'static) -> Self {
        self.surface = Some(Arc::new(surface));
        self
    }

    pub fn shared_surface(mut self, surface: Arc<dyn PlaybackSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = Some(url.into());
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(QualityLevel) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Sampling period, kept at full precision. Overrides `config`.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Replaces the whole configuration, including any earlier `poll_interval`
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self.poll_interval = None;
        self
    }

    /// Replace the default HTTP loader
    pub fn loader(mut self, loader: impl ManifestLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Start the monitor.
    ///
    /// Invalid input is logged and yields an inert monitor in
    /// [`MonitorPhase::Uninitialized`]; nothing is returned to the caller.
    pub fn start(self) -> BitrateMonitor {
        match self.try_start() {
            Ok(monitor) => monitor,
            Err(e) => {
                error!(code = e.error_code(), error = %e, "Bitrate monitor not started");
                BitrateMonitor::uninitialized()
            }
        }
    }

    /// Start the monitor, returning configuration problems as errors
    pub fn try_start(self) -> Result<BitrateMonitor> {
        let surface = self
            .surface
            .ok_or_else(|| Error::config("missing playback surface"))?;
        let manifest_url = self
            .manifest_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::config("missing manifest url"))?;
        let on_change = self
            .on_change
            .ok_or_else(|| Error::config("missing on_change callback"))?;
        let poll_interval = self
            .poll_interval
            .unwrap_or_else(|| self.config.poll_interval());
        if poll_interval.is_zero() {
            return Err(Error::config("poll interval must be greater than zero"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::config("bitrate monitor must be started inside a Tokio runtime"))?;
        let loader: Arc<dyn ManifestLoader> = match self.loader {
            Some(loader) => loader,
            None => match self.config.request_timeout() {
                Some(timeout) => Arc::new(HttpManifestLoader::with_timeout(timeout)?),
                None => Arc::new(HttpManifestLoader::new()),
            },
        };

        let monitor = BitrateMonitor::uninitialized();
        monitor.transition(MonitorPhase::Uninitialized, MonitorPhase::Loading);
        info!(url = %manifest_url, poll_interval = ?poll_interval, "Starting bitrate monitor");

        let worker = Worker {
            surface,
            on_change,
            loader,
            manifest_url,
            poll_interval,
            phase: Arc::clone(&monitor.phase),
            level: Arc::clone(&monitor.level),
            notify_gate: Arc::clone(&monitor.notify_gate),
        };
        let handle = runtime.spawn(worker.run());
        *monitor.lock_task() = Some(handle);

        Ok(monitor)
    }
}

/// Watches a playback surface and reports quality level changes.
///
/// Dropping the monitor stops it.
pub struct BitrateMonitor {
    phase: Arc<watch::Sender<MonitorPhase>>,
    level: Arc<watch::Sender<Option<QualityLevel>>>,
    notify_gate: Arc<Mutex<()>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BitrateMonitor {
    pub fn builder() -> BitrateMonitorBuilder {
        BitrateMonitorBuilder::new()
    }

    fn uninitialized() -> Self {
        let (phase, _) = watch::channel(MonitorPhase::Uninitialized);
        let (level, _) = watch::channel(None);
        Self {
            phase: Arc::new(phase),
            level: Arc::new(level),
            notify_gate: Arc::new(Mutex::new(())),
            task: Mutex::new(None),
        }
    }

    /// Get current phase
    pub fn phase(&self) -> MonitorPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<MonitorPhase> {
        self.phase.subscribe()
    }

    /// Last level passed to the callback
    pub fn current_level(&self) -> Option<QualityLevel> {
        self.level.borrow().clone()
    }

    /// Bitrate of the last level passed to the callback
    pub fn last_notified(&self) -> Option<u64> {
        self.level.borrow().as_ref().map(|level| level.bitrate)
    }

    /// Subscribe to reported levels
    pub fn subscribe_levels(&self) -> watch::Receiver<Option<QualityLevel>> {
        self.level.subscribe()
    }

    /// Stop polling and release the manifest table.
    ///
    /// Safe to call repeatedly and from any phase, including while the
    /// manifest is still loading. Waits for an in-flight callback to finish;
    /// no callback runs after this returns.
    pub fn stop(&self) {
        let stopped = {
            let _gate = lock_gate(&self.notify_gate);
            self.phase.send_if_modified(|phase| {
                if phase.can_transition_to(MonitorPhase::Stopped) {
                    *phase = MonitorPhase::Stopped;
                    true
                } else {
                    false
                }
            })
        };

        if let Some(task) = self.lock_task().take() {
            task.abort();
        }

        if stopped {
            info!("Bitrate monitor stopped");
        }
    }

    fn transition(&self, from: MonitorPhase, to: MonitorPhase) -> bool {
        transition(&self.phase, from, to)
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for BitrateMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BitrateMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitrateMonitor")
            .field("phase", &self.phase())
            .field("last_notified", &self.last_notified())
            .finish()
    }
}

fn lock_gate(gate: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Move `from` -> `to` only if the phase is still `from`
fn transition(phase: &watch::Sender<MonitorPhase>, from: MonitorPhase, to: MonitorPhase) -> bool {
    let moved = phase.send_if_modified(|current| {
        if *current == from && from.can_transition_to(to) {
            *current = to;
            true
        } else {
            false
        }
    });
    if moved {
        info!(from = %from, to = %to, "Monitor phase transition");
    }
    moved
}

/// State owned by the spawned loading/polling task
struct Worker {
    surface: Arc<dyn PlaybackSurface>,
    on_change: QualityCallback,
    loader: Arc<dyn ManifestLoader>,
    manifest_url: String,
    poll_interval: Duration,
    phase: Arc<watch::Sender<MonitorPhase>>,
    level: Arc<watch::Sender<Option<QualityLevel>>>,
    notify_gate: Arc<Mutex<()>>,
}

impl Worker {
    async fn run(self) {
        let table = load_manifest_table(self.loader.as_ref(), &self.manifest_url).await;

        if table.is_empty() {
            transition(&self.phase, MonitorPhase::Loading, MonitorPhase::IdleNoData);
            return;
        }

        if !transition(&self.phase, MonitorPhase::Loading, MonitorPhase::Polling) {
            debug!("Monitor no longer loading, polling not started");
            return;
        }

        let mut tracker = LevelTracker::new(table);
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.poll_once(&mut tracker) {
                break;
            }
        }
    }

    /// One sample under the notify gate. Returns false once polling has ended.
    fn poll_once(&self, tracker: &mut LevelTracker) -> bool {
        let _gate = lock_gate(&self.notify_gate);
        if *self.phase.borrow() != MonitorPhase::Polling {
            return false;
        }

        let dims = self.surface.dimensions();
        if let Some(level) = tracker.sample(dims.width, dims.height) {
            debug!(
                bitrate = level.bitrate,
                resolution = %dims,
                "Quality level changed"
            );
            self.level.send_replace(Some(level.clone()));
            (self.on_change)(level);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SharedSurface;
    use async_trait::async_trait;

    struct NeverLoader;

    #[async_trait]
    impl ManifestLoader for NeverLoader {
        async fn load(&self, _url: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_start_outside_runtime_is_uninitialized() {
        let monitor = BitrateMonitor::builder()
            .surface(SharedSurface::new())
            .manifest_url("https://cdn.example.com/master.m3u8")
            .on_change(|_| {})
            .start();
        assert_eq!(monitor.phase(), MonitorPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_missing_inputs_are_config_errors() {
        let err = BitrateMonitor::builder()
            .manifest_url("https://cdn.example.com/master.m3u8")
            .on_change(|_| {})
            .try_start()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let monitor = BitrateMonitor::builder()
            .surface(SharedSurface::new())
            .manifest_url("   ")
            .on_change(|_| {})
            .start();
        assert_eq!(monitor.phase(), MonitorPhase::Uninitialized);

        let err = BitrateMonitor::builder()
            .surface(SharedSurface::new())
            .manifest_url("https://cdn.example.com/master.m3u8")
            .on_change(|_| {})
            .poll_interval(Duration::ZERO)
            .try_start()
            .unwrap_err();
        assert!(err.to_string().contains("poll interval"));
    }

    #[tokio::test]
    async fn test_sub_millisecond_interval_is_kept() {
        let monitor = BitrateMonitor::builder()
            .surface(SharedSurface::new())
            .manifest_url("https://cdn.example.com/master.m3u8")
            .on_change(|_| {})
            .poll_interval(Duration::from_micros(500))
            .loader(NeverLoader)
            .try_start()
            .expect("500us is a valid interval");
        assert_eq!(monitor.phase(), MonitorPhase::Loading);
        monitor.stop();
    }

    #[tokio::test]
    async fn test_later_config_replaces_poll_interval() {
        let err = BitrateMonitor::builder()
            .surface(SharedSurface::new())
            .manifest_url("https://cdn.example.com/master.m3u8")
            .on_change(|_| {})
            .poll_interval(Duration::from_millis(10))
            .config(MonitorConfig {
                poll_interval_ms: 0,
                request_timeout_ms: None,
            })
            .try_start()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_stop_on_uninitialized_is_noop() {
        let monitor = BitrateMonitor::builder().start();
        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.phase(), MonitorPhase::Uninitialized);
    }
}
