use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::exclusivity::{self, ShareAnnouncement, ShareBus};
use crate::geo::PositionSource;
use crate::presenter::Presenter;
use crate::session::cycle::run_cycle;
use crate::session::{DeviceLink, RecordSink};

const DEFAULT_STOP_REASON: &str = "Sharing stopped.";
const YIELD_REASON: &str = "Another tab is now sharing; stopping this tab.";

/// Tunables for one controller, lifted out of [`Config`] so tests can run
/// with short periods.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub push_period: Duration,
    pub push_jitter_max: Duration,
    pub position_timeout: Duration,
}

impl SessionSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            push_period: config.push_period(),
            push_jitter_max: Duration::from_millis(config.push_jitter_max_ms),
            position_timeout: config.position_timeout(),
        }
    }
}

/// Session state shared between `start()`/`stop()` and the spawned tasks.
///
/// `generation` bumps on every start AND every stop; every async
/// continuation captures it at dispatch time and abandons silently on
/// mismatch. That check is what makes `stop()` synchronously authoritative
/// even though cycles are asynchronous.
#[derive(Default)]
struct Inner {
    active: bool,
    generation: u64,
    started_at: Option<DateTime<Utc>>,
    driver: Option<JoinHandle<()>>,
    map_task: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

/// Drives the recurring location+sensor upload cycle while sharing is
/// enabled. Owns the only mutable session state; the presentation layer is
/// called out to and never calls back in.
pub struct SessionController<D, S, G> {
    device: Arc<D>,
    sink: Arc<S>,
    geo: Arc<G>,
    presenter: Arc<dyn Presenter>,
    settings: SessionSettings,
    peer_id: Uuid,
    share_tx: Option<broadcast::Sender<ShareAnnouncement>>,
    // Handle to ourselves for the tasks start() spawns.
    self_ref: Weak<Self>,
    inner: Mutex<Inner>,
}

impl<D, S, G> SessionController<D, S, G>
where
    D: DeviceLink,
    S: RecordSink,
    G: PositionSource,
{
    /// Create a controller, optionally joined to an exclusivity bus. Joining
    /// spawns a listener that yields this session whenever another peer
    /// announces it is sharing.
    pub fn new(
        device: Arc<D>,
        sink: Arc<S>,
        geo: Arc<G>,
        presenter: Arc<dyn Presenter>,
        settings: SessionSettings,
        bus: Option<&ShareBus>,
    ) -> Arc<Self> {
        let controller = Arc::new_cyclic(|self_ref| Self {
            device,
            sink,
            geo,
            presenter,
            settings,
            peer_id: Uuid::new_v4(),
            share_tx: bus.map(ShareBus::sender),
            self_ref: self_ref.clone(),
            inner: Mutex::new(Inner::default()),
        });

        if let Some(bus) = bus {
            let listener = tokio::spawn(Self::share_listener(
                Arc::downgrade(&controller),
                bus.subscribe(),
            ));
            controller.lock_inner().listener = Some(listener);
        }

        controller
    }

    #[must_use]
    pub fn peer_id(&self) -> Uuid {
        self.peer_id
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock_inner().active
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock_inner().generation
    }

    /// Start sharing. No-op when already active.
    ///
    /// Marks the session active, begins continuous position observation for
    /// live map feedback, and spawns the driver which runs the first upload
    /// cycle immediately. Cycle failures never surface here; the only
    /// synchronous failure is the position-capability precondition.
    ///
    /// # Errors
    ///
    /// Returns `AppError::GeolocationUnsupported`, before any state change,
    /// when the position source reports no capability at all.
    pub fn start(&self) -> AppResult<()> {
        if !self.geo.supported() {
            return Err(AppError::GeolocationUnsupported);
        }
        // Always succeeds while a caller holds the controller.
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };

        let generation = {
            let mut inner = self.lock_inner();
            if inner.active {
                return Ok(());
            }
            inner.active = true;
            inner.generation += 1;
            inner.started_at = Some(Utc::now());
            inner.generation
        };

        tracing::info!(generation, peer = %self.peer_id, "Upload session starting");
        self.presenter.sharing_changed(true);
        self.presenter.status("Starting… acquiring data.");
        self.announce(true, generation);
        self.notify_device(true);

        let map_task = tokio::spawn(Self::observe_positions(Arc::clone(&this), generation));
        let driver = tokio::spawn(Self::drive(this, generation));

        let mut inner = self.lock_inner();
        if inner.active && inner.generation == generation {
            inner.map_task = Some(map_task);
            inner.driver = Some(driver);
        } else {
            // Stopped (or yielded) while we were spawning.
            map_task.abort();
            driver.abort();
        }
        Ok(())
    }

    /// Stop sharing. No-op when already inactive.
    ///
    /// Bumps the generation (invalidating all in-flight work), aborts the
    /// pending timer and any in-flight requests, tears down position
    /// observation, and reports the given or default reason.
    pub fn stop(&self, reason: Option<&str>) {
        self.shutdown_session(None, reason.unwrap_or(DEFAULT_STOP_REASON));
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Shared teardown for `stop()`, first-cycle auto-stop, and exclusivity
    /// yield. `only_generation` restricts the teardown to a specific live
    /// generation so a stale driver cannot stop its successor.
    fn shutdown_session(&self, only_generation: Option<u64>, reason: &str) {
        let (driver, map_task, generation) = {
            let mut inner = self.lock_inner();
            if !inner.active {
                return;
            }
            if let Some(expected) = only_generation {
                if inner.generation != expected {
                    return;
                }
            }
            inner.active = false;
            inner.generation += 1;
            inner.started_at = None;
            (inner.driver.take(), inner.map_task.take(), inner.generation)
        };

        // Aborting the driver drops any in-flight cycle, which cancels its
        // pending timer and network requests with it.
        if let Some(driver) = driver {
            driver.abort();
        }
        if let Some(map_task) = map_task {
            map_task.abort();
        }

        tracing::info!(generation, reason, "Upload session stopped");
        self.presenter.sharing_changed(false);
        self.presenter.status(reason);
        self.announce(false, generation);
        self.notify_device(false);
    }

    fn announce(&self, active: bool, generation: u64) {
        if let Some(tx) = &self.share_tx {
            // Nobody listening is fine.
            let _ = tx.send(ShareAnnouncement {
                peer: self.peer_id,
                active,
                generation,
                sent_at: Utc::now(),
            });
        }
    }

    fn notify_device(&self, active: bool) {
        let device = Arc::clone(&self.device);
        tokio::spawn(async move {
            if let Err(e) = device.notify_sharing(active).await {
                tracing::debug!(error = %e, active, "Device sharing notification failed");
            }
        });
    }

    /// The periodic gather-then-upload loop for one generation.
    ///
    /// Cycle N+1 is only scheduled after cycle N settles, so cycles never
    /// overlap. A first-cycle failure auto-stops the session rather than
    /// leaving the user half-started; later failures are reported and the
    /// schedule continues.
    async fn drive(self: Arc<Self>, generation: u64) {
        let mut first_cycle = true;

        loop {
            let result = run_cycle(
                &self.device,
                self.sink.as_ref(),
                self.geo.as_ref(),
                self.presenter.as_ref(),
                self.settings.position_timeout,
                || self.generation() == generation,
            )
            .await;

            if self.generation() != generation {
                return;
            }

            match result {
                Ok(entry) => {
                    tracing::info!(entry = %entry, "Pushed entry to sink");
                    self.presenter.status(&format!("Pushed entry #{entry}"));
                }
                Err(e) if first_cycle => {
                    tracing::warn!(error = %e, "First cycle failed; auto-stopping");
                    self.shutdown_session(Some(generation), &format!("Push failed: {e}"));
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cycle failed; schedule continues");
                    self.presenter.status(&format!("Push failed: {e}"));
                }
            }
            first_cycle = false;

            tokio::time::sleep(self.settings.push_period + self.jitter()).await;

            if self.generation() != generation {
                return;
            }
        }
    }

    /// Small random offset so a fleet of rigs does not thunder in sync.
    fn jitter(&self) -> Duration {
        let max_ms = self.settings.push_jitter_max.as_millis() as u64;
        if max_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::random_range(0..=max_ms))
        }
    }

    /// Continuous position observation, for live map feedback only; the
    /// upload cadence takes its own one-shot fix per cycle.
    async fn observe_positions(self: Arc<Self>, generation: u64) {
        let mut rx = self.geo.subscribe();

        loop {
            let fix = *rx.borrow_and_update();
            if self.generation() != generation {
                return;
            }
            if let Some(p) = fix {
                self.presenter.map_update(p.latitude, p.longitude, p.display_accuracy());
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    async fn share_listener(
        controller: Weak<Self>,
        mut rx: broadcast::Receiver<ShareAnnouncement>,
    ) {
        loop {
            let announcement = match rx.recv().await {
                Ok(announcement) => announcement,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Share bus listener lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            };
            let Some(controller) = controller.upgrade() else {
                return;
            };
            controller.on_announcement(&announcement);
        }
    }

    fn on_announcement(&self, announcement: &ShareAnnouncement) {
        if announcement.peer == self.peer_id || !announcement.active {
            return;
        }

        let yields = {
            let inner = self.lock_inner();
            match (inner.active, inner.started_at) {
                (true, Some(started_at)) => {
                    exclusivity::should_yield(self.peer_id, started_at, announcement)
                }
                _ => false,
            }
        };

        if yields {
            tracing::info!(foreign_peer = %announcement.peer, "Yielding to another sharing session");
            self.stop(Some(YIELD_REASON));
        }
    }
}
