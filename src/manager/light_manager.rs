// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of lights with discovery and refresh scheduling.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, RwLock, Semaphore, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::device::DeviceNetwork;
use crate::error::{Error, Result};
use crate::event::{EventBus, LightEvent};
use crate::light::{Light, LightSettings};
use crate::store::{LightFilter, LightRecord, LightRecordFields, LightStore};
use crate::types::LightId;

use super::config::ManagerConfig;

/// Summary of one discovery cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Addresses that answered discovery.
    pub reachable: usize,
    /// New records written to the store.
    pub persisted: usize,
    /// Lights added to the registry.
    pub added: Vec<LightId>,
    /// Candidates skipped because of an error.
    pub failed: usize,
}

/// Registry of all known lights.
///
/// The manager is cheap to clone; clones share the same registry. It owns
/// the two recurring background jobs: discovery, which turns stored and
/// newly announced bulbs into [`Light`]s, and refresh, which re-reads every
/// light so cached state stays current without callers polling the bulbs.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use lumenctl::device::{SimulatedBulb, SimulatedNetwork};
/// use lumenctl::manager::{LightManager, ManagerConfig};
/// use lumenctl::store::MemoryStore;
///
/// # async fn example() -> lumenctl::Result<()> {
/// let network = Arc::new(SimulatedNetwork::new());
/// network.add_bulb(SimulatedBulb::new("192.168.0.20", "bedroom"));
///
/// let manager = LightManager::new(ManagerConfig::default(), network, Arc::new(MemoryStore::new()));
/// manager.start().await?;
///
/// let light = manager.get_light_by_name("BEDROOM").await.unwrap();
/// assert!(light.is_connected());
///
/// manager.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LightManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: ManagerConfig,
    network: Arc<dyn DeviceNetwork>,
    store: Arc<dyn LightStore>,
    lights: RwLock<Vec<Arc<Light>>>,
    events: EventBus,
    discovery: Mutex<()>,
    tasks: SyncMutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for LightManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightManager")
            .field("config", &self.inner.config)
            .field("running", &!self.inner.tasks.lock().is_empty())
            .finish_non_exhaustive()
    }
}

impl LightManager {
    /// Creates an empty manager. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new(
        config: ManagerConfig,
        network: Arc<dyn DeviceNetwork>,
        store: Arc<dyn LightStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                network,
                store,
                lights: RwLock::new(Vec::new()),
                events: EventBus::new(),
                discovery: Mutex::new(()),
                tasks: SyncMutex::new(Vec::new()),
            }),
        }
    }

    /// The configuration this manager was created with.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to events of every light.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LightEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the number of active event subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.events.subscriber_count()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Snapshot of every known light, in discovery order.
    pub async fn get_all_lights(&self) -> Vec<Arc<Light>> {
        self.inner.lights.read().await.clone()
    }

    /// Lights in the default group.
    pub async fn default_lights(&self) -> Vec<Arc<Light>> {
        self.inner
            .lights
            .read()
            .await
            .iter()
            .filter(|l| l.is_default())
            .cloned()
            .collect()
    }

    /// Finds a light by name, ignoring case.
    pub async fn get_light_by_name(&self, name: &str) -> Option<Arc<Light>> {
        let wanted = name.to_lowercase();
        self.inner
            .lights
            .read()
            .await
            .iter()
            .find(|l| l.name().to_lowercase() == wanted)
            .cloned()
    }

    /// Finds a light by id.
    pub async fn get_light_by_id(&self, id: LightId) -> Option<Arc<Light>> {
        self.inner
            .lights
            .read()
            .await
            .iter()
            .find(|l| l.id() == id)
            .cloned()
    }

    /// Finds a light by address.
    pub async fn get_light_by_ip(&self, ip: &str) -> Option<Arc<Light>> {
        self.inner
            .lights
            .read()
            .await
            .iter()
            .find(|l| l.ip() == ip)
            .cloned()
    }

    /// Number of known lights.
    pub async fn light_count(&self) -> usize {
        self.inner.lights.read().await.len()
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Runs one discovery cycle.
    ///
    /// Newly announced bulbs are persisted with their advertised name and
    /// outside the default group. Every stored record without a light in
    /// the registry then becomes one; lights whose address answered
    /// discovery are refreshed right away, the others start disconnected.
    /// Candidates are built concurrently, bounded by `discovery_workers`.
    ///
    /// A failing candidate is logged and skipped. Cycles never overlap.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the stored records cannot be listed. If the
    /// network scan fails, stored lights are still added (disconnected) and
    /// `Error::Discovery` is returned afterwards.
    pub async fn discover(&self) -> Result<DiscoveryReport> {
        let _cycle = self.inner.discovery.lock().await;
        let mut report = DiscoveryReport::default();

        let (found, scan_error) = match self.inner.network.discover().await {
            Ok(found) => (found, None),
            Err(e) => {
                tracing::warn!(error = %e, "network scan failed, loading stored lights only");
                (Vec::new(), Some(e))
            }
        };
        let mut reachable = HashSet::new();
        let found: Vec<_> = found
            .into_iter()
            .filter(|d| reachable.insert(d.address.clone()))
            .collect();
        report.reachable = reachable.len();
        tracing::debug!(count = report.reachable, "bulbs answered discovery");

        let stored = self.inner.store.list_lights(&LightFilter::all()).await?;
        let stored_ips: HashSet<&str> = stored.iter().map(|r| r.ip.as_str()).collect();
        for device in found.iter().filter(|d| !stored_ips.contains(d.address.as_str())) {
            let fields = LightRecordFields {
                ip: device.address.clone(),
                name: device
                    .name
                    .chars()
                    .take(self.inner.config.max_light_name_length)
                    .collect(),
                is_default: false,
            };
            match self.inner.store.save_new_light(&fields).await {
                Ok(id) => {
                    report.persisted += 1;
                    tracing::info!(light_id = %id, ip = %fields.ip, name = %fields.name, "persisted new light");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(ip = %fields.ip, error = %e, "cannot persist discovered light, skipping");
                }
            }
        }

        let records = if report.persisted > 0 {
            self.inner.store.list_lights(&LightFilter::all()).await?
        } else {
            stored
        };
        let candidates = self.unknown_records(records).await;
        if !candidates.is_empty() {
            let built = self.build_lights(candidates, &reachable).await;
            report.failed += built.failed;
            self.register(built.lights, &mut report).await;
        }

        match scan_error {
            Some(e) => Err(Error::Discovery(e)),
            None => Ok(report),
        }
    }

    async fn register(&self, built: Vec<Arc<Light>>, report: &mut DiscoveryReport) {
        let mut lights = self.inner.lights.write().await;
        for light in built {
            if lights.iter().any(|l| l.id() == light.id() || l.ip() == light.ip()) {
                continue;
            }
            tracing::info!(light_id = %light.id(), ip = %light.ip(), connected = light.is_connected(), "added light");
            self.inner.events.publish(LightEvent::LightAdded {
                light_id: light.id(),
                ip: light.ip().to_string(),
            });
            report.added.push(light.id());
            lights.push(light);
        }
    }

    async fn unknown_records(&self, records: Vec<LightRecord>) -> Vec<LightRecord> {
        let lights = self.inner.lights.read().await;
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| !lights.iter().any(|l| l.id() == r.id || l.ip() == r.ip))
            .filter(|r| seen.insert(r.ip.clone()))
            .collect()
    }

    async fn build_lights(
        &self,
        candidates: Vec<LightRecord>,
        reachable: &HashSet<String>,
    ) -> BuiltLights {
        let permits = Arc::new(Semaphore::new(self.inner.config.discovery_workers.max(1)));
        let settings = LightSettings::from(&self.inner.config);
        let mut set = JoinSet::new();

        for record in candidates {
            let is_reachable = reachable.contains(&record.ip);
            let link = self.inner.network.link(&record.ip);
            let light = Arc::new(Light::new(
                record,
                link,
                Arc::clone(&self.inner.store),
                self.inner.events.clone(),
                settings.clone(),
            ));
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                if is_reachable
                    && let Err(e) = light.refresh_props().await
                {
                    tracing::warn!(light_id = %light.id(), error = %e, "discovered light did not answer");
                }
                light
            });
        }

        let mut built = BuiltLights::default();
        while let Some(result) = set.join_next().await {
            match result {
                Ok(light) => built.lights.push(light),
                Err(e) => {
                    built.failed += 1;
                    tracing::warn!(error = %e, "light construction task failed, skipping");
                }
            }
        }
        built
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Refreshes every light concurrently and returns how many answered.
    pub async fn refresh_all(&self) -> usize {
        let lights = self.get_all_lights().await;
        let mut set = JoinSet::new();
        for light in lights {
            set.spawn(async move { light.refresh_props().await.is_ok() });
        }

        let mut connected = 0;
        while let Some(result) = set.join_next().await {
            if matches!(result, Ok(true)) {
                connected += 1;
            }
        }
        tracing::debug!(connected, "refreshed lights");
        connected
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Runs the first discovery cycle and starts the background jobs.
    ///
    /// Calling `start` again restarts the jobs.
    ///
    /// # Errors
    ///
    /// Returns the error of the first discovery cycle. The background jobs
    /// are started regardless and will try again.
    pub async fn start(&self) -> Result<DiscoveryReport> {
        self.stop_jobs();
        let first = self.discover().await;
        if let Err(e) = &first {
            tracing::warn!(error = %e, "initial discovery failed");
        }

        let discovery = spawn_job(
            Arc::downgrade(&self.inner),
            self.inner.config.discovery_interval(),
            |manager| async move {
                if let Err(e) = manager.discover().await {
                    tracing::warn!(error = %e, "discovery cycle failed");
                }
            },
        );
        let refresh = spawn_job(
            Arc::downgrade(&self.inner),
            self.inner.config.refresh_interval(),
            |manager| async move {
                manager.refresh_all().await;
            },
        );
        self.inner.tasks.lock().extend([discovery, refresh]);
        tracing::info!(
            discovery_secs = self.inner.config.discovery_interval_secs,
            refresh_secs = self.inner.config.refresh_interval_secs,
            "light manager started"
        );
        first
    }

    /// Stops the background jobs and every running fade.
    pub async fn shutdown(&self) {
        self.stop_jobs();
        for light in self.get_all_lights().await {
            light.stop_fade().await;
        }
        tracing::info!("light manager stopped");
    }

    /// Returns true while the background jobs run.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.inner.tasks.lock().is_empty()
    }

    fn stop_jobs(&self) {
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

#[derive(Default)]
struct BuiltLights {
    lights: Vec<Arc<Light>>,
    failed: usize,
}

/// Runs `job` every `period`, skipping the immediate first tick, until the
/// manager is dropped or the task is aborted.
fn spawn_job<F, Fut>(inner: Weak<Inner>, period: std::time::Duration, job: F) -> JoinHandle<()>
where
    F: Fn(LightManager) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            job(LightManager { inner }).await;
        }
    })
}
