//! Freshness and prefetch coordination.
//!
//! One `RefreshCoordinator` is built at startup. It validates every known
//! platform's cached catalog against the server in the background, refetches
//! the stale ones, and records which platforms have firmware available.
//! Interactive callers consult it through a [`CoordinatorHandle`], which
//! answers "not recorded" when no coordinator was started.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use romm_sync_client::{CatalogApi, CatalogSignature, ClientError, Platform, Rom};

use crate::catalog_cache::CatalogCache;
use crate::freshness::SignatureStore;
use crate::locks;

/// Items requested per catalog page.
pub const PAGE_SIZE: u32 = 1000;

/// Key identifying a platform's freshness and prefetch state.
pub fn partition_key(platform_id: u64) -> String {
    format!("platform_{platform_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// This call fetched and cached the given number of entries.
    Fetched(usize),
    /// Another prefetch for the same key was running; this call waited for it.
    Joined,
    Failed,
}

/// Shared completion signal for one in-flight prefetch.
#[derive(Clone)]
pub struct PrefetchHandle {
    done: watch::Receiver<bool>,
}

impl PrefetchHandle {
    /// Resolve once the prefetch has finished, successfully or not.
    pub async fn wait(mut self) {
        // An error means the sender is gone, which also means finished.
        let _ = self.done.wait_for(|done| *done).await;
    }
}

type Registry = RwLock<HashMap<String, PrefetchHandle>>;

/// Owned by the task running a prefetch. Dropping it, on any exit path,
/// de-registers the key and wakes every waiter in one step under the
/// registry lock.
struct InFlight<'a> {
    registry: &'a Registry,
    key: String,
    done: watch::Sender<bool>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut registry = locks::write(self.registry);
        registry.remove(&self.key);
        self.done.send_replace(true);
    }
}

enum Registration<'a> {
    Owner(InFlight<'a>),
    Waiter(PrefetchHandle),
}

pub struct RefreshCoordinator<A> {
    api: Arc<A>,
    cache: Arc<CatalogCache>,
    signatures: Arc<SignatureStore>,
    freshness: RwLock<HashMap<String, bool>>,
    bios: RwLock<HashMap<u64, bool>>,
    in_flight: Registry,
}

impl<A: CatalogApi + 'static> RefreshCoordinator<A> {
    pub fn new(api: Arc<A>, cache: Arc<CatalogCache>, signatures: Arc<SignatureStore>) -> Arc<Self> {
        Arc::new(Self {
            api,
            cache,
            signatures,
            freshness: RwLock::new(HashMap::new()),
            bios: RwLock::new(HashMap::new()),
            in_flight: RwLock::new(HashMap::new()),
        })
    }

    /// Build the coordinator and start background work for `platforms`.
    ///
    /// The returned task completes when every platform has been probed and
    /// validated (and prefetched where needed).
    pub fn launch(
        api: Arc<A>,
        cache: Arc<CatalogCache>,
        signatures: Arc<SignatureStore>,
        platforms: Vec<Platform>,
    ) -> (CoordinatorHandle<A>, JoinHandle<()>) {
        let coordinator = Self::new(api, cache, signatures);
        let startup = coordinator.start(platforms);
        (CoordinatorHandle::new(coordinator), startup)
    }

    /// Spawn the BIOS probe and freshness validation for each platform.
    pub fn start(self: &Arc<Self>, platforms: Vec<Platform>) -> JoinHandle<()> {
        let started = Instant::now();
        let mut tasks = Vec::with_capacity(platforms.len() * 2);
        for platform in platforms {
            let this = Arc::clone(self);
            let probed = platform.clone();
            tasks.push(tokio::spawn(async move { this.probe_bios(&probed).await }));

            let this = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                this.validate_and_prefetch(&platform).await;
            }));
        }

        tokio::spawn(async move {
            let count = tasks.len();
            for result in futures::future::join_all(tasks).await {
                if let Err(e) = result {
                    log::warn!("Refresh task failed: {}", e);
                }
            }
            log::debug!(
                "Startup refresh finished {} tasks in {:.1?}",
                count,
                started.elapsed()
            );
        })
    }

    async fn probe_bios(&self, platform: &Platform) {
        match self.api.list_firmware(platform.id).await {
            Ok(firmware) => {
                log::debug!("{}: {} firmware files on server", platform.slug, firmware.len());
                locks::write(&self.bios).insert(platform.id, !firmware.is_empty());
            }
            Err(e) => {
                log::debug!("{}: firmware probe failed: {}", platform.slug, e);
                locks::write(&self.bios).insert(platform.id, false);
            }
        }
    }

    /// Compare the server's signature with the one recorded at the last full
    /// fetch, and record the result. Failures count as stale.
    pub async fn validate(&self, platform: &Platform) -> bool {
        let key = partition_key(platform.id);
        let fresh = match self.api.catalog_signature(platform.id).await {
            Ok(remote) => self.signatures.get(&key).is_some_and(|local| local == remote),
            Err(e) => {
                log::debug!("{}: validation failed, treating as stale: {}", platform.slug, e);
                false
            }
        };
        log::debug!("{}: cache is {}", platform.slug, if fresh { "fresh" } else { "stale" });
        locks::write(&self.freshness).insert(key, fresh);
        fresh
    }

    async fn validate_and_prefetch(&self, platform: &Platform) {
        if !self.validate(platform).await {
            self.prefetch(platform).await;
        }
    }

    /// Make sure a platform's cache is current, fetching it if needed.
    /// Returns whether it ended up fresh.
    pub async fn ensure_fresh(&self, platform: &Platform) -> bool {
        let key = partition_key(platform.id);
        if self.wait_for_prefetch(&key).await {
            return self.is_fresh(&key) == Some(true);
        }
        if self.is_fresh(&key) == Some(true) {
            return true;
        }
        if self.validate(platform).await {
            return true;
        }
        self.prefetch(platform).await;
        self.is_fresh(&key) == Some(true)
    }

    fn register(&self, key: &str) -> Registration<'_> {
        let mut registry = locks::write(&self.in_flight);
        if let Some(existing) = registry.get(key) {
            return Registration::Waiter(existing.clone());
        }
        let (done, rx) = watch::channel(false);
        registry.insert(key.to_string(), PrefetchHandle { done: rx });
        Registration::Owner(InFlight {
            registry: &self.in_flight,
            key: key.to_string(),
            done,
        })
    }

    /// Fetch a platform's whole catalog and write it through the cache.
    ///
    /// At most one prefetch per platform runs at a time; a concurrent caller
    /// waits for the running one instead of starting another.
    pub async fn prefetch(&self, platform: &Platform) -> PrefetchOutcome {
        let key = partition_key(platform.id);
        let _in_flight = match self.register(&key) {
            Registration::Owner(in_flight) => in_flight,
            Registration::Waiter(handle) => {
                log::debug!("{}: prefetch already running, waiting", platform.slug);
                handle.wait().await;
                return PrefetchOutcome::Joined;
            }
        };

        let started = Instant::now();
        match self.fetch_all(platform).await {
            Ok((roms, reported_total)) => {
                // The server's reported total; paging may return fewer items.
                let signature = CatalogSignature {
                    total: reported_total,
                    ..CatalogSignature::of_roms(&roms)
                };
                let count = self.cache.store_many(
                    &platform.slug,
                    roms.iter()
                        .map(|r| (r.fs_name.clone(), r.id, r.display_name().to_string())),
                );
                self.signatures.record(&key, signature);
                self.mark_fresh(&key);
                log::debug!(
                    "{}: prefetched {} entries in {:.1?}",
                    platform.slug,
                    count,
                    started.elapsed()
                );
                PrefetchOutcome::Fetched(count)
            }
            Err(e) => {
                log::warn!("{}: prefetch failed: {}", platform.slug, e);
                self.mark_stale(&key);
                PrefetchOutcome::Failed
            }
        }
    }

    /// Page through a platform's catalog until the reported total is
    /// reached or a page comes back empty. Returns the items and the last
    /// reported total.
    async fn fetch_all(&self, platform: &Platform) -> Result<(Vec<Rom>, u64), ClientError> {
        let mut all: Vec<Rom> = Vec::new();
        let mut total = 0;
        let mut page = 1;
        loop {
            let resp = self.api.list_roms(platform.id, page, PAGE_SIZE).await?;
            log::debug!(
                "{}: page {} has {} items (total {})",
                platform.slug,
                page,
                resp.items.len(),
                resp.total
            );
            total = resp.total;
            if resp.items.is_empty() {
                break;
            }
            all.extend(resp.items);
            if all.len() as u64 >= resp.total {
                break;
            }
            page += 1;
        }
        Ok((all, total))
    }

    pub fn is_fresh(&self, key: &str) -> Option<bool> {
        locks::read(&self.freshness).get(key).copied()
    }

    pub fn has_bios(&self, platform_id: u64) -> Option<bool> {
        locks::read(&self.bios).get(&platform_id).copied()
    }

    pub fn mark_stale(&self, key: &str) {
        locks::write(&self.freshness).insert(key.to_string(), false);
    }

    pub fn mark_fresh(&self, key: &str) {
        locks::write(&self.freshness).insert(key.to_string(), true);
    }

    /// Wait for a running prefetch of `key`. Returns whether one was running.
    pub async fn wait_for_prefetch(&self, key: &str) -> bool {
        let handle = locks::read(&self.in_flight).get(key).cloned();
        match handle {
            Some(handle) => {
                handle.wait().await;
                true
            }
            None => false,
        }
    }

    pub fn is_prefetch_in_progress(&self, key: &str) -> bool {
        locks::read(&self.in_flight).contains_key(key)
    }
}

/// Possibly-absent coordinator. Every query answers "not recorded" when no
/// coordinator was started, so callers fall back to asking the server.
pub struct CoordinatorHandle<A>(Option<Arc<RefreshCoordinator<A>>>);

impl<A> Clone for CoordinatorHandle<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A> Default for CoordinatorHandle<A> {
    fn default() -> Self {
        Self(None)
    }
}

impl<A: CatalogApi + 'static> CoordinatorHandle<A> {
    pub fn new(coordinator: Arc<RefreshCoordinator<A>>) -> Self {
        Self(Some(coordinator))
    }

    pub fn uninitialized() -> Self {
        Self(None)
    }

    pub fn coordinator(&self) -> Option<&Arc<RefreshCoordinator<A>>> {
        self.0.as_ref()
    }

    pub fn is_fresh(&self, key: &str) -> Option<bool> {
        self.0.as_ref()?.is_fresh(key)
    }

    pub fn has_bios(&self, platform_id: u64) -> Option<bool> {
        self.0.as_ref()?.has_bios(platform_id)
    }

    pub fn mark_stale(&self, key: &str) {
        if let Some(c) = &self.0 {
            c.mark_stale(key);
        }
    }

    pub fn mark_fresh(&self, key: &str) {
        if let Some(c) = &self.0 {
            c.mark_fresh(key);
        }
    }

    pub async fn wait_for_prefetch(&self, key: &str) -> bool {
        match &self.0 {
            Some(c) => c.wait_for_prefetch(key).await,
            None => false,
        }
    }

    pub fn is_prefetch_in_progress(&self, key: &str) -> bool {
        self.0
            .as_ref()
            .is_some_and(|c| c.is_prefetch_in_progress(key))
    }
}

#[cfg(test)]
#[path = "tests/refresh_tests.rs"]
mod tests;
