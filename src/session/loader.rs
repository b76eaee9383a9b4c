use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::selection::registry::{self, LineCountRegistry, LineCountSource};

/// Shared handle to a registry source usable from worker threads.
pub type SharedSource = Arc<dyn LineCountSource + Send + Sync>;

/// Result of one background registry fetch.
#[derive(Debug)]
pub struct RegistryLoad {
    pub generation: u64,
    pub registry: LineCountRegistry,
}

/// Fetches the registry on worker threads and hands back only the newest.
///
/// Every [`request`](Self::request) gets a fresh generation number. Loads
/// finishing out of order are dropped when an equal or newer generation has
/// already been applied, so a later activation always wins.
pub struct RegistryLoader {
    source: SharedSource,
    tx: Sender<RegistryLoad>,
    rx: Receiver<RegistryLoad>,
    next_generation: u64,
    applied_generation: u64,
}

impl RegistryLoader {
    pub fn new(source: SharedSource) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            source,
            tx,
            rx,
            next_generation: 1,
            applied_generation: 0,
        }
    }

    /// Start a background load and return its generation.
    pub fn request(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let registry = registry::load(source.as_ref());
            let _ = tx.send(RegistryLoad {
                generation,
                registry,
            });
        });
        tracing::debug!(generation, "Registry load requested");
        generation
    }

    pub fn latest_requested(&self) -> u64 {
        self.next_generation - 1
    }

    pub fn applied_generation(&self) -> u64 {
        self.applied_generation
    }

    /// True while the newest request has not been applied.
    pub fn is_loading(&self) -> bool {
        self.applied_generation < self.latest_requested()
    }

    /// Drain finished loads without blocking; returns the newest accepted one.
    pub fn poll(&mut self) -> Option<LineCountRegistry> {
        let mut accepted = None;
        while let Ok(load) = self.rx.try_recv() {
            if let Some(registry) = self.offer(load) {
                accepted = Some(registry);
            }
        }
        accepted
    }

    /// Block until the newest request is applied or `timeout` elapses.
    ///
    /// Returns the last registry accepted while waiting.
    pub fn wait(&mut self, timeout: Duration) -> Option<LineCountRegistry> {
        let deadline = Instant::now() + timeout;
        let mut accepted = self.poll();
        while self.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(load) => {
                    if let Some(registry) = self.offer(load) {
                        accepted = Some(registry);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        generation = self.latest_requested(),
                        "Timed out waiting for registry load"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        accepted
    }

    fn offer(&mut self, load: RegistryLoad) -> Option<LineCountRegistry> {
        if load.generation <= self.applied_generation {
            tracing::debug!(
                generation = load.generation,
                applied = self.applied_generation,
                "Dropping superseded registry load"
            );
            return None;
        }
        self.applied_generation = load.generation;
        Some(load.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::registry::{StaticSource, Unconfigured};
    use std::collections::BTreeMap;

    fn one_type(name: &str) -> LineCountRegistry {
        let mut types = BTreeMap::new();
        types.insert(name.to_string(), BTreeMap::from([("L".to_string(), 1u64)]));
        LineCountRegistry::new(types)
    }

    #[test]
    fn background_load_delivers_registry() {
        let mut loader = RegistryLoader::new(Arc::new(StaticSource(one_type("Cone"))));
        assert!(!loader.is_loading());
        let generation = loader.request();
        assert!(loader.is_loading());
        let registry = loader.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(registry, one_type("Cone"));
        assert_eq!(loader.applied_generation(), generation);
        assert!(!loader.is_loading());
    }

    #[test]
    fn absent_source_yields_fallback() {
        let mut loader = RegistryLoader::new(Arc::new(Unconfigured));
        loader.request();
        let registry = loader.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(registry, LineCountRegistry::fallback());
    }

    #[test]
    fn older_generation_finishing_late_is_dropped() {
        let mut loader = RegistryLoader::new(Arc::new(Unconfigured));
        let newer = loader.offer(RegistryLoad {
            generation: 2,
            registry: one_type("New"),
        });
        assert_eq!(newer, Some(one_type("New")));
        let stale = loader.offer(RegistryLoad {
            generation: 1,
            registry: one_type("Old"),
        });
        assert_eq!(stale, None);
        assert_eq!(loader.applied_generation(), 2);
    }

    #[test]
    fn second_request_supersedes_first() {
        let mut loader = RegistryLoader::new(Arc::new(StaticSource(one_type("Cone"))));
        loader.request();
        let second = loader.request();
        assert!(loader.wait(Duration::from_secs(5)).is_some());
        assert_eq!(loader.applied_generation(), second);
        assert_eq!(loader.poll(), None);
    }
}
