// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The published-map cell: a wait-free read path for looking up which
//! endpoint owns a block, and a publish path that swaps in a whole new map
//! atomically.
//!
//! Publication is read-copy-update: a reader loads an `Arc<Map>` snapshot
//! and keeps using it even if a writer publishes a new one underneath it.
//! The old map is freed once the last reader holding it drops its snapshot.
//! `arc_swap::ArcSwapOption` gives us exactly this without a reader-side
//! lock.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use log::debug;
use std::sync::Arc;

use ngnfs_fsinfo::{wait_shutdown_aware, FsInfo};
use ngnfs_wire::{Endpoint, Error, Map};

/// How often a `wait_until_nonempty` call wakes up to recheck the shutdown
/// latch even if nothing has been published yet.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The published map cell plus the waitqueue that lets a caller block until
/// the first map arrives.
pub struct MapStore {
    current: ArcSwapOption<Map>,
    publish_mutex: Mutex<()>,
    publish_cond: Condvar,
}

impl Default for MapStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MapStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::from(None),
            publish_mutex: Mutex::new(()),
            publish_cond: Condvar::new(),
        }
    }

    /// Publish `map`, replacing whatever was previously published. Readers
    /// already holding the old snapshot keep it valid; new lookups see the
    /// new one.
    pub fn publish(&self, map: Map) {
        self.current.store(Some(Arc::new(map)));
        let _guard = self.publish_mutex.lock().unwrap();
        self.publish_cond.notify_all();
        debug!("published a new map");
    }

    /// The currently published map, if any, without blocking.
    pub fn current_snapshot(&self) -> Option<Arc<Map>> {
        self.current.load_full()
    }

    /// Map a block number to the endpoint that owns it, using whatever map
    /// is currently published. Fails with `NotReady` if nothing has been
    /// published yet.
    pub fn lookup(&self, bnr: u64) -> Result<Endpoint, Error> {
        let snapshot = self.current.load();
        match snapshot.as_ref() {
            Some(map) => Ok(map.map_block(bnr)),
            None => Err(Error::NotReady),
        }
    }

    /// Block until a map has been published, a shutdown is requested, or
    /// `timeout` elapses (if given).
    pub fn wait_until_nonempty(&self, fsinfo: &FsInfo, timeout: Option<Duration>) -> Result<Arc<Map>, Error> {
        if let Some(map) = self.current_snapshot() {
            return Ok(map);
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        wait_shutdown_aware(fsinfo, &self.publish_mutex, &self.publish_cond, POLL_INTERVAL, deadline, |_| {
            self.current.load().is_some()
        })?;

        Ok(self
            .current_snapshot()
            .expect("wait_shutdown_aware only returns Ok once the map is published"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngnfs_wire::DevdMap;
    use std::net::Ipv4Addr;
    use std::thread;

    fn sample_map() -> Map {
        Map::new(DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 1)])).unwrap()
    }

    #[test]
    fn lookup_before_publish_is_not_ready() {
        let store = MapStore::new();
        assert!(matches!(store.lookup(0), Err(Error::NotReady)));
    }

    #[test]
    fn lookup_after_publish_succeeds() {
        let store = MapStore::new();
        store.publish(sample_map());
        assert_eq!(store.lookup(0).unwrap(), Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 1));
    }

    #[test]
    fn wait_until_nonempty_returns_immediately_once_published() {
        let store = MapStore::new();
        store.publish(sample_map());
        let fsinfo = FsInfo::new();
        let map = store.wait_until_nonempty(&fsinfo, Some(Duration::from_millis(10))).unwrap();
        assert_eq!(map.nr_addrs(), 1);
    }

    #[test]
    fn wait_until_nonempty_times_out_without_publish() {
        let store = MapStore::new();
        let fsinfo = FsInfo::new();
        let result = store.wait_until_nonempty(&fsinfo, Some(Duration::from_millis(30)));
        assert!(matches!(result, Err(Error::TimedOut)));
    }

    #[test]
    fn wait_until_nonempty_wakes_on_publish_from_another_thread() {
        let store = Arc::new(MapStore::new());
        let fsinfo = Arc::new(FsInfo::new());

        let s = Arc::clone(&store);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            s.publish(sample_map());
        });

        let map = store
            .wait_until_nonempty(&fsinfo, Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(map.nr_addrs(), 1);
    }

    #[test]
    fn wait_until_nonempty_returns_shutdown_error() {
        let store = Arc::new(MapStore::new());
        let fsinfo = Arc::new(FsInfo::new());

        let f = Arc::clone(&fsinfo);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            f.shutdown(-5);
        });

        let result = store.wait_until_nonempty(&fsinfo, None);
        assert!(matches!(result, Err(Error::Shutdown)));
    }

    #[test]
    fn republish_while_holding_old_snapshot_does_not_disturb_it() {
        let store = MapStore::new();
        store.publish(sample_map());
        let old = store.current_snapshot().unwrap();

        let new_map = Map::new(DevdMap::new(vec![Endpoint::new(Ipv4Addr::new(10, 0, 0, 9), 9)])).unwrap();
        store.publish(new_map);

        assert_eq!(old.nr_addrs(), 1);
        assert_eq!(old.map_block(0).port, 1);
        assert_eq!(store.lookup(0).unwrap().port, 9);
    }
}
