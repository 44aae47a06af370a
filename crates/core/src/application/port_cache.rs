//! Port Cache - lazily computed, run-once table of listening sockets
//!
//! The first caller starts the scan as a spawned task. Every caller, including
//! ones arriving while it runs, awaits that same task and receives the same
//! `Arc`. Dropping a caller does not cancel the scan. There is no refresh: the
//! snapshot lives as long as the cache.

use crate::domain::PortTable;
use crate::port::PortScanner;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Uninitialized -> Computing -> Ready, never backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Uninitialized,
    Computing,
    Ready,
}

type SharedScan = Shared<BoxFuture<'static, Arc<PortTable>>>;

pub struct PortCache {
    scanner: Arc<dyn PortScanner>,
    scan: OnceLock<SharedScan>,
    // Set by the scan task itself, so Ready holds even if no caller is left
    table: Arc<OnceLock<Arc<PortTable>>>,
}

impl PortCache {
    pub fn new(scanner: Arc<dyn PortScanner>) -> Self {
        Self {
            scanner,
            scan: OnceLock::new(),
            table: Arc::new(OnceLock::new()),
        }
    }

    /// The port table, scanning the host on first use
    pub async fn get(&self) -> Arc<PortTable> {
        if let Some(table) = self.table.get() {
            return table.clone();
        }
        let scan = self.scan.get_or_init(|| self.start_scan()).clone();
        scan.await
    }

    fn start_scan(&self) -> SharedScan {
        let scanner = self.scanner.clone();
        let slot = self.table.clone();
        let handle = tokio::spawn(async move {
            let table = Arc::new(scanner.scan().await);
            info!(entries = table.len(), "Port table computed");
            slot.get_or_init(|| table).clone()
        });

        let slot = self.table.clone();
        async move {
            match handle.await {
                Ok(table) => table,
                Err(e) => {
                    warn!(error = %e, "Port scan task failed; using empty table");
                    let empty = PortTable::from_descriptors(Utc::now(), Vec::new());
                    slot.get_or_init(|| Arc::new(empty)).clone()
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn state(&self) -> CacheState {
        if self.table.get().is_some() {
            CacheState::Ready
        } else if self.scan.get().is_some() {
            CacheState::Computing
        } else {
            CacheState::Uninitialized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PortKey, ProcessDescriptor, Protocol};
    use crate::port::port_scanner::mocks::CountingPortScanner;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn sshd() -> ProcessDescriptor {
        ProcessDescriptor {
            pid: Some(812),
            name: Some("sshd".to_string()),
            local_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            local_port: 22,
            protocol: Protocol::Tcp,
        }
    }

    #[tokio::test]
    async fn test_sequential_calls_scan_once() {
        let scanner = Arc::new(CountingPortScanner::new(vec![sshd()]));
        let cache = PortCache::new(scanner.clone());
        assert_eq!(cache.state(), CacheState::Uninitialized);

        let first = cache.get().await;
        let second = cache.get().await;

        assert_eq!(scanner.scan_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.state(), CacheState::Ready);
        assert_eq!(
            first.get(&PortKey::new(Protocol::Tcp, 22)).unwrap().name.as_deref(),
            Some("sshd")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_scan() {
        let scanner =
            Arc::new(CountingPortScanner::new(vec![sshd()]).with_delay(Duration::from_millis(50)));
        let cache = Arc::new(PortCache::new(scanner.clone()));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get().await }));
        }

        let mut tables = Vec::new();
        for handle in handles {
            tables.push(handle.await.unwrap());
        }

        assert_eq!(scanner.scan_count(), 1);
        for table in &tables {
            assert!(Arc::ptr_eq(table, &tables[0]));
        }
    }

    #[tokio::test]
    async fn test_state_is_computing_while_scan_in_flight() {
        let scanner =
            Arc::new(CountingPortScanner::new(vec![]).with_delay(Duration::from_millis(100)));
        let cache = Arc::new(PortCache::new(scanner));

        let background = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.state(), CacheState::Computing);

        let table = background.await.unwrap();
        assert!(table.is_empty());
        assert_eq!(cache.state(), CacheState::Ready);
    }

    #[tokio::test]
    async fn test_abandoned_first_caller_does_not_rescan() {
        let scanner =
            Arc::new(CountingPortScanner::new(vec![sshd()]).with_delay(Duration::from_millis(100)));
        let cache = PortCache::new(scanner.clone());

        let abandoned = tokio::time::timeout(Duration::from_millis(10), cache.get()).await;
        assert!(abandoned.is_err());
        assert_eq!(cache.state(), CacheState::Computing);

        let table = cache.get().await;
        assert_eq!(scanner.scan_count(), 1);
        assert_eq!(cache.state(), CacheState::Ready);
        assert!(table.get(&PortKey::new(Protocol::Tcp, 22)).is_some());
        assert!(Arc::ptr_eq(&table, &cache.get().await));
    }
}
