// Port Scanner Port
// reason: async-trait, the scan walks every socket and process on the host
use async_trait::async_trait;

use crate::domain::PortTable;

/// Full-host scan of listening sockets and their owning processes
///
/// A scan always produces a table; sources that cannot be read are skipped
/// by the implementation rather than reported.
#[async_trait]
pub trait PortScanner: Send + Sync {
    /// Enumerate listening sockets
    ///
    /// # Example
    /// ```text
    /// let table = scanner.scan().await;
    /// if let Some(owner) = table.get(&"tcp:22".parse()?) {
    ///     println!("sshd pid: {:?}", owner.pid);
    /// }
    /// ```
    async fn scan(&self) -> PortTable;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::ProcessDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scanner that returns a fixed set of descriptors and counts its scans
    pub struct CountingPortScanner {
        descriptors: Vec<ProcessDescriptor>,
        delay: Duration,
        scans: AtomicUsize,
    }

    impl CountingPortScanner {
        pub fn new(descriptors: Vec<ProcessDescriptor>) -> Self {
            Self {
                descriptors,
                delay: Duration::ZERO,
                scans: AtomicUsize::new(0),
            }
        }

        /// Hold each scan open for `delay` so callers pile up behind it
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn scan_count(&self) -> usize {
            self.scans.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PortScanner for CountingPortScanner {
        async fn scan(&self) -> PortTable {
            self.scans.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            PortTable::from_descriptors(chrono::Utc::now(), self.descriptors.clone())
        }
    }
}
