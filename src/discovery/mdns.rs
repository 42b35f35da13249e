//! mDNS corrector discovery
//!
//! Browses the local network for the corrector service and remembers the
//! first resolved IPv4 address as `ip:port`.
//!
//! Service type: `_mavis-corrector._tcp.local.`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};

use super::CorrectorLocator;
use crate::Result;

/// mDNS service type advertised by the corrector
pub const SERVICE_TYPE: &str = "_mavis-corrector._tcp.local.";

/// How long a single browse runs before giving up
const BROWSE_WINDOW: Duration = Duration::from_secs(5);

/// Discovers the corrector over mDNS
pub struct MdnsBrowser {
    /// mDNS daemon
    daemon: ServiceDaemon,

    /// Service type to browse for
    service_type: String,

    /// Last resolved `ip:port`
    resolved: Arc<RwLock<Option<String>>>,

    /// Set while a browse is in flight
    browsing: Arc<AtomicBool>,
}

impl MdnsBrowser {
    /// Create a new browser for `service_type`
    ///
    /// # Errors
    ///
    /// Returns error if mDNS daemon cannot be created
    pub fn new(service_type: &str) -> Result<Self> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| crate::Error::Discovery(format!("failed to create mDNS daemon: {e}")))?;

        Ok(Self {
            daemon,
            service_type: service_type.to_string(),
            resolved: Arc::new(RwLock::new(None)),
            browsing: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start a bounded browse unless one is already running
    ///
    /// Needs a tokio runtime; without one the browse is skipped.
    pub fn discover(&self) {
        if self.browsing.swap(true, Ordering::SeqCst) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime available, skipping mDNS browse");
            self.browsing.store(false, Ordering::SeqCst);
            return;
        };

        let receiver = match self.daemon.browse(&self.service_type) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "failed to start mDNS browse");
                self.browsing.store(false, Ordering::SeqCst);
                return;
            }
        };

        tracing::debug!(service_type = %self.service_type, "start service search");

        let daemon = self.daemon.clone();
        let service_type = self.service_type.clone();
        let resolved = Arc::clone(&self.resolved);
        let browsing = Arc::clone(&self.browsing);

        runtime.spawn(async move {
            let search = async {
                while let Ok(event) = receiver.recv_async().await {
                    if let ServiceEvent::ServiceResolved(info) = event {
                        if let Some(addr) = ipv4_addr(&info) {
                            tracing::info!(
                                service = info.get_fullname(),
                                addr,
                                "resolved corrector service"
                            );
                            *resolved.write().unwrap_or_else(PoisonError::into_inner) =
                                Some(addr);
                            break;
                        }
                        tracing::debug!(
                            service = info.get_fullname(),
                            "resolved service has no IPv4 address"
                        );
                    }
                }
            };

            if tokio::time::timeout(BROWSE_WINDOW, search).await.is_err() {
                tracing::debug!(service_type, "service search timed out");
            }
            if let Err(e) = daemon.stop_browse(&service_type) {
                tracing::trace!(error = %e, "failed to stop mDNS browse");
            }
            browsing.store(false, Ordering::SeqCst);
        });
    }

    /// Check if a browse is currently running
    #[must_use]
    pub fn is_browsing(&self) -> bool {
        self.browsing.load(Ordering::SeqCst)
    }
}

impl CorrectorLocator for MdnsBrowser {
    fn resolved_addr(&self) -> Option<String> {
        let addr = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if addr.is_none() {
            self.discover();
        }
        addr
    }

    fn forget(&self) {
        if let Some(addr) = self
            .resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            tracing::info!(addr, "forgetting corrector address");
        }
    }
}

impl Drop for MdnsBrowser {
    fn drop(&mut self) {
        if let Err(e) = self.daemon.shutdown() {
            tracing::trace!(error = %e, "mDNS daemon shutdown error (expected on normal exit)");
        }
    }
}

/// First IPv4 address of a resolved service, formatted as `ip:port`
fn ipv4_addr(info: &ServiceInfo) -> Option<String> {
    info.get_addresses_v4()
        .into_iter()
        .next()
        .map(|ip| format!("{ip}:{}", info.get_port()))
}
