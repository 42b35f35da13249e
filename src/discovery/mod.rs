//! Corrector service address discovery
//!
//! The completion engine only needs to know whether a corrector address is
//! currently known and to say when that address stopped working. How the
//! address is found is up to the [`CorrectorLocator`] implementation.

pub mod mdns;

use std::sync::atomic::{AtomicUsize, Ordering};

pub use mdns::{MdnsBrowser, SERVICE_TYPE};

/// Source of the corrector service's `host:port`
pub trait CorrectorLocator: Send + Sync {
    /// The resolved address, if one is currently known
    fn resolved_addr(&self) -> Option<String>;

    /// Drop the cached address after a failed request
    ///
    /// The next [`resolved_addr`](Self::resolved_addr) call must resolve the
    /// service again instead of trusting the forgotten address.
    fn forget(&self);
}

/// A fixed, configured corrector address
///
/// Resolving a static address always yields the configured value, so a
/// [`forget`](CorrectorLocator::forget) only lasts until the next lookup.
#[derive(Debug)]
pub struct StaticLocator {
    addr: Option<String>,
    forgets: AtomicUsize,
}

impl StaticLocator {
    #[must_use]
    pub const fn new(addr: Option<String>) -> Self {
        Self {
            addr,
            forgets: AtomicUsize::new(0),
        }
    }

    /// Number of failed requests reported so far
    #[must_use]
    pub fn forget_count(&self) -> usize {
        self.forgets.load(Ordering::SeqCst)
    }
}

impl CorrectorLocator for StaticLocator {
    fn resolved_addr(&self) -> Option<String> {
        self.addr.clone()
    }

    fn forget(&self) {
        if let Some(addr) = &self.addr {
            self.forgets.fetch_add(1, Ordering::SeqCst);
            tracing::info!(addr, "corrector request failed, re-resolving configured address");
        }
    }
}
