//! Pluggable plug-in discovery sources.
//!
//! A loader turns some backing store — a directory tree, an archive, a
//! database — into a batch of candidate plug-in records. The scan engine
//! consults every loader registered with the host context and reconciles
//! their batches; see [`crate::scan::scan_plugins`].

use std::sync::Arc;

use crate::context::HostContext;
use crate::info::PluginInfo;

mod local;

pub use local::LocalLoader;

/// A discovery source for plug-in descriptors.
pub trait PluginLoader: Send + Sync {
    /// Scan the backing store for candidate plug-ins.
    ///
    /// Returns `None` when the source could not be scanned at all; the
    /// engine logs that and proceeds with other loaders. Within one batch
    /// the loader must apply the highest-version-wins rule itself, so the
    /// engine sees at most one record per identifier from a single loader.
    fn scan_plugins(&self, ctx: &dyn HostContext) -> Option<Vec<Arc<PluginInfo>>>;

    /// Release a batch previously returned by
    /// [`scan_plugins`](Self::scan_plugins).
    ///
    /// The engine hands back the exact vector it received once it has taken
    /// its own references. The default implementation simply drops it;
    /// loaders that cache or pool their records override this.
    fn release_plugins(&self, _ctx: &dyn HostContext, plugins: Vec<Arc<PluginInfo>>) {
        drop(plugins);
    }
}
