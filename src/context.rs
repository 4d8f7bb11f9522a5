//! Host-facing interfaces: the registry contract a scan operates against.
//!
//! The host owns the installed-plug-in registry and the lifecycle of plug-in
//! runtimes; this crate only drives it. All operations are synchronous and
//! run under the exclusive `&mut` borrow a scan holds for its entire
//! duration, so host callbacks may assume no other operation on the same
//! context is in flight. Hosts that share a context across threads wrap it
//! in their own lock and hold it for the whole scan.

use std::path::Path;
use std::sync::Arc;

use crate::descriptor;
use crate::error::Result;
use crate::info::{PluginInfo, PluginState};
use crate::loader::PluginLoader;

/// Identity of a loader registered with a host context.
///
/// Minted by the host when the loader is registered; used as the key of the
/// loader-to-plugins provenance map, so two registrations of the same
/// loader value are two distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoaderId(pub u64);

/// The host registry consumed by the scan engine and by loaders.
pub trait HostContext {
    /// Information records of every installed plug-in.
    fn plugins_info(&self) -> Result<Vec<Arc<PluginInfo>>>;

    /// Lifecycle state of the identified plug-in.
    ///
    /// Unknown identifiers report [`PluginState::Uninstalled`].
    fn plugin_state(&self, id: &str) -> PluginState;

    /// Information record of the installed plug-in with this identifier,
    /// or `None` when no such plug-in is installed.
    fn installed_info(&self, id: &str) -> Option<Arc<PluginInfo>>;

    /// Install a discovered plug-in, recording its loader provenance.
    fn install_plugin(&mut self, info: Arc<PluginInfo>, loader: LoaderId) -> Result<()>;

    /// Uninstall the identified plug-in.
    ///
    /// Precondition: the plug-in is not running. The scan engine only calls
    /// this after stopping plug-ins when its policy flags require it.
    fn uninstall_plugin(&mut self, id: &str) -> Result<()>;

    /// Stop every running plug-in.
    fn stop_plugins(&mut self);

    /// Start the identified plug-in.
    fn start_plugin(&mut self, id: &str) -> Result<()>;

    /// Loaders registered with this context, in registration order.
    fn loaders(&self) -> Vec<(LoaderId, Arc<dyn PluginLoader>)>;

    /// Reserve a slot for `id` in the loader's provenance set, before the
    /// matching [`install_plugin`](Self::install_plugin) call.
    fn reserve_loader_slot(&mut self, loader: LoaderId, id: &str) -> Result<()>;

    /// Release a reservation made with
    /// [`reserve_loader_slot`](Self::reserve_loader_slot) after a failed
    /// install.
    fn release_loader_slot(&mut self, loader: LoaderId, id: &str);

    /// Parse the plug-in descriptor for the candidate directory `path`.
    ///
    /// The default implementation uses the built-in `plugin.xml` parser;
    /// hosts with their own descriptor format override this. Loaders treat
    /// the returned record as opaque beyond `identifier`, `version`, and
    /// `path`.
    fn load_descriptor(&self, path: &Path) -> Result<Arc<PluginInfo>> {
        descriptor::load_plugin_descriptor(path)
    }
}
