//! Reconcile-and-install scan over every loader registered with a host
//! context.
//!
//! One scan runs in four phases: snapshot the active plug-in set (when a
//! restart was requested), discover candidates from all loaders, reconcile
//! them against the registry with a highest-version-wins rule, and restart
//! the plug-ins that were running when the scan began. Already-installed
//! plug-ins are never rolled back; a fatal host error aborts the reconcile
//! phase but the restart phase still runs.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use crate::context::{HostContext, LoaderId};
use crate::error::{PlugError, Result};
use crate::info::{PluginInfo, PluginState};

/// Policy flags for one scan. All four are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanFlags {
    /// Replace an installed plug-in when a strictly newer version is
    /// discovered.
    pub upgrade: bool,
    /// Stop every running plug-in before installing any new one.
    pub stop_all_on_install: bool,
    /// Stop every running plug-in before uninstalling one for upgrade.
    pub stop_all_on_upgrade: bool,
    /// After install/upgrade, restart every plug-in that was starting or
    /// active when the scan began.
    pub restart_active: bool,
}

impl ScanFlags {
    /// No flags set.
    pub const fn new() -> Self {
        Self {
            upgrade: false,
            stop_all_on_install: false,
            stop_all_on_upgrade: false,
            restart_active: false,
        }
    }

    /// Enable upgrading installed plug-ins to newer discovered versions.
    pub const fn upgrade(mut self) -> Self {
        self.upgrade = true;
        self
    }

    /// Enable stopping all plug-ins before any install.
    pub const fn stop_all_on_install(mut self) -> Self {
        self.stop_all_on_install = true;
        self
    }

    /// Enable stopping all plug-ins before an upgrade uninstall.
    pub const fn stop_all_on_upgrade(mut self) -> Self {
        self.stop_all_on_upgrade = true;
        self
    }

    /// Enable restarting previously active plug-ins after the scan.
    pub const fn restart_active(mut self) -> Self {
        self.restart_active = true;
        self
    }
}

/// A candidate discovered during one scan: the record plus the loader it
/// came from. The loader outlives any scan that uses it; the record is
/// shared with whichever loader produced it.
struct AvailablePlugin {
    info: Arc<PluginInfo>,
    loader: LoaderId,
}

/// Scan all registered loaders and install, upgrade, and restart plug-ins
/// against the host registry according to `flags`.
///
/// Returns `Ok(())` when every phase completed, otherwise the first error
/// encountered. Per-candidate failures during discovery are logged and
/// skipped; a host install or uninstall failure aborts the reconcile phase
/// (plug-ins already installed stay installed) while the restart phase
/// still runs.
pub fn scan_plugins(ctx: &mut dyn HostContext, flags: ScanFlags) -> Result<()> {
    debug!("plug-in scan is starting");
    let mut status: Result<()> = Ok(());

    // Phase A: snapshot the identifiers of starting/active plug-ins, in
    // registry order, when a restart could be needed later.
    let mut restart_list: Option<Vec<String>> = None;
    if flags.restart_active && (flags.upgrade || flags.stop_all_on_install) {
        let infos = match ctx.plugins_info() {
            Ok(infos) => infos,
            Err(e) => {
                error!(error = %e, "could not snapshot installed plug-ins");
                return Err(e);
            }
        };
        let mut started = Vec::new();
        for info in &infos {
            if matches!(
                ctx.plugin_state(&info.identifier),
                PluginState::Starting | PluginState::Active
            ) {
                started.push(info.identifier.clone());
            }
        }
        restart_list = Some(started);
    }

    // Phase B: discover candidates from every loader, merging with the
    // highest-version-wins rule across loaders.
    let mut avail: HashMap<String, AvailablePlugin> = HashMap::new();
    for (loader_id, loader) in ctx.loaders() {
        debug!(loader = ?loader_id, "scanning plug-ins using loader");
        let Some(batch) = loader.scan_plugins(&*ctx) else {
            error!(loader = ?loader_id, "plug-in loader failed to scan for plug-ins");
            continue;
        };

        for info in &batch {
            match avail.entry(info.identifier.clone()) {
                Entry::Occupied(mut slot) => {
                    if info.version > slot.get().info.version {
                        slot.insert(AvailablePlugin {
                            info: Arc::clone(info),
                            loader: loader_id,
                        });
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(AvailablePlugin {
                        info: Arc::clone(info),
                        loader: loader_id,
                    });
                }
            }
        }

        loader.release_plugins(&*ctx, batch);
    }

    // Phase C: install and upgrade. Draining the map releases every
    // remaining candidate if a fatal host error breaks the loop early.
    let mut plugins_stopped = false;
    for (identifier, candidate) in avail.drain() {
        let mut installed = ctx.installed_info(&identifier);

        // Uninstall the installed plug-in if it is to be upgraded.
        if let Some(current) = &installed {
            if flags.upgrade && candidate.info.version > current.version {
                if (flags.stop_all_on_upgrade || flags.stop_all_on_install) && !plugins_stopped {
                    plugins_stopped = true;
                    ctx.stop_plugins();
                }
                if let Err(e) = ctx.uninstall_plugin(&identifier) {
                    error!(
                        plugin = %identifier,
                        error = %e,
                        "could not uninstall plug-in for upgrade"
                    );
                    status = Err(e);
                    break;
                }
                installed = None;
            }
        }

        // Install the plug-in, if the slot is empty.
        if installed.is_none() {
            if flags.stop_all_on_install && !plugins_stopped {
                plugins_stopped = true;
                ctx.stop_plugins();
            }
            if let Err(e) = ctx.reserve_loader_slot(candidate.loader, &identifier) {
                error!(
                    plugin = %identifier,
                    error = %e,
                    "could not record plug-in loader provenance"
                );
                status = Err(e);
                break;
            }
            if let Err(e) = ctx.install_plugin(Arc::clone(&candidate.info), candidate.loader) {
                ctx.release_loader_slot(candidate.loader, &identifier);
                error!(
                    plugin = %identifier,
                    version = ?candidate.info.version,
                    error = %e,
                    "could not install plug-in"
                );
                status = Err(e);
                break;
            }
        }
    }
    drop(avail);

    // Phase D: restart the plug-ins that were running at entry, in
    // snapshot order. Failures are recorded but do not stop the rest.
    if let Some(restart_list) = &restart_list {
        for identifier in restart_list {
            if let Err(e) = ctx.start_plugin(identifier) {
                error!(
                    plugin = %identifier,
                    error = %e,
                    "could not restart plug-in after scan"
                );
                if status.is_ok() {
                    status = Err(e);
                }
            }
        }
    }

    match &status {
        Ok(()) => debug!("plug-in scan has completed successfully"),
        Err(PlugError::Resource(_)) => {
            error!("could not scan all plug-ins due to insufficient resources")
        }
        Err(_) => error!("could not scan all plug-ins"),
    }
    status
}
