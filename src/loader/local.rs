//! Local filesystem plug-in loader.
//!
//! Scans an ordered set of directories whose immediate children are
//! candidate plug-in directories. One unreadable directory, one malformed
//! descriptor, or one enumeration error never hides the rest of the plug-in
//! population.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, error};

use crate::config::ScanConfig;
use crate::context::HostContext;
use crate::info::PluginInfo;
use crate::loader::PluginLoader;

/// A plug-in loader backed by local plug-in collection directories.
///
/// The directory set is ordered, duplicate-free under byte-equal path
/// comparison, and guarded by a lock so directories can be registered
/// through a shared handle. The caller must not mutate the set while a
/// scan using this loader is in flight.
pub struct LocalLoader {
    dirs: RwLock<Vec<PathBuf>>,
}

impl LocalLoader {
    /// Create a loader with no registered directories.
    pub fn new() -> Self {
        Self {
            dirs: RwLock::new(Vec::new()),
        }
    }

    /// Create a loader with the directories named by a [`ScanConfig`].
    pub fn from_config(config: &ScanConfig) -> Self {
        let loader = Self::new();
        for dir in &config.plugin_dirs {
            loader.register_dir(dir.clone());
        }
        loader
    }

    /// Register a plug-in collection directory. Registering a directory
    /// that is already present is a no-op.
    pub fn register_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        let mut dirs = self.dirs.write().expect("plug-in directory set lock poisoned");
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    /// Unregister a previously registered directory. Unregistering an
    /// absent directory is a no-op.
    pub fn unregister_dir(&self, dir: &Path) {
        let mut dirs = self.dirs.write().expect("plug-in directory set lock poisoned");
        dirs.retain(|d| d != dir);
    }

    /// Unregister all registered directories.
    pub fn unregister_all(&self) {
        self.dirs
            .write()
            .expect("plug-in directory set lock poisoned")
            .clear();
    }

    /// The registered directories, in registration order.
    pub fn registered_dirs(&self) -> Vec<PathBuf> {
        self.dirs
            .read()
            .expect("plug-in directory set lock poisoned")
            .clone()
    }
}

impl Default for LocalLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginLoader for LocalLoader {
    fn scan_plugins(&self, ctx: &dyn HostContext) -> Option<Vec<Arc<PluginInfo>>> {
        let dirs = self.registered_dirs();
        let mut avail: HashMap<String, Arc<PluginInfo>> = HashMap::new();

        for dir in &dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    error!(dir = %dir.display(), error = %e, "could not open plug-in directory");
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        error!(dir = %dir.display(), error = %e, "could not read plug-in directory");
                        break;
                    }
                };

                // Skip `.`, `..`, hidden entries, and nameless entries.
                let name = entry.file_name();
                let bytes = name.as_encoded_bytes();
                if bytes.is_empty() || bytes[0] == b'.' {
                    continue;
                }

                let candidate = dir.join(&name);
                let info = match ctx.load_descriptor(&candidate) {
                    Ok(info) => info,
                    Err(e) => {
                        debug!(
                            path = %candidate.display(),
                            error = %e,
                            "skipping plug-in candidate"
                        );
                        continue;
                    }
                };
                merge_available(&mut avail, info);
            }
        }

        Some(avail.into_values().collect())
    }
}

/// Reconcile a freshly parsed record into the working set: highest version
/// wins per identifier, ties keep the record seen first.
fn merge_available(avail: &mut HashMap<String, Arc<PluginInfo>>, info: Arc<PluginInfo>) {
    match avail.entry(info.identifier.clone()) {
        Entry::Occupied(mut slot) => {
            if info.version > slot.get().version {
                slot.insert(info);
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(info);
        }
    }
}
