//! Plug-in framework core for a host application.
//!
//! Discovers plug-in descriptors through pluggable loaders, reconciles
//! multiple discovered versions into a single installable set, and drives
//! the install / upgrade / restart lifecycle against a live host registry.
//!
//! # Architecture
//!
//! - **info**: the data model (`PluginInfo`, `Version`, `PluginState`)
//! - **descriptor**: `plugin.xml` parsing into shared plug-in records
//! - **loader**: the discovery SPI (`PluginLoader`) and the local
//!   filesystem loader (`LocalLoader`)
//! - **context**: the `HostContext` registry contract a scan runs against
//! - **scan**: the reconcile-and-install engine (`scan_plugins`)
//! - **config**: serde-friendly scan settings for embedding in host config
//!
//! The host owns the registry, the plug-in runtimes, and the loader
//! registrations; this crate owns discovery and reconciliation. A minimal
//! host wires things up like this:
//!
//! ```no_run
//! use std::sync::Arc;
//! use plughost::{scan_plugins, HostContext, LocalLoader, ScanFlags};
//!
//! fn rescan(ctx: &mut dyn HostContext) -> plughost::Result<()> {
//!     scan_plugins(ctx, ScanFlags::new().upgrade().restart_active())
//! }
//!
//! // Registered with the host context at startup:
//! let loader = Arc::new(LocalLoader::new());
//! loader.register_dir("/opt/host/plugins");
//! ```

pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod info;
pub mod loader;
pub mod scan;

pub use config::ScanConfig;
pub use context::{HostContext, LoaderId};
pub use descriptor::{load_plugin_descriptor, load_plugin_descriptor_from_memory};
pub use error::{PlugError, Result};
pub use info::{Extension, ExtensionPoint, PluginImport, PluginInfo, PluginState, Version};
pub use loader::{LocalLoader, PluginLoader};
pub use scan::{scan_plugins, ScanFlags};
