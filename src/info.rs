//! Core data model: plug-in records, versions, and lifecycle states.
//!
//! A [`PluginInfo`] is immutable after parsing; every component that needs
//! one holds an `Arc<PluginInfo>`, so the descriptor data outlives any
//! reference taken from it and release bookkeeping reduces to dropping the
//! handle.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

/// Lifecycle state of a plug-in as reported by the host registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Not known to the registry.
    Uninstalled,
    /// Installed but dependencies not yet resolved.
    Installed,
    /// Installed with dependencies resolved.
    Resolved,
    /// Start sequence in progress.
    Starting,
    /// Running.
    Active,
    /// Stop sequence in progress.
    Stopping,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginState::Uninstalled => "uninstalled",
            PluginState::Installed => "installed",
            PluginState::Resolved => "resolved",
            PluginState::Starting => "starting",
            PluginState::Active => "active",
            PluginState::Stopping => "stopping",
        };
        write!(f, "{s}")
    }
}

/// Plug-in version with dotted component ordering.
///
/// Components are separated by `.`. A component pair where both sides are
/// all digits compares numerically, anything else compares byte-wise. A
/// version with fewer components orders first when the shared prefix is
/// equal. An absent version (`Option::None`) orders before any present one,
/// which `Option`'s own ordering already provides.
#[derive(Debug, Clone)]
pub struct Version(String);

impl Version {
    /// Wrap a raw version string.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The raw version string as written in the descriptor.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Equality must agree with the component ordering ("1.0" == "1.00"), so it
// cannot be derived from the raw string.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut ours = self.0.split('.');
        let mut theirs = other.0.split('.');
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => {
                    let ord = compare_component(a, b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

/// Compare one dotted component: numerically when both sides are all
/// digits, byte-wise otherwise.
fn compare_component(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// An immutable-after-parse record describing one plug-in.
///
/// The scan engine consults `identifier`, `version`, and `path`; the
/// remaining fields are descriptor metadata carried for the host runtime.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Unique plug-in identifier, e.g. `org.example.hello`. Never empty.
    pub identifier: String,

    /// Version declared by the descriptor, if any.
    pub version: Option<Version>,

    /// Filesystem path of the plug-in directory the descriptor came from,
    /// or the synthetic `memory` path for in-memory descriptors.
    pub path: PathBuf,

    /// Human-readable plug-in name.
    pub name: Option<String>,

    /// Provider or author of the plug-in.
    pub provider_name: Option<String>,

    /// Plug-ins this plug-in imports.
    pub imports: Vec<PluginImport>,

    /// Name of the runtime library implementing the plug-in, if any.
    pub runtime_library: Option<String>,

    /// Symbol resolving to the plug-in's runtime function table.
    pub runtime_symbol: Option<String>,

    /// Extension points this plug-in opens for others.
    pub extension_points: Vec<ExtensionPoint>,

    /// Extensions this plug-in installs into other plug-ins' points.
    pub extensions: Vec<Extension>,
}

impl PluginInfo {
    /// Create a record with the fields the engine consults; descriptor
    /// metadata starts out empty.
    pub fn new(identifier: impl Into<String>, version: Option<Version>, path: PathBuf) -> Self {
        Self {
            identifier: identifier.into(),
            version,
            path,
            name: None,
            provider_name: None,
            imports: Vec::new(),
            runtime_library: None,
            runtime_symbol: None,
            extension_points: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

/// A dependency on another plug-in.
#[derive(Debug, Clone)]
pub struct PluginImport {
    /// Identifier of the imported plug-in.
    pub plugin_id: String,
    /// Minimum version required, if constrained.
    pub version: Option<Version>,
    /// Whether the import is optional.
    pub optional: bool,
}

/// An extension point opened by a plug-in.
#[derive(Debug, Clone)]
pub struct ExtensionPoint {
    /// Local identifier of the point.
    pub id: String,
    /// Human-readable name.
    pub name: Option<String>,
    /// Path of the extension schema, relative to the plug-in directory.
    pub schema_path: Option<String>,
}

/// An extension installed into some plug-in's extension point.
#[derive(Debug, Clone)]
pub struct Extension {
    /// Fully qualified identifier of the target extension point.
    pub point: String,
    /// Local identifier of the extension, if any.
    pub id: Option<String>,
    /// Human-readable name.
    pub name: Option<String>,
}
