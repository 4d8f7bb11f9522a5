//! Scan configuration, embeddable in a host's own config document.
//!
//! The framework is a library and reads no files itself; hosts that keep
//! their configuration in JSON or TOML deserialize a [`ScanConfig`] out of
//! it and hand the pieces to [`LocalLoader::from_config`] and
//! [`scan_plugins`].
//!
//! [`LocalLoader::from_config`]: crate::loader::LocalLoader::from_config
//! [`scan_plugins`]: crate::scan::scan_plugins

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scan::ScanFlags;

/// Plug-in scan settings: where to look and which lifecycle policies apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directories whose immediate children are candidate plug-in
    /// directories.
    #[serde(default)]
    pub plugin_dirs: Vec<PathBuf>,

    /// Replace an installed plug-in when a strictly newer version is
    /// discovered.
    #[serde(default)]
    pub upgrade: bool,

    /// Stop every running plug-in before installing any new one.
    #[serde(default)]
    pub stop_all_on_install: bool,

    /// Stop every running plug-in before uninstalling one for upgrade.
    #[serde(default)]
    pub stop_all_on_upgrade: bool,

    /// Restart previously active plug-ins after install/upgrade.
    #[serde(default)]
    pub restart_active: bool,
}

impl ScanConfig {
    /// The configured lifecycle policies as scan flags.
    pub fn flags(&self) -> ScanFlags {
        ScanFlags {
            upgrade: self.upgrade,
            stop_all_on_install: self.stop_all_on_install,
            stop_all_on_upgrade: self.stop_all_on_upgrade,
            restart_active: self.restart_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: ScanConfig = serde_json::from_str("{}").unwrap();
        assert!(config.plugin_dirs.is_empty());
        assert!(!config.upgrade);
        assert!(!config.stop_all_on_install);
        assert!(!config.stop_all_on_upgrade);
        assert!(!config.restart_active);
    }

    #[test]
    fn test_flags_mapping() {
        let config: ScanConfig = serde_json::from_str(
            r#"{
                "plugin_dirs": ["/opt/host/plugins", "/home/user/.host/plugins"],
                "upgrade": true,
                "restart_active": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.plugin_dirs.len(), 2);
        let flags = config.flags();
        assert!(flags.upgrade);
        assert!(flags.restart_active);
        assert!(!flags.stop_all_on_install);
        assert!(!flags.stop_all_on_upgrade);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = ScanConfig {
            plugin_dirs: vec![PathBuf::from("/plugins")],
            upgrade: true,
            stop_all_on_install: false,
            stop_all_on_upgrade: true,
            restart_active: false,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: ScanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.plugin_dirs, config.plugin_dirs);
        assert_eq!(back.flags(), config.flags());
    }

    #[test]
    fn test_from_config_seeds_local_loader() {
        use crate::loader::LocalLoader;

        let config = ScanConfig {
            plugin_dirs: vec![PathBuf::from("/plugins/a"), PathBuf::from("/plugins/b")],
            ..ScanConfig::default()
        };

        let loader = LocalLoader::from_config(&config);
        assert_eq!(loader.registered_dirs(), config.plugin_dirs);
    }
}
