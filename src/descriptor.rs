//! Plug-in descriptor parsing.
//!
//! A plug-in is described by a `plugin.xml` document in its directory:
//!
//! ```xml
//! <plugin id="org.example.hello" version="1.0" name="Hello" provider-name="Example">
//!   <requires>
//!     <import plugin="org.example.core" version="0.2" optional="true"/>
//!   </requires>
//!   <runtime library="libhello" funcs="hello_funcs"/>
//!   <extension-point id="greetings" name="Greetings" schema="greetings.xsd"/>
//!   <extension point="org.example.core.hooks" id="hook" name="Hello hook"/>
//! </plugin>
//! ```
//!
//! Only `id` is mandatory. Unknown elements and attributes are ignored so
//! descriptors written for later framework revisions still parse. Content
//! nested inside an `<extension>` element is free-form and skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, error};

use crate::error::{PlugError, Result};
use crate::info::{Extension, ExtensionPoint, PluginImport, PluginInfo, Version};

/// File name of the descriptor inside a plug-in directory.
pub const PLUGIN_DESCRIPTOR: &str = "plugin.xml";

/// Path recorded for descriptors parsed from a memory buffer.
const IN_MEMORY_PATH: &str = "memory";

/// Load and parse the descriptor of the plug-in directory `path`.
///
/// Reads `path/plugin.xml`. A missing or unreadable descriptor is an
/// [`PlugError::Io`]; invalid XML or a violated descriptor rule is a
/// [`PlugError::Malformed`] naming the path.
pub fn load_plugin_descriptor(path: &Path) -> Result<Arc<PluginInfo>> {
    let descriptor_path = path.join(PLUGIN_DESCRIPTOR);
    let xml = match fs::read_to_string(&descriptor_path) {
        Ok(xml) => xml,
        Err(e) => {
            debug!(
                path = %descriptor_path.display(),
                error = %e,
                "could not read plug-in descriptor"
            );
            return Err(PlugError::Io(e));
        }
    };

    match parse_descriptor(&xml, path.to_path_buf()) {
        Ok(info) => Ok(Arc::new(info)),
        Err(e) => {
            error!(path = %path.display(), error = %e, "plug-in descriptor is invalid");
            Err(e)
        }
    }
}

/// Parse a descriptor from a memory buffer.
///
/// The resulting record carries the synthetic path `memory`, which the
/// scan engine never consults.
pub fn load_plugin_descriptor_from_memory(buffer: &[u8]) -> Result<Arc<PluginInfo>> {
    let xml = std::str::from_utf8(buffer).map_err(|e| {
        let err = PlugError::Malformed(format!("descriptor buffer is not valid UTF-8: {e}"));
        error!(path = IN_MEMORY_PATH, error = %err, "plug-in descriptor is invalid");
        err
    })?;

    match parse_descriptor(xml, PathBuf::from(IN_MEMORY_PATH)) {
        Ok(info) => Ok(Arc::new(info)),
        Err(e) => {
            error!(path = IN_MEMORY_PATH, error = %e, "plug-in descriptor is invalid");
            Err(e)
        }
    }
}

/// Streaming parse of one descriptor document.
fn parse_descriptor(xml: &str, path: PathBuf) -> Result<PluginInfo> {
    let mut reader = Reader::from_str(xml);
    let mut info: Option<PluginInfo> = None;
    let mut depth: usize = 0;
    let mut in_requires = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                apply_element(&mut info, &e, depth, in_requires, &path)?;
                if depth == 1 && e.name().as_ref() == b"requires" {
                    in_requires = true;
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                apply_element(&mut info, &e, depth, in_requires, &path)?;
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if depth == 1 && e.name().as_ref() == b"requires" {
                    in_requires = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PlugError::Malformed(format!(
                    "{}: XML parse error at position {}: {}",
                    path.display(),
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    info.ok_or_else(|| malformed(&path, "no <plugin> root element"))
}

/// Fold one element into the record under construction.
fn apply_element(
    info: &mut Option<PluginInfo>,
    e: &BytesStart<'_>,
    depth: usize,
    in_requires: bool,
    path: &Path,
) -> Result<()> {
    if depth == 0 {
        if e.name().as_ref() != b"plugin" {
            return Err(malformed(
                path,
                format_args!(
                    "expected <plugin> root element, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                ),
            ));
        }
        *info = Some(parse_plugin_element(e, path)?);
        return Ok(());
    }

    let Some(info) = info.as_mut() else {
        return Ok(());
    };

    if depth == 1 {
        match e.name().as_ref() {
            b"runtime" => {
                info.runtime_library = attr_value(e, "library");
                info.runtime_symbol = attr_value(e, "funcs");
            }
            b"extension-point" => {
                let id = attr_value(e, "id")
                    .ok_or_else(|| malformed(path, "extension point without an 'id'"))?;
                info.extension_points.push(ExtensionPoint {
                    id,
                    name: attr_value(e, "name"),
                    schema_path: attr_value(e, "schema"),
                });
            }
            b"extension" => {
                let point = attr_value(e, "point")
                    .ok_or_else(|| malformed(path, "extension without a 'point'"))?;
                info.extensions.push(Extension {
                    point,
                    id: attr_value(e, "id"),
                    name: attr_value(e, "name"),
                });
            }
            _ => {}
        }
    } else if depth == 2 && in_requires && e.name().as_ref() == b"import" {
        let plugin_id = attr_value(e, "plugin")
            .ok_or_else(|| malformed(path, "import without a 'plugin'"))?;
        info.imports.push(PluginImport {
            plugin_id,
            version: attr_value(e, "version").map(Version::new),
            optional: attr_value(e, "optional").as_deref() == Some("true"),
        });
    }

    Ok(())
}

/// Parse the root element's attributes into a fresh record.
fn parse_plugin_element(e: &BytesStart<'_>, path: &Path) -> Result<PluginInfo> {
    let identifier = attr_value(e, "id")
        .ok_or_else(|| malformed(path, "missing mandatory plug-in attribute 'id'"))?;
    validate_identifier(&identifier, path)?;

    let version = attr_value(e, "version").map(Version::new);
    let mut info = PluginInfo::new(identifier, version, path.to_path_buf());
    info.name = attr_value(e, "name");
    info.provider_name = attr_value(e, "provider-name");
    Ok(info)
}

/// Validate a plug-in identifier: dotted segments of alphanumerics,
/// hyphens, and underscores, each starting alphanumeric, 1-128 characters
/// in total.
fn validate_identifier(id: &str, path: &Path) -> Result<()> {
    let id_re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*(\.[A-Za-z0-9][A-Za-z0-9_-]*)*$").unwrap();
    if id.len() > 128 || !id_re.is_match(id) {
        return Err(malformed(
            path,
            format_args!("invalid plug-in identifier '{id}'"),
        ));
    }
    Ok(())
}

/// First value of the named attribute, if present.
fn attr_value(e: &BytesStart<'_>, key: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }
    None
}

fn malformed(path: &Path, msg: impl std::fmt::Display) -> PlugError {
    PlugError::Malformed(format!("{}: {}", path.display(), msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FULL_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plugin id="org.example.hello" version="1.0" name="Hello" provider-name="Example Org">
  <requires>
    <import plugin="org.example.core" version="0.2"/>
    <import plugin="org.example.extras" optional="true"/>
  </requires>
  <runtime library="libhello" funcs="hello_funcs"/>
  <extension-point id="greetings" name="Greetings" schema="greetings.xsd"/>
  <extension point="org.example.core.hooks" id="hook" name="Hello hook"/>
</plugin>
"#;

    /// Write a descriptor into a fresh plug-in directory and return its path.
    fn plugin_dir(tmp: &TempDir, dir_name: &str, xml: &str) -> PathBuf {
        let dir = tmp.path().join(dir_name);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(PLUGIN_DESCRIPTOR), xml).unwrap();
        dir
    }

    #[test]
    fn test_parse_full_descriptor() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "hello", FULL_DESCRIPTOR);

        let info = load_plugin_descriptor(&dir).unwrap();
        assert_eq!(info.identifier, "org.example.hello");
        assert_eq!(info.version, Some(Version::new("1.0")));
        assert_eq!(info.path, dir);
        assert_eq!(info.name.as_deref(), Some("Hello"));
        assert_eq!(info.provider_name.as_deref(), Some("Example Org"));
        assert_eq!(info.runtime_library.as_deref(), Some("libhello"));
        assert_eq!(info.runtime_symbol.as_deref(), Some("hello_funcs"));

        assert_eq!(info.imports.len(), 2);
        assert_eq!(info.imports[0].plugin_id, "org.example.core");
        assert_eq!(info.imports[0].version, Some(Version::new("0.2")));
        assert!(!info.imports[0].optional);
        assert!(info.imports[1].optional);
        assert!(info.imports[1].version.is_none());

        assert_eq!(info.extension_points.len(), 1);
        assert_eq!(info.extension_points[0].id, "greetings");
        assert_eq!(info.extension_points[0].schema_path.as_deref(), Some("greetings.xsd"));

        assert_eq!(info.extensions.len(), 1);
        assert_eq!(info.extensions[0].point, "org.example.core.hooks");
        assert_eq!(info.extensions[0].id.as_deref(), Some("hook"));
    }

    #[test]
    fn test_parse_minimal_descriptor() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "minimal", r#"<plugin id="p"/>"#);

        let info = load_plugin_descriptor(&dir).unwrap();
        assert_eq!(info.identifier, "p");
        assert!(info.version.is_none());
        assert!(info.name.is_none());
        assert!(info.imports.is_empty());
    }

    #[test]
    fn test_missing_descriptor_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("empty");
        fs::create_dir(&dir).unwrap();

        let result = load_plugin_descriptor(&dir);
        assert!(matches!(result, Err(PlugError::Io(_))));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "noid", r#"<plugin version="1.0"/>"#);

        let result = load_plugin_descriptor(&dir);
        assert!(matches!(result, Err(PlugError::Malformed(_))));
        assert!(result.unwrap_err().to_string().contains("'id'"));
    }

    #[test]
    fn test_invalid_identifier_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "badid", r#"<plugin id="has spaces"/>"#);

        let result = load_plugin_descriptor(&dir);
        assert!(matches!(result, Err(PlugError::Malformed(_))));
        assert!(result.unwrap_err().to_string().contains("has spaces"));
    }

    #[test]
    fn test_identifier_with_hyphens_and_underscores() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "ok", r#"<plugin id="org.c-pluff.example_1"/>"#);
        assert!(load_plugin_descriptor(&dir).is_ok());
    }

    #[test]
    fn test_broken_xml_is_malformed_with_path() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "broken", "<plugin id=\"p\"></wrong>");

        let result = load_plugin_descriptor(&dir);
        assert!(matches!(result, Err(PlugError::Malformed(_))));
        assert!(result.unwrap_err().to_string().contains("broken"));
    }

    #[test]
    fn test_wrong_root_element_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(&tmp, "wrongroot", r#"<manifest id="p"/>"#);

        let result = load_plugin_descriptor(&dir);
        assert!(matches!(result, Err(PlugError::Malformed(_))));
        assert!(result.unwrap_err().to_string().contains("manifest"));
    }

    #[test]
    fn test_extension_without_point_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(
            &tmp,
            "ext",
            r#"<plugin id="p"><extension id="x"/></plugin>"#,
        );
        assert!(matches!(
            load_plugin_descriptor(&dir),
            Err(PlugError::Malformed(_))
        ));
    }

    #[test]
    fn test_extension_point_without_id_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(
            &tmp,
            "ep",
            r#"<plugin id="p"><extension-point name="x"/></plugin>"#,
        );
        assert!(matches!(
            load_plugin_descriptor(&dir),
            Err(PlugError::Malformed(_))
        ));
    }

    #[test]
    fn test_import_outside_requires_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(
            &tmp,
            "stray",
            r#"<plugin id="p"><import plugin="q"/></plugin>"#,
        );

        let info = load_plugin_descriptor(&dir).unwrap();
        assert!(info.imports.is_empty());
    }

    #[test]
    fn test_extension_payload_content_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(
            &tmp,
            "payload",
            r#"<plugin id="p" version="1.0">
  <extension point="q.items">
    <plugin id="decoy" version="9.9"/>
    <extension-point id="decoy-point"/>
  </extension>
</plugin>"#,
        );

        let info = load_plugin_descriptor(&dir).unwrap();
        assert_eq!(info.identifier, "p");
        assert_eq!(info.version, Some(Version::new("1.0")));
        assert!(info.extension_points.is_empty());
        assert_eq!(info.extensions.len(), 1);
    }

    #[test]
    fn test_unknown_elements_and_attributes_ignored() {
        let tmp = TempDir::new().unwrap();
        let dir = plugin_dir(
            &tmp,
            "forward",
            r#"<plugin id="p" future-attr="x"><future-element a="b"/></plugin>"#,
        );
        assert!(load_plugin_descriptor(&dir).is_ok());
    }

    #[test]
    fn test_from_memory_uses_synthetic_path() {
        let info =
            load_plugin_descriptor_from_memory(br#"<plugin id="mem.plugin" version="2.1"/>"#)
                .unwrap();
        assert_eq!(info.identifier, "mem.plugin");
        assert_eq!(info.path, PathBuf::from("memory"));
    }

    #[test]
    fn test_from_memory_invalid_utf8_is_malformed() {
        let result = load_plugin_descriptor_from_memory(&[0x3c, 0xff, 0xfe]);
        assert!(matches!(result, Err(PlugError::Malformed(_))));
    }

    #[test]
    fn test_from_memory_malformed_xml() {
        let result = load_plugin_descriptor_from_memory(b"not xml at all");
        assert!(matches!(result, Err(PlugError::Malformed(_))));
    }
}
