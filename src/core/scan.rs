//! Purpose: Discover plugin classes and group their companion class files.
//! Exports: `PluginUnit`, `scan_units`, `PLUGIN_SUFFIX`.
//! Role: Turns an input directory into the transient units the packer consumes.
//! Invariants: Discovery is non-recursive and ignores non-`.class` files.
//! Invariants: Units and their files are name-sorted for stable output.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{Error, ErrorKind};

pub const PLUGIN_SUFFIX: &str = "Plugin.class";

const CLASS_SUFFIX: &str = ".class";

/// One plugin to package: the shared name prefix and every class file
/// belonging to it (the plugin class itself plus companions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginUnit {
    pub prefix: String,
    pub files: Vec<PathBuf>,
}

impl PluginUnit {
    /// Entry-point class name the host loads, e.g. `TestPlugin` for prefix `Test`.
    pub fn plugin_class(&self) -> String {
        format!("{}Plugin", self.prefix)
    }
}

/// Scans `input_dir` for `*Plugin.class` files and groups companions by
/// prefix. A missing or empty directory is reported the same way: there is
/// nothing to package.
pub fn scan_units(input_dir: &Path) -> Result<Vec<PluginUnit>, Error> {
    let class_names = list_class_names(input_dir)?;

    let mut plugin_names: Vec<&String> = class_names
        .iter()
        .filter(|name| name.ends_with(PLUGIN_SUFFIX))
        .collect();
    plugin_names.sort();

    if plugin_names.is_empty() {
        return Err(Error::new(ErrorKind::NotFound)
            .with_message("no plugin class files found")
            .with_path(input_dir)
            .with_hint("Compile the plugins first."));
    }

    let mut units = Vec::with_capacity(plugin_names.len());
    for plugin_name in plugin_names {
        let prefix = plugin_name
            .strip_suffix(PLUGIN_SUFFIX)
            .unwrap_or_default()
            .to_string();
        let mut companions: Vec<&String> = class_names
            .iter()
            .filter(|name| name.starts_with(prefix.as_str()))
            .collect();
        companions.sort();
        let files = companions
            .into_iter()
            .map(|name| input_dir.join(name))
            .collect::<Vec<_>>();
        debug!(prefix = %prefix, files = files.len(), "grouped plugin unit");
        units.push(PluginUnit { prefix, files });
    }
    Ok(units)
}

fn list_class_names(input_dir: &Path) -> Result<Vec<String>, Error> {
    let entries = match std::fs::read_dir(input_dir) {
        Ok(entries) => entries,
        // A missing input directory means nothing was compiled yet.
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            let kind = match err.kind() {
                std::io::ErrorKind::PermissionDenied => ErrorKind::Permission,
                _ => ErrorKind::Io,
            };
            return Err(Error::new(kind)
                .with_message("failed to read input directory")
                .with_path(input_dir)
                .with_source(err));
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input directory entry")
                .with_path(input_dir)
                .with_source(err)
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.ends_with(CLASS_SUFFIX) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
