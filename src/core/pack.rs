//! Purpose: Orchestrate a full packaging run over an input directory.
//! Exports: `PackConfig`, `PackEvent`, `PackReport`, `UnitReport`, `pack_plugins`.
//! Role: Packaging engine used by the CLI; isolates run policy from output emission.
//! Invariants: Units are processed sequentially, one fully written before the next.
//! Invariants: A unit failure never aborts the run; it is recorded and skipped.
//! Invariants: A failed unit leaves no partial archive behind (best effort).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::archive::write_plugin_jar;
use crate::core::error::{Error, ErrorKind};
use crate::core::manifest::Manifest;
use crate::core::scan::{PluginUnit, scan_units};

pub const DEFAULT_INPUT_DIR: &str = "bin-plugin";
pub const DEFAULT_OUTPUT_DIR: &str = "dist/plugins";

const JAR_EXTENSION: &str = "jar";

#[derive(Debug, Clone)]
pub struct PackConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Run progress, surfaced before and after each unit is attempted.
#[derive(Debug)]
pub enum PackEvent<'a> {
    ArchiveStarted { path: &'a Path },
    UnitFailed { path: &'a Path, error: &'a Error },
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub plugin: String,
    pub plugin_class: String,
    pub archive: String,
    pub entries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<UnitFailure>,
}

impl UnitReport {
    pub fn packed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackReport {
    pub units: Vec<UnitReport>,
    pub packed: usize,
    pub failed: usize,
}

/// Packages every discovered plugin unit into its own jar.
///
/// Fatal conditions (unusable output directory, unreadable input directory,
/// no plugin classes at all) return an error; per-unit archiving failures
/// are reported through the returned `PackReport` and `on_progress`.
pub fn pack_plugins(
    config: &PackConfig,
    mut on_progress: impl FnMut(PackEvent<'_>),
) -> Result<PackReport, Error> {
    fs::create_dir_all(&config.output_dir).map_err(|err| {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::Permission,
            _ => ErrorKind::Io,
        };
        Error::new(kind)
            .with_message("failed to create output directory")
            .with_path(&config.output_dir)
            .with_source(err)
    })?;

    let units = scan_units(&config.input_dir)?;

    let mut reports = Vec::with_capacity(units.len());
    for unit in &units {
        let archive_path = config
            .output_dir
            .join(format!("{}.{JAR_EXTENSION}", unit.prefix));
        on_progress(PackEvent::ArchiveStarted {
            path: &archive_path,
        });
        let outcome = pack_unit(unit, &archive_path);
        let mut report = UnitReport {
            plugin: unit.prefix.clone(),
            plugin_class: unit.plugin_class(),
            archive: archive_path.display().to_string(),
            entries: Vec::new(),
            failure: None,
        };
        match outcome {
            Ok(entries) => {
                debug!(plugin = %unit.prefix, entries = entries.len(), "packed plugin jar");
                report.entries = entries;
            }
            Err(error) => {
                on_progress(PackEvent::UnitFailed {
                    path: &archive_path,
                    error: &error,
                });
                remove_partial_archive(&archive_path);
                report.failure = Some(UnitFailure {
                    kind: format!("{:?}", error.kind()),
                    message: error.to_string(),
                });
            }
        }
        reports.push(report);
    }

    let packed = reports.iter().filter(|report| report.packed()).count();
    let failed = reports.len() - packed;
    Ok(PackReport {
        units: reports,
        packed,
        failed,
    })
}

fn pack_unit(unit: &PluginUnit, archive_path: &Path) -> Result<Vec<String>, Error> {
    if unit.prefix.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("cannot derive a plugin name from a bare Plugin.class")
            .with_hint("Rename the class so it ends with a non-empty prefix, e.g. TestPlugin."));
    }
    let manifest = Manifest::for_plugin_class(&unit.plugin_class());
    write_plugin_jar(archive_path, &manifest, &unit.files)
}

fn remove_partial_archive(archive_path: &Path) {
    if !archive_path.exists() {
        return;
    }
    if let Err(err) = fs::remove_file(archive_path) {
        warn!(
            path = %archive_path.display(),
            error = %err,
            "failed to remove partial archive"
        );
    }
}
