//! Purpose: Write one plugin jar from a manifest and a set of class files.
//! Exports: `write_plugin_jar`.
//! Role: The archive capability; replaces shelling out to an external jar tool.
//! Invariants: `META-INF/` and the manifest are written before any class entry.
//! Invariants: Entries are stored under their flat base names, never full paths.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::core::error::{Error, ErrorKind};
use crate::core::manifest::{MANIFEST_PATH, Manifest};

/// Creates the jar at `archive_path` containing `manifest` and the given
/// class files, and returns the class entry names in written order.
pub fn write_plugin_jar(
    archive_path: &Path,
    manifest: &Manifest,
    files: &[PathBuf],
) -> Result<Vec<String>, Error> {
    let file = File::create(archive_path).map_err(|err| {
        Error::new(create_error_kind(&err))
            .with_message("failed to create archive file")
            .with_path(archive_path)
            .with_source(err)
    })?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer
        .add_directory("META-INF/", options)
        .map_err(|err| archive_error(archive_path, err))?;
    writer
        .start_file(MANIFEST_PATH, options)
        .map_err(|err| archive_error(archive_path, err))?;
    writer.write_all(&manifest.to_bytes()).map_err(|err| {
        Error::new(ErrorKind::Archive)
            .with_message("failed to write manifest entry")
            .with_path(archive_path)
            .with_source(err)
    })?;

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return Err(Error::new(ErrorKind::Internal)
                .with_message("class file has no usable base name")
                .with_path(path));
        };
        writer
            .start_file(name, options)
            .map_err(|err| archive_error(archive_path, err))?;
        let mut source = File::open(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read class file")
                .with_path(path)
                .with_source(err)
        })?;
        io::copy(&mut source, &mut writer).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to copy class file into archive")
                .with_path(path)
                .with_source(err)
        })?;
        entries.push(name.to_string());
    }

    writer
        .finish()
        .map_err(|err| archive_error(archive_path, err))?;
    Ok(entries)
}

fn archive_error(archive_path: &Path, err: zip::result::ZipError) -> Error {
    Error::new(ErrorKind::Archive)
        .with_message("failed to write archive")
        .with_path(archive_path)
        .with_source(err)
}

fn create_error_kind(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Archive,
    }
}
