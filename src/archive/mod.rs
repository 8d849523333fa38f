//! Archive packing and extraction
//!
//! A project archive is a plain deflate zip of the operation working
//! directory. Entry order is deterministic (sorted relative paths) and entry
//! names are sanitized on extraction so a crafted archive can never write
//! outside the target directory.

use std::fs;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::{PortabilityError, PortabilityResult};

fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(value) => value.to_string_lossy().starts_with('.'),
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => true,
        Component::CurDir => false,
    })
}

fn sanitize_relative_path(path: &str) -> PortabilityResult<PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(PortabilityError::Storage(format!(
            "invalid path component in archive entry: {}",
            path
        )));
    }
    Ok(candidate.components().collect())
}

/// Pack a directory tree into a single in-memory zip
pub fn pack_directory(source_dir: &Path) -> PortabilityResult<Vec<u8>> {
    if !source_dir.exists() {
        return Err(PortabilityError::Storage(format!(
            "pack source directory {:?} does not exist",
            source_dir
        )));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    collect_files(source_dir, source_dir, &mut files)?;
    files.sort();

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for rel in files {
            let full_path = source_dir.join(&rel);
            let mut file = fs::File::open(&full_path)?;
            let rel_string = rel.to_string_lossy().replace('\\', "/");
            writer.start_file(rel_string, options)?;
            std::io::copy(&mut file, &mut writer)?;
        }

        writer.finish()?;
    }
    Ok(cursor.into_inner())
}

/// Extract an archive into `target_dir`, skipping hidden entries and
/// rejecting absolute or parent-relative entry names
pub fn unpack(bytes: &[u8], target_dir: &Path) -> PortabilityResult<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PortabilityError::Storage(format!("failed to read archive: {}", e)))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let rel_path = sanitize_relative_path(entry.name())?;
        if has_hidden_component(&rel_path) {
            continue;
        }

        let out_path = target_dir.join(&rel_path);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut outfile)?;
    }

    Ok(())
}

fn collect_files(dir: &Path, root: &Path, acc: &mut Vec<PathBuf>) -> PortabilityResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .map_err(|e| PortabilityError::Storage(format!("failed to relativize {:?}: {}", path, e)))?;
        if has_hidden_component(rel) {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, root, acc)?;
        } else {
            acc.push(rel.to_path_buf());
        }
    }
    Ok(())
}
