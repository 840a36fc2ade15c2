use std::fs;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use fdpack_core::{PackageManifest, MANIFEST_FILE_NAME};
use flate2::read::GzDecoder;
use tar::Archive;

fn open_archive(path: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open package archive: {}", path.display()))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn is_manifest_entry(entry_path: &Path) -> bool {
    entry_path.file_name().and_then(|name| name.to_str()) == Some(MANIFEST_FILE_NAME)
}

/// Entry paths come from an untrusted archive; only clean relative paths
/// may be joined under the destination.
fn validated_entry_path(entry_path: &Path) -> Result<PathBuf> {
    if entry_path.as_os_str().is_empty() {
        return Err(anyhow!("archive entry has an empty path"));
    }

    let mut clean = PathBuf::new();
    for component in entry_path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(anyhow!(
                    "archive entry escapes the destination: {}",
                    entry_path.display()
                ));
            }
        }
    }
    Ok(clean)
}

/// Locate the embedded descriptor by file name anywhere in the entry tree
/// and parse it. No side effects on the filesystem.
pub fn read_manifest(archive_path: &Path) -> Result<PackageManifest> {
    let mut archive = open_archive(archive_path)?;
    for entry in archive
        .entries()
        .with_context(|| format!("failed to read archive entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("failed to read archive entry: {}", archive_path.display()))?;
        let entry_path = entry
            .path()
            .context("failed to read archive entry path")?
            .into_owned();
        if !is_manifest_entry(&entry_path) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .with_context(|| format!("failed to read {MANIFEST_FILE_NAME}"))?;
        return PackageManifest::from_xml_str(&content);
    }

    Err(anyhow!(
        "no {MANIFEST_FILE_NAME} descriptor found in {}",
        archive_path.display()
    ))
}

/// Number of payload files in the archive (descriptor and directory entries
/// excluded). Used to size extraction progress.
pub fn payload_entry_count(archive_path: &Path) -> Result<u64> {
    let mut archive = open_archive(archive_path)?;
    let mut count = 0;
    for entry in archive
        .entries()
        .with_context(|| format!("failed to read archive entries: {}", archive_path.display()))?
    {
        let entry = entry
            .with_context(|| format!("failed to read archive entry: {}", archive_path.display()))?;
        let entry_path = entry
            .path()
            .context("failed to read archive entry path")?
            .into_owned();
        if is_manifest_entry(&entry_path) || entry.header().entry_type().is_dir() {
            continue;
        }
        count += 1;
    }
    Ok(count)
}

/// Unpack every payload entry under `dest`, preserving relative paths and
/// creating intermediate directories. Link entries are rejected outright: a
/// symlink materialized under `dest` would let a later entry write through
/// it to an arbitrary location. `on_entry` fires once per extracted file.
/// Partially written files are left in place on failure.
pub fn extract_payload(
    archive_path: &Path,
    dest: &Path,
    on_entry: &mut dyn FnMut(&Path),
) -> Result<Vec<PathBuf>> {
    let mut archive = open_archive(archive_path)?;
    let mut extracted = Vec::new();

    for entry in archive
        .entries()
        .with_context(|| format!("failed to read archive entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("failed to read archive entry: {}", archive_path.display()))?;
        let entry_path = entry
            .path()
            .context("failed to read archive entry path")?
            .into_owned();
        if is_manifest_entry(&entry_path) {
            continue;
        }

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            return Err(anyhow!(
                "refusing to extract link entry: {}",
                entry_path.display()
            ));
        }

        let relative = validated_entry_path(&entry_path)?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        entry
            .unpack(&target)
            .with_context(|| format!("failed to unpack {}", target.display()))?;

        on_entry(&relative);
        extracted.push(relative);
    }

    Ok(extracted)
}
