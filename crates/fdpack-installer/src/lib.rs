use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use fdpack_core::{install_date_stamp, PackageManifest, PackageRecord};
use fdpack_registry::{Classification, PackageDatabase};
use thiserror::Error;

mod archive;

pub use archive::{payload_entry_count, read_manifest};


/// A workspace owning installed packages and the registry that tracks them.
/// The root is explicit per invocation; nothing here reads process-global
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_path(&self) -> PathBuf {
        fdpack_registry::registry_path(&self.root)
    }

    pub fn install_dir(&self, install_path: &str) -> PathBuf {
        self.root.join(install_path)
    }
}

pub fn workspace_root_from_env() -> Result<PathBuf> {
    let root = std::env::var("WORKSPACE")
        .context("WORKSPACE is not set; pass --workspace or export WORKSPACE")?;
    Ok(PathBuf::from(root))
}

/// Terminal failures of a single install attempt. Reconciliation variants
/// carry the conflicting records so callers can present what is actually
/// installed. The caller may retry from scratch; nothing here retries.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to read package manifest: {0:#}")]
    Parse(anyhow::Error),
    #[error("no package registry at {}; run 'fdpack init' or install the base package with --force", .0.display())]
    NoRegistry(PathBuf),
    #[error("install path must be a clean relative directory: '{0}'")]
    InvalidInstallPath(String),
    #[error("install path '{0}' is already used by an installed package")]
    PathAlreadyUsed(String),
    #[error("'{name}' is already installed at a different version")]
    VersionMismatch {
        name: String,
        records: Vec<PackageRecord>,
    },
    #[error("'{name}' {version} is installed under a different guid")]
    GuidMismatch {
        name: String,
        version: String,
        records: Vec<PackageRecord>,
    },
    #[error("'{name}' {version} is already installed")]
    AlreadyInstalled {
        name: String,
        version: String,
        records: Vec<PackageRecord>,
    },
    #[error("failed to extract package payload: {0:#}")]
    Extraction(anyhow::Error),
    #[error("registry failure: {0:#}")]
    Registry(anyhow::Error),
}

impl InstallError {
    /// Records carried by the reconciliation variants; empty for the rest.
    pub fn conflicting_records(&self) -> &[PackageRecord] {
        match self {
            Self::VersionMismatch { records, .. }
            | Self::GuidMismatch { records, .. }
            | Self::AlreadyInstalled { records, .. } => records,
            _ => &[],
        }
    }
}

#[derive(Debug)]
pub struct InstallReport {
    pub manifest: PackageManifest,
    pub install_path: String,
    pub installed_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallStatus {
    NotInstalled,
    Uninstalled,
    /// The record existed but its install directory was already gone; the
    /// stale record has been dropped.
    RepairedStaleState,
}

#[derive(Debug)]
pub struct UninstallReport {
    pub name: String,
    pub version: Option<String>,
    pub status: UninstallStatus,
}

/// Run one install attempt to a terminal state.
///
/// The sequence is manifest read, registry checks and reconciliation,
/// payload extraction, then a single registry upsert + persist. Each step
/// short-circuits into a typed failure; an extraction failure does not roll
/// back files already written.
///
/// With `force` the reconciliation gate is bypassed: no registry-exists
/// check (an empty registry is created when missing), no classification.
/// The destination-path check still applies against records of a different
/// name, so force cannot co-locate two packages; a prior record of the
/// same name is overwritten in place.
pub fn install_package(
    workspace: &WorkspaceLayout,
    archive_path: &Path,
    install_path: &str,
    force: bool,
    on_entry: &mut dyn FnMut(&Path),
) -> Result<InstallReport, InstallError> {
    validate_install_path(install_path)?;

    let manifest = archive::read_manifest(archive_path).map_err(InstallError::Parse)?;

    let registry_file = workspace.registry_path();
    let mut database = if registry_file.exists() {
        PackageDatabase::open(&registry_file).map_err(InstallError::Registry)?
    } else if force {
        PackageDatabase::create_empty(&registry_file).map_err(InstallError::Registry)?
    } else {
        return Err(InstallError::NoRegistry(registry_file));
    };

    if force {
        let path_owned_by_other = database
            .list()
            .iter()
            .any(|record| record.install_path == install_path && record.name != manifest.name);
        if path_owned_by_other {
            return Err(InstallError::PathAlreadyUsed(install_path.to_string()));
        }
    } else {
        if database.is_path_used(install_path) {
            return Err(InstallError::PathAlreadyUsed(install_path.to_string()));
        }
        match database.classify(&manifest.name, &manifest.version, &manifest.guid) {
            Classification::NoPriorInstall => {}
            Classification::VersionMismatch(records) => {
                return Err(InstallError::VersionMismatch {
                    name: manifest.name,
                    records,
                });
            }
            Classification::GuidMismatch(records) => {
                return Err(InstallError::GuidMismatch {
                    name: manifest.name,
                    version: manifest.version,
                    records,
                });
            }
            Classification::AlreadyInstalled(records) => {
                return Err(InstallError::AlreadyInstalled {
                    name: manifest.name,
                    version: manifest.version,
                    records,
                });
            }
        }
    }

    let dest = workspace.install_dir(install_path);
    let installed_files =
        archive::extract_payload(archive_path, &dest, on_entry).map_err(InstallError::Extraction)?;

    database.upsert(PackageRecord {
        name: manifest.name.clone(),
        guid: manifest.guid.clone(),
        version: manifest.version.clone(),
        install_path: install_path.to_string(),
        install_date: install_date_stamp(),
    });
    database.persist().map_err(InstallError::Registry)?;

    Ok(InstallReport {
        manifest,
        install_path: install_path.to_string(),
        installed_files,
    })
}

/// Drop the named record from the registry and delete its install
/// directory. The removal is persisted before the directory is deleted, so
/// a failed persist leaves the files intact rather than a live record
/// pointing at a deleted tree. A missing directory is repaired, not an
/// error; a missing record (or registry) reports `NotInstalled`.
pub fn uninstall_package(workspace: &WorkspaceLayout, name: &str) -> Result<UninstallReport> {
    let registry_file = workspace.registry_path();
    if !registry_file.exists() {
        return Ok(UninstallReport {
            name: name.to_string(),
            version: None,
            status: UninstallStatus::NotInstalled,
        });
    }

    let mut database = PackageDatabase::open(&registry_file)?;
    let Some(removed) = database.remove(name) else {
        return Ok(UninstallReport {
            name: name.to_string(),
            version: None,
            status: UninstallStatus::NotInstalled,
        });
    };

    validate_install_path(&removed.install_path).map_err(|err| {
        anyhow::anyhow!("registry record for '{name}' has a bad install path: {err}")
    })?;
    let install_dir = workspace.install_dir(&removed.install_path);
    let dir_existed = install_dir.exists();

    database.persist()?;

    if dir_existed {
        fs::remove_dir_all(&install_dir)
            .with_context(|| format!("failed to remove {}", install_dir.display()))?;
    }

    Ok(UninstallReport {
        name: removed.name,
        version: Some(removed.version),
        status: if dir_existed {
            UninstallStatus::Uninstalled
        } else {
            UninstallStatus::RepairedStaleState
        },
    })
}

fn validate_install_path(install_path: &str) -> Result<(), InstallError> {
    let path = Path::new(install_path);
    if install_path.trim().is_empty() || path.is_absolute() {
        return Err(InstallError::InvalidInstallPath(install_path.to_string()));
    }
    if path
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return Err(InstallError::InvalidInstallPath(install_path.to_string()));
    }
    Ok(())
}
