use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fdpack_core::PackageRecord;
use serde::{Deserialize, Serialize};

mod classify;

pub use classify::{classify, Classification};


/// Location of the framework database relative to the workspace root.
pub const REGISTRY_RELATIVE_PATH: &str = "Tools/Conf/FrameworkDatabase.db";

pub fn registry_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(REGISTRY_RELATIVE_PATH)
}

/// The installed-package database.
///
/// Mutations (`upsert`, `remove`, `clear`) touch in-memory state only;
/// `persist` is the single operation that writes to disk. The split lets
/// callers batch several logical edits into one write.
#[derive(Debug, Clone)]
pub struct PackageDatabase {
    path: PathBuf,
    records: Vec<PackageRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "FrameworkDatabase")]
struct DatabaseFile {
    #[serde(rename = "PackageList", default)]
    package_list: PackageList,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PackageList {
    #[serde(rename = "PackageRecord", default)]
    records: Vec<PackageRecord>,
}

impl PackageDatabase {
    /// Load an existing database file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed reading registry: {}", path.display()))?;
        let file: DatabaseFile = quick_xml::de::from_str(&content)
            .with_context(|| format!("failed parsing registry: {}", path.display()))?;

        Ok(Self {
            path,
            records: file.package_list.records,
        })
    }

    /// Create an empty database and write it out immediately, so a
    /// freshly-initialized workspace has a registry file on disk.
    pub fn create_empty(path: impl Into<PathBuf>) -> Result<Self> {
        let database = Self {
            path: path.into(),
            records: Vec::new(),
        };
        database.persist()?;
        Ok(database)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Snapshot in insertion order. The order carries no meaning beyond
    /// being stable for display.
    pub fn list(&self) -> &[PackageRecord] {
        &self.records
    }

    /// True when any record already occupies `install_path`. Two packages
    /// must never share a destination directory.
    pub fn is_path_used(&self, install_path: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.install_path == install_path)
    }

    pub fn classify(&self, name: &str, version: &str, guid: &str) -> Classification {
        classify(&self.records, name, version, guid)
    }

    /// Overwrite the first record with a matching `name` in place, else
    /// append. Reinstalling a name therefore never duplicates its row.
    pub fn upsert(&mut self, record: PackageRecord) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.name == record.name)
        {
            Some(existing) => {
                existing.version = record.version;
                existing.guid = record.guid;
                existing.install_path = record.install_path;
                existing.install_date = record.install_date;
            }
            None => self.records.push(record),
        }
    }

    /// Drop the record with a matching `name`. Returns the removed record,
    /// or `None` when nothing matched.
    pub fn remove(&mut self, name: &str) -> Option<PackageRecord> {
        let index = self
            .records
            .iter()
            .position(|record| record.name == name)?;
        Some(self.records.remove(index))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Write the full record set back to disk with stable 2-space
    /// indentation, via a temp file renamed over the target so a crash
    /// cannot leave a truncated registry behind.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating registry dir: {}", parent.display()))?;
        }

        let file = DatabaseFile {
            package_list: PackageList {
                records: self.records.clone(),
            },
        };
        let content = render_database_file(&file)
            .with_context(|| format!("failed serializing registry: {}", self.path.display()))?;

        let tmp_path = self.path.with_extension("db.tmp");
        fs::write(&tmp_path, content.as_bytes())
            .with_context(|| format!("failed writing registry: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!("failed replacing registry: {}", self.path.display())
        })
    }
}

fn render_database_file(file: &DatabaseFile) -> Result<String> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    file.serialize(serializer)?;

    let mut content = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    content.push_str(&body);
    content.push('\n');
    Ok(content)
}
