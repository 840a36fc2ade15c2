use chrono::Local;
use serde::{Deserialize, Serialize};

/// Timestamp layout recorded against every install, e.g. `2026-08-23 14:05`.
pub const INSTALL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One row of the framework database.
///
/// `name` is not required to be unique: several versions of the same base
/// name may coexist as long as each occupies its own `install_path`.
/// Every field is single-valued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(rename = "PackageName")]
    pub name: String,
    #[serde(rename = "GuidValue")]
    pub guid: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "InstallPath")]
    pub install_path: String,
    #[serde(rename = "InstallDate")]
    pub install_date: String,
}

pub fn install_date_stamp() -> String {
    Local::now().format(INSTALL_DATE_FORMAT).to_string()
}
