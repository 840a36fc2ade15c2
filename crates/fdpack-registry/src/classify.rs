use fdpack_core::PackageRecord;

/// Outcome of reconciling a candidate `(name, version, guid)` against the
/// installed records. Conflict variants carry the records they collided
/// with so callers can show what is actually installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NoPriorInstall,
    /// Same base name is installed, but none of those records match the
    /// candidate version. Carries the full name-matched set.
    VersionMismatch(Vec<PackageRecord>),
    /// Same name and version, different lineage guid. A hard conflict, not
    /// an upgrade. Carries the version-matched set.
    GuidMismatch(Vec<PackageRecord>),
    /// The exact triple is already installed. Carries the matched set.
    AlreadyInstalled(Vec<PackageRecord>),
}

/// Exhaustive linear scan; never stops at the first name match, because
/// multiple versions of one base name may legally coexist at distinct
/// install paths.
pub fn classify(
    records: &[PackageRecord],
    name: &str,
    version: &str,
    guid: &str,
) -> Classification {
    let name_matched: Vec<PackageRecord> = records
        .iter()
        .filter(|record| record.name == name)
        .cloned()
        .collect();
    if name_matched.is_empty() {
        return Classification::NoPriorInstall;
    }

    let version_matched: Vec<PackageRecord> = name_matched
        .iter()
        .filter(|record| record.version == version)
        .cloned()
        .collect();
    if version_matched.is_empty() {
        return Classification::VersionMismatch(name_matched);
    }

    if version_matched.iter().any(|record| record.guid != guid) {
        return Classification::GuidMismatch(version_matched);
    }

    Classification::AlreadyInstalled(version_matched)
}
