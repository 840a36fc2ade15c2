mod manifest;
mod record;

pub use manifest::{PackageManifest, MANIFEST_FILE_NAME};
pub use record::{install_date_stamp, PackageRecord, INSTALL_DATE_FORMAT};

#[cfg(test)]
mod tests;
