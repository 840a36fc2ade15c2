use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

/// Descriptor entry every distribution package must carry somewhere in its
/// entry tree. Matched by file name, not by position.
pub const MANIFEST_FILE_NAME: &str = "FDPManifest.xml";

/// Identity of a candidate package, read from the embedded descriptor.
///
/// Versions are opaque tokens compared by exact string equality; two
/// packages belong to the same lineage only when their guids match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub guid: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename = "FdpManifest")]
struct ManifestDocument {
    #[serde(rename = "Header")]
    header: ManifestHeader,
}

#[derive(Debug, Deserialize, Serialize)]
struct ManifestHeader {
    #[serde(rename = "PackageName")]
    package_name: String,
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "GuidValue")]
    guid_value: String,
}

impl PackageManifest {
    pub fn from_xml_str(input: &str) -> anyhow::Result<Self> {
        let document: ManifestDocument =
            quick_xml::de::from_str(input).context("failed to parse package manifest")?;

        let header = document.header;
        let manifest = Self {
            name: header.package_name.trim().to_string(),
            version: header.version.trim().to_string(),
            guid: header.guid_value.trim().to_string(),
        };

        if manifest.name.is_empty() {
            return Err(anyhow!("manifest header has an empty PackageName"));
        }
        if manifest.version.is_empty() {
            return Err(anyhow!("manifest header has an empty Version"));
        }
        if manifest.guid.is_empty() {
            return Err(anyhow!("manifest header has an empty GuidValue"));
        }

        Ok(manifest)
    }

    pub fn to_xml_string(&self) -> anyhow::Result<String> {
        let document = ManifestDocument {
            header: ManifestHeader {
                package_name: self.name.clone(),
                version: self.version.clone(),
                guid_value: self.guid.clone(),
            },
        };

        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        document
            .serialize(serializer)
            .context("failed to serialize package manifest")?;
        Ok(body)
    }
}
