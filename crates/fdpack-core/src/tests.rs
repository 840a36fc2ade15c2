use chrono::NaiveDateTime;

use super::*;

#[test]
fn parse_manifest() {
    let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<FdpManifest>
  <Header>
    <PackageName>EdkNt32Pkg</PackageName>
    <Version>0.3</Version>
    <GuidValue>0fbbbbe0-8e59-44f8-979b-12c290cbb3cd</GuidValue>
  </Header>
</FdpManifest>
"#;

    let parsed = PackageManifest::from_xml_str(content).expect("manifest should parse");
    assert_eq!(parsed.name, "EdkNt32Pkg");
    assert_eq!(parsed.version, "0.3");
    assert_eq!(parsed.guid, "0fbbbbe0-8e59-44f8-979b-12c290cbb3cd");
}

#[test]
fn parse_manifest_trims_surrounding_whitespace() {
    let content = r#"<FdpManifest>
  <Header>
    <PackageName>  Base  </PackageName>
    <Version> 1.0 </Version>
    <GuidValue> GUID-1 </GuidValue>
  </Header>
</FdpManifest>"#;

    let parsed = PackageManifest::from_xml_str(content).expect("manifest should parse");
    assert_eq!(parsed.name, "Base");
    assert_eq!(parsed.version, "1.0");
    assert_eq!(parsed.guid, "GUID-1");
}

#[test]
fn parse_manifest_rejects_malformed_xml() {
    let err = PackageManifest::from_xml_str("<FdpManifest><Header>")
        .expect_err("must reject malformed document");
    assert!(err.to_string().contains("failed to parse package manifest"));
}

#[test]
fn parse_manifest_rejects_missing_header_field() {
    let content = r#"<FdpManifest>
  <Header>
    <PackageName>Base</PackageName>
    <Version>1.0</Version>
  </Header>
</FdpManifest>"#;

    let err =
        PackageManifest::from_xml_str(content).expect_err("must reject header without guid");
    assert!(err.to_string().contains("failed to parse package manifest"));
}

#[test]
fn parse_manifest_rejects_blank_name() {
    let content = r#"<FdpManifest>
  <Header>
    <PackageName>   </PackageName>
    <Version>1.0</Version>
    <GuidValue>GUID-1</GuidValue>
  </Header>
</FdpManifest>"#;

    let err = PackageManifest::from_xml_str(content).expect_err("must reject blank name");
    assert!(err.to_string().contains("empty PackageName"));
}

#[test]
fn manifest_xml_output_parses_back() {
    let manifest = PackageManifest {
        name: "Base".to_string(),
        version: "1.0".to_string(),
        guid: "GUID-1".to_string(),
    };

    let rendered = manifest.to_xml_string().expect("must serialize");
    assert!(rendered.contains("<PackageName>Base</PackageName>"));

    let parsed = PackageManifest::from_xml_str(&rendered).expect("must parse own output");
    assert_eq!(parsed, manifest);
}

#[test]
fn install_date_stamp_matches_format() {
    let stamp = install_date_stamp();
    NaiveDateTime::parse_from_str(&stamp, INSTALL_DATE_FORMAT)
        .expect("stamp must round-trip through the install date format");
}
