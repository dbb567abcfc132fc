use std::fs;

use assert_matches::assert_matches;
use tempfile::tempdir;

use kira_geneset_resolver::config::{Config, ConfigLoader, DEFAULT_BASE_URL, ProviderSettings};
use kira_geneset_resolver::error::KiraError;
use kira_geneset_resolver::identifier::Scopes;
use kira_geneset_resolver::species::Species;

#[test]
fn config_file_is_loaded_and_normalized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kira-gsr.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "provider": {"batch_size": 200},
            "species": ["human", 10090],
            "scopes": ["uniprot", "entrezgene"],
            "fields": ["homologene"]
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(resolved.provider.batch_size, 200);
    assert_eq!(resolved.provider.timeout_secs, 30);
    assert_eq!(
        resolved.species,
        Species::Multiple(vec!["9606".to_string(), "10090".to_string()])
    );
    assert_eq!(
        resolved.scopes,
        Some(Scopes::fallback(["uniprot", "entrezgene"]))
    );
    let fields = resolved.field_set();
    assert!(fields.contains("homologene"));
    assert!(fields.contains("symbol"));
}

#[test]
fn single_scope_string_is_accepted() {
    let config: Config =
        serde_json::from_str(r#"{"species": 9606, "scopes": "entrezgene,retired"}"#).unwrap();
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.species, Species::from_taxid(9606));
    assert_eq!(resolved.scopes, Some(Scopes::single("entrezgene,retired")));
}

#[test]
fn provider_defaults_apply() {
    let settings = ProviderSettings::default();
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    assert_eq!(settings.timeout_secs, 30);
    assert_eq!(settings.batch_size, 1000);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, KiraError::ConfigRead(_));
}

#[test]
fn unsupported_species_value_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kira-gsr.json");
    fs::write(&path, r#"{"species": {"taxid": 9606}}"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, KiraError::ConfigParse(_));
}

#[test]
fn all_mixed_with_taxids_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kira-gsr.json");
    fs::write(&path, r#"{"species": ["all", "9606"]}"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, KiraError::ConfigParse(_));
}

#[test]
fn zero_batch_size_is_rejected() {
    let config: Config = serde_json::from_str(r#"{"provider": {"batch_size": 0}}"#).unwrap();
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, KiraError::ConfigParse(_));
}
