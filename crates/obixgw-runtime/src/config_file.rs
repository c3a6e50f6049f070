//! Loading of the mapping config file.

use std::path::Path;

use anyhow::Context;
use obixgw_core::MappingConfig;

/// Read and validate the mapping config at `path`.
///
/// Any failure here is fatal: the daemon never starts polling with a
/// partially valid mapping set.
pub fn load_config(path: &Path) -> anyhow::Result<MappingConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read mapping config {}", path.display()))?;
    let config = MappingConfig::from_json_str(&text)
        .with_context(|| format!("invalid mapping config {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        points = config.len(),
        poll_interval_secs = config.poll_interval_seconds(),
        "mapping config loaded"
    );
    if config.is_empty() {
        tracing::warn!("mapping config defines no points; nothing will be polled");
    }
    for mapping in &config {
        tracing::debug!(
            remote_id = %mapping.remote_id,
            variable = %mapping.variable_name,
            variable_type = %mapping.variable_type,
            significant_change = mapping.significant_change,
            ttl_seconds = mapping.ttl_seconds,
            "point mapped"
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(body.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_valid_file() {
        let file = write_config(
            r#"{
                "poll_interval_seconds": "2m",
                "gateway_connection": {"host": "10.0.0.5", "node_id": "N1", "device_id": "D2"},
                "mappings": [
                    {"remote_id": "AV101", "variable_name": "temp_office",
                     "variable_type": "numeric", "significant_change": 0.5, "ttl_seconds": 600}
                ]
            }"#,
        );
        let config = load_config(file.path()).expect("loads");
        assert_eq!(config.poll_interval_seconds(), 120);
        assert_eq!(config.len(), 1);
        assert!(config.find("AV101").is_some());
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.cfg");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("absent.cfg"));
    }

    #[test]
    fn invalid_mapping_is_fatal() {
        let file = write_config(
            r#"{"mappings": [
                {"remote_id": "AV1", "variable_name": "t", "variable_type": "numeric"},
                {"remote_id": "AV2", "variable_name": "t", "variable_type": "numeric"}
            ]}"#,
        );
        let err = load_config(file.path()).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("invalid mapping config"), "{chain}");
        assert!(chain.contains("t"), "{chain}");
    }

    #[test]
    fn malformed_json_is_fatal() {
        let file = write_config("{ not json");
        assert!(load_config(file.path()).is_err());
    }
}
