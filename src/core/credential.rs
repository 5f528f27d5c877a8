use crate::config::AppConfig;
use crate::utils::error::{GcsPocError, Result};
use std::collections::BTreeMap;

/// 將 `secrets.gcs-credential` 序列化成 storage client 需要的 JSON bytes
pub fn assemble(config: &AppConfig) -> Result<Vec<u8>> {
    let credential = &config.secrets.gcs_credential;

    if credential.is_empty() {
        return Err(GcsPocError::CredentialSerializationError {
            message: "secrets.gcs-credential is empty".to_string(),
            source: None,
        });
    }

    if let Some(kind) = credential.get("type").and_then(|v| v.as_str()) {
        tracing::debug!(
            "Assembling {} credential for project {}",
            kind,
            credential
                .get("project_id")
                .and_then(|v| v.as_str())
                .unwrap_or("<unknown>")
        );
    }

    // 鍵排序後輸出，同一份憑證永遠得到相同的 bytes
    let sorted: BTreeMap<&String, &serde_json::Value> = credential.iter().collect();
    serde_json::to_vec(&sorted).map_err(|e| GcsPocError::CredentialSerializationError {
        message: e.to_string(),
        source: Some(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn config_with(credential: Value) -> AppConfig {
        let mut config = AppConfig::default();
        if let Value::Object(map) = credential {
            config.secrets.gcs_credential = map;
        }
        config
    }

    #[test]
    fn test_assemble_round_trips_the_credential() {
        let credential = json!({"type": "service_account", "project_id": "x"});
        let bytes = assemble(&config_with(credential.clone())).unwrap();

        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, credential);
    }

    #[test]
    fn test_assemble_is_canonical() {
        let first = config_with(json!({"project_id": "x", "type": "service_account"}));
        let second = config_with(json!({"type": "service_account", "project_id": "x"}));

        assert_eq!(assemble(&first).unwrap(), assemble(&second).unwrap());
    }

    #[test]
    fn test_assemble_rejects_empty_credential() {
        let mut config = AppConfig::default();
        config.secrets.gcs_credential = Map::new();

        let err = assemble(&config).unwrap_err();
        assert!(matches!(
            err,
            GcsPocError::CredentialSerializationError { source: None, .. }
        ));
        assert_eq!(err.exit_code(), 13);
    }
}
