#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{GcsPocError, Result};
use config::{Config, File, FileFormat};
use serde::de::{Error as DeError, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const CONFIG_PATH_VAR: &str = "API_CONFIG_PATH";
pub const CONFIG_NAME_VAR: &str = "API_CONFIG_NAME";
pub const OVERRIDE_DOCUMENT_VAR: &str = "configs";
pub const SECRET_MARKER: &str = "SECRET_";

const SECRETS_PREFIX: &str = "secrets.";
const DEFAULT_CONFIG_PATH: &str = "./config";
const DEFAULT_CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    #[serde(default)]
    pub env: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(
        rename = "gcs-credential",
        default,
        deserialize_with = "credential_document"
    )]
    pub gcs_credential: Map<String, Value>,
    #[serde(default)]
    pub datamock: String,
    /// 其他由 SECRET_* 變數注入的鍵
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `SECRET_GCS_CREDENTIAL` 只能帶字串，所以同時接受 JSON 物件與編碼後的 JSON 字串
fn credential_document<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Object(Map<String, Value>),
        Encoded(String),
    }

    match Document::deserialize(deserializer)? {
        Document::Object(map) => Ok(map),
        Document::Encoded(raw) if raw.trim().is_empty() => Ok(Map::new()),
        Document::Encoded(raw) => serde_json::from_str(&raw)
            .map_err(|e| D::Error::custom(format!("gcs-credential is not a JSON object: {}", e))),
    }
}

/// Snapshot of the process environment, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: Vec<(String, String)>,
}

impl EnvSnapshot {
    /// Non-UTF-8 variables are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Base config file location: `<dir>/<name>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub dir: PathBuf,
    pub name: String,
}

impl ConfigLocation {
    /// 空值或缺少時改用預設值
    pub fn from_hints(path_hint: Option<&str>, name_hint: Option<&str>) -> Self {
        let dir = match path_hint.filter(|p| !p.is_empty()) {
            Some(path) => path.to_string(),
            None => {
                tracing::warn!(
                    "{} not found, using default config path {}",
                    CONFIG_PATH_VAR,
                    DEFAULT_CONFIG_PATH
                );
                DEFAULT_CONFIG_PATH.to_string()
            }
        };

        let name = match name_hint.filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!(
                    "{} not found, using default config name {}",
                    CONFIG_NAME_VAR,
                    DEFAULT_CONFIG_NAME
                );
                DEFAULT_CONFIG_NAME.to_string()
            }
        };

        Self {
            dir: PathBuf::from(dir),
            name,
        }
    }

    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self::from_hints(env.get(CONFIG_PATH_VAR), env.get(CONFIG_NAME_VAR))
    }

    /// Path without extension; the extension decides the file format.
    pub fn stem(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretOverride {
    pub key: String,
    pub value: String,
}

/// 將 `SECRET_*` 環境變數轉換成 `secrets.*` 鍵
///
/// `SECRET_GCS_CREDENTIAL` becomes `secrets.gcs-credential`. Values that are
/// not valid JSON get literal `\n` sequences turned into newlines so PEM keys
/// survive single-line variables.
pub fn secret_override(name: &str, raw_value: &str) -> Option<SecretOverride> {
    if !name.contains(SECRET_MARKER) {
        return None;
    }

    let key = name
        .replace(SECRET_MARKER, SECRETS_PREFIX)
        .replace('_', "-")
        .trim()
        .to_lowercase();

    let mut value = raw_value.trim().to_string();
    if serde_json::from_str::<IgnoredAny>(&value).is_err() {
        value = value.replace("\\n", "\n");
    }

    Some(SecretOverride { key, value })
}

/// Dotted key made only of non-empty `[A-Za-z0-9_-]` segments.
fn is_addressable_key(key: &str) -> bool {
    key.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

/// The override document wins over the base file, `SECRET_*` variables win
/// over both.
pub fn resolve(env: &EnvSnapshot) -> Result<AppConfig> {
    resolve_at(&ConfigLocation::from_env(env), env)
}

pub fn resolve_at(location: &ConfigLocation, env: &EnvSnapshot) -> Result<AppConfig> {
    let stem = location.stem();
    tracing::debug!("Loading base configuration from {}", stem.display());

    let mut builder = Config::builder().add_source(File::from(stem.as_path()).required(true));

    if let Some((origin, document)) = override_document(env) {
        // 先單獨解析，才能和基礎檔案的錯誤區分
        Config::builder()
            .add_source(File::from_str(document, FileFormat::Yaml))
            .build()
            .map_err(|source| GcsPocError::ConfigParseError {
                origin: origin.to_string(),
                source,
            })?;

        tracing::debug!("Merging override document from `{}`", origin);
        builder = builder.add_source(File::from_str(document, FileFormat::Yaml));
    }

    for (name, raw_value) in env.iter() {
        let Some(secret) = secret_override(name, raw_value) else {
            continue;
        };

        // 無法定址的鍵直接略過，不影響啟動
        if !is_addressable_key(&secret.key) {
            tracing::warn!(
                "⚠️  Ignoring {}: `{}` is not a usable configuration key",
                name,
                secret.key
            );
            continue;
        }

        tracing::debug!("Applying secret override {} from {}", secret.key, name);
        builder = builder
            .set_override(secret.key.as_str(), secret.value)
            .map_err(|source| GcsPocError::ConfigParseError {
                origin: name.to_string(),
                source,
            })?;
    }

    let merged = builder
        .build()
        .map_err(|source| GcsPocError::ConfigLoadError {
            location: format!("{}.<ext>", stem.display()),
            source,
        })?;

    merged
        .try_deserialize::<AppConfig>()
        .map_err(GcsPocError::ConfigUnmarshalError)
}

/// `configs`, with the upper-case spelling accepted as a fallback.
fn override_document(env: &EnvSnapshot) -> Option<(&'static str, &str)> {
    const UPPER_OVERRIDE_DOCUMENT_VAR: &str = "CONFIGS";

    [OVERRIDE_DOCUMENT_VAR, UPPER_OVERRIDE_DOCUMENT_VAR]
        .into_iter()
        .find_map(|name| {
            env.get(name)
                .filter(|doc| !doc.trim().is_empty())
                .map(|doc| (name, doc))
        })
}
