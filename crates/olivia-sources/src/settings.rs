//! Per-source connection settings

use olivia_core::{Error, Result, SourceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// PISTE OAuth endpoint shared by the three providers
pub const PISTE_TOKEN_URL: &str = "https://oauth.piste.gouv.fr/api/oauth/token";

pub const LEGIFRANCE_BASE_URL: &str = "https://api.piste.gouv.fr/dila/legifrance/lf-engine-app";
pub const JUDILIBRE_BASE_URL: &str = "https://api.piste.gouv.fr/cassation/judilibre/v1.0";
pub const JUSTICE_BACK_BASE_URL: &str = "https://api.piste.gouv.fr/minju/v1/Justiceback";

/// Connection settings of one source
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub page_size: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            token_url: None,
            client_id: None,
            client_secret: None,
            scope: None,
            api_key: None,
            timeout_secs: 15,
            max_retries: 2,
            page_size: 5,
        }
    }
}

impl fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSettings")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id.as_deref().map(obfuscate))
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl SourceSettings {
    /// Production base URL of a known source
    pub fn default_base_url(source: &SourceId) -> Option<&'static str> {
        match source.as_str() {
            SourceId::LEGIFRANCE => Some(LEGIFRANCE_BASE_URL),
            SourceId::JUDILIBRE => Some(JUDILIBRE_BASE_URL),
            SourceId::JUSTICE_BACK => Some(JUSTICE_BACK_BASE_URL),
            _ => None,
        }
    }

    /// Configured base URL, else the production one, parsed
    pub fn resolved_base_url(&self, source: &SourceId) -> Result<Url> {
        let raw = self
            .base_url
            .as_deref()
            .or_else(|| Self::default_base_url(source))
            .ok_or_else(|| Error::config(format!("sources.{}.base_url is required", source)))?;
        parse_url(source, "base_url", raw)
    }

    pub fn resolved_token_url(&self, source: &SourceId) -> Result<Url> {
        parse_url(source, "token_url", self.token_url.as_deref().unwrap_or(PISTE_TOKEN_URL))
    }

    /// Both halves of the OAuth client credentials are set and non-blank
    pub fn has_oauth_credentials(&self) -> bool {
        non_blank(&self.client_id) && non_blank(&self.client_secret)
    }

    pub fn has_api_key(&self) -> bool {
        non_blank(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Check everything a live adapter needs; demo mode skips credentials
    pub fn validate(&self, source: &SourceId, require_credentials: bool) -> Result<()> {
        self.resolved_base_url(source)?;
        if self.token_url.is_some() {
            self.resolved_token_url(source)?;
        }
        if self.page_size == 0 {
            return Err(Error::config(format!("sources.{}.page_size must be positive", source)));
        }
        if require_credentials && !self.has_oauth_credentials() && !self.has_api_key() {
            return Err(Error::config(format!(
                "sources.{} is enabled but has no credentials (client_id/client_secret or api_key)",
                source
            )));
        }
        Ok(())
    }
}

/// The `sources` configuration section, one entry per known provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesSettings {
    pub legifrance: SourceSettings,
    pub judilibre: SourceSettings,
    pub justice_back: SourceSettings,
}

impl SourcesSettings {
    /// Entries in registration order
    pub fn entries(&self) -> [(SourceId, &SourceSettings); 3] {
        [
            (SourceId::new(SourceId::LEGIFRANCE), &self.legifrance),
            (SourceId::new(SourceId::JUDILIBRE), &self.judilibre),
            (SourceId::new(SourceId::JUSTICE_BACK), &self.justice_back),
        ]
    }

    /// Validate every enabled source
    pub fn validate(&self, demo_mode: bool) -> Result<()> {
        for (id, settings) in self.entries() {
            if settings.enabled {
                settings.validate(&id, !demo_mode)?;
            }
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

fn parse_url(source: &SourceId, field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        Error::config(format!("sources.{}.{} is not a valid URL ({}): {}", source, field, raw, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "sources.{}.{} must use http or https",
            source, field
        )));
    }
    Ok(url)
}

/// Loggable form of a client id: `abc…xyz`
pub fn obfuscate(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "•".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_production_urls() {
        let settings = SourceSettings::default();
        let url = settings
            .resolved_base_url(&SourceId::new(SourceId::JUDILIBRE))
            .unwrap();
        assert_eq!(url.as_str(), JUDILIBRE_BASE_URL);
        assert!(settings
            .resolved_base_url(&SourceId::new("custom"))
            .is_err());
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let source = SourceId::new(SourceId::LEGIFRANCE);
        let settings = SourceSettings::default();
        assert!(matches!(settings.validate(&source, true), Err(Error::Config(_))));
        assert!(settings.validate(&source, false).is_ok());

        let settings = SourceSettings {
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            ..SourceSettings::default()
        };
        assert!(settings.validate(&source, true).is_ok());
    }

    #[test]
    fn test_bad_url_is_config_error() {
        let settings = SourceSettings {
            base_url: Some("not a url".into()),
            ..SourceSettings::default()
        };
        let err = settings
            .validate(&SourceId::new(SourceId::JUDILIBRE), false)
            .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let settings = SourceSettings {
            client_id: Some("abcdef123456".into()),
            client_secret: Some("super-secret".into()),
            api_key: Some("key-123".into()),
            ..SourceSettings::default()
        };
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("key-123"));
        assert!(printed.contains("abc…456"));
    }

    #[test]
    fn test_sources_section_from_yaml() {
        let yaml = r#"
legifrance:
  client_id: lf-client
  client_secret: lf-secret
judilibre:
  api_key: jl-key
  page_size: 10
justice_back:
  enabled: false
"#;
        let sources: SourcesSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(sources.judilibre.page_size, 10);
        assert!(!sources.justice_back.enabled);
        assert!(sources.validate(false).is_ok());

        let ids: Vec<String> = sources.entries().iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["legifrance", "judilibre", "justice_back"]);
    }

    #[test]
    fn test_sources_without_credentials_need_demo_mode() {
        let sources = SourcesSettings::default();
        assert!(sources.validate(false).is_err());
        assert!(sources.validate(true).is_ok());
    }

    #[test]
    fn test_obfuscate_short_values() {
        assert_eq!(obfuscate("abc"), "•••");
        assert_eq!(obfuscate("client-identifier"), "cli…ier");
    }
}
