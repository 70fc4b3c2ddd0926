//! Extension pour intégrer la configuration IGD dans pmoconfig
//!
//! Ce module fournit le trait `IgdConfigExt` qui ajoute à `pmoconfig::Config`
//! les réglages de découverte et de contrôle des passerelles (clés `igd.*`).

use anyhow::{Result, anyhow};
use pmoconfig::Config;
use serde_yaml::{Number, Value};

use crate::options::{DEFAULT_HTTP_TIMEOUT, DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_USER_AGENT};

/// Trait d'extension pour la configuration IGD
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmoigd::IgdConfigExt;
///
/// let config = get_config();
/// let timeout = config.get_igd_discovery_timeout_secs()?;
/// ```
pub trait IgdConfigExt {
    /// Durée d'écoute d'une passe SSDP en secondes (défaut: 3)
    fn get_igd_discovery_timeout_secs(&self) -> Result<u64>;
    fn set_igd_discovery_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Adresse locale imposée, `None` si la clé est vide (détection automatique)
    fn get_igd_local_address(&self) -> Result<Option<String>>;
    fn set_igd_local_address(&self, address: Option<String>) -> Result<()>;

    /// Délai de téléchargement des descriptions en secondes (défaut: 10)
    fn get_igd_http_timeout_secs(&self) -> Result<u64>;
    fn set_igd_http_timeout_secs(&self, secs: u64) -> Result<()>;

    fn get_igd_user_agent(&self) -> Result<String>;
    fn set_igd_user_agent(&self, user_agent: String) -> Result<()>;

    fn get_igd_verbose(&self) -> Result<bool>;
    fn set_igd_verbose(&self, verbose: bool) -> Result<()>;
}

fn as_secs(value: Result<Value>, key: &str, default: u64) -> Result<u64> {
    match value {
        Ok(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| anyhow!("igd.{} must be a positive integer", key)),
        Ok(Value::Null) | Err(_) => Ok(default),
        Ok(other) => Err(anyhow!("igd.{} must be a number, got {:?}", key, other)),
    }
}

impl IgdConfigExt for Config {
    fn get_igd_discovery_timeout_secs(&self) -> Result<u64> {
        as_secs(
            self.get_value(&["igd", "discovery_timeout_secs"]),
            "discovery_timeout_secs",
            DEFAULT_DISCOVERY_TIMEOUT.as_secs(),
        )
    }

    fn set_igd_discovery_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["igd", "discovery_timeout_secs"],
            Value::Number(Number::from(secs)),
        )
    }

    fn get_igd_local_address(&self) -> Result<Option<String>> {
        match self.get_value(&["igd", "local_address"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
            _ => Ok(None),
        }
    }

    fn set_igd_local_address(&self, address: Option<String>) -> Result<()> {
        self.set_value(
            &["igd", "local_address"],
            Value::String(address.unwrap_or_default()),
        )
    }

    fn get_igd_http_timeout_secs(&self) -> Result<u64> {
        as_secs(
            self.get_value(&["igd", "http_timeout_secs"]),
            "http_timeout_secs",
            DEFAULT_HTTP_TIMEOUT.as_secs(),
        )
    }

    fn set_igd_http_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["igd", "http_timeout_secs"],
            Value::Number(Number::from(secs)),
        )
    }

    fn get_igd_user_agent(&self) -> Result<String> {
        match self.get_value(&["igd", "user_agent"]) {
            Ok(Value::String(s)) if !s.is_empty() => Ok(s),
            _ => Ok(DEFAULT_USER_AGENT.to_string()),
        }
    }

    fn set_igd_user_agent(&self, user_agent: String) -> Result<()> {
        self.set_value(&["igd", "user_agent"], Value::String(user_agent))
    }

    fn get_igd_verbose(&self) -> Result<bool> {
        match self.get_value(&["igd", "verbose"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => Ok(false),
        }
    }

    fn set_igd_verbose(&self, verbose: bool) -> Result<()> {
        self.set_value(&["igd", "verbose"], Value::Bool(verbose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("").unwrap();

        assert_eq!(config.get_igd_discovery_timeout_secs().unwrap(), 3);
        assert_eq!(config.get_igd_http_timeout_secs().unwrap(), 10);
        assert_eq!(config.get_igd_local_address().unwrap(), None);
        assert_eq!(config.get_igd_user_agent().unwrap(), "PMOIgd/1.0 UPnP/1.0");
        assert!(!config.get_igd_verbose().unwrap());
    }

    #[test]
    fn test_set_and_get() {
        let config = Config::from_yaml_str("").unwrap();

        config.set_igd_discovery_timeout_secs(7).unwrap();
        config
            .set_igd_local_address(Some("192.168.1.20".to_string()))
            .unwrap();
        config.set_igd_verbose(true).unwrap();

        assert_eq!(config.get_igd_discovery_timeout_secs().unwrap(), 7);
        assert_eq!(
            config.get_igd_local_address().unwrap().as_deref(),
            Some("192.168.1.20")
        );
        assert!(config.get_igd_verbose().unwrap());

        config.set_igd_local_address(None).unwrap();
        assert_eq!(config.get_igd_local_address().unwrap(), None);
    }

    #[test]
    fn test_invalid_timeout() {
        let config = Config::from_yaml_str("igd:\n  discovery_timeout_secs: soon\n").unwrap();
        assert!(config.get_igd_discovery_timeout_secs().is_err());
    }
}
