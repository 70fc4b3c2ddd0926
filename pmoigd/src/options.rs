use std::net::SocketAddr;
use std::time::Duration;

use pmoconfig::Config;
use tracing::warn;

use crate::config_ext::IgdConfigExt;
use crate::ssdp::ssdp_multicast_socket_addr;

pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "PMOIgd/1.0 UPnP/1.0";

/// Réglages passés explicitement au moteur de découverte et au client SOAP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgdOptions {
    /// Durée d'écoute de chaque passe SSDP
    pub timeout: Duration,
    /// Adresse locale imposée ; `None` pour la déduire de chaque device
    pub local_address: Option<String>,
    /// Délai global du téléchargement des descriptions
    pub http_timeout: Duration,
    pub user_agent: String,
    /// Trace les datagrammes et enveloppes SOAP en `debug`
    pub verbose: bool,
    /// Destination des `M-SEARCH` (groupe multicast SSDP par défaut)
    pub search_address: SocketAddr,
}

impl Default for IgdOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            local_address: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verbose: false,
            search_address: ssdp_multicast_socket_addr(),
        }
    }
}

impl IgdOptions {
    /// Lit les clés `igd.*` ; une clé illisible garde sa valeur par défaut.
    pub fn from_config(config: &Config) -> Self {
        let mut options = Self::default();

        match config.get_igd_discovery_timeout_secs() {
            Ok(secs) => options.timeout = Duration::from_secs(secs),
            Err(e) => warn!("igd.discovery_timeout_secs: {}", e),
        }
        match config.get_igd_local_address() {
            Ok(address) => options.local_address = address,
            Err(e) => warn!("igd.local_address: {}", e),
        }
        match config.get_igd_http_timeout_secs() {
            Ok(secs) => options.http_timeout = Duration::from_secs(secs),
            Err(e) => warn!("igd.http_timeout_secs: {}", e),
        }
        match config.get_igd_user_agent() {
            Ok(user_agent) => options.user_agent = user_agent,
            Err(e) => warn!("igd.user_agent: {}", e),
        }
        match config.get_igd_verbose() {
            Ok(verbose) => options.verbose = verbose,
            Err(e) => warn!("igd.verbose: {}", e),
        }

        options
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_local_address(mut self, local_address: Option<String>) -> Self {
        self.local_address = local_address;
        self
    }

    pub fn with_search_address(mut self, search_address: SocketAddr) -> Self {
        self.search_address = search_address;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
