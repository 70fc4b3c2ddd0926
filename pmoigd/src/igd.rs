use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use tracing::{debug, warn};
use url::Url;

use crate::errors::IgdError;
use crate::soap::{SoapClient, SoapParseError, parse_action_response};

/// Protocole de transport d'une redirection de port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            other => Err(format!("Unknown protocol: {}", other)),
        }
    }
}

/// Service de connexion WAN d'une passerelle (`WANIPConnection` ou
/// `WANPPPConnection`).
#[derive(Debug, Clone)]
pub struct IgdService {
    service_id: String,
    control_url: Url,
    service_type: String,
    client: SoapClient,
}

impl IgdService {
    pub fn new(service_id: String, control_url: Url, service_type: String) -> Self {
        Self {
            service_id,
            control_url,
            service_type,
            client: SoapClient::default(),
        }
    }

    /// Remplace le client SOAP (user agent, verbosité)
    pub fn with_client(mut self, client: SoapClient) -> Self {
        self.client = client;
        self
    }

    pub fn id(&self) -> &str {
        &self.service_id
    }

    pub fn control_url(&self) -> &Url {
        &self.control_url
    }

    /// URN du service, utilisée comme namespace des actions
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    fn invoke(&self, action: &str, args: &[(&str, &str)]) -> Result<String, IgdError> {
        self.client
            .invoke(&self.control_url, &self.service_type, action, args)
    }

    /// Ajoute une redirection `external_port` → `local_address:internal_port`.
    ///
    /// L'hôte distant est laissé vide (toute origine). Un bail de 0 seconde
    /// demande une redirection permanente.
    pub fn add_port_mapping(
        &self,
        local_address: &str,
        protocol: Protocol,
        external_port: u16,
        internal_port: u16,
        description: &str,
        lease_secs: u32,
    ) -> Result<(), IgdError> {
        let external_port = external_port.to_string();
        let internal_port = internal_port.to_string();
        let lease = lease_secs.to_string();

        self.invoke(
            "AddPortMapping",
            &[
                ("NewRemoteHost", ""),
                ("NewExternalPort", external_port.as_str()),
                ("NewProtocol", protocol.as_str()),
                ("NewInternalPort", internal_port.as_str()),
                ("NewInternalClient", local_address),
                ("NewEnabled", "1"),
                ("NewPortMappingDescription", description),
                ("NewLeaseDuration", lease.as_str()),
            ],
        )?;

        debug!(
            "[{}] Mapped {} {} -> {}:{}",
            self.service_id, protocol, external_port, local_address, internal_port
        );
        Ok(())
    }

    pub fn delete_port_mapping(&self, protocol: Protocol, external_port: u16) -> Result<(), IgdError> {
        let external_port = external_port.to_string();

        self.invoke(
            "DeletePortMapping",
            &[
                ("NewRemoteHost", ""),
                ("NewExternalPort", external_port.as_str()),
                ("NewProtocol", protocol.as_str()),
            ],
        )?;

        debug!("[{}] Unmapped {} {}", self.service_id, protocol, external_port);
        Ok(())
    }

    /// Adresse IP externe du service.
    ///
    /// `Ok(None)` quand le champ est vide ou n'est pas une adresse IP : des
    /// passerelles sans connexion active répondent ainsi.
    pub fn get_external_ip_address(&self) -> Result<Option<IpAddr>, IgdError> {
        let body = self.invoke("GetExternalIPAddress", &[])?;

        let response = match parse_action_response(body.as_bytes(), "GetExternalIPAddress") {
            Ok(response) => response,
            Err(SoapParseError::MissingResponse(name)) => {
                debug!("[{}] No {} in response", self.service_id, name);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let raw = response.value("NewExternalIPAddress").unwrap_or_default();
        match raw.parse::<IpAddr>() {
            Ok(ip) => Ok(Some(ip)),
            Err(_) => {
                debug!(
                    "[{}] No valid external IP address reported ('{}')",
                    self.service_id, raw
                );
                Ok(None)
            }
        }
    }
}

/// Passerelle `InternetGatewayDevice` découverte.
#[derive(Debug, Clone)]
pub struct Igd {
    uuid: String,
    friendly_name: String,
    url: Url,
    local_ip: String,
    services: Vec<IgdService>,
}

impl Igd {
    pub fn new(
        uuid: String,
        friendly_name: String,
        url: Url,
        local_ip: String,
        services: Vec<IgdService>,
    ) -> Self {
        Self {
            uuid,
            friendly_name,
            url,
            local_ip,
            services,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// `'<nom>' (<hôte>)`
    pub fn friendly_identifier(&self) -> String {
        format!(
            "'{}' ({})",
            self.friendly_name,
            self.url.host_str().unwrap_or_default()
        )
    }

    /// URL de la description racine
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Adresse locale utilisée pour joindre la passerelle
    pub fn local_ip(&self) -> &str {
        &self.local_ip
    }

    pub fn services(&self) -> &[IgdService] {
        &self.services
    }

    /// Ajoute la redirection sur tous les services, dans l'ordre.
    ///
    /// S'arrête au premier échec : les services déjà traités gardent leur
    /// redirection. Utiliser [`IgdService::add_port_mapping`] pour un
    /// contrôle service par service.
    pub fn add_port_mapping(
        &self,
        protocol: Protocol,
        external_port: u16,
        internal_port: u16,
        description: &str,
        lease_secs: u32,
    ) -> Result<(), IgdError> {
        for service in &self.services {
            service.add_port_mapping(
                &self.local_ip,
                protocol,
                external_port,
                internal_port,
                description,
                lease_secs,
            )?;
        }
        Ok(())
    }

    /// Supprime la redirection sur tous les services, même arrêt au premier
    /// échec que [`Igd::add_port_mapping`].
    pub fn delete_port_mapping(&self, protocol: Protocol, external_port: u16) -> Result<(), IgdError> {
        for service in &self.services {
            service.delete_port_mapping(protocol, external_port)?;
        }
        Ok(())
    }

    /// Première adresse externe valide rapportée par un service.
    ///
    /// L'erreur du dernier service en échec n'est retournée que si aucun
    /// service n'a répondu.
    pub fn get_external_ip_address(&self) -> Result<Option<IpAddr>, IgdError> {
        let mut last_error = None;

        for service in &self.services {
            match service.get_external_ip_address() {
                Ok(Some(ip)) => return Ok(Some(ip)),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "{} [{}] GetExternalIPAddress failed: {}",
                        self.friendly_identifier(),
                        service.id(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}
