use std::fmt;

use tracing::{debug, warn};
use ureq::Agent;
use url::Url;

use super::{build_soap_request, parse_upnp_fault};
use crate::errors::IgdError;
use crate::http::{build_agent, status_text};
use crate::options::DEFAULT_USER_AGENT;

/// Client HTTP pour les actions SOAP UPnP.
///
/// Aucun délai global n'est imposé : un appel de contrôle dure ce que dure
/// le transport, sans nouvelle tentative.
#[derive(Clone)]
pub struct SoapClient {
    agent: Agent,
    user_agent: String,
    verbose: bool,
}

impl fmt::Debug for SoapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoapClient")
            .field("user_agent", &self.user_agent)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, false)
    }
}

impl SoapClient {
    pub fn new(user_agent: impl Into<String>, verbose: bool) -> Self {
        Self {
            agent: build_agent(None),
            user_agent: user_agent.into(),
            verbose,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Invoque `action` sur `control_url` et retourne le corps de la réponse.
    ///
    /// Un statut HTTP >= 400 donne [`IgdError::Action`] ; le corps brut y est
    /// conservé quand il a pu être lu.
    pub fn invoke(
        &self,
        control_url: &Url,
        service_urn: &str,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<String, IgdError> {
        let body_xml = build_soap_request(service_urn, action, args)?;
        let soap_action_header = format!(r#""{}#{}""#, service_urn, action);

        if self.verbose {
            debug!("SOAP request {} to {}:\n{}", action, control_url, body_xml);
        }

        let mut response = self
            .agent
            .post(control_url.as_str())
            .header("Content-Type", r#"text/xml; charset="utf-8""#)
            .header("User-Agent", &self.user_agent)
            .header("SOAPAction", &soap_action_header)
            .header("Connection", "Close")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send(body_xml)?;

        let status = response.status();

        if status.as_u16() >= 400 {
            // Le statut suffit : un corps tronqué ne masque pas l'échec
            let raw_body = match response.body_mut().read_to_string() {
                Ok(body) => body,
                Err(e) => {
                    debug!(
                        "Could not read {} error body from {}: {}",
                        action, control_url, e
                    );
                    String::new()
                }
            };

            if self.verbose {
                debug!(
                    "SOAP response {} from {} ({}):\n{}",
                    action, control_url, status, raw_body
                );
            }

            if let Some(fault) = parse_upnp_fault(raw_body.as_bytes()) {
                warn!(
                    "{} on {} failed with UPnPError {}: {}",
                    action, control_url, fault.error_code, fault.error_description
                );
            }
            return Err(IgdError::action(action, status_text(status), raw_body));
        }

        let raw_body = response.body_mut().read_to_string()?;

        if self.verbose {
            debug!(
                "SOAP response {} from {} ({}):\n{}",
                action, control_url, status, raw_body
            );
        }

        Ok(raw_body)
    }
}
