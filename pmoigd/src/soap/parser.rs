//! Analyse des réponses SOAP renvoyées par les services de contrôle

use std::collections::HashMap;

use xmltree::Element;

/// Réponse d'action extraite du corps SOAP
#[derive(Debug, Clone)]
pub struct ActionResponse {
    /// Nom de l'élément de réponse (ex: "GetExternalIPAddressResponse")
    pub name: String,

    /// Valeurs de retour, texte brut sans espaces de bord
    pub values: HashMap<String, String>,
}

impl ActionResponse {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Détail `<UPnPError>` d'un SOAP Fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpnpFault {
    pub error_code: String,
    pub error_description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SoapParseError {
    #[error("XML parse error: {0}")]
    XmlError(#[from] xmltree::ParseError),

    #[error("Missing SOAP Envelope")]
    MissingEnvelope,

    #[error("Missing SOAP Body")]
    MissingBody,

    #[error("Missing {0} element in SOAP Body")]
    MissingResponse(String),
}

/// Retourne le `<Body>` d'une enveloppe SOAP
pub fn parse_soap_body(xml: &[u8]) -> Result<Element, SoapParseError> {
    let root = Element::parse(xml)?;

    if !root.name.ends_with("Envelope") {
        return Err(SoapParseError::MissingEnvelope);
    }

    find_child_with_suffix(&root, "Body")
        .cloned()
        .ok_or(SoapParseError::MissingBody)
}

/// Extrait `<u:{action}Response>` et ses valeurs de retour.
pub fn parse_action_response(xml: &[u8], action: &str) -> Result<ActionResponse, SoapParseError> {
    let body = parse_soap_body(xml)?;
    let response_name = format!("{}Response", action);

    let response = find_child_with_suffix(&body, &response_name)
        .ok_or_else(|| SoapParseError::MissingResponse(response_name.clone()))?;

    let values = response
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .map(|elem| {
            let value = elem
                .get_text()
                .map(|text| text.trim().to_string())
                .unwrap_or_default();
            (elem.name.clone(), value)
        })
        .collect();

    Ok(ActionResponse {
        name: response.name.clone(),
        values,
    })
}

/// Cherche `Fault/detail/UPnPError` dans une réponse en erreur.
pub fn parse_upnp_fault(xml: &[u8]) -> Option<UpnpFault> {
    let body = parse_soap_body(xml).ok()?;
    let fault = find_child_with_suffix(&body, "Fault")?;
    let detail = find_child_with_suffix(fault, "detail")?;
    let upnp_error = find_child_with_suffix(detail, "UPnPError")?;

    let text = |name: &str| {
        find_child_with_suffix(upnp_error, name)
            .and_then(|e| e.get_text())
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    };

    Some(UpnpFault {
        error_code: text("errorCode"),
        error_description: text("errorDescription"),
    })
}

fn find_child_with_suffix<'a>(parent: &'a Element, suffix: &str) -> Option<&'a Element> {
    parent
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .find(|e| e.name.ends_with(suffix))
}
