//! Construction des requêtes SOAP

use xmltree::{Element, XMLNode};

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_ENCODING: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Élément d'action `<u:Action xmlns:u="urn">` avec un enfant par argument.
///
/// Une valeur vide produit un élément vide (ex. `NewRemoteHost` = tout hôte).
pub fn build_action_element(service_urn: &str, action: &str, args: &[(&str, &str)]) -> Element {
    let mut request_elem = Element::new(&format!("u:{}", action));
    request_elem
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (name, value) in args {
        let mut child = Element::new(name);
        if !value.is_empty() {
            child.children.push(XMLNode::Text((*value).to_string()));
        }
        request_elem.children.push(XMLNode::Element(child));
    }

    request_elem
}

/// Enveloppe SOAP 1.1 complète autour de `body_child`
pub fn build_soap_envelope(body_child: Element) -> Result<String, xmltree::Error> {
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    let mut envelope = Element::new("s:Envelope");
    envelope
        .attributes
        .insert("xmlns:s".to_string(), SOAP_ENVELOPE_NS.to_string());
    envelope
        .attributes
        .insert("s:encodingStyle".to_string(), SOAP_ENCODING.to_string());
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn build_soap_request(
    service_urn: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<String, xmltree::Error> {
    build_soap_envelope(build_action_element(service_urn, action, args))
}
