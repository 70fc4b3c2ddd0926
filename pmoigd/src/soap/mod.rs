//! # Module SOAP - côté client
//!
//! Construction des enveloppes d'action, envoi HTTP POST vers l'URL de
//! contrôle d'un service et analyse des réponses (valeurs de retour ou
//! `UPnPError`).

mod builder;
mod client;
mod parser;

pub use builder::{build_action_element, build_soap_envelope, build_soap_request};
pub use client::SoapClient;
pub use parser::{
    ActionResponse, SoapParseError, UpnpFault, parse_action_response, parse_soap_body,
    parse_upnp_fault,
};
