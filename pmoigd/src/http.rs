use std::time::Duration;

use ureq::Agent;
use ureq::http::StatusCode;

/// Agent HTTP qui ne transforme pas les statuts 4xx/5xx en erreurs.
///
/// Le corps reste lisible (fault SOAP, page d'erreur) et l'appelant décide
/// lui-même à partir du statut.
pub(crate) fn build_agent(timeout: Option<Duration>) -> Agent {
    Agent::config_builder()
        // Les passerelles sont sur le réseau local : jamais de proxy
        .proxy(None)
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build()
        .into()
}

/// Texte de statut au format `"500 Internal Server Error"`
pub(crate) fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
