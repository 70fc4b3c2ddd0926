use tracing::trace;
use url::Url;

use crate::errors::IgdError;

/// Adresse locale utilisée pour joindre le device publié à `url`.
///
/// Une adresse imposée par l'appelant est retournée sans aucune activité
/// réseau. Sinon (ou si elle est vide) une connexion TCP éphémère est ouverte
/// vers `host:port` et son extrémité locale est lue.
pub fn resolve_local_address(url: &Url, local_override: Option<&str>) -> Result<String, IgdError> {
    if let Some(address) = local_override.map(str::trim).filter(|a| !a.is_empty()) {
        return Ok(address.to_string());
    }

    let host = url
        .host_str()
        .ok_or_else(|| IgdError::MissingHost(url.to_string()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| IgdError::MissingHost(url.to_string()))?;

    // host_str() garde les crochets des adresses IPv6
    let authority = format!("{}:{}", host, port);
    let local_ip = pmoutils::local_ip_towards(&authority)?;

    trace!("Local address towards {} is {}", authority, local_ip);
    Ok(local_ip.to_string())
}
