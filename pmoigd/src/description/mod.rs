//! Descriptions de devices UPnP : récupération, arbre de devices et
//! extraction des services WAN d'une passerelle.

mod resolver;
mod tree;

use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http::{build_agent, status_text};

pub use resolver::{IgdVersion, resolve_services, splice_control_url};
pub use tree::{DeviceNode, ServiceNode};

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("[{url}] HTTP status {status}")]
    Status { url: String, status: String },

    #[error("XML parsing error: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("Missing required device element: {0}")]
    MissingField(&'static str),

    #[error("[{0}] Malformed root device description: not an InternetGatewayDevice")]
    NotAnIgd(String),

    #[error("[{0}] Malformed device description: no compatible service descriptions found")]
    NoCompatibleService(String),
}

/// Télécharge et analyse la description racine publiée à `location`.
///
/// Un statut HTTP >= 400 est une erreur, tout comme un document qui ne
/// contient pas d'élément `<device>`.
pub fn fetch_description(location: &Url, timeout: Duration) -> Result<DeviceNode, DescriptionError> {
    debug!("Fetching device description at {}", location);

    let mut response = build_agent(Some(timeout)).get(location.as_str()).call()?;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(DescriptionError::Status {
            url: location.to_string(),
            status: status_text(status),
        });
    }

    let body = response.body_mut().read_to_vec()?;
    DeviceNode::parse_root(body.as_slice())
}
