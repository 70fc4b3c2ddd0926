//! # Module SSDP - côté control point
//!
//! Ce module contient les briques SSDP utilisées par le moteur de découverte :
//!
//! - construction des requêtes `M-SEARCH` ([`build_msearch`]),
//! - analyse des réponses HTTP-over-UDP ([`SsdpResponse`]),
//! - extraction de l'UUID depuis l'en-tête `USN` ([`parse_usn_uuid`]),
//! - ouverture du socket de recherche ([`open_search_socket`]).
//!
//! ## Constantes SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Taille maximale d'un datagramme lu**: 1500 octets (une trame Ethernet)

mod response;
mod socket;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use thiserror::Error;

pub use response::{SsdpResponse, is_canonical_uuid, parse_usn_uuid};
pub use socket::open_search_socket;

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Taille du buffer de réception d'un datagramme
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Adresse de destination des `M-SEARCH`
pub fn ssdp_multicast_socket_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(SSDP_MULTICAST_ADDR, SSDP_PORT))
}

/// Erreurs de validation d'une réponse SSDP
#[derive(Debug, Error)]
pub enum SsdpError {
    #[error("Malformed SSDP response: {0}")]
    Malformed(String),
    #[error("Invalid IGD response: no {0} specified")]
    MissingHeader(&'static str),
    #[error("Unrecognized UPnP device of type {0}")]
    UnexpectedSearchTarget(String),
}

/// Construit une requête `M-SEARCH` pour `device_type`.
///
/// `MX` vaut la durée d'écoute en secondes entières, avec un minimum de 1.
pub fn build_msearch(device_type: &str, listen: Duration) -> String {
    let mx = listen.as_secs().max(1);
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         Host: {}:{}\r\n\
         St: {}\r\n\
         Man: \"ssdp:discover\"\r\n\
         Mx: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, SSDP_PORT, device_type, mx
    )
}
