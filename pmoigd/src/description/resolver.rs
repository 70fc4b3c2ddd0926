use std::fmt;

use tracing::{debug, warn};
use url::Url;

use super::{DescriptionError, DeviceNode};
use crate::igd::IgdService;

const IGD_V1: &str = "urn:schemas-upnp-org:device:InternetGatewayDevice:1";
const IGD_V2: &str = "urn:schemas-upnp-org:device:InternetGatewayDevice:2";

const WAN_DEVICE_V1: &str = "urn:schemas-upnp-org:device:WANDevice:1";
const WAN_DEVICE_V2: &str = "urn:schemas-upnp-org:device:WANDevice:2";

const WAN_CONNECTION_DEVICE_V1: &str = "urn:schemas-upnp-org:device:WANConnectionDevice:1";
const WAN_CONNECTION_DEVICE_V2: &str = "urn:schemas-upnp-org:device:WANConnectionDevice:2";

const WAN_IP_CONNECTION_V1: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";
const WAN_IP_CONNECTION_V2: &str = "urn:schemas-upnp-org:service:WANIPConnection:2";
const WAN_PPP_CONNECTION_V1: &str = "urn:schemas-upnp-org:service:WANPPPConnection:1";

/// Version du device `InternetGatewayDevice`.
///
/// Chaque version fixe la chaîne de types attendue sous le device racine :
/// `WANDevice` → `WANConnectionDevice` → services de connexion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgdVersion {
    V1,
    V2,
}

impl IgdVersion {
    /// Ordre des passes de découverte : la v2 d'abord.
    pub const SEARCH_ORDER: [IgdVersion; 2] = [IgdVersion::V2, IgdVersion::V1];

    pub fn from_device_type(device_type: &str) -> Option<Self> {
        match device_type.trim() {
            IGD_V1 => Some(IgdVersion::V1),
            IGD_V2 => Some(IgdVersion::V2),
            _ => None,
        }
    }

    /// URN du device racine, utilisée aussi comme cible `St` du `M-SEARCH`
    pub fn device_type(self) -> &'static str {
        match self {
            IgdVersion::V1 => IGD_V1,
            IgdVersion::V2 => IGD_V2,
        }
    }

    pub fn wan_device(self) -> &'static str {
        match self {
            IgdVersion::V1 => WAN_DEVICE_V1,
            IgdVersion::V2 => WAN_DEVICE_V2,
        }
    }

    pub fn wan_connection_device(self) -> &'static str {
        match self {
            IgdVersion::V1 => WAN_CONNECTION_DEVICE_V1,
            IgdVersion::V2 => WAN_CONNECTION_DEVICE_V2,
        }
    }

    /// Types de services acceptés. Une passerelle v2 peut garder un
    /// `WANPPPConnection:1`.
    pub fn service_types(self) -> &'static [&'static str] {
        match self {
            IgdVersion::V1 => &[WAN_IP_CONNECTION_V1, WAN_PPP_CONNECTION_V1],
            IgdVersion::V2 => &[WAN_IP_CONNECTION_V2, WAN_PPP_CONNECTION_V1],
        }
    }
}

impl fmt::Display for IgdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgdVersion::V1 => write!(f, "IGDv1"),
            IgdVersion::V2 => write!(f, "IGDv2"),
        }
    }
}

/// Extrait les services WAN d'une description racine.
///
/// Les URL de contrôle sont résolues par rapport à `root_url`. Un sous-arbre
/// incomplet ne produit simplement aucun service ; l'erreur n'est levée que
/// si la description entière n'en fournit aucun.
pub fn resolve_services(
    root_url: &Url,
    root: &DeviceNode,
    verbose: bool,
) -> Result<Vec<IgdService>, DescriptionError> {
    let version = IgdVersion::from_device_type(&root.device_type)
        .ok_or_else(|| DescriptionError::NotAnIgd(root_url.to_string()))?;

    let mut services = Vec::new();

    let mut wan_devices = root.child_devices(version.wan_device()).peekable();
    if wan_devices.peek().is_none() {
        debug!("[{}] {}: no {} found", root_url, version, version.wan_device());
    }

    for wan_device in wan_devices {
        let mut connection_devices = wan_device
            .child_devices(version.wan_connection_device())
            .peekable();
        if connection_devices.peek().is_none() {
            debug!(
                "[{}] {}: no {} found",
                root_url,
                version,
                version.wan_connection_device()
            );
        }

        for connection_device in connection_devices {
            for service_type in version.service_types() {
                let mut found = false;
                for node in connection_device.services_of_type(service_type) {
                    found = true;

                    if node.control_url.is_empty() {
                        warn!(
                            "[{}] Service {} has an empty control URL, skipping",
                            root_url, node.service_id
                        );
                        continue;
                    }

                    match splice_control_url(root_url, &node.control_url) {
                        Ok(control_url) => services.push(IgdService::new(
                            node.service_id.clone(),
                            control_url,
                            node.service_type.clone(),
                        )),
                        Err(e) => warn!(
                            "[{}] Service {} has an invalid control URL '{}': {}",
                            root_url, node.service_id, node.control_url, e
                        ),
                    }
                }

                if !found && verbose {
                    debug!("[{}] No services of type {} found", root_url, service_type);
                }
            }
        }
    }

    if services.is_empty() {
        return Err(DescriptionError::NoCompatibleService(root_url.to_string()));
    }

    Ok(services)
}

/// Greffe une URL de contrôle annoncée sur l'URL de la description racine.
///
/// - URL absolue : son chemin et sa requête remplacent ceux de la racine ;
/// - chemin commençant par `/` : remplace le chemin de la racine ;
/// - sinon : concaténé tel quel au chemin existant de la racine.
///
/// L'hôte et le port restent toujours ceux de la racine.
pub fn splice_control_url(root: &Url, control: &str) -> Result<Url, url::ParseError> {
    let mut resolved = root.clone();
    resolved.set_fragment(None);

    match Url::parse(control) {
        Ok(absolute) => {
            resolved.set_path(absolute.path());
            resolved.set_query(absolute.query());
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let (path, query) = match control.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (control, None),
            };

            if path.starts_with('/') {
                resolved.set_path(path);
            } else if !path.is_empty() {
                let joined = format!("{}{}", root.path(), path);
                resolved.set_path(&joined);
            }
            resolved.set_query(query);
        }
        Err(e) => return Err(e),
    }

    Ok(resolved)
}
