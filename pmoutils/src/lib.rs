/// Utilitaires pour la gestion des adresses IP réseau.
///
/// Ce module fournit des fonctions pour lister les interfaces IPv4 locales et
/// pour déterminer l'adresse locale utilisée pour joindre un hôte donné.
///
/// # Fonctions principales
///
/// - [`local_ip_towards`] : adresse locale de la connexion sortante vers `host:port`
/// - [`list_ipv4_interfaces`] : adresses IPv4 non-loopback de la machine
///
/// # Examples
///
/// ```no_run
/// use pmoutils::local_ip_towards;
///
/// let ip = local_ip_towards("192.168.1.1:5000")?;
/// println!("Adresse locale vers la passerelle: {}", ip);
/// # Ok::<(), std::io::Error>(())
/// ```
mod ip_utils;

pub use ip_utils::{list_ipv4_interfaces, local_ip_towards};
