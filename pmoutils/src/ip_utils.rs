use get_if_addrs::get_if_addrs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, TcpStream};

/// Détermine l'adresse IP locale utilisée pour joindre `authority` (`host:port`).
///
/// Une connexion TCP éphémère est ouverte vers la cible, l'adresse locale du
/// socket est lue puis la connexion est refermée à la sortie de la fonction.
/// Contrairement à une simple résolution de route, l'hôte doit effectivement
/// accepter la connexion : c'est ce qui garantit que l'interface retournée
/// est bien celle qui atteint l'équipement.
///
/// # Errors
///
/// Retourne l'erreur d'E/S de `connect` si l'hôte est injoignable ou refuse
/// la connexion.
///
/// # Examples
///
/// ```no_run
/// let ip = pmoutils::local_ip_towards("192.168.1.1:80")?;
/// println!("IP locale détectée: {}", ip);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn local_ip_towards(authority: &str) -> io::Result<IpAddr> {
    let stream = TcpStream::connect(authority)?;
    let local = stream.local_addr()?;
    Ok(local.ip())
}

/// Liste les adresses IPv4 non-loopback des interfaces réseau.
///
/// Utilisé pour rejoindre un groupe multicast sur chaque interface.
///
/// # Note
///
/// - Seules les adresses IPv4 sont retournées
/// - Les adresses de loopback (127.x.x.x) sont filtrées
/// - L'ordre suit celui des interfaces renvoyé par le système
pub fn list_ipv4_interfaces() -> io::Result<Vec<Ipv4Addr>> {
    let mut result = Vec::new();

    for iface in get_if_addrs()? {
        if let IpAddr::V4(ipv4) = iface.ip() {
            if ipv4.is_loopback() || result.contains(&ipv4) {
                continue;
            }
            result.push(ipv4);
        }
    }

    Ok(result)
}
