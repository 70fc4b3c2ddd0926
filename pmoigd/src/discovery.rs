//! Moteur de découverte SSDP des passerelles IGD.
//!
//! Une découverte enchaîne deux passes, `InternetGatewayDevice:2` puis
//! `InternetGatewayDevice:1`. Chaque passe envoie un `M-SEARCH`, écoute
//! jusqu'à l'échéance et confie chaque datagramme reçu à un thread dédié
//! (validation, description, adresse locale). La boucle de réception n'est
//! jamais bloquée par le traitement d'une réponse.
//!
//! Les threads d'une passe vivent dans un `std::thread::scope` : la passe ne
//! se termine qu'une fois tous ses threads achevés, et le canal de résultats
//! n'est fermé qu'après le dernier envoi.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::description::{IgdVersion, fetch_description, resolve_services};
use crate::errors::IgdError;
use crate::igd::Igd;
use crate::local_address::resolve_local_address;
use crate::options::IgdOptions;
use crate::soap::SoapClient;
use crate::ssdp::{
    MAX_DATAGRAM_SIZE, SsdpError, SsdpResponse, build_msearch, is_canonical_uuid,
    open_search_socket, parse_usn_uuid,
};

/// Capacité du canal de résultats d'une passe
const RESULT_CHANNEL_CAPACITY: usize = 8;

/// Moteur de découverte configuré par un [`IgdOptions`].
#[derive(Debug, Clone)]
pub struct Discoverer {
    options: IgdOptions,
    client: SoapClient,
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new(IgdOptions::default())
    }
}

impl Discoverer {
    pub fn new(options: IgdOptions) -> Self {
        let client = SoapClient::new(options.user_agent.clone(), options.verbose);
        Self { options, client }
    }

    pub fn options(&self) -> &IgdOptions {
        &self.options
    }

    /// Découvre les passerelles IGD v2 puis v1.
    ///
    /// Ne retourne jamais d'erreur : une passe en échec donne simplement une
    /// liste vide. L'ordre des résultats n'est pas déterministe.
    pub fn discover(&self) -> Vec<Igd> {
        info!("Starting UPnP discovery...");

        let mut result: Vec<Igd> = Vec::new();
        for version in IgdVersion::SEARCH_ORDER {
            // Les devices v2 qui répondent aussi en v1 ne sont pas ajoutés deux fois
            let found = self.discover_version(version, &result);
            result.extend(found);
        }

        if !result.is_empty() && self.options.verbose {
            debug!("UPnP discovery result:");
            for igd in &result {
                debug!("[{}]", igd.uuid());
                for service in igd.services() {
                    debug!("* [{}] {}", service.id(), service.control_url());
                }
            }
        }

        let suffix = if result.len() == 1 { "device" } else { "devices" };
        info!("UPnP discovery complete (found {} {}).", result.len(), suffix);

        result
    }

    /// Une passe pour `version`, en ignorant les UUID de `known`.
    pub fn discover_version(&self, version: IgdVersion, known: &[Igd]) -> Vec<Igd> {
        let device_type = version.device_type();
        debug!("Starting discovery of device type {}...", device_type);

        let results = match self.run_pass(device_type, known) {
            Ok(results) => results,
            Err(e) => {
                warn!("UPnP discovery of {} aborted: {}", device_type, e);
                Vec::new()
            }
        };

        debug!(
            "Discovery for device type {} finished ({} new).",
            device_type,
            results.len()
        );
        results
    }

    fn run_pass(&self, device_type: &str, known: &[Igd]) -> io::Result<Vec<Igd>> {
        let search_address = self.options.search_address;
        let search = build_msearch(device_type, self.options.timeout);

        let socket = open_search_socket(search_address)?;
        let deadline = Instant::now() + self.options.timeout;

        debug!("Sending search request for device type {}...", device_type);
        socket.send_to(search.as_bytes(), search_address)?;

        let (sender, receiver) = bounded::<Igd>(RESULT_CHANNEL_CAPACITY);
        let mut results: Vec<Igd> = Vec::new();

        thread::scope(|scope| {
            debug!("Listening for UPnP response for device type {}...", device_type);

            while let Some((datagram, from)) = receive_until(&socket, deadline) {
                let sender = sender.clone();
                scope.spawn(move || {
                    match self.handle_search_response(device_type, known, &datagram, from) {
                        Ok(Some(igd)) => {
                            // Le récepteur est vivant jusqu'à la fin du scope
                            let _ = sender.send(igd);
                        }
                        Ok(None) => {}
                        Err(e) => debug!("Dropping UPnP response from {}: {}", from, e),
                    }
                });
            }

            // Le canal se ferme quand le dernier thread a relâché son émetteur
            drop(sender);

            for igd in receiver.iter() {
                if results.iter().any(|r| r.uuid() == igd.uuid())
                    || known.iter().any(|k| k.uuid() == igd.uuid())
                {
                    debug!(
                        "Already processed device with UUID {}, continuing...",
                        igd.uuid()
                    );
                    continue;
                }
                results.push(igd);
            }
        });

        Ok(results)
    }

    /// Valide une réponse `M-SEARCH` et construit l'[`Igd`] correspondant.
    ///
    /// `Ok(None)` pour un device déjà connu.
    pub fn handle_search_response(
        &self,
        device_type: &str,
        known: &[Igd],
        datagram: &[u8],
        from: SocketAddr,
    ) -> Result<Option<Igd>, IgdError> {
        if self.options.verbose {
            debug!(
                "Handling UPnP response from {}:\n\n{}",
                from,
                String::from_utf8_lossy(datagram)
            );
        }

        let response = SsdpResponse::parse(datagram)?;

        let responding_type = response.header("St").unwrap_or_default();
        if responding_type != device_type {
            return Err(SsdpError::UnexpectedSearchTarget(responding_type.to_string()).into());
        }

        let location = response
            .header("Location")
            .ok_or(SsdpError::MissingHeader("location"))?;
        let url = Url::parse(location).map_err(|e| IgdError::invalid_url(location, e))?;

        let usn = response
            .header("USN")
            .ok_or(SsdpError::MissingHeader("USN"))?;
        let uuid = parse_usn_uuid(usn);
        if !is_canonical_uuid(&uuid) {
            warn!(
                "Invalid IGD response: invalid device UUID {} (continuing anyway)",
                uuid
            );
        }

        if known.iter().any(|k| k.uuid() == uuid) {
            if self.options.verbose {
                debug!("Ignoring known device with UUID {}", uuid);
            }
            return Ok(None);
        }

        let root = fetch_description(&url, self.options.http_timeout)?;
        let services = resolve_services(&url, &root, self.options.verbose)?;

        let local_ip = resolve_local_address(&url, self.options.local_address.as_deref())?;

        let services = services
            .into_iter()
            .map(|service| service.with_client(self.client.clone()))
            .collect();

        trace!("Finished handling of UPnP response from {}.", from);

        Ok(Some(Igd::new(
            uuid,
            root.friendly_name,
            url,
            local_ip,
            services,
        )))
    }
}

/// Attend le prochain datagramme jusqu'à `deadline`.
///
/// `None` à l'échéance ou sur erreur de lecture (journalisée si ce n'est pas
/// un simple délai dépassé).
fn receive_until(socket: &UdpSocket, deadline: Instant) -> Option<(Vec<u8>, SocketAddr)> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return None;
    }

    if let Err(e) = socket.set_read_timeout(Some(remaining)) {
        warn!("SSDP: failed to arm read deadline: {}", e);
        return None;
    }

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((n, from)) => {
            buf.truncate(n);
            Some((buf, from))
        }
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => None,
        Err(e) => {
            warn!("SSDP read error: {}", e);
            None
        }
    }
}

/// Découverte avec les réglages par défaut et une adresse locale optionnelle.
pub fn discover(local_address: Option<&str>) -> Vec<Igd> {
    let options = IgdOptions::default().with_local_address(local_address.map(str::to_string));
    Discoverer::new(options).discover()
}
