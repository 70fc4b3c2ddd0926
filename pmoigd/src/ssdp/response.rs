//! Analyse des réponses `M-SEARCH` (HTTP sur UDP)

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use super::SsdpError;

static UUID_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Réponse SSDP analysée : ligne de statut + en-têtes.
///
/// Les noms d'en-têtes sont insensibles à la casse (`ST`, `St` et `st`
/// désignent le même en-tête). En cas de doublon, la première valeur gagne.
#[derive(Debug, Clone)]
pub struct SsdpResponse {
    status: u16,
    headers: HashMap<String, String>,
}

impl SsdpResponse {
    /// Analyse un datagramme comme une réponse HTTP.
    ///
    /// Les octets non UTF-8 (en-tête `SERVER` en Latin-1 par exemple) sont
    /// remplacés : seuls les en-têtes utilisés décident de la validité.
    pub fn parse(datagram: &[u8]) -> Result<Self, SsdpError> {
        let text = String::from_utf8_lossy(datagram);

        let mut lines = text.lines();
        let status_line = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| SsdpError::Malformed("empty datagram".to_string()))?;

        let status = parse_status_line(status_line)?;
        let headers = parse_headers(lines);

        Ok(Self { status, headers })
    }

    /// Code de statut HTTP de la réponse
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Valeur d'un en-tête, `None` s'il est absent ou vide
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }
}

fn parse_status_line(line: &str) -> Result<u16, SsdpError> {
    let mut parts = line.split_whitespace();

    let version = parts.next().unwrap_or_default();
    if !version.to_ascii_uppercase().starts_with("HTTP/") {
        return Err(SsdpError::Malformed(format!(
            "not an HTTP response: {}",
            line
        )));
    }

    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| SsdpError::Malformed(format!("invalid status line: {}", line)))
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();

        // Empty line marks end of headers
        if line.is_empty() {
            break;
        }

        // Split on first ':' only (values may contain ':')
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_uppercase();
            let value = value.trim().to_string();

            if !name.is_empty() && !value.is_empty() {
                headers.entry(name).or_insert(value);
            } else {
                trace!("Skipping malformed header: '{}'", line);
            }
        } else {
            trace!("Skipping line without colon: '{}'", line);
        }
    }
    headers
}

/// Extrait l'UUID d'un en-tête `USN`.
///
/// `uuid:2fac1234-31f8-11b4-a222-08002b34c003::urn:schemas-upnp-org:device:InternetGatewayDevice:1`
/// donne `2fac1234-31f8-11b4-a222-08002b34c003`.
pub fn parse_usn_uuid(usn: &str) -> String {
    let head = usn.trim().split("::").next().unwrap_or_default();
    match head.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("uuid:") => head[5..].to_string(),
        _ => head.to_string(),
    }
}

/// Vérifie la forme canonique 8-4-4-4-12 hexadécimale.
pub fn is_canonical_uuid(uuid: &str) -> bool {
    UUID_RE
        .get_or_init(|| {
            Regex::new(
                r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}$",
            )
            .ok()
        })
        .as_ref()
        .is_some_and(|re| re.is_match(uuid))
}
