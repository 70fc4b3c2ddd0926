//! Fixtures réseau partagées par les tests d'intégration : aides autour de
//! `wiremock` et une passerelle SSDP qui répond aux `M-SEARCH` sur loopback.

#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use wiremock::{MockServer, Request, ResponseTemplate};

pub const IGD_V1: &str = "urn:schemas-upnp-org:device:InternetGatewayDevice:1";
pub const IGD_V2: &str = "urn:schemas-upnp-org:device:InternetGatewayDevice:2";
pub const FIXTURE_UUID: &str = "2fac1234-31f8-11b4-a222-08002b34c003";

/// Requêtes reçues par `server` pour la méthode `verb`, dans l'ordre
pub async fn requests_to(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb)
        .collect()
}

pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn body(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

/// Réponse XML au format d'une passerelle
pub fn xml_response(status: u16, body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.into(), "text/xml")
}

/// Exécute un appel bloquant (ureq, sockets) hors du runtime de test
pub async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

/// Description racine d'une passerelle de version `igd_type`, avec un
/// `WANIPConnection` dont l'URL de contrôle est `control_url`.
pub fn gateway_description(igd_type: &str, control_url: &str) -> String {
    let version = if igd_type == IGD_V2 { 2 } else { 1 };
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>{igd_type}</deviceType>
    <friendlyName>Test Gateway</friendlyName>
    <UDN>uuid:{uuid}</UDN>
    <deviceList>
      <device>
        <deviceType>urn:schemas-upnp-org:device:WANDevice:{version}</deviceType>
        <friendlyName>WANDevice</friendlyName>
        <deviceList>
          <device>
            <deviceType>urn:schemas-upnp-org:device:WANConnectionDevice:{version}</deviceType>
            <friendlyName>WANConnectionDevice</friendlyName>
            <serviceList>
              <service>
                <serviceType>urn:schemas-upnp-org:service:WANIPConnection:{version}</serviceType>
                <serviceId>urn:upnp-org:serviceId:WANIPConn1</serviceId>
                <controlURL>{control_url}</controlURL>
              </service>
            </serviceList>
          </device>
        </deviceList>
      </device>
    </deviceList>
  </device>
</root>"#,
        igd_type = igd_type,
        uuid = FIXTURE_UUID,
        version = version,
        control_url = control_url,
    )
}

pub fn external_ip_response(ip: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:GetExternalIPAddressResponse xmlns:u="urn:schemas-upnp-org:service:WANIPConnection:1">
      <NewExternalIPAddress>{}</NewExternalIPAddress>
    </u:GetExternalIPAddressResponse>
  </s:Body>
</s:Envelope>"#,
        ip
    )
}

pub fn upnp_fault(code: u32, description: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>s:Client</faultcode>
      <faultstring>UPnPError</faultstring>
      <detail>
        <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
          <errorCode>{}</errorCode>
          <errorDescription>{}</errorDescription>
        </UPnPError>
      </detail>
    </s:Fault>
  </s:Body>
</s:Envelope>"#,
        code, description
    )
}

/// Réponse SSDP configurable envoyée par [`SsdpFixture`]
#[derive(Debug, Clone)]
pub struct FixtureReply {
    /// Cible `St` de la requête à laquelle on répond
    pub answers: String,
    /// Datagramme brut renvoyé
    pub datagram: String,
    /// Nombre d'envois du datagramme
    pub repeat: usize,
}

impl FixtureReply {
    /// Réponse conforme : `St` identique à la requête, `LOCATION` et `USN`.
    pub fn igd(search_target: &str, location: &str) -> Self {
        Self::igd_with_uuid(search_target, location, FIXTURE_UUID)
    }

    /// Même réponse pour un autre device (`USN` portant `uuid`)
    pub fn igd_with_uuid(search_target: &str, location: &str, uuid: &str) -> Self {
        Self {
            answers: search_target.to_string(),
            datagram: format!(
                "HTTP/1.1 200 OK\r\n\
                 CACHE-CONTROL: max-age=120\r\n\
                 ST: {st}\r\n\
                 USN: uuid:{uuid}::{st}\r\n\
                 EXT:\r\n\
                 SERVER: Linux/5.4 UPnP/1.1 TestGateway/1.0\r\n\
                 LOCATION: {location}\r\n\
                 \r\n",
                st = search_target,
                uuid = uuid,
                location = location,
            ),
            repeat: 1,
        }
    }

    pub fn raw(search_target: &str, datagram: &str) -> Self {
        Self {
            answers: search_target.to_string(),
            datagram: datagram.to_string(),
            repeat: 1,
        }
    }

    pub fn repeated(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Passerelle SSDP en unicast sur loopback.
///
/// Chaque `M-SEARCH` reçu est journalisé ; les réponses dont `answers`
/// correspond à la cible `St` de la requête sont renvoyées à l'émetteur.
pub struct SsdpFixture {
    addr: SocketAddr,
    searches: Arc<Mutex<Vec<String>>>,
    stop: Arc<AtomicBool>,
}

impl SsdpFixture {
    pub fn start(replies: Vec<FixtureReply>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let addr = socket.local_addr().unwrap();

        let searches = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let recorded = Arc::clone(&searches);
        let stopped = Arc::clone(&stop);
        thread::spawn(move || {
            let mut buf = [0u8; 2048];
            while !stopped.load(Ordering::Relaxed) {
                let Ok((n, from)) = socket.recv_from(&mut buf) else {
                    continue;
                };
                let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                let target = search_target(&request).unwrap_or_default();
                recorded.lock().unwrap().push(request);

                for reply in replies.iter().filter(|r| r.answers == target) {
                    for _ in 0..reply.repeat {
                        let _ = socket.send_to(reply.datagram.as_bytes(), from);
                    }
                }
            }
        });

        Self {
            addr,
            searches,
            stop,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

impl Drop for SsdpFixture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn search_target(request: &str) -> Option<String> {
    request.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("st")
            .then(|| value.trim().to_string())
    })
}
