mod common;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::Duration;

use common::{blocking, body, external_ip_response, header, requests_to, upnp_fault, xml_response};
use pmoigd::{Igd, IgdError, IgdService, Protocol, SoapClient};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAN_IP_V1: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";

fn service_at(base: &str, path: &str, id: &str) -> IgdService {
    IgdService::new(
        id.to_string(),
        Url::parse(&format!("{}{}", base, path)).unwrap(),
        WAN_IP_V1.to_string(),
    )
}

fn service(server: &MockServer, path: &str, id: &str) -> IgdService {
    service_at(&server.uri(), path, id)
}

fn gateway(server: &MockServer, services: Vec<IgdService>) -> Igd {
    Igd::new(
        "2fac1234-31f8-11b4-a222-08002b34c003".to_string(),
        "Test Gateway".to_string(),
        Url::parse(&format!("{}/rootDesc.xml", server.uri())).unwrap(),
        "192.168.1.20".to_string(),
        services,
    )
}

async fn mount(server: &MockServer, control_path: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(control_path))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Répond une seule fois avec un statut et un `Content-Length` plus grand
/// que le corps réellement envoyé, puis ferme la connexion.
fn truncated_responder(status_line: &'static str, declared: usize, sent: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else { return };
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();

        // Lire toute la requête avant de répondre
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !String::from_utf8_lossy(&request).contains("</s:Envelope>") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line, declared, sent
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });

    addr
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_port_mapping_request() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/IPConn", ResponseTemplate::new(200)).await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1")
        .with_client(SoapClient::new("TestAgent/1.0", false));
    blocking(move || {
        service.add_port_mapping("192.168.1.20", Protocol::Udp, 6881, 16881, "pmoigd test", 3600)
    })
    .await
    .unwrap();

    let requests = requests_to(&server, "POST").await;
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.url.path(), "/ctl/IPConn");
    assert_eq!(
        header(request, "soapaction"),
        Some(r#""urn:schemas-upnp-org:service:WANIPConnection:1#AddPortMapping""#)
    );
    assert_eq!(
        header(request, "content-type"),
        Some(r#"text/xml; charset="utf-8""#)
    );
    assert_eq!(header(request, "user-agent"), Some("TestAgent/1.0"));
    assert_eq!(header(request, "cache-control"), Some("no-cache"));
    assert_eq!(header(request, "pragma"), Some("no-cache"));

    let body = body(request);
    assert!(body.contains("<u:AddPortMapping"));
    assert!(body.contains("<NewExternalPort>6881</NewExternalPort>"));
    assert!(body.contains("<NewProtocol>UDP</NewProtocol>"));
    assert!(body.contains("<NewInternalPort>16881</NewInternalPort>"));
    assert!(body.contains("<NewInternalClient>192.168.1.20</NewInternalClient>"));
    assert!(body.contains("<NewEnabled>1</NewEnabled>"));
    assert!(body.contains("<NewPortMappingDescription>pmoigd test</NewPortMappingDescription>"));
    assert!(body.contains("<NewLeaseDuration>3600</NewLeaseDuration>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_port_mapping_server_error() {
    let server = MockServer::start().await;
    // Pas de nouvelle tentative
    Mock::given(method("POST"))
        .and(path("/ctl/IPConn"))
        .respond_with(xml_response(500, upnp_fault(718, "ConflictInMappingEntry")))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1");
    let err = blocking(move || {
        service.add_port_mapping("192.168.1.20", Protocol::Tcp, 80, 8080, "web", 0)
    })
    .await
    .unwrap_err();

    match &err {
        IgdError::Action {
            action,
            status,
            body,
        } => {
            assert_eq!(action, "AddPortMapping");
            assert_eq!(status, "500 Internal Server Error");
            assert!(body.contains("ConflictInMappingEntry"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_remote_action());
    assert_eq!(err.to_string(), "AddPortMapping: 500 Internal Server Error");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_port_mapping_server_error() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/IPConn", xml_response(500, "Internal Server Error")).await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1");
    let err = blocking(move || service.delete_port_mapping(Protocol::Tcp, 80))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "DeletePortMapping: 500 Internal Server Error");

    let requests = requests_to(&server, "POST").await;
    assert_eq!(requests.len(), 1);
    assert!(body(&requests[0]).contains("<NewExternalPort>80</NewExternalPort>"));
    assert!(body(&requests[0]).contains("<NewProtocol>TCP</NewProtocol>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_truncated_error_body_still_reports_status() {
    // 500 annonçant 500 octets, 12 seulement envoyés
    let addr = truncated_responder("500 Internal Server Error", 500, "<s:Envelope>");
    let service = service_at(&format!("http://{}", addr), "/ctl/IPConn", "truncated");

    let err = blocking(move || {
        service.add_port_mapping("192.168.1.20", Protocol::Tcp, 80, 8080, "web", 0)
    })
    .await
    .unwrap_err();

    assert!(err.is_remote_action(), "unexpected error: {:?}", err);
    match &err {
        IgdError::Action { action, status, .. } => {
            assert_eq!(action, "AddPortMapping");
            assert_eq!(status, "500 Internal Server Error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_truncated_success_body_is_a_transport_error() {
    let addr = truncated_responder("200 OK", 500, "<s:Envelope>");
    let service = service_at(&format!("http://{}", addr), "/ctl/IPConn", "truncated");

    let err = blocking(move || service.delete_port_mapping(Protocol::Udp, 53))
        .await
        .unwrap_err();
    assert!(matches!(err, IgdError::Http(_)), "unexpected error: {:?}", err);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_external_ip_address() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/IPConn", xml_response(200, external_ip_response("203.0.113.7"))).await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1");
    let ip = blocking(move || service.get_external_ip_address())
        .await
        .unwrap();
    assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));

    let requests = requests_to(&server, "POST").await;
    assert_eq!(
        header(&requests[0], "soapaction"),
        Some(r#""urn:schemas-upnp-org:service:WANIPConnection:1#GetExternalIPAddress""#)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_external_ip_address_empty() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/IPConn", xml_response(200, external_ip_response(""))).await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1");
    let ip = blocking(move || service.get_external_ip_address()).await;
    assert_eq!(ip.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_external_ip_address_invalid() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/IPConn", xml_response(200, external_ip_response("not-an-ip"))).await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1");
    let ip = blocking(move || service.get_external_ip_address()).await;
    assert_eq!(ip.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_external_ip_address_server_error() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/IPConn", xml_response(500, upnp_fault(501, "ActionFailed"))).await;

    let service = service(&server, "/ctl/IPConn", "urn:upnp-org:serviceId:WANIPConn1");
    let err = blocking(move || service.get_external_ip_address())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "GetExternalIPAddress: 500 Internal Server Error");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_igd_fan_out_stops_at_first_failure() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/first", xml_response(500, upnp_fault(718, "ConflictInMappingEntry"))).await;
    Mock::given(method("POST"))
        .and(path("/ctl/second"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let igd = gateway(
        &server,
        vec![
            service(&server, "/ctl/first", "first"),
            service(&server, "/ctl/second", "second"),
        ],
    );
    let err = blocking(move || igd.add_port_mapping(Protocol::Tcp, 6881, 6881, "fan-out", 0))
        .await
        .unwrap_err();
    assert!(err.is_remote_action());

    let paths: Vec<String> = requests_to(&server, "POST")
        .await
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/ctl/first".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_igd_fan_out_uses_local_ip() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/first", ResponseTemplate::new(200)).await;
    mount(&server, "/ctl/second", ResponseTemplate::new(200)).await;

    let igd = gateway(
        &server,
        vec![
            service(&server, "/ctl/first", "first"),
            service(&server, "/ctl/second", "second"),
        ],
    );
    blocking(move || {
        igd.add_port_mapping(Protocol::Tcp, 6881, 6881, "fan-out", 0)?;
        igd.delete_port_mapping(Protocol::Tcp, 6881)
    })
    .await
    .unwrap();

    let requests = requests_to(&server, "POST").await;
    assert_eq!(requests.len(), 4);
    assert!(body(&requests[0]).contains("<NewInternalClient>192.168.1.20</NewInternalClient>"));
    assert_eq!(requests[0].url.path(), "/ctl/first");
    assert_eq!(requests[1].url.path(), "/ctl/second");
    assert!(body(&requests[2]).contains("DeletePortMapping"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_igd_external_ip_first_valid_wins() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/broken", xml_response(500, "oops")).await;
    mount(&server, "/ctl/empty", xml_response(200, external_ip_response(""))).await;
    mount(&server, "/ctl/ok", xml_response(200, external_ip_response("198.51.100.4"))).await;

    let igd = gateway(
        &server,
        vec![
            service(&server, "/ctl/broken", "broken"),
            service(&server, "/ctl/empty", "empty"),
            service(&server, "/ctl/ok", "ok"),
        ],
    );
    let ip = blocking(move || igd.get_external_ip_address()).await.unwrap();
    assert_eq!(ip, Some("198.51.100.4".parse().unwrap()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_igd_external_ip_all_failed() {
    let server = MockServer::start().await;
    mount(&server, "/ctl/broken", xml_response(500, "oops")).await;

    let igd = gateway(&server, vec![service(&server, "/ctl/broken", "broken")]);
    assert!(blocking(move || igd.get_external_ip_address()).await.is_err());
}
