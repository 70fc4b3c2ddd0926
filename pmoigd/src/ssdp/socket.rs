/*!
The discovery socket is a *control point* socket.
It must **not** bind to UDP port 1900.

Gateways answer an `M-SEARCH` with unicast HTTP/200 replies sent back to the
source address of the query, so an ephemeral port is enough. Binding 1900
next to another SSDP stack on the same host would make the kernel spread
incoming datagrams between sockets and replies would be lost randomly.

The multicast group is still joined on every non-loopback IPv4 interface so
that gateways replying to the group address are heard too.
*/

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use super::SSDP_MULTICAST_ADDR;

/// Ouvre le socket UDP utilisé pour une passe de découverte vers `target`.
pub fn open_search_socket(target: SocketAddr) -> io::Result<UdpSocket> {
    let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket2.set_reuse_address(true)?;

    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
    socket2.bind(&bind_addr.into())?;

    let socket: UdpSocket = socket2.into();

    if target.ip().is_multicast() {
        socket.set_multicast_loop_v4(true)?;
        join_multicast_group(&socket);
    }

    Ok(socket)
}

fn join_multicast_group(socket: &UdpSocket) {
    let interfaces = match pmoutils::list_ipv4_interfaces() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("SSDP: failed to list network interfaces: {}", e);
            Vec::new()
        }
    };

    if interfaces.is_empty() {
        if let Err(e) = socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &Ipv4Addr::UNSPECIFIED) {
            warn!("SSDP: failed to join {} on default interface: {}", SSDP_MULTICAST_ADDR, e);
        }
        return;
    }

    for ipv4 in interfaces {
        match socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &ipv4) {
            Ok(()) => debug!("SSDP: joined {} on {}", SSDP_MULTICAST_ADDR, ipv4),
            Err(e) => warn!("SSDP: failed to join {} on {}: {}", SSDP_MULTICAST_ADDR, ipv4, e),
        }
    }
}
