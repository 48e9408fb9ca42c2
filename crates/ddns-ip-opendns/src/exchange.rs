//! DNS query/response exchange over UDP
//!
//! Builds a single-question query with `hickory-proto`, sends it on a
//! connected UDP socket and validates the response header. Answer records
//! are left to the caller.

use ddns_core::{Error, Result};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Default timeout for one query (send + receive)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends DNS questions and returns validated responses
#[derive(Debug, Clone, Copy)]
pub struct DnsExchange {
    timeout: Duration,
}

impl DnsExchange {
    /// Create an exchange with a per-query timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Ask `server` for `name`/`record_type` and return its response
    ///
    /// # Errors
    ///
    /// - `Error::NoIpv6Route`: `server` is IPv6 and the host has no route to
    ///   it, or no IPv6 support at all
    /// - `Error::Transport`: timeout, refusal or any other I/O failure;
    ///   also SERVFAIL/REFUSED answers
    /// - `Error::NoRecord`: the server answered NXDOMAIN
    /// - `Error::Protocol`: truncated response or an unexpected response code
    ///
    /// Datagrams that cannot be decoded or carry another query's id are
    /// skipped; the timeout bounds the wait for a valid answer.
    pub async fn query(
        &self,
        server: SocketAddr,
        name: &Name,
        record_type: RecordType,
    ) -> Result<Message> {
        let (id, request) = build_query(name, record_type)?;

        // Bind to ephemeral port of the server's family (0 = OS assigns)
        let bind_addr: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| bind_failure(server, e))?;

        // A connected socket surfaces ICMP errors (refused, unreachable)
        socket
            .connect(server)
            .await
            .map_err(|e| io_failure(server, "connect", e))?;

        let exchange = async {
            socket
                .send(&request)
                .await
                .map_err(|e| io_failure(server, "send", e))?;

            debug!("Sent {} query for {} to {} (id {})", record_type, name, server, id);

            let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
            loop {
                let received = socket
                    .recv(&mut recv_buf)
                    .await
                    .map_err(|e| io_failure(server, "receive", e))?;

                let response = match Message::from_vec(&recv_buf[..received]) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("Ignoring undecodable datagram from {}: {}", server, e);
                        continue;
                    }
                };

                if response.id() != id {
                    warn!(
                        "Ignoring DNS response with id {} from {} (expected {})",
                        response.id(),
                        server,
                        id
                    );
                    continue;
                }

                return Ok::<_, Error>(response);
            }
        };

        let response: Message = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "Timeout after {:?} waiting for {} response from {}",
                    self.timeout, record_type, server
                ))
            })??;

        check_response(&response, server)?;

        debug!(
            "Received {} answer(s) for {} from {}",
            response.answers().len(),
            name,
            server
        );

        Ok(response)
    }
}

/// Build a recursive single-question query and serialize it to wire format
fn build_query(name: &Name, record_type: RecordType) -> Result<(u16, Vec<u8>)> {
    let id = fastrand::u16(..);

    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(name.clone(), record_type));

    let bytes = message.to_bytes().map_err(|e| {
        Error::protocol(format!("Failed to serialize DNS query for {}: {}", name, e))
    })?;

    Ok((id, bytes))
}

/// Validate the response header before its answers are used
fn check_response(response: &Message, server: SocketAddr) -> Result<()> {
    if response.message_type() != MessageType::Response {
        return Err(Error::protocol(format!(
            "{} sent a query instead of a response",
            server
        )));
    }

    if response.truncated() {
        return Err(Error::protocol(format!("Truncated DNS response from {}", server)));
    }

    match response.response_code() {
        ResponseCode::NoError => Ok(()),
        ResponseCode::NXDomain => Err(Error::no_record(format!(
            "{} answered NXDOMAIN",
            server
        ))),
        code @ (ResponseCode::ServFail | ResponseCode::Refused) => Err(Error::transport(
            format!("{} answered {}", server, code),
        )),
        code => Err(Error::protocol(format!(
            "Unexpected response code {} from {}",
            code, server
        ))),
    }
}

/// Whether an I/O error means the destination cannot be routed to
pub(crate) fn is_no_route(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::NetworkDown
            | io::ErrorKind::AddrNotAvailable
    )
}

/// Whether an I/O error means the address family is not supported
fn is_family_unsupported(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Unsupported || e.raw_os_error() == Some(libc::EAFNOSUPPORT)
}

/// An IPv6 socket that cannot even be bound means the host has no IPv6
fn bind_failure(server: SocketAddr, e: io::Error) -> Error {
    if server.is_ipv6() && is_family_unsupported(&e) {
        return Error::no_ipv6_route(format!("IPv6 is not supported on this host: {}", e));
    }

    io_failure(server, "bind", e)
}

/// Map a socket failure to the error the caller can act on
fn io_failure(server: SocketAddr, operation: &str, e: io::Error) -> Error {
    if server.is_ipv6() && is_no_route(&e) {
        return Error::no_ipv6_route(format!("{} {}: {}", operation, server, e));
    }

    Error::transport(format!("Failed to {} {}: {}", operation, server, e))
}
