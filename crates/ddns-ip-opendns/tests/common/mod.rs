//! Loopback DNS server for echo resolver tests
//!
//! Answers each question with whatever the test's responder returns, so the
//! bootstrap and echo paths can be exercised without network access.

#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// How the fake server answers one question
#[derive(Debug, Clone)]
pub enum FakeAnswer {
    /// NOERROR with these answer records
    Records(Vec<RData>),
    /// NXDOMAIN
    NxDomain,
    /// No reply at all
    Silence,
    /// A datagram that is not a DNS message, then the inner answer
    GarbageFirst(Box<FakeAnswer>),
}

impl FakeAnswer {
    pub fn a(ip: Ipv4Addr) -> Self {
        FakeAnswer::Records(vec![RData::A(A(ip))])
    }

    pub fn aaaa(ip: Ipv6Addr) -> Self {
        FakeAnswer::Records(vec![RData::AAAA(AAAA(ip))])
    }

    pub fn empty() -> Self {
        FakeAnswer::Records(Vec::new())
    }

    /// Junk bytes before the real answer
    pub fn garbage_then(answer: FakeAnswer) -> Self {
        FakeAnswer::GarbageFirst(Box::new(answer))
    }

    /// An alias followed by an A record
    pub fn cname_then_a(target: &str, ip: Ipv4Addr) -> Self {
        FakeAnswer::Records(vec![
            RData::CNAME(CNAME(Name::from_str(target).unwrap())),
            RData::A(A(ip)),
        ])
    }
}

/// A UDP DNS server on 127.0.0.1 with an ephemeral port
pub struct FakeDnsServer {
    addr: SocketAddr,
    questions: Arc<Mutex<Vec<(String, RecordType)>>>,
    handle: JoinHandle<()>,
}

impl FakeDnsServer {
    /// Start serving; `responder` gets the question name (without the
    /// trailing dot) and type
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str, RecordType) -> FakeAnswer + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let questions = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&questions);

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                let Some(query) = request.queries().first().cloned() else {
                    continue;
                };

                let name = query.name().to_string();
                let name = name.trim_end_matches('.').to_string();
                seen.lock().unwrap().push((name.clone(), query.query_type()));

                let mut response = Message::new();
                response
                    .set_id(request.id())
                    .set_message_type(MessageType::Response)
                    .set_recursion_desired(true)
                    .set_recursion_available(true);
                response.add_query(query.clone());

                let mut answer = responder(&name, query.query_type());
                while let FakeAnswer::GarbageFirst(inner) = answer {
                    let _ = socket.send_to(&[0xde, 0xad, 0xbe], peer).await;
                    answer = *inner;
                }

                match answer {
                    FakeAnswer::Records(answers) => {
                        for rdata in answers {
                            response.add_answer(Record::from_rdata(
                                query.name().clone(),
                                0,
                                rdata,
                            ));
                        }
                    }
                    FakeAnswer::NxDomain => {
                        response.set_response_code(ResponseCode::NXDomain);
                    }
                    FakeAnswer::Silence => continue,
                    FakeAnswer::GarbageFirst(_) => unreachable!("unwrapped above"),
                }

                let bytes = response.to_bytes().unwrap();
                let _ = socket.send_to(&bytes, peer).await;
            }
        });

        Self {
            addr,
            questions,
            handle,
        }
    }

    /// Address to use as bootstrap resolver
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every question received so far, in order
    pub fn questions(&self) -> Vec<(String, RecordType)> {
        self.questions.lock().unwrap().clone()
    }
}

impl Drop for FakeDnsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A loopback port with nothing listening on it
pub fn closed_port() -> u16 {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

/// Echo resolver IPv4 address used across tests
pub fn resolver_v4() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}

/// Echo resolver IPv6 address used across tests
pub fn resolver_v6() -> Ipv6Addr {
    "2620:119:35::35".parse().unwrap()
}

/// Public IPv4 the fake echo resolver reports
pub fn public_v4() -> Ipv4Addr {
    Ipv4Addr::new(203, 0, 113, 5)
}
