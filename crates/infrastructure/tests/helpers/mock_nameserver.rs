#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, NS, SOA};
use hickory_proto::rr::{Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

/// Which transport a query arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Udp,
    Tcp,
}

type Responder = Arc<dyn Fn(&Message, Leg) -> Option<Message> + Send + Sync>;

/// A localhost nameserver on UDP and TCP driven by a closure. Returning
/// `None` from the closure leaves the query unanswered.
pub struct MockNameserver {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<(Leg, Message)>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockNameserver {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Message, Leg) -> Option<Message> + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let listener = TcpListener::bind(addr).await.unwrap();

        let responder: Responder = Arc::new(responder);
        let received = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let log = Arc::clone(&received);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        let Ok(query) = Message::from_vec(&buf[..len]) else { continue };
                        log.lock().unwrap().push((Leg::Udp, query.clone()));
                        if let Some(reply) = responder(&query, Leg::Udp) {
                            let _ = socket.send_to(&encode(&reply), peer).await;
                        }
                    }
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let responder = Arc::clone(&responder);
                        let log = Arc::clone(&log);
                        tokio::spawn(serve_tcp(stream, responder, log));
                    }
                }
            }
        });

        Self {
            addr,
            received,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn received(&self) -> Vec<(Leg, Message)> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self, leg: Leg) -> usize {
        self.received().iter().filter(|(l, _)| *l == leg).count()
    }
}

impl Drop for MockNameserver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_tcp(
    mut stream: TcpStream,
    responder: Responder,
    log: Arc<Mutex<Vec<(Leg, Message)>>>,
) {
    let mut len_buf = [0u8; 2];
    if stream.read_exact(&mut len_buf).await.is_err() {
        return;
    }
    let mut body = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    if stream.read_exact(&mut body).await.is_err() {
        return;
    }
    let Ok(query) = Message::from_vec(&body) else {
        return;
    };
    log.lock().unwrap().push((Leg::Tcp, query.clone()));
    if let Some(reply) = responder(&query, Leg::Tcp) {
        let bytes = encode(&reply);
        let _ = stream.write_all(&(bytes.len() as u16).to_be_bytes()).await;
        let _ = stream.write_all(&bytes).await;
    }
}

fn encode(message: &Message) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

/// Empty response echoing the question.
pub fn reply_to(query: &Message) -> Message {
    let mut reply = Message::new(query.id(), MessageType::Response, query.op_code());
    reply.add_queries(query.queries().to_vec());
    reply
}

pub fn ns_record(zone: &str, host: &str) -> Record {
    Record::from_rdata(name(zone), 3600, RData::NS(NS(name(host))))
}

pub fn a_record(host: &str, ip: Ipv4Addr) -> Record {
    Record::from_rdata(name(host), 3600, RData::A(A(ip)))
}

pub fn aaaa_record(host: &str, ip: Ipv6Addr) -> Record {
    Record::from_rdata(name(host), 3600, RData::AAAA(AAAA(ip)))
}

pub fn soa_record(zone: &str) -> Record {
    let base = zone.trim_end_matches('.');
    let soa = SOA::new(
        name(&format!("ns1.{}.", base).replace("..", ".")),
        name(&format!("hostmaster.{}.", base).replace("..", ".")),
        1,
        3600,
        900,
        604800,
        300,
    );
    Record::from_rdata(name(zone), 300, RData::SOA(soa))
}

/// Non-authoritative referral to `zone` with optional glue.
pub fn referral(query: &Message, zone: &str, hosts: &[(&str, Option<Ipv4Addr>)]) -> Message {
    let mut reply = reply_to(query);
    for (host, glue) in hosts {
        reply.add_name_server(ns_record(zone, host));
        if let Some(ip) = glue {
            reply.add_additional(a_record(host, *ip));
        }
    }
    reply
}

/// Authoritative NS answer for the zone apex.
pub fn apex_answer(query: &Message, zone: &str, hosts: &[&str]) -> Message {
    let mut reply = reply_to(query);
    reply.set_authoritative(true);
    for host in hosts {
        reply.add_answer(ns_record(zone, host));
    }
    reply
}

pub fn nxdomain(query: &Message, zone: &str) -> Message {
    let mut reply = reply_to(query);
    reply.set_authoritative(true);
    reply.set_response_code(ResponseCode::NXDomain);
    reply.add_name_server(soa_record(zone));
    reply
}
