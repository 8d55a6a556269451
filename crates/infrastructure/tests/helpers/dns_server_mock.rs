#![allow(dead_code)]
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tern_domain::wire;
use tern_domain::{Message, Record};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// Builds the datagrams (UDP) or the single reply (TCP) sent back for one
/// decoded request.
pub type Handler = Arc<dyn Fn(&Message) -> Vec<Vec<u8>> + Send + Sync>;

/// Loopback DNS server speaking the wire codec over UDP or TCP.
pub struct MockDnsServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn udp(handler: Handler) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        let Ok(request) = Message::from_bytes(&buf[..len]) else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        for datagram in handler(&request) {
                            let _ = socket.send_to(&datagram, peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Each accepted connection reads one length-prefixed request and writes
    /// back the handler's first buffer verbatim (callers add the prefix).
    pub async fn tcp(handler: Handler) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((mut stream, _)) = accepted else { continue };
                        let handler = Arc::clone(&handler);
                        let counter = Arc::clone(&counter);
                        tokio::spawn(async move {
                            let mut len = [0u8; 2];
                            if stream.read_exact(&mut len).await.is_err() {
                                return;
                            }
                            let mut body = vec![0u8; u16::from_be_bytes(len) as usize];
                            if stream.read_exact(&mut body).await.is_err() {
                                return;
                            }
                            let Ok(request) = Message::from_bytes(&body) else { return };
                            counter.fetch_add(1, Ordering::SeqCst);
                            if let Some(reply) = handler(&request).into_iter().next() {
                                let _ = stream.write_all(&reply).await;
                            }
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A response to `request` with the same id and question.
pub fn reply(request: &Message, answers: Vec<Record>) -> Message {
    let mut message = Message::response_for(request.questions[0].clone(), answers);
    message.header.id = request.id();
    message
}

pub fn datagram(message: &Message) -> Vec<u8> {
    wire::encode(message).unwrap()
}

pub fn framed(message: &Message) -> Vec<u8> {
    wire::encode_with_length_prefix(message).unwrap()
}
