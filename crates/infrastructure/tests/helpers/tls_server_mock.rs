#![allow(dead_code)]
//! Loopback DoT, DoH, DoH3 and DoQ servers backed by a self-signed
//! certificate for [`TEST_SERVER_NAME`].

use super::dns_server_mock::{echo_response, serve_framed, ResponseMode};
use bytes::{Buf, Bytes, BytesMut};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method, Response, StatusCode, Uri, Version};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use quinn::crypto::rustls::QuicServerConfig;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

/// Name on the test certificate. It does not resolve, so any client that
/// reaches the server must have used the configured address.
pub const TEST_SERVER_NAME: &str = "dns.example.test";

const DNS_MESSAGE: &str = "application/dns-message";

pub fn server_tls_config(alpn: &[&[u8]]) -> Arc<rustls::ServerConfig> {
    let certified = rcgen::generate_simple_self_signed(vec![TEST_SERVER_NAME.to_string()])
        .expect("self-signed certificate");
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        certified.key_pair.serialize_der(),
    ));

    let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_protocol_versions(&[&rustls::version::TLS13])
    .expect("TLS 1.3 supported")
    .with_no_client_auth()
    .with_single_cert(vec![certified.cert.der().clone()], key)
    .expect("server certificate");

    config.alpn_protocols = alpn.iter().map(|proto| proto.to_vec()).collect();
    Arc::new(config)
}

fn message_id(message: &[u8]) -> Option<u16> {
    message.get(..2).map(|id| u16::from_be_bytes([id[0], id[1]]))
}

// ── DoT ────────────────────────────────────────────────────────────────────

pub struct MockDotServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDotServer {
    pub async fn start(mode: ResponseMode) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let acceptor = TlsAcceptor::from(server_tls_config(&[]));
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        let acceptor = acceptor.clone();
                        tokio::spawn(async move {
                            if let Ok(tls) = acceptor.accept(stream).await {
                                serve_framed(tls, mode).await;
                            }
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockDotServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// ── DoH (HTTP/2) and DoH3 (HTTP/3) ─────────────────────────────────────────

/// What a DoH or DoH3 server saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub version: Version,
    pub authority: Option<String>,
    pub path: String,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub message_id: Option<u16>,
}

impl SeenRequest {
    fn new(method: &Method, uri: &Uri, version: Version, headers: &HeaderMap, body: &[u8]) -> Self {
        let header = |name: http::header::HeaderName| {
            headers
                .get(name)
                .and_then(|value: &http::HeaderValue| value.to_str().ok())
                .map(str::to_string)
        };

        Self {
            method: method.clone(),
            version,
            authority: uri.authority().map(|a| a.to_string()),
            path: uri.path().to_string(),
            content_type: header(CONTENT_TYPE),
            accept: header(ACCEPT),
            message_id: message_id(body),
        }
    }
}

type SeenLog = Arc<Mutex<Vec<SeenRequest>>>;

async fn answer_http(
    request: hyper::Request<Incoming>,
    mode: ResponseMode,
    seen: SeenLog,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = request.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    seen.lock().unwrap().push(SeenRequest::new(
        &parts.method,
        &parts.uri,
        parts.version,
        &parts.headers,
        &body,
    ));

    let response = match mode {
        ResponseMode::Silent => std::future::pending().await,
        ResponseMode::Status(code) => Response::builder()
            .status(code)
            .body(Full::new(Bytes::new()))
            .unwrap(),
        _ => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, DNS_MESSAGE)
            .body(Full::new(Bytes::from(echo_response(&body, mode))))
            .unwrap(),
    };
    Ok(response)
}

pub struct MockDohServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    seen: SeenLog,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDohServer {
    pub async fn start(mode: ResponseMode) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let acceptor = TlsAcceptor::from(server_tls_config(&[b"h2"]));
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        let seen: SeenLog = Arc::default();
        let log = Arc::clone(&seen);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        let acceptor = acceptor.clone();
                        let log = Arc::clone(&log);
                        tokio::spawn(async move {
                            let Ok(tls) = acceptor.accept(stream).await else { return };
                            let service = service_fn(move |request| {
                                answer_http(request, mode, Arc::clone(&log))
                            });
                            let _ = auto::Builder::new(TokioExecutor::new())
                                .serve_connection(TokioIo::new(tls), service)
                                .await;
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            seen,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockDohServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn quic_endpoint(alpn: &[u8]) -> Result<quinn::Endpoint, std::io::Error> {
    let crypto = QuicServerConfig::try_from(server_tls_config(&[alpn]))
        .expect("QUIC-compatible TLS config");
    let config = quinn::ServerConfig::with_crypto(Arc::new(crypto));
    quinn::Endpoint::server(config, SocketAddr::from(([127, 0, 0, 1], 0)))
}

pub struct MockDoh3Server {
    endpoint: quinn::Endpoint,
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    seen: SeenLog,
}

impl MockDoh3Server {
    pub async fn start(mode: ResponseMode) -> Result<Self, std::io::Error> {
        let endpoint = quic_endpoint(b"h3")?;
        let addr = endpoint.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        let seen: SeenLog = Arc::default();
        let log = Arc::clone(&seen);

        let accepting = endpoint.clone();
        tokio::spawn(async move {
            while let Some(incoming) = accepting.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(Self::serve(incoming, mode, Arc::clone(&log)));
            }
        });

        Ok(Self {
            endpoint,
            addr,
            connections,
            seen,
        })
    }

    async fn serve(incoming: quinn::Incoming, mode: ResponseMode, seen: SeenLog) {
        let Ok(conn) = incoming.await else { return };
        let Ok(mut h3_conn) =
            h3::server::Connection::<h3_quinn::Connection, Bytes>::new(h3_quinn::Connection::new(
                conn,
            ))
            .await
        else {
            return;
        };

        while let Ok(Some(resolver)) = h3_conn.accept().await {
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                let Ok((request, mut stream)) = resolver.resolve_request().await else {
                    return;
                };

                let mut body = BytesMut::new();
                while let Ok(Some(mut chunk)) = stream.recv_data().await {
                    body.extend_from_slice(chunk.chunk());
                    chunk.advance(chunk.remaining());
                }
                seen.lock().unwrap().push(SeenRequest::new(
                    request.method(),
                    request.uri(),
                    request.version(),
                    request.headers(),
                    &body,
                ));

                let (status, payload) = match mode {
                    ResponseMode::Silent => std::future::pending().await,
                    ResponseMode::Status(code) => (code, Bytes::new()),
                    _ => (200, Bytes::from(echo_response(&body, mode))),
                };

                let response = Response::builder()
                    .status(status)
                    .header(CONTENT_TYPE, DNS_MESSAGE)
                    .body(())
                    .unwrap();
                if stream.send_response(response).await.is_err() {
                    return;
                }
                if !payload.is_empty() {
                    let _ = stream.send_data(payload).await;
                }
                let _ = stream.finish().await;
            });
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// QUIC connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockDoh3Server {
    fn drop(&mut self) {
        self.endpoint.close(0u32.into(), b"");
    }
}

// ── DoQ ────────────────────────────────────────────────────────────────────

/// What a DoQ server saw on one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenDoqQuery {
    /// Value of the 2-byte length prefix.
    pub prefix_len: usize,
    /// Bytes that followed the prefix before the stream ended.
    pub body_len: usize,
    pub message_id: Option<u16>,
    /// Client half-closed its send side right after the message.
    pub finished: bool,
}

pub struct MockDoqServer {
    endpoint: quinn::Endpoint,
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenDoqQuery>>>,
}

impl MockDoqServer {
    pub async fn start(mode: ResponseMode) -> Result<Self, std::io::Error> {
        let endpoint = quic_endpoint(b"doq")?;
        let addr = endpoint.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let accepting = endpoint.clone();
        tokio::spawn(async move {
            while let Some(incoming) = accepting.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(Self::serve(incoming, mode, Arc::clone(&log)));
            }
        });

        Ok(Self {
            endpoint,
            addr,
            connections,
            seen,
        })
    }

    async fn serve(
        incoming: quinn::Incoming,
        mode: ResponseMode,
        seen: Arc<Mutex<Vec<SeenDoqQuery>>>,
    ) {
        let Ok(conn) = incoming.await else { return };

        while let Ok((mut send, mut recv)) = conn.accept_bi().await {
            let mut len_buf = [0u8; 2];
            if recv.read_exact(&mut len_buf).await.is_err() {
                break;
            }
            let prefix_len = u16::from_be_bytes(len_buf) as usize;
            let mut query = vec![0u8; prefix_len];
            if recv.read_exact(&mut query).await.is_err() {
                break;
            }
            let trailing = recv.read_to_end(usize::from(u16::MAX)).await;

            seen.lock().unwrap().push(SeenDoqQuery {
                prefix_len,
                body_len: query.len() + trailing.as_ref().map_or(0, Vec::len),
                message_id: message_id(&query),
                finished: trailing.is_ok(),
            });

            if mode == ResponseMode::Silent {
                // Holding `send` keeps the stream open without an answer.
                conn.closed().await;
                drop(send);
                return;
            }

            let response = echo_response(&query, mode);
            let mut frame = (response.len() as u16).to_be_bytes().to_vec();
            frame.extend_from_slice(&response);
            let _ = send.write_all(&frame).await;
            let _ = send.finish();
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<SeenDoqQuery> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockDoqServer {
    fn drop(&mut self) {
        self.endpoint.close(0u32.into(), b"");
    }
}
