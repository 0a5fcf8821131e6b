//! End-to-end tests over loopback sockets.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use gatehouse::http::client::Client;
use gatehouse::http::dispatch::{Handler, ResponseBranch, Settings};
use gatehouse::http::headers::HeaderRegistry;
use gatehouse::http::mime::{MimeRegistration, MimeRegistry};
use gatehouse::http::request::{Method, Request, RequestBuilder};
use gatehouse::http::response::{Response, ResponseBuilder, StatusCode};
use gatehouse::http::transport::Transport;
use gatehouse::server::{listener, ServerContext};

struct Echo;

impl Handler for Echo {
    fn on_request(&self, req: &mut Request, out: &mut dyn Transport) {
        let response = if req.path == "/switch" {
            ResponseBuilder::new(StatusCode::SwitchingProtocols)
                .header("upgrade", "websocket")
                .header("connection", "upgrade")
                .build()
        } else {
            let mut response = Response::ok(format!("path={}", req.path));
            if !req.keep_alive() {
                response.headers.insert("connection".to_string(), "close".to_string());
            }
            response
        };
        out.send(response).unwrap();
    }
}

async fn start(settings: Settings) -> SocketAddr {
    let headers = Arc::new(HeaderRegistry::new());
    let mime = Arc::new(MimeRegistry::with_registration(MimeRegistration::Minimal));
    let ctx = Arc::new(ServerContext::new(settings, headers, mime));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener::serve(listener, ctx));
    addr
}

async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    String::from_utf8(received).unwrap()
}

#[tokio::test]
async fn test_pipelined_requests_share_connection() {
    let addr = start(Settings::new(Arc::new(Echo))).await;

    let raw = "GET /a HTTP/1.1\r\nHost: x\r\n\r\n\
               GET /b HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n";
    let received = roundtrip(addr, raw).await;

    let first = received.find("path=/a").unwrap();
    let second = received.find("path=/b").unwrap();
    assert!(first < second);
    assert_eq!(received.matches("HTTP/1.1 200 OK").count(), 2);
}

#[tokio::test]
async fn test_missing_host_is_answered_with_400() {
    let addr = start(Settings::new(Arc::new(Echo))).await;

    let received = roundtrip(addr, "GET / HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(received.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(received.ends_with("400 Bad Request"));
    assert!(!received.contains("path="));
}

#[tokio::test]
async fn test_malformed_request_closes_connection() {
    let addr = start(Settings::new(Arc::new(Echo))).await;

    // read_to_end only returns because the server closes its side.
    let received = roundtrip(addr, "NONSENSE\r\n\r\n").await;

    assert!(received.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(received.contains("connection: close\r\n"));
}

#[tokio::test]
async fn test_oversized_body_is_refused_with_413() {
    let addr = start(Settings::new(Arc::new(Echo))).await;

    let raw = "POST /upload HTTP/1.1\r\nHost: x\r\nContent-Length: 1000000000000\r\n\r\n";
    let received = roundtrip(addr, raw).await;

    assert!(received.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    assert!(received.contains("connection: close\r\n"));
    assert!(!received.contains("path="));
}

#[tokio::test]
async fn test_h2c_upgrade_refused() {
    let addr = start(Settings::new(Arc::new(Echo))).await;

    let raw = "GET / HTTP/1.1\r\nHost: x\r\nUpgrade: h2c\r\nConnection: close\r\n\r\n";
    let received = roundtrip(addr, raw).await;

    assert!(received.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_public_folder_served_before_application() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "from disk").unwrap();
    let settings = Settings::new(Arc::new(Echo)).with_public_folder(dir.path());
    let addr = start(settings).await;

    let raw = "GET /hello.txt HTTP/1.1\r\nHost: x\r\n\r\n\
               GET /nothing.txt HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n";
    let received = roundtrip(addr, raw).await;

    assert!(received.contains("content-type: text/plain\r\n"));
    assert!(received.contains("from disk"));
    assert!(received.contains("path=/nothing.txt"));
}

#[test]
fn test_shutdown_empties_mime_table() {
    let mime = Arc::new(MimeRegistry::with_registration(MimeRegistration::Minimal));
    let ctx = ServerContext::new(
        Settings::new(Arc::new(Echo)),
        Arc::new(HeaderRegistry::new()),
        Arc::clone(&mime),
    );
    assert!(mime.stats().entries > 0);

    ctx.shutdown();

    assert_eq!(mime.stats().entries, 0);
    assert!(mime.lookup("html").is_none());
}

#[derive(Default)]
struct Recorder {
    responses: Mutex<Vec<u16>>,
    upgrades: Mutex<Vec<String>>,
}

impl Handler for Recorder {
    fn on_request(&self, _req: &mut Request, _out: &mut dyn Transport) {}

    fn on_response(&self, res: &mut Request) {
        let status = res.status.map(|s| s.as_u16()).unwrap_or_default();
        self.responses.lock().unwrap().push(status);
    }

    fn on_upgrade(&self, _res: &mut Request, protocol: &[u8], _out: &mut dyn Transport) {
        self.upgrades
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(protocol).into_owned());
    }
}

fn client(recorder: &Arc<Recorder>) -> Client {
    let settings = Settings::new(recorder.clone());
    Client::new(Arc::new(HeaderRegistry::new()), settings)
}

fn get() -> Request {
    RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .header("Connection", "close")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_client_response_reaches_on_response() {
    let addr = start(Settings::new(Arc::new(Echo))).await;
    let recorder = Arc::new(Recorder::default());
    let url = url::Url::parse(&format!("http://{}/greet?name=x", addr)).unwrap();

    let exchange = client(&recorder).exchange(&url, get()).await.unwrap();

    assert_eq!(exchange.branch, ResponseBranch::Response);
    assert_eq!(exchange.response.status, Some(StatusCode::Ok));
    assert_eq!(exchange.response.body, b"path=/greet?name=x".to_vec());
    assert_eq!(*recorder.responses.lock().unwrap(), vec![200]);
    assert!(recorder.upgrades.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_client_upgrade_response_reaches_on_upgrade() {
    let addr = start(Settings::new(Arc::new(Echo))).await;
    let recorder = Arc::new(Recorder::default());
    let url = url::Url::parse(&format!("http://{}/switch", addr)).unwrap();

    let exchange = client(&recorder).exchange(&url, get()).await.unwrap();

    assert_eq!(exchange.branch, ResponseBranch::Upgrade);
    assert_eq!(exchange.response.status, Some(StatusCode::SwitchingProtocols));
    assert_eq!(*recorder.upgrades.lock().unwrap(), vec!["websocket".to_string()]);
    assert!(recorder.responses.lock().unwrap().is_empty());
}
