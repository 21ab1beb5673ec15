//! Canned HTTP responses on a local port.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

/// A canned reply for requests whose path starts with `path`.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: &'static str,
    pub status: &'static str,
    pub body: String,
}

impl Route {
    pub fn new(path: &'static str, status: &'static str, body: impl Into<String>) -> Self {
        Self {
            path,
            status,
            body: body.into(),
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = vec![0u8; 16 * 1024];
    let n = stream.read(&mut buf).await.unwrap_or(0);
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Serves one response to the first connection. The receiver yields the raw
/// request.
pub async fn serve_once(status: &'static str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let _ = tx.send(request);
        respond(&mut stream, status, &body).await;
    });
    (format!("http://{addr}"), rx)
}

/// Serves every connection by matching the request path against `routes`
/// (first match wins, 404 otherwise). The receiver yields each request line.
pub async fn serve_routes(routes: Vec<Route>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let request = read_request(&mut stream).await;
            let request_line = request.lines().next().unwrap_or_default().to_string();
            let path = request_line.split_whitespace().nth(1).unwrap_or_default();
            match routes.iter().find(|r| path.starts_with(r.path)) {
                Some(route) => respond(&mut stream, route.status, &route.body).await,
                None => respond(&mut stream, "404 Not Found", "").await,
            }
            let _ = tx.send(request_line);
        }
    });
    (format!("http://{addr}"), rx)
}
