//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

use page_front::bundler::{BuildInput, Bundler, BundlerError, DevServerHandle, DevServerOptions};
use page_front::config::{ConfigBuilder, Mode, RuntimeConfig};
use page_front::routing::Route;

/// Start a programmable dev origin. The closure receives the request path
/// (with query) and returns the status and HTML body.
pub async fn start_dev_origin<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let path = read_request_path(&mut socket).await;
                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Dev origin that records every requested path and answers with `body`.
pub async fn start_recording_origin(body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let addr = start_dev_origin(move |path| {
        log.lock().unwrap().push(path);
        async move { (200, body.to_string()) }
    })
    .await;
    (addr, seen)
}

async fn read_request_path(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string()
}

/// A port nothing is listening on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Development config pointing at a dev origin on 127.0.0.1.
pub fn dev_config(port: u16, routes: Vec<Route>) -> RuntimeConfig {
    let mut builder = ConfigBuilder::new();
    builder.mode(Mode::Development).dev_port(port).register(routes).unwrap();
    let mut config = builder.build();
    config.dev.host = "127.0.0.1".to_string();
    config.dev.fetch_timeout_ms = 2_000;
    config
}

pub fn prod_config(routes: Vec<Route>) -> RuntimeConfig {
    let mut builder = ConfigBuilder::new();
    builder.mode(Mode::Production).register(routes).unwrap();
    builder.build()
}

/// Bundler stand-in: counts calls, and on build writes `files` into `out_dir`.
pub struct FakeBundler {
    pub out_dir: PathBuf,
    pub files: Vec<(&'static str, &'static str)>,
    pub builds: AtomicUsize,
    pub dev_starts: AtomicUsize,
    pub last_input: Mutex<Option<BuildInput>>,
}

impl FakeBundler {
    pub fn new(out_dir: PathBuf, files: Vec<(&'static str, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            out_dir,
            files,
            builds: AtomicUsize::new(0),
            dev_starts: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        })
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn dev_starts(&self) -> usize {
        self.dev_starts.load(Ordering::SeqCst)
    }

    pub fn write_files(&self) {
        for (relative, contents) in &self.files {
            let path = self.out_dir.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
    }
}

impl Bundler for FakeBundler {
    fn build<'a>(&'a self, input: &'a BuildInput) -> BoxFuture<'a, Result<(), BundlerError>> {
        Box::pin(async move {
            self.builds.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap() = Some(input.clone());
            self.write_files();
            Ok(())
        })
    }

    fn start_dev_server<'a>(
        &'a self,
        _options: &'a DevServerOptions,
        input: &'a BuildInput,
    ) -> BoxFuture<'a, Result<DevServerHandle, BundlerError>> {
        Box::pin(async move {
            self.dev_starts.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap() = Some(input.clone());
            Ok(DevServerHandle::detached())
        })
    }

    fn out_dir(&self) -> PathBuf {
        self.out_dir.clone()
    }
}

/// Send a GET through the router without a network listener.
pub async fn get(router: axum::Router, uri: &str) -> Response<Body> {
    send(router, Method::GET, uri).await
}

pub async fn send(router: axum::Router, method: Method, uri: &str) -> Response<Body> {
    router
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
