#![allow(dead_code)]

use std::{
    io::Cursor,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use tiny_http::{Header, Response, Server};

/// Local HTTP server standing in for avatar hosts.
///
/// Routes: `/avatar.png` (4x4 PNG), `/avatar.svg`, `/missing` (404), `/big` (body larger than
/// [`BIG_BODY`]), `/garbage` (200 with non-image bytes), `/wide.png` (small PNG whose width no
/// pixmap can hold), `/slow` (never answers in time).
pub struct FixtureServer {
    server: Arc<Server>,
    pub base: String,
    hits: Arc<AtomicUsize>,
}

pub const BIG_BODY: usize = 64 * 1024;

impl FixtureServer {
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let srv = Arc::clone(&server);
        let counter = Arc::clone(&hits);
        std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                counter.fetch_add(1, Ordering::SeqCst);
                let path = request.url().to_string();
                let response = match path.as_str() {
                    "/avatar.png" => bytes_response(avatar_png(), "image/png"),
                    "/avatar.svg" => bytes_response(AVATAR_SVG.to_vec(), "image/svg+xml"),
                    "/big" => bytes_response(vec![0u8; BIG_BODY + 1], "image/png"),
                    "/wide.png" => bytes_response(wide_png(), "image/png"),
                    "/garbage" => bytes_response(b"<html>nope</html>".to_vec(), "text/html"),
                    "/slow" => {
                        std::thread::sleep(std::time::Duration::from_millis(1500));
                        bytes_response(avatar_png(), "image/png")
                    }
                    _ => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            base: format!("http://{addr}"),
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

fn bytes_response(body: Vec<u8>, content_type: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(body).with_header(
        Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap(),
    )
}

pub const AVATAR_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><circle cx="8" cy="8" r="8" fill="#22c55e"/></svg>"##;

pub fn avatar_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 40, 40, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// 70000x1 PNG: a couple of KiB on the wire, wider than any `u16` pixmap.
pub fn wide_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(70_000, 1, image::Rgba([0, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Rasterizer fake that records every tree it is handed.
#[derive(Clone, Default)]
pub struct RecordingRasterizer {
    pub trees: Arc<Mutex<Vec<ogcard::LayoutNode>>>,
}

impl RecordingRasterizer {
    pub fn last(&self) -> ogcard::LayoutNode {
        self.trees.lock().unwrap().last().cloned().unwrap()
    }

    pub fn count(&self) -> usize {
        self.trees.lock().unwrap().len()
    }
}

impl ogcard::Rasterizer for RecordingRasterizer {
    fn render(
        &mut self,
        root: &ogcard::LayoutNode,
        canvas: ogcard::Canvas,
        _format: ogcard::OutputFormat,
    ) -> ogcard::OgResult<Vec<u8>> {
        ogcard::validate_tree(root, canvas)?;
        self.trees.lock().unwrap().push(root.clone());
        Ok(b"\x89PNG-fake".to_vec())
    }
}

pub fn config(max_bytes: u64) -> ogcard::ServiceConfig {
    let mut cfg = ogcard::ServiceConfig::default();
    cfg.avatar.timeout_ms = 1000;
    cfg.avatar.max_bytes = max_bytes;
    cfg
}
