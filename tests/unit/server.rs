use super::*;
use crate::{
    config::ServiceConfig,
    foundation::core::Canvas,
    layout::node::LayoutNode,
    render::{OutputFormat, Rasterizer},
};

struct Fixed(OgResult<Vec<u8>>);

impl Rasterizer for Fixed {
    fn render(&mut self, _: &LayoutNode, _: Canvas, _: OutputFormat) -> OgResult<Vec<u8>> {
        match &self.0 {
            Ok(b) => Ok(b.clone()),
            Err(e) => Err(OgError::render(e.to_string())),
        }
    }
}

fn service(out: OgResult<Vec<u8>>) -> OgImageService {
    OgImageService::new(&ServiceConfig::default(), Fixed(out)).unwrap()
}

#[tokio::test]
async fn og_route_returns_image_with_cache_header() {
    let svc = service(Ok(b"png-bytes".to_vec()));
    let reply = handle(&svc, "GET", "/og?title=Hi").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("image/png"));
    assert_eq!(reply.header("Cache-Control"), Some("public, max-age=60"));
    assert_eq!(reply.body, b"png-bytes");
}

#[tokio::test]
async fn health_route_says_ok() {
    let svc = service(Ok(Vec::new()));
    let reply = handle(&svc, "GET", "/health").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"OK");
    assert_eq!(
        reply.header("Content-Type"),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn unknown_path_is_404_and_bad_method_is_405() {
    let svc = service(Ok(Vec::new()));
    assert_eq!(handle(&svc, "GET", "/nope").await.status, 404);
    assert_eq!(handle(&svc, "GET", "/og/extra").await.status, 404);

    let reply = handle(&svc, "POST", "/og").await;
    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD"));
}

#[tokio::test]
async fn head_is_routed_like_get() {
    let svc = service(Ok(b"x".to_vec()));
    assert_eq!(handle(&svc, "HEAD", "/og").await.status, 200);
}

#[tokio::test]
async fn render_failure_is_500_without_image_bytes() {
    let svc = service(Err(OgError::render("boom")));
    let reply = handle(&svc, "GET", "/og").await;
    assert_eq!(reply.status, 500);
    assert_ne!(reply.header("Content-Type"), Some("image/png"));
    assert_eq!(reply.body, b"Failed to generate image");
}

#[test]
fn reply_headers_survive_conversion() {
    let reply = HttpReply::text(404, "Not Found");
    let resp = to_response(reply);
    assert_eq!(resp.status_code().0, 404);
    assert!(
        resp.headers()
            .iter()
            .any(|h| h.field.equiv("Content-Type"))
    );
}
