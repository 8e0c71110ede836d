use std::{net::SocketAddr, sync::Arc};

use crate::{
    content::model::RawParams,
    foundation::error::{OgError, OgResult},
    pipeline::OgImageService,
};

/// Transport-independent HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpReply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".to_owned(),
                "text/plain; charset=utf-8".to_owned(),
            )],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Route one request. `url` is the request target (path plus optional query).
#[tracing::instrument(level = "debug", skip(service))]
pub async fn handle(service: &OgImageService, method: &str, url: &str) -> HttpReply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    if !matches!(method, "GET" | "HEAD") {
        let mut reply = HttpReply::text(405, "Method Not Allowed");
        reply
            .headers
            .push(("Allow".to_owned(), "GET, HEAD".to_owned()));
        return reply;
    }

    match path {
        "/health" => HttpReply::text(200, "OK"),
        "/og" => {
            let params = RawParams::from_query(query);
            match service.generate(&params).await {
                Ok(img) => HttpReply {
                    status: 200,
                    headers: vec![
                        ("Content-Type".to_owned(), img.mime_type.to_owned()),
                        (
                            "Cache-Control".to_owned(),
                            format!("public, max-age={}", service.cache_max_age_secs()),
                        ),
                    ],
                    body: img.bytes,
                },
                Err(err) => {
                    tracing::error!(error = %err, "image generation failed");
                    HttpReply::text(500, "Failed to generate image")
                }
            }
        }
        _ => HttpReply::text(404, "Not Found"),
    }
}

/// Blocking `tiny_http` front end that hands each request to a tokio runtime.
pub struct OgServer {
    http: Arc<tiny_http::Server>,
    service: Arc<OgImageService>,
}

impl std::fmt::Debug for OgServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OgServer")
            .field("addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

impl OgServer {
    pub fn bind(addr: SocketAddr, service: Arc<OgImageService>) -> OgResult<Self> {
        let http = tiny_http::Server::http(addr)
            .map_err(|e| OgError::validation(format!("bind {addr}: {e}")))?;
        Ok(Self {
            http: Arc::new(http),
            service,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Stop a running [`OgServer::run`] loop from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.http))
    }

    /// Accept requests until shut down. Blocks the calling thread.
    pub fn run(&self, runtime: tokio::runtime::Handle) {
        tracing::info!(addr = ?self.local_addr(), "listening");
        for request in self.http.incoming_requests() {
            let service = Arc::clone(&self.service);
            runtime.spawn(async move {
                let method = request.method().as_str().to_owned();
                let url = request.url().to_owned();
                let reply = handle(&service, &method, &url).await;
                let status = reply.status;
                // Socket writes block on slow clients; keep them off the async workers.
                let written =
                    tokio::task::spawn_blocking(move || request.respond(to_response(reply))).await;
                match written {
                    Ok(Ok(())) => tracing::info!(%method, %url, status, "request served"),
                    Ok(Err(err)) => tracing::warn!(error = %err, "failed to write response"),
                    Err(err) => tracing::warn!(error = %err, "response writer failed"),
                }
            });
        }
        tracing::info!("server stopped");
    }
}

/// Unblocks the accept loop of the [`OgServer`] it came from.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<tiny_http::Server>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.unblock();
    }
}

fn to_response(reply: HttpReply) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut resp = tiny_http::Response::from_data(reply.body).with_status_code(reply.status);
    for (name, value) in &reply.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => resp.add_header(h),
            Err(()) => tracing::warn!(header = %name, "dropping malformed header"),
        }
    }
    resp
}

#[cfg(test)]
#[path = "../tests/unit/server.rs"]
mod tests;
