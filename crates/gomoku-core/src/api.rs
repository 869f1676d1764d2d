// HTTP client for the game server's REST endpoints: rooms, skin upload and
// the image gallery.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::message::{ImageInfo, RoomSummary};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("server returned an empty skin URL")]
    EmptyUrl,
}

/// Operations the client performs against the REST API.
///
/// The application talks to the server only through this trait so tests can
/// substitute an in-memory fake.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ApiError>;

    async fn create_room(&self, name: &str) -> Result<RoomSummary, ApiError>;

    /// Upload a skin image and return the URL the server stored it under.
    async fn upload_skin(&self, path: &Path) -> Result<String, ApiError>;

    async fn list_images(&self, username: &str) -> Result<Vec<ImageInfo>, ApiError>;

    async fn star_image(&self, id: i64) -> Result<(), ApiError>;

    async fn delete_image(&self, id: i64) -> Result<(), ApiError>;

    async fn upload_image(&self, username: &str, path: &Path) -> Result<(), ApiError>;

    async fn link_image(&self, username: &str, url: &str) -> Result<(), ApiError>;

    /// Whether `url` serves something that looks like an image.
    async fn probe_image(&self, url: &str) -> bool;
}

// ---------------------------------------------------------------------------
// HttpApi
// ---------------------------------------------------------------------------

/// `GameApi` backed by reqwest.
pub struct HttpApi {
    http: reqwest::Client,
    base: String,
}

impl HttpApi {
    pub fn new(server: &ServerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(server.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        HttpApi {
            http,
            base: server.http_base(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Resolve a skin URL the way a page served from the context root
    /// would: full URLs are kept, `/x` is relative to the server origin and
    /// `x` is relative to the context path.
    pub fn absolute(&self, url: &str) -> String {
        match reqwest::Url::parse(&format!("{}/", self.base)).and_then(|page| page.join(url)) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                debug!("cannot resolve skin URL {url:?}: {e}");
                url.to_string()
            }
        }
    }

    async fn send(&self, url: String, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        debug!("HTTP {url}");
        let resp = req.send().await.map_err(|source| ApiError::Request {
            url: url.clone(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }
        Ok(resp)
    }

    async fn json<T: serde::de::DeserializeOwned>(&self, url: String, req: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let resp = self.send(url.clone(), req).await?;
        resp.json::<T>()
            .await
            .map_err(|source| ApiError::Request { url, source })
    }
}

/// Build a single-file multipart part, guessing the MIME type from the
/// extension.
async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "skin".to_string());
    let part = Part::bytes(bytes).file_name(file_name);
    match mime_for(path) {
        Some(mime) => part.mime_str(mime).map_err(|source| ApiError::Request {
            url: path.display().to_string(),
            source,
        }),
        None => Ok(part),
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[async_trait]
impl GameApi for HttpApi {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ApiError> {
        let url = self.url("/api/rooms");
        self.json(url.clone(), self.http.get(&url)).await
    }

    async fn create_room(&self, name: &str) -> Result<RoomSummary, ApiError> {
        let url = self.url("/api/rooms");
        self.json(url.clone(), self.http.post(&url).query(&[("name", name)]))
            .await
    }

    async fn upload_skin(&self, path: &Path) -> Result<String, ApiError> {
        let url = self.url("/api/upload");
        let form = Form::new().part("file", file_part(path).await?);
        let resp = self.send(url.clone(), self.http.post(&url).multipart(form)).await?;
        let text = resp
            .text()
            .await
            .map_err(|source| ApiError::Request { url, source })?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ApiError::EmptyUrl);
        }
        Ok(trimmed.to_string())
    }

    async fn list_images(&self, username: &str) -> Result<Vec<ImageInfo>, ApiError> {
        let url = self.url("/api/images/list");
        self.json(url.clone(), self.http.get(&url).query(&[("username", username)]))
            .await
    }

    async fn star_image(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/images/{id}/star"));
        self.send(url.clone(), self.http.post(&url)).await.map(|_| ())
    }

    async fn delete_image(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/images/{id}"));
        self.send(url.clone(), self.http.delete(&url)).await.map(|_| ())
    }

    async fn upload_image(&self, username: &str, path: &Path) -> Result<(), ApiError> {
        let url = self.url("/api/images/upload");
        let form = Form::new()
            .text("username", username.to_string())
            .part("file", file_part(path).await?);
        self.send(url.clone(), self.http.post(&url).multipart(form))
            .await
            .map(|_| ())
    }

    async fn link_image(&self, username: &str, image_url: &str) -> Result<(), ApiError> {
        let url = self.url("/api/images/link");
        let req = self
            .http
            .post(&url)
            .query(&[("username", username), ("url", image_url)]);
        self.send(url.clone(), req).await.map(|_| ())
    }

    async fn probe_image(&self, url: &str) -> bool {
        let target = self.absolute(url);
        match self.http.get(&target).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with("image/")),
            Ok(resp) => {
                debug!("skin probe {target} returned {}", resp.status());
                false
            }
            Err(e) => {
                debug!("skin probe {target} failed: {e}");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn api_at(context_path: &str) -> HttpApi {
        HttpApi::new(&ServerConfig {
            base_url: "http://localhost:8080".into(),
            context_path: context_path.into(),
            ws_path: "/ws/websocket".into(),
            request_timeout_secs: 5,
        })
    }

    fn api() -> HttpApi {
        api_at("/Oh_Mock")
    }

    #[test]
    fn url_joins_context_path() {
        assert_eq!(api().url("/api/rooms"), "http://localhost:8080/Oh_Mock/api/rooms");
    }

    #[test]
    fn absolute_keeps_full_urls() {
        assert_eq!(api().absolute("https://cdn.example/a.png"), "https://cdn.example/a.png");
    }

    #[test]
    fn absolute_resolves_against_origin() {
        assert_eq!(
            api().absolute("/Oh_Mock/uploads/a.png"),
            "http://localhost:8080/Oh_Mock/uploads/a.png"
        );
        assert_eq!(api_at("").absolute("/uploads/a.png"), "http://localhost:8080/uploads/a.png");
    }

    #[test]
    fn absolute_resolves_bare_paths_under_context() {
        assert_eq!(
            api().absolute("uploads/a.png"),
            "http://localhost:8080/Oh_Mock/uploads/a.png"
        );
        assert_eq!(api_at("").absolute("uploads/a.png"), "http://localhost:8080/uploads/a.png");
        assert_eq!(api_at("/game/").absolute("uploads/a.png"), "http://localhost:8080/game/uploads/a.png");
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(mime_for(Path::new("cat.PNG")), Some("image/png"));
        assert_eq!(mime_for(Path::new("me.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("notes.txt")), None);
        assert_eq!(mime_for(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn upload_missing_file_is_file_error() {
        let err = api()
            .upload_skin(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::File { .. }));
    }
}
