use futures::future::{BoxFuture, FutureExt};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::{ImageHost, UploadError, UploadReceipt, UPLOAD_CONTENT_TYPE, UPLOAD_FILE_NAME};
use crate::config::UploadConfig;
use crate::state::data::ConvertedAsset;

/// Unsigned uploads to Cloudinary.
///
/// One multipart `POST` per upload, no retries, no auth header; the upload
/// preset must be configured as unsigned on the account.
#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    client: Client,
    config: UploadConfig,
}

/// Fields we read from Cloudinary's upload response
#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    format: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    bytes: Option<u64>,
    error: Option<CloudinaryError>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    message: String,
}

impl CloudinaryHost {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn post(
        client: Client,
        config: UploadConfig,
        asset: ConvertedAsset,
    ) -> Result<UploadReceipt, UploadError> {
        let data = tokio::fs::read(&asset.path)
            .await
            .map_err(|e| UploadError::Read {
                path: asset.path.clone(),
                source: e,
            })?;

        let file = Part::bytes(data)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_CONTENT_TYPE)?;
        let form = Form::new()
            .part("file", file)
            .text("upload_preset", config.upload_preset.clone())
            .text("cloud_name", config.cloud_name.clone());

        let url = config.upload_url();
        tracing::info!("☁️  Uploading {} ({}KB) to {}", asset.path.display(), asset.bytes / 1024, url);

        let response = client.post(&url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        // The status code is not checked on its own: the body decides
        let parsed: CloudinaryResponse = serde_json::from_slice(&body)
            .map_err(|source| UploadError::Json { status, source })?;

        match parsed.secure_url {
            Some(secure_url) => Ok(UploadReceipt {
                secure_url,
                public_id: parsed.public_id,
                format: parsed.format,
                width: parsed.width,
                height: parsed.height,
                bytes: parsed.bytes,
            }),
            None => Err(UploadError::MissingSecureUrl {
                status,
                message: parsed.error.map(|e| e.message),
            }),
        }
    }
}

impl ImageHost for CloudinaryHost {
    fn upload(&self, asset: ConvertedAsset) -> BoxFuture<'static, Result<UploadReceipt, UploadError>> {
        Self::post(self.client.clone(), self.config.clone(), asset).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer it with `status` and `body`, and hand
    /// back the raw request bytes
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (base, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&request, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|value| value.trim().parse::<usize>().unwrap());

        loop {
            let done = match content_length {
                Some(len) => request.len() >= header_end + len,
                None => request.ends_with(b"0\r\n\r\n"),
            };
            if done {
                break;
            }
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        request
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn converted(dir: &Path, data: &[u8]) -> ConvertedAsset {
        let path = dir.join("1-1.jpg");
        std::fs::write(&path, data).unwrap();
        ConvertedAsset {
            path,
            width: 4,
            height: 3,
            bytes: data.len() as u64,
        }
    }

    fn host(base: String) -> CloudinaryHost {
        CloudinaryHost::new(UploadConfig {
            api_base: base,
            ..UploadConfig::default()
        })
    }

    #[tokio::test]
    async fn test_successful_upload_returns_secure_url() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"secure_url":"https://res.cloudinary.com/dyxrfm7fh/image/upload/v1/x.jpg","public_id":"x","format":"jpg","width":4,"height":3,"bytes":15}"#,
        )
        .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let asset = converted(dir.path(), b"fake-jpeg-bytes");

        let receipt = host(base).upload(asset).await.unwrap();
        assert_eq!(
            receipt.secure_url,
            "https://res.cloudinary.com/dyxrfm7fh/image/upload/v1/x.jpg"
        );
        assert_eq!(receipt.public_id.as_deref(), Some("x"));
        assert_eq!(receipt.width, Some(4));
        assert_eq!(receipt.bytes, Some(15));

        let request = server.await.unwrap();
        let text = String::from_utf8_lossy(&request);
        assert!(text.starts_with("POST /v1_1/dyxrfm7fh/image/upload HTTP/1.1\r\n"));
        assert!(text.to_lowercase().contains("content-type: multipart/form-data; boundary="));
        assert!(!text.to_lowercase().contains("authorization:"));
        assert!(text.contains("name=\"file\"; filename=\"upload.jpg\""));
        assert!(text.contains("Content-Type: image/jpeg"));
        assert!(text.contains("fake-jpeg-bytes"));
        assert!(text.contains("name=\"upload_preset\"\r\n\r\nexpo-image-upload"));
        assert!(text.contains("name=\"cloud_name\"\r\n\r\ndyxrfm7fh"));
    }

    #[tokio::test]
    async fn test_error_body_without_secure_url() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"error":{"message":"Upload preset not found"}}"#,
        )
        .await;
        let dir = tempfile::tempdir().expect("tempdir");

        let err = host(base)
            .upload(converted(dir.path(), b"jpeg"))
            .await
            .unwrap_err();
        match err {
            UploadError::MissingSecureUrl { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("Upload preset not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let (base, server) = serve_once("502 Bad Gateway", "<html>oops</html>").await;
        let dir = tempfile::tempdir().expect("tempdir");

        let err = host(base)
            .upload(converted(dir.path(), b"jpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Json { status: 502, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let dir = tempfile::tempdir().expect("tempdir");

        let err = host(base)
            .upload(converted(dir.path(), b"jpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Request(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let asset = ConvertedAsset {
            path: dir.path().join("gone.jpg"),
            width: 1,
            height: 1,
            bytes: 0,
        };

        let err = host("http://127.0.0.1:9".into()).upload(asset).await.unwrap_err();
        assert!(matches!(err, UploadError::Read { .. }));
    }
}
