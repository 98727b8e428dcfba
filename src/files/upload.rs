use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::http::error::ServeError;
use crate::http::request::Request;
use crate::http::response::{KeepAlive, Response, StatusCode, http_date};

/// Writable store for JSON uploads.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    /// Opens the store, creating its directory if needed.
    pub async fn open(dir: impl Into<PathBuf>, max_bytes: usize) -> std::io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, max_bytes })
    }

    /// Validates and persists a JSON body, answering 201 with its location.
    pub async fn store(
        &self,
        req: &Request,
        keep_alive: Option<KeepAlive>,
    ) -> Result<Response, ServeError> {
        if let Some(ct) = req.header("Content-Type") {
            let media_type = ct.split(';').next().unwrap_or_default().trim();
            if !media_type.eq_ignore_ascii_case("application/json") {
                return Err(ServeError::TypeUnsupported(ct.to_string()));
            }
        }

        let size = req.body.len().max(req.content_length());
        if size > self.max_bytes {
            return Err(ServeError::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let document: serde_json::Value = serde_json::from_slice(&req.body)
            .map_err(|e| ServeError::MalformedRequest(format!("invalid JSON: {e}")))?;

        let name = upload_name();
        let path = self.dir.join(&name);
        let contents = serde_json::to_vec_pretty(&document)
            .map_err(|e| ServeError::Io(std::io::Error::other(e)))?;

        // create_new: a name clash is reported instead of overwriting.
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        write_or_discard(file, &path, &contents).await?;

        tracing::info!(file = %path.display(), bytes = contents.len(), "Stored upload");

        let body = serde_json::json!({
            "status": "success",
            "message": "File created successfully",
            "filepath": format!("/uploads/{name}"),
        })
        .to_string();

        Ok(Response::builder(StatusCode::Created)
            .header("Content-Type", "application/json")
            .header("Content-Length", body.len().to_string())
            .header("Date", http_date())
            .connection(keep_alive)
            .body(body)
            .build())
    }
}

/// Fills a freshly created upload file. A failed write removes the file so no
/// truncated document is left behind.
async fn write_or_discard<W>(mut file: W, path: &Path, contents: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(contents).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(rm) = tokio::fs::remove_file(path).await {
            tracing::warn!(file = %path.display(), error = %rm, "Failed to remove partial upload");
        }
        return Err(e);
    }
    Ok(())
}

fn upload_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let id = Uuid::new_v4().simple().to_string();
    format!("upload_{}_{}.json", secs, &id[..8])
}
