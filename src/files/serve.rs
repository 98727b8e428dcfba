use crate::files::resolver::PathResolver;
use crate::http::error::ServeError;
use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::{KeepAlive, Response, StatusCode, http_date};

/// Answers a GET with the whole file read into memory.
pub async fn serve_file(
    resolver: &PathResolver,
    req: &Request,
    keep_alive: Option<KeepAlive>,
) -> Result<Response, ServeError> {
    let file = resolver.resolve(&req.path)?;
    let body = tokio::fs::read(&file.path).await?;

    tracing::debug!(
        path = %req.path,
        file = %file.path.display(),
        bytes = body.len(),
        "Serving file"
    );

    let mut builder = Response::builder(StatusCode::Ok)
        .header("Content-Type", file.content_type)
        .header("Content-Length", body.len().to_string())
        .header("Date", http_date())
        .connection(keep_alive);

    if mime::is_attachment(file.content_type) {
        builder = builder.header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file.file_name()),
        );
    }

    Ok(builder.body(body).build())
}
