//! Multipart parsing for the chunk endpoint

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use chunkup_core::{AppError, DocumentType};

use crate::services::reassembler::ChunkMeta;

/// Field names that carry the chunk bytes even without a filename
const FILE_FIELD_NAMES: [&str; 2] = ["file", "chunk"];

/// A parsed chunk request: metadata plus payload
#[derive(Debug)]
pub struct ChunkForm {
    pub meta: ChunkMeta,
    pub payload: Bytes,
}

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, err.body_text()))
    } else {
        AppError::BadRequest(format!("{}: {}", context, err.body_text()))
    }
}

async fn field_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| multipart_error(&format!("Failed to read field '{}'", name), e))
}

/// Parse a zero-based chunk index. Non-numeric or negative values are rejected.
pub fn parse_chunk_index(raw: &str) -> Result<u32, AppError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("chunkIndex must be an integer, got '{}'", raw)))?;
    if value < 0 {
        return Err(AppError::InvalidInput(format!(
            "chunkIndex must not be negative, got {}",
            value
        )));
    }
    u32::try_from(value)
        .map_err(|_| AppError::InvalidInput(format!("chunkIndex {} is out of range", value)))
}

/// Parse the declared chunk count. Must be at least 1 and at most `max_total_chunks`.
pub fn parse_total_chunks(raw: &str, max_total_chunks: u32) -> Result<u32, AppError> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        AppError::InvalidInput(format!("totalChunks must be an integer, got '{}'", raw))
    })?;
    if value < 1 {
        return Err(AppError::InvalidInput(format!(
            "totalChunks must be at least 1, got {}",
            value
        )));
    }
    if value > i64::from(max_total_chunks) {
        return Err(AppError::InvalidInput(format!(
            "totalChunks {} exceeds the maximum of {}",
            value, max_total_chunks
        )));
    }
    Ok(value as u32)
}

/// Extract the chunk payload and its metadata from a multipart form.
///
/// The payload is the single part that carries a filename, or the part named
/// `file`/`chunk`. Text fields are `chunkIndex`, `totalChunks`, `fileName`,
/// `document_type` (alias `documentType`), `category` and `fileId`.
pub async fn extract_chunk_form(
    mut multipart: Multipart,
    max_chunk_size: usize,
    max_total_chunks: u32,
) -> Result<ChunkForm, AppError> {
    let mut payload: Option<Bytes> = None;
    let mut part_file_name: Option<String> = None;
    let mut chunk_index: Option<String> = None;
    let mut total_chunks: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut document_type: Option<String> = None;
    let mut category: Option<String> = None;
    let mut file_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart", e))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        let is_file_part =
            field.file_name().is_some() || FILE_FIELD_NAMES.contains(&name.as_str());

        if is_file_part {
            if payload.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file parts are not allowed; send exactly one chunk per request"
                        .to_string(),
                ));
            }
            part_file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error("Failed to read chunk data", e))?;
            if data.len() > max_chunk_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "Chunk of {} bytes exceeds the maximum of {} bytes",
                    data.len(),
                    max_chunk_size
                )));
            }
            payload = Some(data);
            continue;
        }

        match name.as_str() {
            "chunkIndex" => chunk_index = Some(field_text(field, &name).await?),
            "totalChunks" => total_chunks = Some(field_text(field, &name).await?),
            "fileName" => file_name = Some(field_text(field, &name).await?),
            "document_type" | "documentType" => {
                document_type = Some(field_text(field, &name).await.map_err(|_| {
                    AppError::BadRequest("document_type field is unreadable".to_string())
                })?)
            }
            "category" => category = Some(field_text(field, &name).await?),
            "fileId" => file_id = Some(field_text(field, &name).await?),
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let payload = payload.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    let chunk_index = parse_chunk_index(
        chunk_index
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("chunkIndex is required".to_string()))?,
    )?;
    let total_chunks = parse_total_chunks(
        total_chunks
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("totalChunks is required".to_string()))?,
        max_total_chunks,
    )?;

    let file_name = file_name
        .filter(|s| !s.is_empty())
        .or(part_file_name.filter(|s| !s.is_empty()))
        .ok_or_else(|| AppError::InvalidInput("fileName is required".to_string()))?;

    Ok(ChunkForm {
        meta: ChunkMeta {
            chunk_index,
            total_chunks,
            file_name,
            document_type: DocumentType::parse_or_default(document_type.as_deref()),
            category,
            file_id: file_id.filter(|s| !s.is_empty()),
        },
        payload,
    })
}

/// Reduce a client-supplied filename to a single safe path segment.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]` become `_`,
/// and `..` runs are broken up. Names that end up empty become `file`.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let mut sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        return "file".to_string();
    }

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_strips_directories_and_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\thesis.pdf"), "thesis.pdf");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("a..b.txt"), "a_b.txt");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn sanitize_filename_accepts_valid_names() {
        assert_eq!(sanitize_filename("image.png"), "image.png");
        assert_eq!(sanitize_filename("my-file_1.jpg"), "my-file_1.jpg");
        assert_eq!(sanitize_filename("final draft.pdf"), "final_draft.pdf");
    }

    #[test]
    fn chunk_index_parsing() {
        assert_eq!(parse_chunk_index("0").unwrap(), 0);
        assert_eq!(parse_chunk_index(" 7 ").unwrap(), 7);
        assert!(parse_chunk_index("-1").is_err());
        assert!(parse_chunk_index("abc").is_err());
        assert!(parse_chunk_index("").is_err());
    }

    #[test]
    fn total_chunks_parsing() {
        assert_eq!(parse_total_chunks("1", 10).unwrap(), 1);
        assert!(parse_total_chunks("0", 10).is_err());
        assert!(parse_total_chunks("11", 10).is_err());
        assert!(parse_total_chunks("3.5", 10).is_err());
    }
}
