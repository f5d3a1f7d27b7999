//! Shared route helpers: stored-file serving and multipart field parsing.

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use axum::{
    Json,
    extract::{Multipart, Path},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime};
use services::on_duty::Upload;
use std::collections::HashMap;

/// GET /files/{*path}
///
/// Serves an uploaded file (proof photos, on-duty documents, selfies) from
/// the storage root. Paths are the storage-relative ones produced at upload
/// time; anything trying to escape the root is rejected.
pub async fn serve_file(Path(path): Path<String>) -> impl IntoResponse {
    if path.split('/').any(|part| part == ".." || part.is_empty()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("Invalid file path")),
        )
            .into_response();
    }

    let full_path = util::paths::storage_path(&path);
    match tokio::fs::read(&full_path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&full_path)
                .first_or_octet_stream()
                .to_string();
            ([(CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("File not found")),
        )
            .into_response(),
    }
}

/// Text and file fields collected from a multipart request body.
#[derive(Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Drains a multipart body into named text fields and file uploads.
    /// Fields with a filename are treated as files; everything else as text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("invalid multipart body: {e}"))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let filename = field.file_name().map(str::to_owned);

            if let Some(filename) = filename {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("failed to read field '{name}': {e}"))?;
                form.files.insert(
                    name,
                    Upload {
                        bytes: bytes.to_vec(),
                        filename: Some(filename),
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("failed to read field '{name}': {e}"))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|s| !s.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<&str, String> {
        self.text(name).ok_or_else(|| format!("{name}: required"))
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, String> {
        self.text(name)
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| format!("{name}: expected YYYY-MM-DD"))
            })
            .transpose()
    }

    pub fn require_date(&self, name: &str) -> Result<NaiveDate, String> {
        self.date(name)?.ok_or_else(|| format!("{name}: required"))
    }

    pub fn time(&self, name: &str) -> Result<Option<NaiveTime>, String> {
        self.text(name)
            .map(|s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .map_err(|_| format!("{name}: expected HH:MM or HH:MM:SS"))
            })
            .transpose()
    }

    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, String> {
        self.text(name)
            .map(|s| s.parse::<T>().map_err(|_| format!("{name}: invalid value")))
            .transpose()
    }

    pub fn require_parsed<T: std::str::FromStr>(&self, name: &str) -> Result<T, String> {
        self.parsed(name)?.ok_or_else(|| format!("{name}: required"))
    }

    pub fn file(&self, name: &str) -> Option<Upload> {
        self.files.get(name).cloned().filter(|u| !u.bytes.is_empty())
    }
}
