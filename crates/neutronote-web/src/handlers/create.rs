//! Entry creation from the create panel tabs.
//!
//! Validation failures queue a flash message and send the user back to
//! the tab they came from; nothing is written in that case.

use axum::{
    extract::{Multipart, State},
    response::Redirect,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use neutronote_common::ApiError;
use neutronote_db::{EntryType, NewEntry};
use neutronote_snap::is_state_id;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::flash;
use crate::handlers::{blocking, non_blank, to_index};
use crate::state::SharedState;

/// Image extensions accepted for upload.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];

type Created = Result<(CookieJar, Redirect), ApiError>;

fn rejected(jar: CookieJar, tab: &str, message: impl Into<String>) -> Created {
    Ok((flash::error(jar, message), to_index(Some(tab))))
}

/// Lowercased extension of an uploaded file name when it is allowed.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Parse a run number form field, producing the user-facing error.
fn parse_run_number(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Please enter a run number.".to_string());
    }
    raw.parse::<u64>()
        .map_err(|_| format!("Invalid run number: '{raw}'. Please enter a valid integer."))
}

// =============================================================================
// Text
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TextForm {
    pub title: String,
    pub body: String,
    pub author: String,
}

/// A blank body creates nothing.
pub async fn create_text(
    State(state): State<SharedState>,
    Form(form): Form<TextForm>,
) -> Result<Redirect, ApiError> {
    if let Some(body) = non_blank(&form.body) {
        let new = NewEntry::new(EntryType::Text, body)
            .with_title(non_blank(&form.title))
            .with_author(non_blank(&form.author));
        state.entries.insert(new).await?;
    }
    Ok(to_index(None))
}

// =============================================================================
// Header
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HeaderForm {
    pub run_number: String,
    pub author: String,
}

/// Header entry built from a run's NeXus metadata in the notebook's IPTS.
pub async fn create_header(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<HeaderForm>,
) -> Created {
    let Some(ipts) = state.configured_ipts().await? else {
        return rejected(jar, "header", "Please configure the notebook IPTS first.");
    };
    let run_number = match parse_run_number(&form.run_number) {
        Ok(n) => n,
        Err(message) => return rejected(jar, "header", message),
    };

    let snap = state.snap.clone();
    let metadata = blocking(move || snap.get_run_metadata(run_number, Some(ipts.as_str()))).await?;
    if let Some(error) = &metadata.error {
        return rejected(jar, "header", format!("Run {run_number}: {error}"));
    }

    let new = NewEntry::new(EntryType::Header, metadata.to_json().to_string())
        .with_title(Some(format!("Run {run_number}: {}", metadata.title)))
        .with_author(non_blank(&form.author));
    let entry = state.entries.insert(new).await?;
    info!(id = entry.id, run_number, "header entry created");
    Ok((jar, to_index(None)))
}

// =============================================================================
// Image
// =============================================================================

#[derive(Debug, Default)]
struct ImageUpload {
    filename: String,
    bytes: Vec<u8>,
    caption: String,
    author: String,
}

async fn read_image_form(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    let bad = |e: axum::extract::multipart::MultipartError| ApiError::BadRequest(e.body_text());
    let mut upload = ImageUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                upload.filename = field.file_name().unwrap_or_default().to_string();
                upload.bytes = field.bytes().await.map_err(bad)?.to_vec();
            }
            "caption" => upload.caption = field.text().await.map_err(bad)?,
            "author" => upload.author = field.text().await.map_err(bad)?,
            other => debug!(field = other, "ignoring form field"),
        }
    }
    Ok(upload)
}

/// Store the upload under a random name and record it as an image entry.
pub async fn create_image(
    State(state): State<SharedState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Created {
    let upload = read_image_form(multipart).await?;
    if upload.filename.trim().is_empty() {
        return rejected(jar, "image", "No image file selected.");
    }
    let Some(ext) = allowed_extension(&upload.filename) else {
        return rejected(jar, "image", "Invalid file type. Allowed: PNG, JPG, JPEG, GIF, WebP, SVG.");
    };

    let stored_name = format!("{}.{ext}", Uuid::new_v4().simple());
    let path = state.upload_dir.join(&stored_name);
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("creating upload folder: {e}")))?;
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("saving upload: {e}")))?;
    debug!(path = %path.display(), bytes = upload.bytes.len(), "image saved");

    let new = NewEntry::new(EntryType::Image, stored_name)
        .with_title(non_blank(&upload.caption))
        .with_author(non_blank(&upload.author));
    state.entries.insert(new).await?;
    Ok((jar, to_index(None)))
}

// =============================================================================
// Reduced data
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DataForm {
    pub state_id: String,
    pub run_number: String,
    pub author: String,
}

/// Data entry pointing at the latest lite reduction of a run.
pub async fn create_data(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<DataForm>,
) -> Created {
    let Some(ipts) = state.configured_ipts().await? else {
        return rejected(jar, "data", "Please configure the notebook IPTS first.");
    };
    let Some(state_id) = non_blank(&form.state_id).filter(|s| is_state_id(s)) else {
        return rejected(jar, "data", "Please select an instrument state.");
    };
    let run_number = match parse_run_number(&form.run_number) {
        Ok(n) => n,
        Err(message) => return rejected(jar, "data", message),
    };

    let snap = state.snap.clone();
    let (ipts_c, state_c) = (ipts.clone(), state_id.clone());
    let runs = blocking(move || snap.discover_reduced_runs(&ipts_c, &state_c, true, true)).await?;
    let Some(run) = runs.into_iter().find(|r| r.run_number == run_number) else {
        return rejected(jar, "data", format!("Run {run_number} not found in state {state_id}"));
    };

    let mut body = run.to_json();
    body["ipts"] = json!(ipts);
    let new = NewEntry::new(EntryType::Data, body.to_string())
        .with_title(Some(format!("Reduced run {run_number}")))
        .with_author(non_blank(&form.author));
    state.entries.insert(new).await?;
    Ok((jar, to_index(None)))
}

// =============================================================================
// Code
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CodeForm {
    pub code: String,
    pub title: String,
    /// Checkbox; `on` runs the cell in the kernel before saving.
    pub run: Option<String>,
    pub author: String,
}

pub async fn create_code(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<CodeForm>,
) -> Created {
    if form.code.trim().is_empty() {
        return rejected(jar, "code", "Please enter some code.");
    }
    let code = form.code.trim_end().to_string();

    let body = if form.run.as_deref() == Some("on") {
        let result = state.kernel.execute(&code).await;
        json!({
            "code": code,
            "output": result.output,
            "success": result.success,
            "execution_time": result.execution_time,
        })
    } else {
        json!({ "code": code })
    };

    let new = NewEntry::new(EntryType::Code, body.to_string())
        .with_title(non_blank(&form.title))
        .with_author(non_blank(&form.author));
    state.entries.insert(new).await?;
    Ok((jar, to_index(None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("beam.PNG").as_deref(), Some("png"));
        assert_eq!(allowed_extension("a.b.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("notes.txt"), None);
        assert_eq!(allowed_extension("noext"), None);
    }

    #[test]
    fn test_parse_run_number_messages() {
        assert_eq!(parse_run_number(" 58810 "), Ok(58810));
        assert_eq!(parse_run_number(""), Err("Please enter a run number.".to_string()));
        assert_eq!(
            parse_run_number("abc"),
            Err("Invalid run number: 'abc'. Please enter a valid integer.".to_string())
        );
    }
}
