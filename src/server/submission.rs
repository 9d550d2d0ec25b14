//! `POST /plan/` body: either an urlencoded form or a multipart form with an
//! optional `uploadfile` part. An uploaded file wins over `plantext`.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PlanError, PlanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Save,
    Parse,
}

impl Action {
    fn from_field(value: &str) -> Option<Self> {
        match value.trim() {
            "save" => Some(Action::Save),
            "parse" => Some(Action::Parse),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionForm {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    plantext: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSubmission {
    pub action: Option<Action>,
    pub plantext: String,
}

impl PlanSubmission {
    /// Plan text of a save request, which arrives base64 encoded.
    pub fn decoded_plantext(&self) -> PlanResult<String> {
        let compact: String = self.plantext.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| PlanError::Encoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| PlanError::Encoding(e.to_string()))
    }
}

impl<S> FromRequest<S> for PlanSubmission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !multipart {
            let Form(form) = Form::<SubmissionForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self {
                action: form.action.as_deref().and_then(Action::from_field),
                plantext: form.plantext.unwrap_or_default(),
            });
        }

        let mut parts = Multipart::from_request(req, state).await.map_err(IntoResponse::into_response)?;
        let mut action = None;
        let mut plantext = String::new();
        let mut upload: Option<String> = None;
        loop {
            let field = match parts.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(upload_rejection(PlanError::upload(e.body_text()))),
            };
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "action" => {
                    let value = field.text().await.map_err(|e| upload_rejection(PlanError::upload(e.body_text())))?;
                    action = Action::from_field(&value);
                }
                "plantext" => {
                    plantext = field.text().await.map_err(|e| upload_rejection(PlanError::upload(e.body_text())))?;
                }
                "uploadfile" => {
                    let bytes = field.bytes().await.map_err(|e| upload_rejection(PlanError::upload(e.body_text())))?;
                    if !bytes.is_empty() {
                        debug!("Read {} bytes from file upload", bytes.len());
                        upload = Some(upload_text(bytes.to_vec()).map_err(upload_rejection)?);
                    }
                }
                _ => {}
            }
        }
        Ok(Self { action, plantext: upload.unwrap_or(plantext) })
    }
}

/// Uploaded plan text must be valid UTF-8; it is never patched up.
fn upload_text(bytes: Vec<u8>) -> PlanResult<String> {
    String::from_utf8(bytes).map_err(|e| PlanError::upload(format!("file is not valid UTF-8 ({})", e.utf8_error())))
}

fn upload_rejection(err: PlanError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, err.to_string()).into_response()
}
