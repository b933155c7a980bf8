use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use phonebook_api_types::{ApiErrorBody, ApiErrorMessage, FieldErrorView};

use crate::application::error::ErrorReport;
use crate::domain::error::FieldViolation;

pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";
    pub const STORAGE_ERROR: &str = "storage_error";
    pub const STORAGE_TIMEOUT: &str = "storage_timeout";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    fields: Vec<FieldErrorView>,
    /// Logged through the error report only; never sent to the client.
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            fields: Vec::new(),
            detail: None,
        }
    }

    pub fn validation(violations: &[FieldViolation]) -> Self {
        let mut error = Self::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION_FAILED,
            "Request validation failed",
            None,
        );
        error.fields = violations
            .iter()
            .map(|violation| FieldErrorView {
                field: violation.field.to_string(),
                reason: violation.reason.to_string(),
            })
            .collect();
        error
    }

    pub fn malformed_body(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION_FAILED,
            "Request body must be a JSON object",
            Some(rejection.body_text()),
        )
    }

    /// The `{id}` segment could not be extracted at all, e.g. invalid UTF-8.
    pub fn malformed_path(rejection: PathRejection) -> Self {
        Self::validation(&[FieldViolation {
            field: "id",
            reason: "is not a valid contact id",
        }])
            .with_detail(rejection.body_text())
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            codes::METHOD_NOT_ALLOWED,
            "Method not allowed",
            None,
        )
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let diagnostic = self
            .detail
            .clone()
            .or_else(|| self.hint.clone())
            .or_else(|| {
                (!self.fields.is_empty()).then(|| {
                    self.fields
                        .iter()
                        .map(|f| format!("{} {}", f.field, f.reason))
                        .collect::<Vec<_>>()
                        .join("; ")
                })
            })
            .unwrap_or_else(|| self.message.to_string());

        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
                fields: self.fields,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {diagnostic}", self.code),
        )
        .attach(&mut response);
        response
    }
}
