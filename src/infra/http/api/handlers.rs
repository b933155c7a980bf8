use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use phonebook_api_types::{
    ContactCreateRequest, ContactUpdateRequest, ContactView, DeleteOneResponse,
    InsertOneResponse, UpdateOneResponse,
};

use crate::application::contacts::{
    ContactServiceError, CreateContactCommand, UpdateContactCommand,
};
use crate::application::repos::RepoError;
use crate::domain::contact::{Contact, ContactId};
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};
use super::state::ApiState;

pub async fn create_contact(
    State(state): State<ApiState>,
    payload: Result<Json<ContactCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(ApiError::malformed_body)?;

    let command = CreateContactCommand {
        name: payload.name,
        phone: payload.phone,
    };
    let id = state
        .contacts
        .create(command)
        .await
        .map_err(contacts_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(InsertOneResponse {
            inserted_id: id.as_uuid(),
        }),
    ))
}

pub async fn list_contacts(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ContactView>>, ApiError> {
    let contacts = state.contacts.list().await.map_err(contacts_to_api)?;
    Ok(Json(contacts.into_iter().map(contact_view).collect()))
}

pub async fn get_contact(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<ContactView>, ApiError> {
    let id = parse_id(id)?;
    let contact = state.contacts.get(id).await.map_err(contacts_to_api)?;
    Ok(Json(contact_view(contact)))
}

pub async fn update_contact(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ContactUpdateRequest>, JsonRejection>,
) -> Result<Json<UpdateOneResponse>, ApiError> {
    let id = parse_id(id)?;
    let Json(payload) = payload.map_err(ApiError::malformed_body)?;

    let outcome = state
        .contacts
        .update_phone(UpdateContactCommand {
            id,
            phone: payload.phone,
        })
        .await
        .map_err(contacts_to_api)?;

    Ok(Json(UpdateOneResponse {
        matched_count: outcome.matched,
        modified_count: outcome.modified,
    }))
}

pub async fn delete_contact(
    State(state): State<ApiState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteOneResponse>, ApiError> {
    let id = parse_id(id)?;
    let outcome = state.contacts.delete(id).await.map_err(contacts_to_api)?;
    Ok(Json(DeleteOneResponse {
        deleted_count: outcome.deleted,
    }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub async fn route_not_found() -> ApiError {
    ApiError::not_found("No route matches the request")
}

fn parse_id(raw: Result<Path<String>, PathRejection>) -> Result<ContactId, ApiError> {
    let Path(raw) = raw.map_err(ApiError::malformed_path)?;
    raw.parse::<ContactId>().map_err(domain_to_api)
}

fn contact_view(contact: Contact) -> ContactView {
    ContactView {
        id: contact.id.as_uuid(),
        name: contact.name,
        phone: contact.phone,
    }
}

pub(crate) fn contacts_to_api(err: ContactServiceError) -> ApiError {
    match err {
        ContactServiceError::Domain(domain) => domain_to_api(domain),
        ContactServiceError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { violations } => ApiError::validation(&violations),
        DomainError::NotFound { .. } => ApiError::not_found("Contact not found"),
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORAGE_TIMEOUT,
            "Storage did not respond in time",
            None,
        ),
        other @ (RepoError::Persistence(_) | RepoError::Decode(_)) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::STORAGE_ERROR,
            "Storage error",
            None,
        )
        .with_detail(other.to_string()),
    }
}
