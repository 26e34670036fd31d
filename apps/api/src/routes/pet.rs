//! `/pet` handlers.
//!
//! Pet status is never taken from a request body: new pets start
//! `available`, and edits may only repeat the current status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthPrincipal;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use petstore_core::validation::{validate_new_pet, validate_pet_patch};
use petstore_core::{authorize, double_option, Action, CoreError, NewPet, Pet, PetId, PetPatch, PetStatus, ValidationError};

/// `{ "id": .., "name": .. }` reference to a category or tag. Only the name is used.
#[derive(Debug, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<NameRef>,
    #[serde(default)]
    pub tags: Vec<NameRef>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub status: Option<PetStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePetRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<NameRef>>,
    pub tags: Option<Vec<NameRef>>,
    pub photo_urls: Option<Vec<String>>,
    pub status: Option<PetStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagsQuery {
    pub tags: Option<String>,
}

fn status_is_engine_owned(allowed: PetStatus) -> ValidationError {
    ValidationError::NotAllowed {
        field: "status".to_string(),
        allowed: vec![allowed.to_string()],
    }
}

fn names(refs: Vec<NameRef>) -> Vec<String> {
    refs.into_iter().map(|r| r.name).collect()
}

fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses a comma list of statuses, dropping repeats. Empty means `available`.
fn parse_statuses(raw: Option<&str>) -> Result<Vec<PetStatus>, ValidationError> {
    let mut statuses = Vec::new();
    for item in split_list(raw) {
        let status: PetStatus = item.parse()?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }

    if statuses.is_empty() {
        statuses.push(PetStatus::Available);
    }
    Ok(statuses)
}

/// `POST /pet`
pub async fn add_pet(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(body): ApiJson<CreatePetRequest>,
) -> ApiResult<Json<Pet>> {
    authorize(&principal, Action::ManagePet, None).into_result()?;

    if body.status.is_some_and(|s| s != PetStatus::Available) {
        return Err(status_is_engine_owned(PetStatus::Available).into());
    }

    let new_pet = NewPet {
        name: body.name,
        category: body.category.map(|c| c.name),
        tags: names(body.tags),
        photo_urls: body.photo_urls,
    };
    validate_new_pet(&new_pet)?;

    let pet = state.db.pets().insert(&new_pet).await?;

    info!(pet_id = pet.id, by = principal.user_id, "Pet added");
    Ok(Json(pet))
}

/// `PUT /pet/{petId}`
pub async fn update_pet(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(pet_id): ApiPath<PetId>,
    ApiJson(body): ApiJson<UpdatePetRequest>,
) -> ApiResult<Json<Pet>> {
    authorize(&principal, Action::ManagePet, None).into_result()?;

    let current = state
        .db
        .pets()
        .get_by_id(pet_id)
        .await?
        .ok_or(CoreError::PetNotFound(pet_id))?;

    if body.status.is_some_and(|s| s != current.status) {
        return Err(status_is_engine_owned(current.status).into());
    }

    let patch = PetPatch {
        name: body.name,
        category: body.category.map(|c| c.map(|r| r.name)),
        tags: body.tags.map(names),
        photo_urls: body.photo_urls,
    };
    validate_pet_patch(&patch)?;

    if patch.is_empty() {
        return Ok(Json(current));
    }

    // The pet may be deleted between the read above and the edit.
    let pet = state
        .db
        .pets()
        .update(pet_id, &patch)
        .await?
        .ok_or(CoreError::PetNotFound(pet_id))?;
    Ok(Json(pet))
}

/// `GET /pet/{petId}`
pub async fn get_pet(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(pet_id): ApiPath<PetId>,
) -> ApiResult<Json<Pet>> {
    authorize(&principal, Action::ViewPet, None).into_result()?;

    let pet = state
        .db
        .pets()
        .get_by_id(pet_id)
        .await?
        .ok_or(CoreError::PetNotFound(pet_id))?;

    Ok(Json(pet))
}

/// `DELETE /pet/{petId}`
pub async fn delete_pet(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(pet_id): ApiPath<PetId>,
) -> ApiResult<StatusCode> {
    state.engine.delete_pet(&principal, pet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /pet/findByStatus?status=available,pending`
///
/// Defaults to `available` when no status is given.
pub async fn find_by_status(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> ApiResult<Json<Vec<Pet>>> {
    authorize(&principal, Action::ViewPet, None).into_result()?;

    let statuses = parse_statuses(query.status.as_deref())?;
    let pets = state.db.pets().find_by_status(&statuses).await?;
    Ok(Json(pets))
}

/// `GET /pet/findByTags?tags=friendly,small`
pub async fn find_by_tags(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiQuery(query): ApiQuery<TagsQuery>,
) -> ApiResult<Json<Vec<Pet>>> {
    authorize(&principal, Action::ViewPet, None).into_result()?;

    let tags: Vec<String> = split_list(query.tags.as_deref())
        .into_iter()
        .map(str::to_string)
        .collect();

    if tags.is_empty() {
        return Err(ValidationError::Required {
            field: "tags".to_string(),
        }
        .into());
    }

    let pets = state.db.pets().find_by_tags(&tags).await?;
    Ok(Json(pets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("a, b,,c ")), vec!["a", "b", "c"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_parse_statuses_drops_repeats() {
        assert_eq!(
            parse_statuses(Some("available,pending,available")).unwrap(),
            vec![PetStatus::Available, PetStatus::Pending]
        );
        assert_eq!(parse_statuses(None).unwrap(), vec![PetStatus::Available]);
        assert!(parse_statuses(Some("sold,lost")).is_err());
    }

    #[test]
    fn test_update_request_category_null_clears() {
        let body: UpdatePetRequest = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert!(matches!(body.category, Some(None)));

        let body: UpdatePetRequest = serde_json::from_str(r#"{"name": "Rex"}"#).unwrap();
        assert!(body.category.is_none());
    }

    #[test]
    fn test_create_request_accepts_client_shape() {
        let body: CreatePetRequest = serde_json::from_str(
            r#"{"id": 10, "name": "doggie", "category": {"id": 1, "name": "Dogs"},
                "photoUrls": ["https://img.example.com/d.jpg"], "tags": [{"id": 0, "name": "cute"}],
                "status": "available"}"#,
        )
        .unwrap();
        assert_eq!(body.category.unwrap().name, "Dogs");
        assert_eq!(names(body.tags), vec!["cute"]);
        assert_eq!(body.status, Some(PetStatus::Available));
    }
}
