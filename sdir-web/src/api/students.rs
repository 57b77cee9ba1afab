//! Student record CRUD
//!
//! Writes are authenticated and owner-scoped: an identity may hold at most
//! one record, and only the owning identity may update or delete it.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sdir_common::{Course, Department, StudentRecord};
use serde::Deserialize;
use tracing::info;

use crate::api::auth::bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub name: String,
    #[serde(default)]
    pub student_id: String,
    pub department: Department,
    pub admission_year: i32,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub hobby: Option<String>,
    #[serde(default)]
    pub self_intro: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub admission_year: Option<i32>,
    #[serde(default)]
    pub courses: Option<Vec<Course>>,
    #[serde(default)]
    pub hobby: Option<String>,
    #[serde(default)]
    pub self_intro: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn validate_record(record: &StudentRecord) -> ApiResult<()> {
    if record.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    if record.student_id.trim().is_empty() {
        return Err(ApiError::Validation(
            "studentId must not be empty".to_string(),
        ));
    }
    if record.department == Department::Unknown {
        return Err(ApiError::Validation(
            "department is not a recognized value".to_string(),
        ));
    }
    if record.courses.contains(&Course::Unknown) {
        return Err(ApiError::Validation(
            "courses contains an unrecognized value".to_string(),
        ));
    }
    Ok(())
}

/// Caller must be the owning identity; unowned records are never writable.
fn check_owner(record: &StudentRecord, uid: &str) -> ApiResult<()> {
    match record.owner_ref.as_deref() {
        Some(owner) if owner == uid => Ok(()),
        _ => Err(ApiError::Forbidden(
            "only the owning account may modify this record".to_string(),
        )),
    }
}

/// GET /api/students
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Json<Vec<StudentRecord>>> {
    let records = state.store.list_all().await?;
    Ok(Json(records))
}

/// POST /api/students
pub async fn create_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentRecord>)> {
    let token = bearer_token(&headers)?;
    let identity = state.identity.lookup(token).await?;

    let record = StudentRecord {
        id: None,
        name: request.name,
        student_id: request.student_id,
        department: request.department,
        admission_year: request.admission_year,
        courses: request.courses,
        hobby: request.hobby,
        self_intro: request.self_intro,
        avatar_url: request.avatar_url,
        owner_ref: Some(identity.uid.clone()),
    };
    validate_record(&record)?;

    // One record per identity
    let existing = state.store.list_all().await?;
    if existing
        .iter()
        .any(|r| r.owner_ref.as_deref() == Some(identity.uid.as_str()))
    {
        return Err(ApiError::Conflict(
            "this account already has a registered student record".to_string(),
        ));
    }

    let created = state.store.create(record).await?;
    info!(name = %created.name, "Registered student record");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StudentRecord>> {
    let record = state.store.get(&id).await?;
    Ok(Json(record))
}

/// PUT /api/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<StudentPatch>,
) -> ApiResult<Json<StudentRecord>> {
    let token = bearer_token(&headers)?;
    let identity = state.identity.lookup(token).await?;

    let mut record = state.store.get(&id).await?;
    check_owner(&record, &identity.uid)?;

    if let Some(name) = patch.name {
        record.name = name;
    }
    if let Some(student_id) = patch.student_id {
        record.student_id = student_id;
    }
    if let Some(department) = patch.department {
        record.department = department;
    }
    if let Some(admission_year) = patch.admission_year {
        record.admission_year = admission_year;
    }
    if let Some(courses) = patch.courses {
        record.courses = courses;
    }
    if let Some(hobby) = patch.hobby {
        record.hobby = Some(hobby);
    }
    if let Some(self_intro) = patch.self_intro {
        record.self_intro = Some(self_intro);
    }
    if let Some(avatar_url) = patch.avatar_url {
        record.avatar_url = Some(avatar_url);
    }
    validate_record(&record)?;

    let updated = state.store.update(&id, record).await?;
    info!(record_id = %id, "Updated student record");
    Ok(Json(updated))
}

/// DELETE /api/students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers)?;
    let identity = state.identity.lookup(token).await?;

    let record = state.store.get(&id).await?;
    check_owner(&record, &identity.uid)?;

    state.store.delete(&id).await?;
    info!(record_id = %id, "Deleted student record");
    Ok(StatusCode::NO_CONTENT)
}
