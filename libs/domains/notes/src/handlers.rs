use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    PaginationQuery, ValidatedJson,
    errors::responses::{
        BadRequestPaginationResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
    pagination_header_map,
};
use serde_json::Value;
use std::sync::Arc;
use utoipa::OpenApi;

use mongo_repository::{ConvertOptions, convert_object};
use pagination::pagination_headers;

use crate::error::NoteResult;
use crate::models::{CreateNote, Note, NoteFilter, NoteView, UpdateNote};
use crate::service::NoteService;

/// OpenAPI documentation for the Notes API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_notes,
        create_note,
        count_notes,
        export_notes,
        get_note,
        update_note,
        delete_note,
        purge_note,
    ),
    components(
        schemas(NoteView, CreateNote, UpdateNote, NoteFilter),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestPaginationResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Notes", description = "Note management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the notes router with all HTTP endpoints
pub fn router(service: NoteService) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/count", get(count_notes))
        .route("/export", get(export_notes))
        .route(
            "/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/{id}/purge", axum::routing::delete(purge_note))
        .with_state(shared_service)
}

/// Sanitize a note for external consumption.
fn to_view(note: &Note) -> Value {
    convert_object(note, &ConvertOptions::default())
}

/// List one page of notes
///
/// Pagination state is reported through the `x-pagination-*` response
/// headers.
#[utoipa::path(
    get,
    path = "",
    tag = "Notes",
    params(
        NoteFilter,
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("pageSize" = Option<u64>, Query, description = "Records per page (max 100)"),
    ),
    responses(
        (status = 200, description = "One page of notes", body = Vec<NoteView>),
        (status = 400, response = BadRequestPaginationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_notes(
    State(service): State<Arc<NoteService>>,
    Query(filter): Query<NoteFilter>,
    PaginationQuery(window): PaginationQuery,
) -> NoteResult<(HeaderMap, Json<Value>)> {
    let (notes, total) = service.list_notes(filter, window).await?;

    let headers = pagination_header_map(&pagination_headers(Some(&window), Some(total)));
    let body = notes.iter().map(to_view).collect();
    Ok((headers, Json(Value::Array(body))))
}

/// Create a new note
#[utoipa::path(
    post,
    path = "",
    tag = "Notes",
    request_body = CreateNote,
    responses(
        (status = 201, description = "Note created successfully", body = NoteView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_note(
    State(service): State<Arc<NoteService>>,
    ValidatedJson(input): ValidatedJson<CreateNote>,
) -> NoteResult<impl IntoResponse> {
    let note = service.create_note(input).await?;
    Ok((StatusCode::CREATED, Json(to_view(&note))))
}

/// Count notes matching the filter
#[utoipa::path(
    get,
    path = "/count",
    tag = "Notes",
    params(NoteFilter),
    responses(
        (status = 200, description = "Number of matching notes"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_notes(
    State(service): State<Arc<NoteService>>,
    Query(filter): Query<NoteFilter>,
) -> NoteResult<Json<Value>> {
    let count = service.count_notes(filter).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

/// Export every matching note
///
/// Walks all pages server-side and returns the full result set.
#[utoipa::path(
    get,
    path = "/export",
    tag = "Notes",
    params(NoteFilter),
    responses(
        (status = 200, description = "All matching notes", body = Vec<NoteView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn export_notes(
    State(service): State<Arc<NoteService>>,
    Query(filter): Query<NoteFilter>,
) -> NoteResult<Json<Value>> {
    let notes = service.export_notes(filter).await?;
    let body = notes.iter().map(to_view).collect();
    Ok(Json(Value::Array(body)))
}

/// Get a note by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Notes",
    params(
        ("id" = String, Path, description = "Note ID (hex ObjectId)")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteView),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> NoteResult<Json<Value>> {
    let note = service.get_note(&id).await?;
    Ok(Json(to_view(&note)))
}

/// Update a note
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Notes",
    params(
        ("id" = String, Path, description = "Note ID (hex ObjectId)")
    ),
    request_body = UpdateNote,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateNote>,
) -> NoteResult<Json<Value>> {
    let note = service.update_note(&id, input).await?;
    Ok(Json(to_view(&note)))
}

/// Soft-delete a note
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Notes",
    params(
        ("id" = String, Path, description = "Note ID (hex ObjectId)")
    ),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> NoteResult<StatusCode> {
    service.delete_note(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Permanently delete a note
///
/// Removes the record itself, including notes that were previously
/// soft-deleted.
#[utoipa::path(
    delete,
    path = "/{id}/purge",
    tag = "Notes",
    params(
        ("id" = String, Path, description = "Note ID (hex ObjectId)")
    ),
    responses(
        (status = 204, description = "Note permanently removed"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn purge_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> NoteResult<StatusCode> {
    service.purge_note(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
