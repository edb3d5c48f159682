//! Manufacturer list / detail / create / update / delete.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::entities::manufacturer::{self, Manufacturer, ManufacturerInput};
use crate::web::pagination::{paginate, Page, PageQuery};
use crate::web::{ApiJson, ApiPath, AppError, AppState, CurrentUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/manufacturers", get(list).post(create))
        .route(
            "/manufacturers/:id",
            get(detail).put(update).delete(remove),
        )
}

/// GET /manufacturers?page=N
async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Manufacturer>>, AppError> {
    let manufacturers = state.db.read(manufacturer::list_all)?;
    Ok(Json(paginate(manufacturers, query, state.page_size())?))
}

/// POST /manufacturers
async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(input): ApiJson<ManufacturerInput>,
) -> Result<Response, AppError> {
    let created = state.db.write(|tx| manufacturer::create(tx, &input))?;
    let location = format!("/manufacturers/{}", created.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)).into_response())
}

/// GET /manufacturers/:id
async fn detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Manufacturer>, AppError> {
    Ok(Json(state.db.read(|conn| manufacturer::get_by_id(conn, id))?))
}

/// PUT /manufacturers/:id
async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ManufacturerInput>,
) -> Result<Json<Manufacturer>, AppError> {
    Ok(Json(state.db.write(|tx| manufacturer::update(tx, id, &input))?))
}

/// DELETE /manufacturers/:id - honours the configured delete policy
async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    let policy = state.config.fleet.manufacturer_delete;
    state.db.write(|tx| manufacturer::delete(tx, id, policy))?;
    Ok(StatusCode::NO_CONTENT)
}
