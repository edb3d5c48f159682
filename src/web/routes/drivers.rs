//! Driver screens.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use crate::entities::driver::{self, Driver, DriverUpdate, LicenseUpdate, NewDriver};
use crate::projections::{self, DriverDetail};
use crate::web::pagination::{paginate, Page, PageQuery};
use crate::web::{ApiJson, ApiPath, AppError, AppState, CurrentUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/drivers", get(list).post(create))
        .route("/drivers/:id", get(detail).put(update).delete(remove))
        .route("/drivers/:id/license", put(update_license))
}

/// GET /drivers?page=N
async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Driver>>, AppError> {
    let drivers = state.db.read(driver::list_all)?;
    Ok(Json(paginate(drivers, query, state.page_size())?))
}

/// POST /drivers - registers identity and profile together
async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(input): ApiJson<NewDriver>,
) -> Result<Response, AppError> {
    let created = state.db.write(|tx| driver::create(tx, &input))?;
    let location = format!("/drivers/{}", created.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)).into_response())
}

/// GET /drivers/:id - driver with assigned cars and their manufacturers
async fn detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DriverDetail>, AppError> {
    Ok(Json(
        state.db.read(|conn| projections::get_driver_with_cars(conn, id))?,
    ))
}

/// PUT /drivers/:id
async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<DriverUpdate>,
) -> Result<Json<Driver>, AppError> {
    Ok(Json(state.db.write(|tx| driver::update(tx, id, &input))?))
}

/// PUT /drivers/:id/license
async fn update_license(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<LicenseUpdate>,
) -> Result<Json<Driver>, AppError> {
    Ok(Json(
        state.db.write(|tx| driver::update_license(tx, id, &input))?,
    ))
}

/// DELETE /drivers/:id
async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.db.write(|tx| driver::delete(tx, id))?;
    Ok(StatusCode::NO_CONTENT)
}
