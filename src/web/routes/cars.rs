//! Car screens and the self-assignment toggle.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::assignment;
use crate::entities::car::{self, Car, CarInput};
use crate::entities::driver;
use crate::projections::{self, CarDetail, CarSummary};
use crate::web::pagination::{paginate, Page, PageQuery};
use crate::web::{ApiJson, ApiPath, AppError, AppState, CurrentUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list).post(create))
        .route("/cars/:id", get(detail).put(update).delete(remove))
        .route("/cars/:id/toggle-assign", post(toggle_assign))
}

/// GET /cars?page=N - cars joined with manufacturer name
async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<CarSummary>>, AppError> {
    let cars = state.db.read(projections::list_cars_with_manufacturer)?;
    Ok(Json(paginate(cars, query, state.page_size())?))
}

/// POST /cars
async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(input): ApiJson<CarInput>,
) -> Result<Response, AppError> {
    let created = state.db.write(|tx| car::create(tx, &input))?;
    let location = format!("/cars/{}", created.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)).into_response())
}

/// GET /cars/:id - car, manufacturer and assigned drivers
async fn detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CarDetail>, AppError> {
    Ok(Json(
        state.db.read(|conn| projections::get_car_with_drivers(conn, id))?,
    ))
}

/// PUT /cars/:id
async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CarInput>,
) -> Result<Json<Car>, AppError> {
    Ok(Json(state.db.write(|tx| car::update(tx, id, &input))?))
}

/// DELETE /cars/:id
async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.db.write(|tx| car::delete(tx, id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cars/:id/toggle-assign - flip the caller's assignment to this car.
///
/// Always redirects to the car detail, whichever way the edge went.
async fn toggle_assign(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(car_id): ApiPath<i64>,
) -> Result<Response, AppError> {
    state.db.write(|tx| {
        let Some(me) = driver::find_by_identity(tx, user.identity_id)? else {
            return Ok(None);
        };
        assignment::toggle_assignment(tx, me.id, car_id).map(Some)
    })?
    .ok_or_else(|| AppError::Forbidden("only drivers can assign themselves to cars".to_string()))?;

    let location = format!("/cars/{car_id}");
    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response())
}
