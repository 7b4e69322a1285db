use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::orders::{OrderWithItems, PlaceOrderRequest, PlaceOrderResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order))
        .route("/", get(list_orders))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = PlaceOrderResponse),
        (status = 400, description = "Invalid cart, insufficient stock or price mismatch"),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Invalid or expired token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<PlaceOrderResponse>)> {
    let resp = order_service::place_order(&state.pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Order history, newest first", body = Vec<OrderWithItems>),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Invalid or expired token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let orders = order_service::list_orders(&state.pool, &user).await?;
    Ok(Json(orders))
}
