use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UserOrderList},
    error::AppResult,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/users/{user_id}", get(orders_of_user))
        .route("/{order_id}", delete(remove_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Cart converted into an order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "User or cart not found"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::create_order(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("sort_by" = Option<String>, Query, description = "order_date, order_amount, billing_name, order_status or payment_status"),
        ("sort_dir" = Option<String>, Query, description = "desc for descending, anything else ascending")
    ),
    responses(
        (status = 200, description = "All orders, paginated", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown sort field"),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::get_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Order owner")
    ),
    responses(
        (status = 200, description = "Orders of the user with their items", body = ApiResponse<UserOrderList>),
        (status = 404, description = "User not found"),
    ),
    tag = "Orders"
)]
pub async fn orders_of_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserOrderList>>> {
    let resp = order_service::get_orders_of_user(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order and its items removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn remove_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::remove_order(&state, order_id).await?;
    Ok(Json(resp))
}
