use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UserOrderList},
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::Entity as Carts,
        order_items::{
            ActiveModel as OrderItemActive, Entity as OrderItems, Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, OrderSortBy, SortOrder},
    state::AppState,
};

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let user = Users::find_by_id(payload.user_id).one(&txn).await?;
    if user.is_none() {
        return Err(AppError::NotFound("user"));
    }

    // The cart is addressed by its own id and locked for the conversion.
    // The cart owner is not matched against user_id.
    let cart = Carts::find_by_id(payload.cart_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::NotFound("cart")),
    };

    #[derive(Debug, FromQueryResult)]
    struct CartLine {
        product_id: Uuid,
        quantity: i32,
        unit_price: i64,
    }

    let lines = CartItems::find()
        .select_only()
        .column_as(CartItemCol::ProductId, "product_id")
        .column_as(CartItemCol::Quantity, "quantity")
        .column_as(products::Column::DiscountedPrice, "unit_price")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartItemCol::CartId.eq(cart.id))
        .into_model::<CartLine>()
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    // Line totals are recomputed from the live discounted price, not taken
    // from the stored cart item totals.
    let mut order_amount: i64 = 0;
    for line in &lines {
        order_amount += (line.quantity as i64) * line.unit_price;
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        billing_name: Set(payload.billing_name),
        billing_phone: Set(payload.billing_phone),
        billing_address: Set(payload.billing_address),
        order_amount: Set(order_amount),
        order_status: Set(payload
            .order_status
            .unwrap_or_else(|| "PENDING".to_string())),
        payment_status: Set(payload
            .payment_status
            .unwrap_or_else(|| "NOTPAID".to_string())),
        order_date: Set(Utc::now().into()),
        delivered_date: Set(None),
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::new();
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            total_price: Set((line.quantity as i64) * line.unit_price),
        }
        .insert(&txn)
        .await?;

        items.push(order_item_from_entity(item));
    }

    // The source cart empties in the same transaction as the order insert.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(payload.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_orders_of_user(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<UserOrderList>> {
    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    if user.is_none() {
        return Err(AppError::NotFound("user"));
    }

    let rows = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .find_with_related(OrderItems)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(order, order_items)| OrderWithItems {
            order: order_from_entity(order),
            items: order_items.into_iter().map(order_item_from_entity).collect(),
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        UserOrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, per_page, offset) = query.pagination().normalize();

    let sort_by = match query.sort_by.as_deref() {
        Some(field) => OrderSortBy::parse(field)
            .ok_or_else(|| AppError::BadRequest(format!("unknown sort field: {field}")))?,
        None => OrderSortBy::OrderDate,
    };
    let sort_dir = SortOrder::from_param(query.sort_dir.as_deref());

    let mut finder = Orders::find();
    finder = match sort_dir {
        SortOrder::Asc => finder.order_by_asc(sort_column(sort_by)),
        SortOrder::Desc => finder.order_by_desc(sort_column(sort_by)),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn remove_order(
    state: &AppState,
    order_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // Order items go with the order through ON DELETE CASCADE.
    let result = Orders::delete_by_id(order_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("order"));
    }

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "order_remove",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message_only("Order removed"))
}

fn sort_column(sort_by: OrderSortBy) -> OrderCol {
    match sort_by {
        OrderSortBy::OrderDate => OrderCol::OrderDate,
        OrderSortBy::OrderAmount => OrderCol::OrderAmount,
        OrderSortBy::BillingName => OrderCol::BillingName,
        OrderSortBy::OrderStatus => OrderCol::OrderStatus,
        OrderSortBy::PaymentStatus => OrderCol::PaymentStatus,
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        billing_name: model.billing_name,
        billing_phone: model.billing_phone,
        billing_address: model.billing_address,
        order_amount: model.order_amount,
        order_status: model.order_status,
        payment_status: model.payment_status,
        order_date: model.order_date.with_timezone(&Utc),
        delivered_date: model.delivered_date.map(|dt| dt.with_timezone(&Utc)),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        total_price: model.total_price,
    }
}
