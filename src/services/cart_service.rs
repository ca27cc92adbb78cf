use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddItemToCartRequest, CartDto, CartItemDto},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{self, ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        products::{self, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_cart_by_user(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<CartDto>> {
    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    if user.is_none() {
        return Err(AppError::NotFound("user"));
    }

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::NotFound("cart")),
    };

    let dto = load_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success("OK", dto, Some(Meta::empty())))
}

pub async fn add_item_to_cart(
    state: &AppState,
    user_id: Uuid,
    payload: AddItemToCartRequest,
) -> AppResult<ApiResponse<CartDto>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound("product")),
    };

    let user = Users::find_by_id(user_id).one(&txn).await?;
    if user.is_none() {
        return Err(AppError::NotFound("user"));
    }

    // Take the cart row under FOR UPDATE so writers to one cart serialize.
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => {
            // First item for this user. The unique index on carts.user_id
            // keeps racing first adds from creating a second cart.
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    let line_total = product.discounted_price * (payload.quantity as i64);

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    match existing {
        Some(item) => {
            // Same product again: replace the quantity, never accumulate.
            let mut active: CartItemActive = item.into();
            active.quantity = Set(payload.quantity);
            active.total_price = Set(line_total);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                total_price: Set(line_total),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    let dto = load_cart(&txn, &cart).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "cart_add_item",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", dto, Some(Meta::empty())))
}

pub async fn remove_item_from_cart(
    state: &AppState,
    user_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // Deletes by item id alone; the caller is not matched against the
    // owning cart.
    let result = CartItems::delete_by_id(item_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("cart item"));
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "cart_remove_item",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message_only("Item removed from cart"))
}

pub async fn clear_cart(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let user = Users::find_by_id(user_id).one(&txn).await?;
    if user.is_none() {
        return Err(AppError::NotFound("user"));
    }

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::NotFound("cart")),
    };

    // Empty the cart but keep the row; the cart survives its items.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "cart_clear",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_id": cart.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::message_only("Cart is cleared"))
}

// Snapshot a cart with its items and their products, oldest item first.
async fn load_cart<C>(conn: &C, cart: &carts::Model) -> AppResult<CartDto>
where
    C: ConnectionTrait,
{
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .find_also_related(Products)
        .all(conn)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart item {} has no product row", item.id))
        })?;
        items.push(CartItemDto {
            id: item.id,
            product: product_from_entity(product),
            quantity: item.quantity,
            total_price: item.total_price,
        });
    }

    Ok(CartDto {
        id: cart.id,
        user_id: cart.user_id,
        created_at: cart.created_at.with_timezone(&Utc),
        items,
    })
}

fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        discounted_price: model.discounted_price,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
