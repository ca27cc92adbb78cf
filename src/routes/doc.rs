use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartDto, CartItemDto},
        orders::{OrderList, OrderWithItems, UserOrderList},
    },
    models::{Order, OrderItem, Product},
    response::{ApiResponse, Meta},
    routes::{cart, health, orders, params},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::get_cart,
        cart::add_item,
        cart::remove_item,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::orders_of_user,
        orders::remove_order
    ),
    components(
        schemas(
            Product,
            Order,
            OrderItem,
            CartDto,
            CartItemDto,
            OrderList,
            OrderWithItems,
            UserOrderList,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<CartDto>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<UserOrderList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Carts", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
