use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only a case-insensitive "desc" sorts descending; anything else,
    /// including an absent parameter, sorts ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSortBy {
    OrderDate,
    OrderAmount,
    BillingName,
    OrderStatus,
    PaymentStatus,
}

impl OrderSortBy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "order_date" => Some(OrderSortBy::OrderDate),
            "order_amount" => Some(OrderSortBy::OrderAmount),
            "billing_name" => Some(OrderSortBy::BillingName),
            "order_status" => Some(OrderSortBy::OrderStatus),
            "payment_status" => Some(OrderSortBy::PaymentStatus),
            _ => None,
        }
    }
}

// Kept flat: serde_urlencoded cannot drive numeric fields through
// #[serde(flatten)].
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
