use crate::db::{DbPool, OrmConn};

/// Shared handles cloned into every handler. Entity work goes through `orm`,
/// the raw pool serves the audit trail and startup migrations.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}
