use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
};

/// Shared handles cloned into every handler. The sqlx pool serves the
/// simple query paths, the SeaORM connection the transactional order
/// flow; both point at the same database.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
}
