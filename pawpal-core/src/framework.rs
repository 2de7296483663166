use sqlx::PgPool;

/// Postgres-backed executor for the SQL processors in [`crate::entities`].
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
