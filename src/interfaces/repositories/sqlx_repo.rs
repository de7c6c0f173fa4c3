use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxLeadRepo {
    pub pool: PgPool,
}
