pub mod lead;
pub mod sqlx_repo;
