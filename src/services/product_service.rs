use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::Product,
};

/// Full catalog snapshot. No pagination; the catalog is small by design.
pub async fn list_products(pool: &DbPool) -> AppResult<Vec<Product>> {
    let items = sqlx::query_as::<_, Product>("SELECT * FROM products")
        .fetch_all(pool)
        .await?;
    Ok(items)
}

pub async fn get_product(pool: &DbPool, id: i64) -> AppResult<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}
