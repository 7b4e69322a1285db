use rust_decimal::Decimal;

use crate::{
    db::DbPool,
    dto::orders::{OrderWithItems, PlaceOrderRequest, PlaceOrderResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItemDetail},
};

/// Validates the cart against live stock and prices, then commits the order,
/// its line items and the stock decrements as one transaction.
///
/// Every product row in the cart is read with `FOR UPDATE`, so two orders
/// racing for the same stock serialize on the row lock and the later one sees
/// the decremented quantity. Any failure after `begin` returns early; the
/// transaction rolls back when it drops without a commit, leaving no partial
/// order and no partial stock decrement.
pub async fn place_order(
    pool: &DbPool,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<PlaceOrderResponse> {
    let total = payload
        .total
        .ok_or_else(|| AppError::Validation("total is required".into()))?;

    if payload.items.is_empty() {
        return Err(AppError::Validation(
            "Order must contain at least one item".into(),
        ));
    }
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "Invalid quantity for product {}",
                item.product_id
            )));
        }
    }

    let mut txn = pool.begin().await?;

    for item in &payload.items {
        let row: Option<(Decimal, i32)> =
            sqlx::query_as("SELECT price, stock_quantity FROM products WHERE id = $1 FOR UPDATE")
                .bind(item.product_id)
                .fetch_optional(&mut *txn)
                .await?;

        let (price, stock) = row.ok_or(AppError::NotFound)?;

        if item.quantity > stock {
            return Err(AppError::InsufficientStock {
                product_id: item.product_id,
            });
        }

        // Stale-cart guard: the client's price must still match the stored
        // one, both at two decimal places.
        if item.price_at_purchase.round_dp(2) != price.round_dp(2) {
            return Err(AppError::PriceMismatch {
                product_id: item.product_id,
            });
        }
    }

    // The declared total is recorded as-is; it is not cross-checked against
    // the sum of line totals.
    let (order_id,): (i64,) = sqlx::query_as(
        "INSERT INTO orders (user_id, total, status) VALUES ($1, $2, 'Pending') RETURNING id",
    )
    .bind(user.user_id)
    .bind(total)
    .fetch_one(&mut *txn)
    .await?;

    for item in &payload.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price_at_purchase.round_dp(2))
        .execute(&mut *txn)
        .await?;

        sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $1 WHERE id = $2")
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *txn)
            .await?;
    }

    txn.commit().await?;

    tracing::info!(order_id, user_id = user.user_id, "order placed");

    Ok(PlaceOrderResponse {
        message: "Order placed".into(),
        order_id,
    })
}

/// A user's orders, newest first, each with its line items joined against the
/// product's current name and image.
pub async fn list_orders(pool: &DbPool, user: &AuthUser) -> AppResult<Vec<OrderWithItems>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY order_date DESC",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price_at_purchase,
                   p.name, p.image_url
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(order.id)
        .fetch_all(pool)
        .await?;

        result.push(OrderWithItems { order, items });
    }

    Ok(result)
}
