use axum_shop_api::{
    db::{DbPool, create_pool},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        orders::{CartItemRequest, PlaceOrderRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{auth_service, order_service, product_service},
    state::AppState,
    token::TokenKeys,
};
use rust_decimal::Decimal;

// Integration flow: register/login, place an order against live stock, then
// verify that rejected orders leave the store completely untouched.
#[tokio::test]
async fn register_login_and_order_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // --- registration ---
    let registered = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "alice".into(),
            password: "secret1".into(),
        },
    )
    .await?;
    assert!(registered.user_id > 0);

    let duplicate = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "alice".into(),
            password: "secret1".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // The fast-path existence check caught the duplicate above. Under
    // concurrent registrations the insert itself can still collide, so the
    // unique constraint is the real guard; a raw duplicate insert must fail
    // with the violation the service maps to Conflict.
    let raw_duplicate =
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
            .bind("alice")
            .bind("irrelevant")
            .execute(&state.pool)
            .await;
    match raw_duplicate {
        Err(sqlx::Error::Database(db)) => assert!(db.is_unique_violation()),
        other => panic!("expected unique violation, got {other:?}"),
    }

    let too_short = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "al".into(),
            password: "secret1".into(),
        },
    )
    .await;
    assert!(matches!(too_short, Err(AppError::Validation(_))));

    // --- login ---
    let login = auth_service::login_user(
        &state,
        LoginRequest {
            username: "alice".into(),
            password: "secret1".into(),
        },
    )
    .await?;
    assert_eq!(login.username, "alice");
    assert_eq!(login.user_id, registered.user_id);

    let claims = state.tokens.verify(&login.token)?;
    assert_eq!(claims.sub, registered.user_id);
    assert_eq!(claims.username, "alice");

    let bad_login = auth_service::login_user(
        &state,
        LoginRequest {
            username: "alice".into(),
            password: "wrongpass".into(),
        },
    )
    .await;
    assert!(matches!(bad_login, Err(AppError::Unauthorized(_))));

    let user = AuthUser {
        user_id: claims.sub,
        username: claims.username,
    };

    // --- catalog ---
    let keyboard = seed_product(&state.pool, "Keyboard", "99.99", 50).await?;
    let mouse = seed_product(&state.pool, "Mouse", "5.00", 10).await?;

    let listed = product_service::list_products(&state.pool).await?;
    let fetched = product_service::get_product(&state.pool, keyboard).await?;
    let from_list = listed
        .iter()
        .find(|p| p.id == keyboard)
        .expect("seeded product in listing");
    assert_eq!(from_list.price, fetched.price);
    assert_eq!(from_list.stock_quantity, fetched.stock_quantity);

    let missing = product_service::get_product(&state.pool, 999_999).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    // --- successful order ---
    let placed = order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![
                CartItemRequest {
                    product_id: keyboard,
                    quantity: 2,
                    price_at_purchase: dec("99.99"),
                },
                CartItemRequest {
                    product_id: mouse,
                    quantity: 1,
                    price_at_purchase: dec("5.00"),
                },
            ],
            total: Some(dec("204.98")),
        },
    )
    .await?;

    assert_eq!(stock_of(&state.pool, keyboard).await?, 48);
    assert_eq!(stock_of(&state.pool, mouse).await?, 9);
    assert_eq!(order_count(&state.pool).await?, 1);
    assert_eq!(item_count(&state.pool).await?, 2);

    // --- oversized quantity aborts the whole order ---
    let oversell = order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![
                CartItemRequest {
                    product_id: mouse,
                    quantity: 1,
                    price_at_purchase: dec("5.00"),
                },
                CartItemRequest {
                    product_id: keyboard,
                    quantity: 1000,
                    price_at_purchase: dec("99.99"),
                },
            ],
            total: Some(dec("99995.00")),
        },
    )
    .await;
    assert!(matches!(
        oversell,
        Err(AppError::InsufficientStock { .. })
    ));
    // No partial writes: stock, orders and items all unchanged.
    assert_eq!(stock_of(&state.pool, keyboard).await?, 48);
    assert_eq!(stock_of(&state.pool, mouse).await?, 9);
    assert_eq!(order_count(&state.pool).await?, 1);
    assert_eq!(item_count(&state.pool).await?, 2);

    // --- stale-cart price is rejected ---
    let stale = order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![CartItemRequest {
                product_id: keyboard,
                quantity: 1,
                price_at_purchase: dec("89.99"),
            }],
            total: Some(dec("89.99")),
        },
    )
    .await;
    assert!(matches!(stale, Err(AppError::PriceMismatch { .. })));
    assert_eq!(order_count(&state.pool).await?, 1);

    // --- unknown product, empty cart, missing total ---
    let unknown = order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![CartItemRequest {
                product_id: 999_999,
                quantity: 1,
                price_at_purchase: dec("1.00"),
            }],
            total: Some(dec("1.00")),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::NotFound)));

    let empty = order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![],
            total: Some(dec("0.00")),
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let no_total = order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![CartItemRequest {
                product_id: mouse,
                quantity: 1,
                price_at_purchase: dec("5.00"),
            }],
            total: None,
        },
    )
    .await;
    assert!(matches!(no_total, Err(AppError::Validation(_))));

    // --- history: newest first, price snapshot survives price changes ---
    order_service::place_order(
        &state.pool,
        &user,
        PlaceOrderRequest {
            items: vec![CartItemRequest {
                product_id: mouse,
                quantity: 2,
                price_at_purchase: dec("5.00"),
            }],
            total: Some(dec("10.00")),
        },
    )
    .await?;

    sqlx::query("UPDATE products SET price = $1 WHERE id = $2")
        .bind(dec("7.50"))
        .bind(mouse)
        .execute(&state.pool)
        .await?;

    let history = order_service::list_orders(&state.pool, &user).await?;
    assert_eq!(history.len(), 2);
    assert!(history[0].order.order_date >= history[1].order.order_date);
    assert_eq!(history[1].order.id, placed.order_id);
    assert_eq!(history[0].order.status, "Pending");

    let mouse_line = history[0]
        .items
        .iter()
        .find(|i| i.product_id == mouse)
        .expect("mouse line in latest order");
    assert_eq!(mouse_line.price_at_purchase, dec("5.00"));
    assert_eq!(mouse_line.name, "Mouse");

    Ok(())
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs
    sqlx::query("TRUNCATE TABLE order_items, orders, products, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await?;

    Ok(AppState {
        pool,
        tokens: TokenKeys::new("integration-test-secret"),
    })
}

async fn seed_product(
    pool: &DbPool,
    name: &str,
    price: &str,
    stock: i32,
) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO products (name, description, price, image_url, stock_quantity) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(name)
    .bind(format!("{name} for testing"))
    .bind(dec(price))
    .bind("/images/test.jpg")
    .bind(stock)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn stock_of(pool: &DbPool, id: i64) -> anyhow::Result<i32> {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock_quantity FROM products WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(stock)
}

async fn order_count(pool: &DbPool) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn item_count(pool: &DbPool) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM order_items")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
