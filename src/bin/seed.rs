use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_shop_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_id = ensure_user(&pool, "demo", "demo123").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, username: &str, password: &str) -> anyhow::Result<i64> {
    if let Some((id,)) = sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?
    {
        return Ok(id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id")
            .bind(username)
            .bind(password_hash)
            .fetch_one(pool)
            .await?;

    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM products")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let products: [(&str, &str, Decimal, &str, i32); 4] = [
        (
            "Mechanical Keyboard",
            "Tenkeyless, hot-swappable switches",
            Decimal::new(8999, 2),
            "/images/keyboard.jpg",
            25,
        ),
        (
            "Wireless Mouse",
            "Ergonomic, 2.4 GHz receiver",
            Decimal::new(2999, 2),
            "/images/mouse.jpg",
            50,
        ),
        (
            "USB-C Hub",
            "7-in-1 with HDMI and card reader",
            Decimal::new(4550, 2),
            "/images/hub.jpg",
            40,
        ),
        (
            "Laptop Stand",
            "Adjustable aluminium stand",
            Decimal::new(3475, 2),
            "/images/stand.jpg",
            30,
        ),
    ];

    for (name, description, price, image_url, stock) in products {
        sqlx::query(
            "INSERT INTO products (name, description, price, image_url, stock_quantity) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(image_url)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    Ok(())
}
