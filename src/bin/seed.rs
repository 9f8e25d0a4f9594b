use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::NaiveDate;
use toko_api::{
    config::AppConfig,
    db::{DbPool, create_orm_conn, run_migrations, shared_pool},
    models::Role,
};

struct SeedUser<'a> {
    email: &'a str,
    username: &'a str,
    phone: &'a str,
    password: &'a str,
    role: Role,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    let pool = shared_pool(&orm);
    run_migrations(&pool).await?;

    let admin_id = ensure_user(
        &pool,
        SeedUser {
            email: "admin@example.com",
            username: "admin",
            phone: "081200000001",
            password: "admin123",
            role: Role::Admin,
        },
    )
    .await?;
    let user_id = ensure_user(
        &pool,
        SeedUser {
            email: "user@example.com",
            username: "user",
            phone: "081200000002",
            password: "user123",
            role: Role::User,
        },
    )
    .await?;
    seed_products(&pool).await?;

    orm.close().await?;
    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(pool: &DbPool, user: SeedUser<'_>) -> anyhow::Result<i32> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(user.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    let dob = NaiveDate::from_ymd_opt(1990, 1, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid seed date"))?;

    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, username, phone, password_hash, gender, dob, address, role)
        VALUES ($1, $2, $3, $4, 'L', $5, '', $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, updated_at = now()
        RETURNING id
        "#,
    )
    .bind(user.email)
    .bind(user.username)
    .bind(user.phone)
    .bind(password_hash)
    .bind(dob)
    .bind(user.role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {} (role={})", user.email, user.role);
    Ok(id)
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<()> {
    let products = [
        ("P-001", "Kopi Arabika 250g", "makanan", 85000.0, "Biji kopi sangrai medium"),
        ("P-002", "Teh Melati", "minuman", 15000.0, "Teh melati kemasan 25 kantong"),
        ("P-003", "Kaos Polos", "pakaian", 60000.0, "Kaos katun combed 30s"),
        ("P-004", "E-book Rust Async", "digital", 120000.0, "Panduan pemrograman async"),
    ];

    for (code, name, kind, price, desc) in products {
        sqlx::query(
            r#"
            INSERT INTO products (product_code, name, type, price, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(kind)
        .bind(price)
        .bind(desc)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
