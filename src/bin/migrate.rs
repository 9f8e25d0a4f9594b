use toko_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations, shared_pool},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&shared_pool(&orm)).await?;
    orm.close().await?;
    println!("Migrations applied");
    Ok(())
}
