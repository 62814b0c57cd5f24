//! Apply migrations and load the demo products and customers.

use anyhow::Context;
use crm_api::config::LogFormat;
use crm_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(LogFormat::Pretty);

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = crm_db::create_pool(&database_url)
        .await
        .context("failed to connect to database")?;

    crm_db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let report = crm_db::seed::run(&pool).await.context("seeding failed")?;
    tracing::info!(
        products_created = report.products_created,
        customers_created = report.customers_created,
        "Seeding complete"
    );

    pool.close().await;
    Ok(())
}
