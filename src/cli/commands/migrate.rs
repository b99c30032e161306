use serde_json::json;
use sqlx::PgPool;

use crate::cli::OutputFormat;
use crate::database::manager;

pub async fn handle(pool: &PgPool, output_format: OutputFormat) -> anyhow::Result<()> {
    manager::init_schema(pool).await?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "migrated": true })),
        OutputFormat::Text => println!("Schema is up to date"),
    }
    Ok(())
}
