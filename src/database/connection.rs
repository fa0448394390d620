use mongodb::{bson::doc, Client, Database};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::errors::Result;

pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.database_url).await?;
    let db = client.database(&config.database_name);

    match db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => info!("✅ Connected to database: {}", config.database_name),
        Err(e) => {
            error!("❌ Database '{}' is not reachable: {}", config.database_name, e);
            return Err(e.into());
        }
    }

    Ok(db)
}
