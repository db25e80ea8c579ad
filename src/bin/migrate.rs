use leaderboard::{config::Config, error::ServerError, init_tracing, store::SqliteStore};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    init_tracing();

    let config = Config::load()?;
    SqliteStore::open(&config.database_path).await?;

    Ok(())
}
