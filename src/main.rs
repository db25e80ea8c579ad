use leaderboard::{error::ServerError, start_server};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    start_server().await
}
