mod cli;
mod infra;
mod report;
mod routes;
mod server;

use value_agent::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
