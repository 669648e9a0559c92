use std::fmt::{Debug, Display};

use fitness_gym::core::{get_subscriber, init_subscriber, AppConfig};
use fitness_gym::gym_web_server::GymWebServer;
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = std::env::var("GYM_LOG_DIR").unwrap_or_else(|_| "/var/tmp/log/fitness_gym".into());
    let file_appender = tracing_appender::rolling::daily(log_dir, "app");

    let subscriber = get_subscriber("fitness_gym".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new()?;

    let gym_web_server = GymWebServer::build(config.clone()).await?;
    let port = gym_web_server.port();

    let server_task = tokio::spawn(gym_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "🚀 Server started on Addr: {}:{}",
        config.server.host, port
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        outcome = server_task => report_exit("API server", outcome),
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
