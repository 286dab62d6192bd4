mod config;
mod dispatch;
mod error;
mod handler;
mod interpret;
mod message;
mod models;
mod queue;

use std::env;

use aws_sdk_sqs::Client;
use tracing_subscriber::filter;

use config::Config;
use dispatch::Dispatcher;
use error::ConfigError;
use handler::handle_event;
use queue::{delete_message, receive_session_event};


#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {

    tracing_subscriber::fmt()
        .with_level(true)
        .with_max_level(filter::LevelFilter::INFO)
        .init();


    let config = Config::from_env().inspect_err(|err| {
        tracing::error!("Invalid configuration: {}", err);
    })?;
    let queue_url = env::var("SESSION_EVENT_QUEUE_URL")
        .map_err(|_| ConfigError::Missing("SESSION_EVENT_QUEUE_URL"))
        .inspect_err(|err| tracing::error!("Invalid configuration: {}", err))?;

    let dispatcher = Dispatcher::new(&config)?;
    let client = aws_sdk_sqs::Client::new(&aws_config::load_from_env().await);

    if config.enable_logging {
        tracing::info!("Polling {} for session events", queue_url);
    }

    loop {
        let queued_opt = match receive_session_event(&client, &queue_url).await {
            Ok(queued) => queued,
            Err(err) => {
                tracing::error!("Error receiving session event: {}", err);
                // Back off before asking the queue again
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                None
            }
        };

        if let Some(queued) = queued_opt {
            if process(&queued.body, &config, &dispatcher).await {
                acknowledge(&client, &queue_url, &queued.receipt_handle).await;
            }
        }
    }
}


/// Returns whether the event was handled and may be removed from the queue.
async fn process(body: &str, config: &Config, dispatcher: &Dispatcher) -> bool {
    let raw: serde_json::Value = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!("Failed to parse message body as JSON: {}", err);
            return false;
        }
    };

    handle_event(&raw, config, dispatcher).await.is_ok()
}

async fn acknowledge(client: &Client, queue_url: &str, receipt_handle: &str) {
    delete_message(client, queue_url, receipt_handle)
        .await
        .unwrap_or_else(|err| {
            tracing::error!("Error deleting message: {}", err);
        });
}
