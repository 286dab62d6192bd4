use serde_json::Value;

use crate::config::Config;
use crate::dispatch::{Ack, Dispatcher};
use crate::error::HandlerError;
use crate::interpret::interpret;
use crate::message::render;


/// Runs one event through interpret, render and dispatch.
///
/// Diagnostic lines are only written when `enable_logging` is set; failures are always logged.
/// An event that cannot be interpreted never reaches the webhook.
pub async fn handle_event(raw: &Value, config: &Config, dispatcher: &Dispatcher) -> Result<Ack, HandlerError> {
    if config.enable_logging {
        tracing::info!("Received event: {}", raw);
    }

    let event = interpret(raw).map_err(|err| {
        tracing::error!("Error interpreting event: {}", err);
        err
    })?;

    let message = render(&event, config);
    if config.enable_logging {
        match serde_json::to_string(&message) {
            Ok(json) => tracing::info!("Rendered message: {}", json),
            Err(err) => tracing::warn!("Could not serialize message for logging: {}", err),
        }
    }

    match dispatcher.dispatch(&message).await {
        Ok(ack) => {
            if config.enable_logging {
                tracing::info!("Webhook response: {} {}", ack.status, ack.body);
            }
            Ok(ack)
        }
        Err(err) => {
            tracing::error!(
                "Error dispatching {} notification ({:?}): {}",
                event.event_name.as_str(),
                err.kind(),
                err
            );
            Err(err.into())
        }
    }
}
