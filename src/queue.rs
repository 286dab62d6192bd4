use aws_sdk_sqs::Client;
use aws_sdk_sqs::types::Message;


// Long poll so an idle queue does not spin the loop.
const WAIT_TIME_SECONDS: i32 = 20;

/// One queued EventBridge delivery. The body is kept raw so that a payload which is
/// not valid JSON still reaches the handler's error path and gets logged.
#[derive(Debug, PartialEq, Eq)]
pub struct QueuedEvent {
    pub body: String,
    pub receipt_handle: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Received {
    Event(QueuedEvent),
    /// Nothing to hand to the handler, and nothing a redelivery would fix.
    Empty { receipt_handle: Option<String> },
}

fn classify(message: Message) -> Received {
    match message.body {
        Some(body) => Received::Event(QueuedEvent {
            body,
            receipt_handle: message.receipt_handle.unwrap_or_default(),
        }),
        None => Received::Empty {
            receipt_handle: message.receipt_handle,
        },
    }
}


pub async fn receive_session_event(client: &Client, queue_url: &str) -> Result<Option<QueuedEvent>, aws_sdk_sqs::Error> {
    let rcv_message_output = client
        .receive_message()
        .queue_url(queue_url)
        .max_number_of_messages(1)
        .wait_time_seconds(WAIT_TIME_SECONDS)
        .send()
        .await?;

    for message in rcv_message_output.messages.unwrap_or_default() {
        match classify(message) {
            Received::Event(queued) => return Ok(Some(queued)),
            Received::Empty { receipt_handle } => {
                tracing::error!("Received message with no body, discarding it.");
                if let Some(receipt_handle) = receipt_handle {
                    delete_message(client, queue_url, &receipt_handle)
                        .await
                        .unwrap_or_else(|err| {
                            tracing::error!("Error deleting message: {}", err);
                        });
                }
            }
        }
    }

    Ok(None)
}

/// Acknowledges a handled event. Failed events are left on the queue for its redrive policy.
pub async fn delete_message(client: &Client, queue_url: &str, receipt_handle: &str) -> Result<(), aws_sdk_sqs::Error> {
    client
        .delete_message()
        .queue_url(queue_url)
        .receipt_handle(receipt_handle)
        .send()
        .await?;

    tracing::debug!("Message deleted successfully");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_with_body_is_handed_on() {
        let message = Message::builder()
            .body(r#"{"detail":{}}"#)
            .receipt_handle("handle-1")
            .build();

        assert_eq!(classify(message), Received::Event(QueuedEvent {
            body: r#"{"detail":{}}"#.to_string(),
            receipt_handle: "handle-1".to_string(),
        }));
    }

    #[test]
    fn message_without_body_is_marked_for_discard() {
        let message = Message::builder().receipt_handle("handle-2").build();

        assert_eq!(classify(message), Received::Empty {
            receipt_handle: Some("handle-2".to_string()),
        });
    }
}
