/// NATS JetStream trigger for the sample function
///
/// Binds the durable subscription to the sample topic, pulls batches and
/// acknowledges each message once its row is written.

use async_nats::jetstream::{self, consumer::pull, AckKind};
use futures::StreamExt;

use crate::config::TriggerConfig;
use crate::dispatch::dispatch;
use crate::error::AppError;
use crate::function::SampleFunction;
use crate::logger::Logger;
use crate::models::{SampleMessage, SampleTableEntity};
use crate::table::TableSink;

fn broker_err(context: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Broker(format!("{}: {}", context, e))
}

/// Run [`dispatch`] off the async worker; Diesel and r2d2 calls block.
///
/// Requires the multi-threaded runtime.
pub fn dispatch_blocking<L, S>(
    payload: &[u8],
    function: &SampleFunction<L>,
    sink: &S,
) -> Result<SampleTableEntity, AppError>
where
    L: Logger,
    S: TableSink + ?Sized,
{
    tokio::task::block_in_place(|| dispatch(payload, function, sink))
}

pub struct NatsTrigger {
    jetstream: jetstream::Context,
    consumer: jetstream::consumer::Consumer<pull::Config>,
    config: TriggerConfig,
}

impl NatsTrigger {
    /// Connect to NATS and bind the durable subscription
    pub async fn connect(config: TriggerConfig) -> Result<Self, AppError> {
        let client = async_nats::connect(&config.nats_url)
            .await
            .map_err(|e| broker_err("connect", e))?;
        tracing::info!("Connected to NATS at {}", config.nats_url);

        let jetstream = jetstream::new(client);

        let stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream_name.clone(),
                subjects: vec![config.topic.clone()],
                max_age: config.max_age,
                storage: jetstream::stream::StorageType::File,
                num_replicas: 1,
                ..Default::default()
            })
            .await
            .map_err(|e| broker_err("create stream", e))?;

        tracing::info!("JetStream stream '{}' ready", config.stream_name);

        let consumer = stream
            .get_or_create_consumer(
                &config.subscription,
                pull::Config {
                    durable_name: Some(config.subscription.clone()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    max_deliver: config.max_deliver,
                    filter_subject: config.topic.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| broker_err("create consumer", e))?;

        tracing::info!(
            "Subscription '{}' bound to topic '{}'",
            config.subscription,
            config.topic
        );

        Ok(Self {
            jetstream,
            consumer,
            config,
        })
    }

    /// Pull and handle messages until ctrl-c
    pub async fn run<L, S>(&self, function: &SampleFunction<L>, sink: &S) -> Result<(), AppError>
    where
        L: Logger,
        S: TableSink + ?Sized,
    {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown requested, stopping subscription '{}'", self.config.subscription);
                    return Ok(());
                }
                _ = async {
                    self.process_batch(function, sink).await;
                    tokio::time::sleep(self.config.poll_interval).await;
                } => {}
            }
        }
    }

    async fn process_batch<L, S>(&self, function: &SampleFunction<L>, sink: &S)
    where
        L: Logger,
        S: TableSink + ?Sized,
    {
        let mut messages = match self
            .consumer
            .fetch()
            .max_messages(self.config.batch_size)
            .messages()
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!("Failed to fetch messages: {}", e);
                return;
            }
        };

        while let Some(msg) = messages.next().await {
            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!("Error receiving message: {}", e);
                    continue;
                }
            };

            match dispatch_blocking(&msg.payload, function, sink) {
                Ok(_) => {
                    if let Err(e) = msg.ack().await {
                        tracing::error!("Failed to ACK message: {}", e);
                    }
                }
                Err(e) => {
                    let delivered = msg.info().map(|info| info.delivered).unwrap_or(1);
                    tracing::warn!(
                        "Failed to process message (delivery {} of {}): {}",
                        delivered,
                        self.config.max_deliver,
                        e
                    );

                    if let Err(nak_err) = msg.ack_with(AckKind::Nak(None)).await {
                        tracing::error!("Failed to NAK message: {}", nak_err);
                    }
                }
            }
        }
    }

    /// Publish a sample message on the topic and wait for the stream ack
    pub async fn publish(&self, sample: &SampleMessage) -> Result<(), AppError> {
        let payload = serde_json::to_vec(sample)?;

        let ack = self
            .jetstream
            .publish(self.config.topic.clone(), payload.into())
            .await
            .map_err(|e| broker_err("publish", e))?;
        ack.await
            .map_err(|e| broker_err("publish ack", e))?;

        tracing::debug!("Published message {} to {}", sample.id, self.config.topic);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::TracingLogger;
    use crate::table::MemoryTable;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dispatch_blocking_on_runtime() {
        let function = SampleFunction::new(TracingLogger);
        let table = MemoryTable::new();

        let row = dispatch_blocking(br#"{"Id": "5", "Message": "pooled"}"#, &function, &table).unwrap();

        assert_eq!(row.message, "pooled");
        assert_eq!(table.rows(), vec![row]);
    }
}
