use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;

use crate::domain::errors::PublishError;

use super::publisher::{EventMessage, EventSink};

pub const ROUTING_KEY_HEADER: &str = "routing_key";

#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub brokers: String,
    /// Topic playing the role of the order exchange.
    pub topic: String,
    pub partitions: i32,
    pub replication_factor: i32,
    pub send_timeout: Duration,
}

/// Publishes order events to a single Kafka topic. The routing key travels
/// in a header; the order id is the message key.
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaSink {
    /// Creates the producer, checks that the cluster answers, and declares the
    /// topic. Any failure here leaves the caller to run without a broker.
    pub async fn connect(settings: &KafkaSettings) -> Result<Self, PublishError> {
        let timeout_ms = settings.send_timeout.as_millis().to_string();
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("message.timeout.ms", &timeout_ms)
            .set("acks", "all")
            .create()
            .map_err(broker_error)?;

        let probe = producer.clone();
        let probe_timeout = settings.send_timeout;
        tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(None, probe_timeout)
                .map(|_| ())
        })
        .await
        .map_err(|e| PublishError::Broker(e.to_string()))?
        .map_err(broker_error)?;

        declare_topic(settings).await?;
        log::info!(
            "Publishing order events to Kafka topic '{}' at {}",
            settings.topic,
            settings.brokers
        );

        Ok(Self {
            producer,
            topic: settings.topic.clone(),
            send_timeout: settings.send_timeout,
        })
    }
}

async fn declare_topic(settings: &KafkaSettings) -> Result<(), PublishError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", &settings.brokers)
        .create()
        .map_err(broker_error)?;

    let topic = NewTopic::new(
        &settings.topic,
        settings.partitions,
        TopicReplication::Fixed(settings.replication_factor),
    );
    let options = AdminOptions::new().operation_timeout(Some(settings.send_timeout));
    let results = admin
        .create_topics(&[topic], &options)
        .await
        .map_err(broker_error)?;

    for result in results {
        match result {
            Ok(_) => log::info!("Declared topic '{}'", settings.topic),
            Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {}
            Err((name, code)) => {
                return Err(PublishError::Broker(format!(
                    "could not declare topic '{name}': {code}"
                )))
            }
        }
    }
    Ok(())
}

fn broker_error(e: KafkaError) -> PublishError {
    match e {
        KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut) => PublishError::Timeout,
        other => PublishError::Broker(other.to_string()),
    }
}

impl EventSink for KafkaSink {
    async fn send(&self, message: &EventMessage) -> Result<(), PublishError> {
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: ROUTING_KEY_HEADER,
                value: Some(message.routing_key),
            })
            .insert(Header {
                key: "content-type",
                value: Some("application/json"),
            });
        let record = FutureRecord::to(&self.topic)
            .key(&message.key)
            .payload(&message.payload)
            .headers(headers);

        let delivery = self
            .producer
            .send(record, Timeout::After(self.send_timeout));
        match tokio::time::timeout(self.send_timeout, delivery).await {
            Err(_) => Err(PublishError::Timeout),
            Ok(Err((e, _))) => Err(broker_error(e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn flush(&self) {
        let producer = self.producer.clone();
        let timeout = self.send_timeout;
        match tokio::task::spawn_blocking(move || producer.flush(timeout)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Kafka flush incomplete: {}", e),
            Err(e) => log::warn!("Kafka flush task failed: {}", e),
        }
    }
}
