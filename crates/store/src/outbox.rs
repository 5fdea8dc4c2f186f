//! Durable outbox records.

use chrono::{DateTime, Utc};
use common::CorrelationId;
use domain::CatalogEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durably recorded pending or processed event.
///
/// Written in the same transaction as the business state it describes; the
/// relay is the only writer afterwards, and it only ever sets
/// `processed_at`. Once set, `processed_at` is never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub correlation_id: CorrelationId,
}

impl OutboxRecord {
    /// Creates a pending record carrying the event's wire payload.
    pub fn for_event(
        event: &CatalogEvent,
        correlation_id: CorrelationId,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            payload: event.payload()?,
            created_at: Utc::now(),
            processed_at: None,
            correlation_id,
        })
    }

    /// Returns true if the record has not been published yet.
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }
}
