//! Stub delivery for testing and offline runs

use async_trait::async_trait;
use coupon_herald_domain::{ActionLink, DeliveryError, DeliveryPort, DeliveryReceipt};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

/// Failure a stub can be scripted to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    Api,
    Auth,
    RateLimited,
    Network,
    Unconfirmed,
}

impl StubFailure {
    fn to_error(self) -> DeliveryError {
        match self {
            StubFailure::Api => DeliveryError::Api("stub: scripted api failure".to_string()),
            StubFailure::Auth => DeliveryError::Auth("stub: scripted auth failure".to_string()),
            StubFailure::RateLimited => DeliveryError::RateLimited(Some(Duration::from_secs(30))),
            StubFailure::Network => {
                DeliveryError::Network("stub: scripted network failure".to_string())
            }
            StubFailure::Unconfirmed => {
                DeliveryError::Unconfirmed("stub: scripted unconfirmed send".to_string())
            }
        }
    }
}

impl FromStr for StubFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "api" => Ok(StubFailure::Api),
            "auth" => Ok(StubFailure::Auth),
            "rate_limited" => Ok(StubFailure::RateLimited),
            "network" => Ok(StubFailure::Network),
            "unconfirmed" => Ok(StubFailure::Unconfirmed),
            other => Err(format!("Unknown stub failure: {}", other)),
        }
    }
}

/// A call recorded by [`StubDelivery`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubMessage {
    pub destination: String,
    pub media: Option<String>,
    pub text: String,
    pub action: Option<ActionLink>,
}

/// Records every send and answers with a fake receipt, or a scripted failure
#[derive(Debug, Default)]
pub struct StubDelivery {
    failure: Option<StubFailure>,
    sent: Mutex<Vec<StubMessage>>,
}

impl StubDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failure: StubFailure) -> Self {
        Self {
            failure: Some(failure),
            sent: Mutex::new(vec![]),
        }
    }

    /// Every message attempted so far, failed ones included
    pub fn sent(&self) -> Vec<StubMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, message: StubMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let mut sent = self
            .sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sent.push(message);

        if let Some(failure) = self.failure {
            return Err(failure.to_error());
        }

        Ok(DeliveryReceipt {
            message_id: format!("stub_{}", sent.len()),
            url: None,
        })
    }
}

#[async_trait]
impl DeliveryPort for StubDelivery {
    async fn send_media(
        &self,
        destination: &str,
        media: &str,
        caption: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.record(StubMessage {
            destination: destination.to_string(),
            media: Some(media.to_string()),
            text: caption.to_string(),
            action: action.cloned(),
        })
    }

    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.record(StubMessage {
            destination: destination.to_string(),
            media: None,
            text: text.to_string(),
            action: action.cloned(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
