use crate::models::ClickEvent;
use anyhow::Result;
use async_trait::async_trait;

/// Point lookup of destination URLs registered on a smart link.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Return the destination URL registered for `service_name` on the
    /// given smart link. `Ok(None)` means no URL is registered for that
    /// pair; errors mean the store itself failed.
    async fn destination_url(
        &self,
        smartlink_id: &str,
        service_name: &str,
    ) -> Result<Option<String>>;
}

/// Durable persistence of click events.
#[async_trait]
pub trait ClickRecorder: Send + Sync {
    /// Persist the event and return the generated tracking identifier.
    /// A click is only considered tracked if this succeeds.
    async fn record(&self, event: &ClickEvent) -> Result<String>;
}
