//! The SDK boundary

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use zoneguard_core::RawFailure;

/// Remote DNS-management API
///
/// Implementations wrap an SDK client and translate its failures into
/// [`RawFailure`]s; they perform no retries or pacing of their own.
/// Arguments are owned so a call can be replayed on retry.
#[async_trait]
pub trait DnsApi: Send + Sync + 'static {
    /// Submit a change batch; the response carries `ChangeInfo`
    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: String,
        change_batch: JsonValue,
    ) -> Result<JsonValue, RawFailure>;

    /// The response carries `ResourceRecordSets`
    async fn list_resource_record_sets(
        &self,
        hosted_zone_id: String,
    ) -> Result<JsonValue, RawFailure>;

    async fn get_change(&self, change_id: String) -> Result<JsonValue, RawFailure>;

    /// The response carries `HostedZones`
    async fn list_hosted_zones(&self) -> Result<JsonValue, RawFailure>;

    async fn create_hosted_zone(
        &self,
        name: String,
        caller_reference: String,
    ) -> Result<JsonValue, RawFailure>;
}
