//! Mock SDK client for testing
//!
//! Enabled in unit tests and through the `testing` feature, so downstream
//! crates can script the SDK boundary with mockall.

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value as JsonValue;
use zoneguard_core::RawFailure;

use crate::api::DnsApi;

mock! {
    pub Route53Api {}

    #[async_trait]
    impl DnsApi for Route53Api {
        async fn change_resource_record_sets(
            &self,
            hosted_zone_id: String,
            change_batch: JsonValue,
        ) -> Result<JsonValue, RawFailure>;
        async fn list_resource_record_sets(&self, hosted_zone_id: String) -> Result<JsonValue, RawFailure>;
        async fn get_change(&self, change_id: String) -> Result<JsonValue, RawFailure>;
        async fn list_hosted_zones(&self) -> Result<JsonValue, RawFailure>;
        async fn create_hosted_zone(
            &self,
            name: String,
            caller_reference: String,
        ) -> Result<JsonValue, RawFailure>;
    }
}
