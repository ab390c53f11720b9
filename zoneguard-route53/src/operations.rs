//! Zone and record operations routed through the resilience pipeline

use futures::FutureExt;
use log::{debug, info};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use zoneguard_config::ZoneguardConfig;
use zoneguard_core::{
    validate_change_id, validate_domain_name, validate_hosted_zone_id, DnsApiError, RawFailure,
    Result,
};
use zoneguard_logging::EventSink;
use zoneguard_resilience::{
    AdaptiveSnapshot, CallContext, LoggingStage, Pipeline, ResilienceError, RetryExecutor,
};

use crate::api::DnsApi;
use crate::change_batch::{service_a_record, service_a_record_key, ChangeAction, ChangeBatch};

/// Error code for responses that lack a field the operation depends on
pub const MALFORMED_RESPONSE: &str = "MalformedResponse";

/// Hosted zone and record operations over a [`DnsApi`]
///
/// Every SDK call runs through a pipeline of a logging stage and the shared
/// retry executor, so all operations draw from the same permit bucket and
/// feed the same adaptive controller. Arguments are validated before any
/// permit is consumed.
pub struct ZoneOperations<A: DnsApi> {
    api: Arc<A>,
    executor: Arc<RetryExecutor>,
    pipeline: Pipeline<JsonValue>,
    call_timeout: Option<Duration>,
}

impl<A: DnsApi> ZoneOperations<A> {
    /// Route calls through an already constructed executor
    pub fn new(api: Arc<A>, executor: Arc<RetryExecutor>) -> Self {
        let pipeline = Pipeline::<JsonValue>::new()
            .stage(LoggingStage)
            .shared_stage(executor.clone());

        Self {
            api,
            executor,
            pipeline,
            call_timeout: None,
        }
    }

    /// Build the executor from configuration, reporting retry events to `sink`
    pub fn from_config(
        api: Arc<A>,
        config: &ZoneguardConfig,
        sink: Arc<dyn EventSink>,
    ) -> std::result::Result<Self, ResilienceError> {
        let executor = RetryExecutor::builder()
            .rate_limit(config.rate_limit.clone())
            .retry(config.retry.clone())
            .sink(sink)
            .build()?;

        info!(
            "Zone operations ready: {} permits at {:.2}/s, {} attempts per call",
            config.rate_limit.capacity, config.rate_limit.initial_rate, config.retry.max_attempts
        );
        Ok(Self::new(api, Arc::new(executor)))
    }

    /// Bound each call, including permit waits and retries, by `timeout`
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn executor(&self) -> &Arc<RetryExecutor> {
        &self.executor
    }

    pub fn snapshot(&self) -> AdaptiveSnapshot {
        self.executor.snapshot()
    }

    /// Create or replace record sets; returns the change id
    pub async fn upsert_records(&self, zone_id: &str, record_sets: Vec<JsonValue>) -> Result<String> {
        self.submit_changes(zone_id, ChangeAction::Upsert, record_sets)
            .await
    }

    /// Delete record sets; returns the change id
    pub async fn delete_records(&self, zone_id: &str, record_sets: Vec<JsonValue>) -> Result<String> {
        self.submit_changes(zone_id, ChangeAction::Delete, record_sets)
            .await
    }

    /// Point an A record for each `{service}.{domain}` at `target_ip`
    pub async fn create_service_records<S: AsRef<str>>(
        &self,
        zone_id: &str,
        domain: &str,
        target_ip: &str,
        services: &[S],
    ) -> Result<String> {
        let domain = validate_domain_name(domain)?;
        let target_ip: Ipv4Addr = target_ip
            .parse()
            .map_err(|_| DnsApiError::validation(format!("Invalid IPv4 address: {}", target_ip)))?;
        let target_ip = target_ip.to_string();
        check_services(services)?;

        let record_sets = services
            .iter()
            .map(|service| service_a_record(service.as_ref(), &domain, &target_ip))
            .collect();
        self.upsert_records(zone_id, record_sets).await
    }

    /// Delete the A record of each `{service}.{domain}`
    pub async fn delete_service_records<S: AsRef<str>>(
        &self,
        zone_id: &str,
        domain: &str,
        services: &[S],
    ) -> Result<String> {
        let domain = validate_domain_name(domain)?;
        check_services(services)?;

        let record_sets = services
            .iter()
            .map(|service| service_a_record_key(service.as_ref(), &domain))
            .collect();
        self.delete_records(zone_id, record_sets).await
    }

    /// All record sets in the zone
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<JsonValue>> {
        let zone_id = validate_hosted_zone_id(zone_id)?;

        let response = self
            .call("list_records", move |api| {
                let zone_id = zone_id.clone();
                async move { api.list_resource_record_sets(zone_id).await }
            })
            .await?;

        Ok(array_field(&response, "ResourceRecordSets"))
    }

    /// `PENDING` or `INSYNC`
    pub async fn get_change_status(&self, change_id: &str) -> Result<String> {
        let change_id = validate_change_id(change_id)?;

        let response = self
            .call("get_change_status", move |api| {
                let change_id = change_id.clone();
                async move { api.get_change(change_id).await }
            })
            .await?;

        response
            .get("ChangeInfo")
            .and_then(|info| info.get("Status"))
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed("get_change_status", "ChangeInfo.Status"))
    }

    pub async fn list_hosted_zones(&self) -> Result<Vec<JsonValue>> {
        let response = self
            .call("list_hosted_zones", |api| async move { api.list_hosted_zones().await })
            .await?;

        Ok(array_field(&response, "HostedZones"))
    }

    /// Create a zone; returns the `HostedZone` payload
    pub async fn create_hosted_zone(&self, name: &str, caller_reference: &str) -> Result<JsonValue> {
        let name = validate_domain_name(name)?;
        if caller_reference.is_empty() {
            return Err(DnsApiError::validation("Caller reference cannot be empty"));
        }
        let caller_reference = caller_reference.to_string();

        let mut response = self
            .call("create_hosted_zone", move |api| {
                let (name, caller_reference) = (name.clone(), caller_reference.clone());
                async move { api.create_hosted_zone(name, caller_reference).await }
            })
            .await?;

        response
            .get_mut("HostedZone")
            .map(JsonValue::take)
            .ok_or_else(|| malformed("create_hosted_zone", "HostedZone"))
    }

    async fn submit_changes(
        &self,
        zone_id: &str,
        action: ChangeAction,
        record_sets: Vec<JsonValue>,
    ) -> Result<String> {
        let zone_id = validate_hosted_zone_id(zone_id)?;
        if record_sets.is_empty() {
            return Err(DnsApiError::validation("Change batch cannot be empty"));
        }

        let batch = ChangeBatch::from_records(action, record_sets);
        debug!("Submitting {} {:?} change(s) to zone {}", batch.len(), action, zone_id);
        let batch = batch.to_json();

        let operation = match action {
            ChangeAction::Delete => "delete_records",
            _ => "upsert_records",
        };
        let response = self
            .call(operation, move |api| {
                let (zone_id, batch) = (zone_id.clone(), batch.clone());
                async move { api.change_resource_record_sets(zone_id, batch).await }
            })
            .await?;

        response
            .get("ChangeInfo")
            .and_then(|info| info.get("Id"))
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed(operation, "ChangeInfo.Id"))
    }

    async fn call<F, Fut>(&self, operation: &str, invoke: F) -> Result<JsonValue>
    where
        F: Fn(Arc<A>) -> Fut + Send + Sync,
        Fut: Future<Output = std::result::Result<JsonValue, RawFailure>> + Send + 'static,
    {
        let ctx = match self.call_timeout {
            Some(timeout) => CallContext::new(operation).with_timeout(timeout),
            None => CallContext::new(operation),
        };
        let api = &self.api;
        self.pipeline
            .run(&ctx, || invoke(api.clone()).boxed())
            .await
    }
}

fn check_services<S: AsRef<str>>(services: &[S]) -> Result<()> {
    if services.is_empty() {
        return Err(DnsApiError::validation("Service list cannot be empty"));
    }
    if services.iter().any(|service| service.as_ref().is_empty()) {
        return Err(DnsApiError::validation("Service name cannot be empty"));
    }
    Ok(())
}

/// A missing list is an empty one
fn array_field(response: &JsonValue, field: &str) -> Vec<JsonValue> {
    response
        .get(field)
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default()
}

fn malformed(operation: &str, field: &str) -> DnsApiError {
    DnsApiError::unknown(format!("{} response is missing {}", operation, field), false)
        .with_code(MALFORMED_RESPONSE)
}
