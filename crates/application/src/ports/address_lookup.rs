use async_trait::async_trait;
use dnseye_domain::{ResolverSelector, TraceError};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Live A/AAAA resolution of a hostname through a recursive resolver.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, host: &str, timeout: Duration) -> Result<Vec<IpAddr>, TraceError>;
}

pub trait AddressLookupProvider: Send + Sync {
    fn lookup_for(&self, selector: &ResolverSelector) -> Arc<dyn AddressLookup>;
}
