use dnseye_application::ports::{AddressLookup, AddressLookupProvider};
use dnseye_domain::ResolverSelector;
use std::sync::Arc;

use super::address_lookup::{RecursiveAddressLookup, SystemAddressLookup};

/// Hands out the address lookup behind a resolver selector.
pub struct ResolverRegistry {
    system: Arc<SystemAddressLookup>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self {
            system: Arc::new(SystemAddressLookup::new()),
        }
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressLookupProvider for ResolverRegistry {
    fn lookup_for(&self, selector: &ResolverSelector) -> Arc<dyn AddressLookup> {
        match selector {
            ResolverSelector::System => self.system.clone(),
            ResolverSelector::Server(addr) => Arc::new(RecursiveAddressLookup::new(*addr)),
        }
    }
}
