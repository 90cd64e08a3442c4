pub mod address_lookup;
pub mod nameserver_client;
pub mod registry;
pub mod transport;
pub mod wire;

pub use address_lookup::{RecursiveAddressLookup, SystemAddressLookup};
pub use nameserver_client::HickoryNameserverClient;
pub use registry::ResolverRegistry;
