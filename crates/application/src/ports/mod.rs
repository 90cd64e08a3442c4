mod address_lookup;
mod nameserver_query;

pub use address_lookup::{AddressLookup, AddressLookupProvider};
pub use nameserver_query::{NameserverQuery, NsResponse, Rcode};
