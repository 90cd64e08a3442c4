pub mod mock_nameserver;

#[allow(unused_imports)]
pub use mock_nameserver::*;
