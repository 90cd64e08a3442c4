//! DNS By Eye Infrastructure Layer
//!
//! Wire format, UDP/TCP transports and address lookups behind the
//! application ports.

pub mod dns;
