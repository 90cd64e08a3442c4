#![allow(dead_code)]

pub mod fake_internet;
pub mod fixtures;

#[allow(unused_imports)]
pub use fake_internet::{standard_internet, FakeInternet, ServerBehavior};
#[allow(unused_imports)]
pub use fixtures::*;
