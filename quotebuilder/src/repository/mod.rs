//! Data access, one module per entity.
//!
//! Every function takes any [`sea_orm::ConnectionTrait`], so the same query runs
//! either on the pool (reads) or inside a transaction opened by a service
//! (writes).

pub mod account;
pub mod profile;
pub mod role;
