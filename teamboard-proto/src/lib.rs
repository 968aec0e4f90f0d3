//! Shared data model for `Teamboard` clients and the remote data store.

pub mod codec;
pub mod highlight;
pub mod mutation;
pub mod page;
pub mod project;
pub mod task;
