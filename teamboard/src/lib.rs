//! `Teamboard`: client-side reconciliation layer for a collaborative
//! task workspace.

pub mod cache;
pub mod config;
pub mod highlight;
pub mod notify;
pub mod remote;
pub mod replay;
pub mod route;
pub mod session;
pub mod sync;
pub mod timer;
