//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache engine.
//!
//! # Tasks
//! - TTL Sweeper: purges expired entries from the head of the store at a fixed interval

mod sweeper;

pub(crate) use sweeper::Sweeper;
