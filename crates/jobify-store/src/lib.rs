//! Document store access for Jobify.
//!
//! This crate provides:
//! - A race-safe, lazily dialed connection singleton with a reset hook
//! - MongoDB dialer and data source
//! - Typed repositories for users and jobs
//! - An in-memory backend (feature `memory`) for tests

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod job_repo;
pub mod repos;
pub mod user_repo;

mod documents;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use client::{MongoDataSource, MongoDialer, MongoHandle};
pub use config::MongoConfig;
pub use connector::{Connector, Dialer};
pub use error::{StoreError, StoreResult};
pub use job_repo::MongoJobRepository;
pub use repos::{DataSource, JobStore, Repositories, UserStore};
pub use user_repo::MongoUserRepository;

#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryStore;
