//! Behavioral segmentation of corporate card customers.
//!
//! Transactions are aggregated per customer, the four behavioral features
//! are standardized and clustered with seeded k-means, clusters are named
//! with ordered business rules, and the result is written back through an
//! injected `CustomerStore`.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod customer;
pub mod error;
pub mod label;
pub mod name_generator;
pub mod pipeline;
pub mod report;
pub mod rng;
pub mod scaler;
pub mod seed;
pub mod store;
pub mod transaction;
pub mod types;

pub use config::{LabelRules, SeedConfig, SegmentationConfig};
pub use error::{SegError, SegResult};
pub use label::SegmentLabel;
pub use pipeline::{SegmentationEngine, SegmentationSummary};
pub use store::{CustomerStore, MemoryStore, SqliteStore};
