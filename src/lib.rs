//! NEAR Indexer Functions Library
//!
//! Transformation layer for NEAR indexer functions, following hexagonal architecture:
//!
//! - `domain`: Core models (blocks, actions, standard events, candidate records, matching rules)
//! - `application`: Use cases (block pass, ingestion pipeline), ports (traits), and error types
//! - `adapters`: Implementations (file block source, extractors, PostgreSQL and in-memory sinks)
//! - `infrastructure`: Cross-cutting concerns (configuration, logging)

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
