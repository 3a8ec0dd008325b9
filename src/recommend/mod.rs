//! Recommendation layer
//!
//! Turns configured version sources into answers for `lookup(group, name)`
//! and manages the per-provider override lifecycle (set, local, reset, store, update).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Recommender │────▶│  Provider   │────▶│   Reader    │
//! │  (lookup)   │     │ (map cache) │     │(ivy,maven..)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   │                   │
//!        │                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │UpdateEngine │     │  Override   │     │   Closure   │
//! │ (registry)  │     │   Store     │     │   Walker    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`resolver`]: Ordered providers and the lookup / lifecycle operations
//! - [`provider`]: One version source with its lazily computed version map
//! - [`override_state`]: Working and stored override files of a provider
//! - [`closure`]: Transitive expansion of Ivy dependencies
//! - [`update`]: Regex-driven selection of newer published versions
//! - [`ordering`]: Version comparison used by updates
//! - [`pattern`]: Glob and full-match regex helpers
//! - [`repository`]: Descriptor repository trait and local directory implementation
//! - [`registry`]: Registry trait for listing published versions
//! - [`registries`]: Concrete registry implementations (local, Maven metadata)
//! - [`error`]: Error types for providers, repositories and registries

pub mod closure;
pub mod error;
pub mod ordering;
pub mod override_state;
pub mod pattern;
pub mod provider;
pub mod registries;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod update;
