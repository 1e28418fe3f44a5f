//! Version layer: fetching, normalizing and selecting upstream versions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Dispatcher │────▶│     Row     │────▶│   Filter    │
//! │  (fan-out)  │     │ (normalize) │     │  (select)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │  Upstreams  │     │   Schema    │
//! │ (hub, npm…) │     │ (registry)  │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`dispatch`]: one concurrent query per distinct repository
//! - [`upstream`]: Upstream trait for fetching raw version records
//! - [`upstreams`]: Concrete upstreams (Docker Hub, Artifactory, ECR, RPM, npm, git)
//! - [`schema`]: Source kinds and where their records keep each field
//! - [`row`]: Normalized version rows
//! - [`filter`]: Alias grouping, match predicates and selection
//! - [`timestamp`]: Date parsing shared by rows and date bounds
//! - [`error`]: Error types for upstream queries and filters

pub mod dispatch;
pub mod error;
pub mod filter;
pub mod row;
pub mod schema;
pub mod timestamp;
pub mod upstream;
pub mod upstreams;
