//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (method, "/users/{userId+}", callbacks)
//!     → matcher.rs (parse template into segments)
//!     → router.rs (append to table, registration order kept)
//!
//! Incoming request (method, path):
//!     → router.rs (filter the whole table)
//!     → matcher.rs (segment-by-segment comparison)
//!     → exactly one RouteMatch + extracted parameters, or an error
//! ```
//!
//! # Design Decisions
//! - Linear scan; route tables are small and written once
//! - Every route is tested, never first-match-wins: overlapping templates
//!   are reported as an authoring bug
//! - Literal segments are case-sensitive; `{name+}` binds one segment verbatim
//! - The table is immutable after startup and shared without locks

pub mod matcher;
pub mod router;

pub use matcher::{PathTemplate, Segment};
pub use router::{HttpMethod, Route, RouteMatch, RouteTable, UnknownMethod};
