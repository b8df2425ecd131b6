//! Tenant hierarchy types.
//!
//! - [`TenantNodeId`] - Numeric node identity; `0` is the root sentinel
//! - [`ClosureEdge`] - One `(ancestor, descendant, depth)` row of the closure table
//!
//! Nodes themselves are created and deleted by the tenant lifecycle service.
//! This crate only maintains the edges between them.
//!
//! ```
//! use helios_tenant_closure::tenant::{ClosureEdge, TenantNodeId};
//!
//! let edge = ClosureEdge::new(1u64, 3u64, 2);
//! assert_eq!(edge.ancestor, TenantNodeId::new(1));
//! assert!(!edge.is_direct());
//! ```

mod edge;
mod id;

pub use edge::ClosureEdge;
pub use id::TenantNodeId;
