//! Tenant node identifier type.
//!
//! This module defines [`TenantNodeId`], the numeric identity of a node in the
//! tenant hierarchy. The value `0` is reserved: it never names a stored node and
//! is used as the "no parent" sentinel when inserting or moving to the root.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identity of a node in the tenant hierarchy.
///
/// The parent of a node is not part of its identity and is never stored on
/// the node; it is derived from the closure table as the single row in which
/// the node is the descendant at depth 1.
///
/// # Examples
///
/// ```
/// use helios_tenant_closure::tenant::TenantNodeId;
///
/// let tenant = TenantNodeId::new(42);
/// assert_eq!(tenant.get(), 42);
/// assert!(!tenant.is_root());
/// assert!(TenantNodeId::ROOT.is_root());
/// ```
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TenantNodeId(u64);

impl TenantNodeId {
    /// The "no parent" sentinel.
    pub const ROOT: TenantNodeId = TenantNodeId(0);

    /// Largest identifier that fits the signed 64-bit integer columns.
    pub const MAX: TenantNodeId = TenantNodeId(i64::MAX as u64);

    /// Creates a node identifier from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` for the root sentinel.
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }

    /// Validates an identifier that must name a real node.
    pub(crate) fn require_node(self, field: &'static str) -> Result<Self, ValidationError> {
        if self.is_root() {
            return Err(ValidationError::ZeroId { field });
        }
        self.require_storable(field)
    }

    /// Validates an identifier that may be the root sentinel.
    pub(crate) fn require_storable(self, field: &'static str) -> Result<Self, ValidationError> {
        if self > Self::MAX {
            return Err(ValidationError::IdOutOfRange {
                field,
                value: self.0,
            });
        }
        Ok(self)
    }
}

impl fmt::Display for TenantNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantNodeId({})", self.0)
    }
}

impl FromStr for TenantNodeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(TenantNodeId)
    }
}

impl From<u64> for TenantNodeId {
    fn from(id: u64) -> Self {
        TenantNodeId(id)
    }
}

impl From<TenantNodeId> for u64 {
    fn from(id: TenantNodeId) -> Self {
        id.0
    }
}

#[cfg(feature = "sqlite")]
mod sql {
    use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

    use super::TenantNodeId;

    impl ToSql for TenantNodeId {
        fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
            let value = i64::try_from(self.0)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(ToSqlOutput::from(value))
        }
    }

    impl FromSql for TenantNodeId {
        fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
            let raw = i64::column_result(value)?;
            u64::try_from(raw)
                .map(TenantNodeId)
                .map_err(|_| FromSqlError::OutOfRange(raw))
        }
    }
}
