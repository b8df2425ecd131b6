//! Database backend implementations.
//!
//! Each backend is gated behind a feature flag.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | SQLite | `sqlite` | Embedded database with upsert support, in-memory or file-based |

#[cfg(feature = "sqlite")]
pub mod sqlite;
