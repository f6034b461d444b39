//! Postgres store adapter.
//!
//! All SQL is authored centrally in [`statements`] and referenced by key;
//! every mutating statement upserts on the entity's primary key so that
//! re-ingesting a block is a no-op. Each [`PgStore::execute`] call checks a
//! connection out of the pool and runs a single autocommitted statement —
//! logically independent writes are never batched, so a crash between two
//! statements leaves the store consistent under the monotonicity rule.

mod pg;
pub use pg::{PgStore, SqlParam};

mod schema;
mod statements;
pub use statements::Statement;
