//! coupon-herald adapters crate
//!
//! Infrastructure adapters implementing the domain ports:
//! - `catalog`: JSON catalog snapshot on disk
//! - `state`: file, SQLite and in-memory cursor stores
//! - `destination`: channel id lookup
//! - `telegram`: Telegram Bot API delivery
//! - `outbox`: JSONL outbox delivery
//! - `delivery`: stub delivery for tests and offline runs

mod catalog_fs;
mod delivery_stub;
mod destination_fs;
pub mod outbox;
mod state_file;
mod state_memory;
mod state_sqlite;
pub mod telegram;

/// Re-exports for catalog adapters
pub mod catalog {
    pub use crate::catalog_fs::JsonCatalogSource;
}

/// Re-exports for cursor store adapters
pub mod state {
    pub use crate::state_file::FileCursorStore;
    pub use crate::state_memory::InMemoryCursorStore;
    pub use crate::state_sqlite::SqliteCursorStore;
}

pub mod delivery {
    pub use crate::delivery_stub::{StubDelivery, StubFailure, StubMessage};
}

pub mod destination {
    pub use crate::destination_fs::resolve_destination;
}
