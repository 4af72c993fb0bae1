//! Infrastructure layer: adapters for the accounting persistence ports.

pub mod journal_store;

pub use journal_store::{InMemoryJournalStore, StagedJournals};
