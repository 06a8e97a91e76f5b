//! Record to spreadsheet synchronization.
//!
//! - **Engine**: pushes one record to its worksheet, writing the header on
//!   first use and skipping ids the sheet already has
//! - **Batch**: walks every kind's unsynced records through the engine and
//!   commits the `synced` flags one kind at a time
//! - **Observer**: structured progress reporting
//!
//! # Example
//!
//! ```ignore
//! use datacollect::sheets::MemorySheetClient;
//! use datacollect::sync::{sync_all_unsynced, SyncEngine, TracingObserver};
//!
//! let mut client = MemorySheetClient::new();
//! let mut engine = SyncEngine::new(&mut client, &TracingObserver);
//! let report = sync_all_unsynced(&mut storage, &mut engine, "field-tablet");
//! println!("{} records synced", report.total_synced);
//! ```

mod batch;
mod engine;
mod observer;
mod types;

pub use batch::{sync_all_unsynced, sync_saved_record, RecordStore};
pub use engine::SyncEngine;
pub use observer::{NullObserver, SyncObserver, TracingObserver};
pub use types::{SyncOutcome, SyncReport};
