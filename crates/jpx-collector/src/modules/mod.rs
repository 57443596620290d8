//! 수집 워크플로우 모듈.

pub mod history_collect;
pub mod listing_sync;

pub use history_collect::{collect_histories, CollectOptions};
pub use listing_sync::{download_listing, load_codes, sync_listing};
