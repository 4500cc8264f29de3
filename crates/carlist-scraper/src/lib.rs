pub mod acquisition;
pub mod checkpoint;
pub mod client;
pub mod error;
pub mod extract;
pub mod listing_page;
pub mod proxy;
mod rate_limit;

pub use acquisition::{
    locale_sub_target, run_acquisition, run_acquisition_with_progress, AcquisitionConfig,
    AcquisitionReport, LocaleReport, PageKey, PageSource, CATEGORIES,
};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore, CHECKPOINT_VERSION};
pub use client::{ClientConfig, ListingClient};
pub use error::{FieldError, ScraperError};
pub use listing_page::{build_record, parse_listing_page, CardError, PageParse, SOURCE_NAME};
pub use proxy::ProxyPool;
