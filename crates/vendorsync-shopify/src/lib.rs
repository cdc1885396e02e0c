pub mod batch;
pub mod client;
pub mod error;
pub mod flows;
pub mod normalize;
pub mod pacing;
pub mod pagination;
pub mod retry;
pub mod types;

pub use batch::{
    BatchConfig, BatchError, BatchFailure, BatchItem, BatchPayload, BatchProcessor, BatchResult,
    BatchStatus, BatchSuccess, FailureKind, ItemError,
};
pub use client::{OrderFilter, ProductFilter, ShopifyClient};
pub use error::ShopifyError;
pub use flows::{
    DefaultVariantRemoval, FullProduct, FullProductCreation, UpdatedVariant, VariantCreation,
    VariantDeletion, VariantMediaUpdate, VariantSpec, VariantSummary, VariantUpdate,
};
pub use normalize::{normalize_product, VendorProduct};
pub use retry::{retry_with_backoff, RateLimitSignal, RetryPolicy};
