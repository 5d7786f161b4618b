//! Fixed-asset capitalization from goods receipts.
//!
//! The [`CapitalizationGuard`] turns flagged receipt lines into assets and,
//! more importantly, refuses to create the same asset twice. Retrying a
//! receipt after a partial failure must yield zero duplicates.

pub mod asset;
pub mod guard;

pub use asset::{Asset, AssetId};
pub use guard::{AssetError, CapitalizationGuard, CapitalizationReport, SkippedAsset};
