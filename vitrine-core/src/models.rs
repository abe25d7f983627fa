use crate::error::CopyFailure;
use std::path::PathBuf;

/// One (product, image) association as returned by the catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImageRow {
    pub product_id: u64,
    pub reference: String,
    pub image_id: u64,
    pub is_cover: bool,
    pub position: u64,
}

/// Result of handling a single row.
#[derive(Debug)]
pub enum CopyOutcome {
    Success(PathBuf),
    Failure(CopyFailure),
}

