use std::io;
use thiserror::Error;

/// Fatal errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Per-image failures. Recorded and reported, never propagated.
#[derive(Debug, Error)]
pub enum CopyFailure {
    #[error("image {image_id} not found for product {product_id}")]
    NotFound { product_id: u64, image_id: u64 },

    #[error("copy error for image {image_id} of product {product_id}: {source}")]
    Copy {
        product_id: u64,
        image_id: u64,
        source: io::Error,
    },
}

impl CopyFailure {
    pub fn image_id(&self) -> u64 {
        match self {
            CopyFailure::NotFound { image_id, .. } | CopyFailure::Copy { image_id, .. } => *image_id,
        }
    }

    pub fn product_id(&self) -> u64 {
        match self {
            CopyFailure::NotFound { product_id, .. } | CopyFailure::Copy { product_id, .. } => {
                *product_id
            }
        }
    }
}
