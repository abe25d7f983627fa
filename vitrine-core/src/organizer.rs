use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{AppError, CopyFailure};
use crate::models::{CopyOutcome, ProductImageRow};
use crate::report::{OrganizeEvent, ProgressSink, RunSummary};
use crate::store::{ImageStore, ResolvedImage};
use futures::{Stream, TryStreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Copies catalog images out of the sharded store into one flat directory
/// per product.
pub struct Organizer {
    store: ImageStore,
    output_root: PathBuf,
}

impl Organizer {
    pub fn new(store: ImageStore, output_root: PathBuf) -> Self {
        Self { store, output_root }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn product_dir(&self, product_id: u64) -> PathBuf {
        self.output_root.join(format!("product-{}", product_id))
    }

    /// Creates the output root and consumes `rows` in order. Rows of one
    /// product must be contiguous.
    ///
    /// Only a failure to create the output root or an error from the row
    /// stream is returned; per-image problems end up in the summary.
    pub async fn organize<S>(
        &self,
        rows: S,
        sink: &mut dyn ProgressSink,
    ) -> Result<RunSummary, AppError>
    where
        S: Stream<Item = Result<ProductImageRow, AppError>>,
    {
        create_dir(&self.output_root).await?;

        let mut rows = std::pin::pin!(rows);
        let mut summary = RunSummary::new(&self.output_root);
        let mut current: Option<(u64, PathBuf)> = None;

        while let Some(row) = rows.try_next().await? {
            summary.rows_processed += 1;

            let product_dir = match &current {
                Some((id, dir)) if *id == row.product_id => dir.clone(),
                _ => {
                    summary.products_seen += 1;
                    let dir = self.ensure_product_dir(row.product_id).await;
                    sink.record(&OrganizeEvent::ProductStarted {
                        product_id: row.product_id,
                        reference: row.reference.clone(),
                        directory: dir.clone(),
                    });
                    current = Some((row.product_id, dir.clone()));
                    dir
                }
            };

            let outcome = self.copy_image(&row, &product_dir).await;
            match &outcome {
                CopyOutcome::Success(destination) => {
                    summary.images_copied += 1;
                    sink.record(&OrganizeEvent::ImageCopied {
                        product_id: row.product_id,
                        image_id: row.image_id,
                        destination: destination.clone(),
                    });
                }
                CopyOutcome::Failure(failure) => {
                    tracing::warn!("{}", failure);
                    sink.record(&OrganizeEvent::failed(failure));
                }
            }
            summary.outcomes.push(outcome);
        }

        tracing::info!(
            products = summary.products_seen,
            copied = summary.images_copied,
            errors = summary.error_count(),
            "Image organization finished"
        );
        Ok(summary)
    }

    /// Creates the product directory if needed. A failure here is only
    /// logged; the copies into it will fail and be recorded individually.
    async fn ensure_product_dir(&self, product_id: u64) -> PathBuf {
        let dir = self.product_dir(product_id);
        if let Err(e) = create_dir(&dir).await {
            tracing::warn!("Failed to create {}: {}", dir.display(), e);
        }
        dir
    }

    async fn copy_image(&self, row: &ProductImageRow, product_dir: &Path) -> CopyOutcome {
        let Some(ResolvedImage { path, extension }) = self.store.resolve(row.image_id).await
        else {
            return CopyOutcome::Failure(CopyFailure::NotFound {
                product_id: row.product_id,
                image_id: row.image_id,
            });
        };

        let destination =
            product_dir.join(destination_file_name(row.image_id, row.is_cover, extension));

        // Overwrites on purpose: every run re-copies.
        match fs::copy(&path, &destination).await {
            Ok(_) => CopyOutcome::Success(destination),
            Err(source) => CopyOutcome::Failure(CopyFailure::Copy {
                product_id: row.product_id,
                image_id: row.image_id,
                source,
            }),
        }
    }
}

/// Recursive, idempotent `mkdir` with mode 0755 on unix.
async fn create_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(dir).await
}

pub fn destination_file_name(image_id: u64, is_cover: bool, extension: &str) -> String {
    let prefix = if is_cover { "cover_" } else { "" };
    format!("{}image_{}.{}", prefix, image_id, extension)
}

/// Connects to the catalog and organizes every active product's images.
///
/// The output root is only created once the connection is established.
pub async fn run(config: &Config, sink: &mut dyn ProgressSink) -> Result<RunSummary, AppError> {
    let catalog = Catalog::connect(&config.database).await?;
    let organizer = Organizer::new(ImageStore::new(config.image_root()), config.output_root.clone());

    tracing::info!(
        "Organizing images from {} into {}",
        organizer.store.root().display(),
        organizer.output_root().display()
    );

    let result = organizer.organize(catalog.product_images(), sink).await;
    catalog.close().await;
    result
}
