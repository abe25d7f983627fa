use crate::config::{validate_table_prefix, DatabaseConfig};
use crate::error::AppError;
use crate::models::ProductImageRow;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Raw shape of a result row. Columns are cast in SQL so that decoding does
/// not depend on the exact integer widths of a given shop schema.
#[derive(Debug, sqlx::FromRow)]
struct ProductImageRecord {
    product_id: u64,
    reference: String,
    image_id: u64,
    cover: i64,
    position: u64,
}

impl From<ProductImageRecord> for ProductImageRow {
    fn from(r: ProductImageRecord) -> Self {
        Self {
            product_id: r.product_id,
            reference: r.reference,
            image_id: r.image_id,
            is_cover: r.cover != 0,
            position: r.position,
        }
    }
}

/// Read access to the shop catalog.
pub struct Catalog {
    pool: MySqlPool,
    query: String,
}

impl Catalog {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        validate_table_prefix(&config.table_prefix)?;
        let options = config.target.connect_options()?;

        tracing::info!("Connecting to catalog database...");
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        Self::new(pool, &config.table_prefix)
    }

    pub fn new(pool: MySqlPool, table_prefix: &str) -> Result<Self, AppError> {
        validate_table_prefix(table_prefix)?;
        Ok(Self {
            pool,
            query: product_images_query(table_prefix),
        })
    }

    /// Active products joined to their images, streamed in
    /// (product, cover first, position) order.
    pub fn product_images(&self) -> BoxStream<'_, Result<ProductImageRow, AppError>> {
        sqlx::query_as::<_, ProductImageRecord>(&self.query)
            .fetch(&self.pool)
            .map_ok(ProductImageRow::from)
            .map_err(AppError::from)
            .boxed()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub fn product_images_query(table_prefix: &str) -> String {
    format!(
        "SELECT DISTINCT \
            CAST(p.id_product AS UNSIGNED) AS product_id, \
            COALESCE(p.reference, '') AS reference, \
            CAST(i.id_image AS UNSIGNED) AS image_id, \
            CAST(COALESCE(i.cover, 0) AS SIGNED) AS cover, \
            CAST(i.position AS UNSIGNED) AS position \
        FROM {prefix}product p \
        INNER JOIN {prefix}image i ON p.id_product = i.id_product \
        WHERE p.active = 1 \
        ORDER BY product_id ASC, cover DESC, position ASC",
        prefix = table_prefix
    )
}
