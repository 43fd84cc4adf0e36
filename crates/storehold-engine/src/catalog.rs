//! # Catalog
//!
//! Product creation, pricing, visibility, restocking, archiving and media.
//!
//! Restocking is the one catalog operation that moves stock; it goes
//! through [`ledger::adjust`] like every other counter change.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use storehold_core::validation::{
    validate_category, validate_media_capacity, validate_media_url, validate_price,
    validate_product_name, validate_stock_quantity,
};
use storehold_core::{
    CoreError, Discount, MediaKind, NewProduct, Page, PricingUpdate, Product, ProductFilter,
    ProductMedia, StockLevel, StorefrontProduct,
};
use storehold_db::repository::product;

use crate::error::EngineResult;
use crate::ledger;
use crate::Engine;

fn validate_pricing(
    cost_price: i64,
    selling_price: i64,
    discount: Option<&Discount>,
) -> EngineResult<()> {
    validate_price("cost price", cost_price)?;
    validate_price("selling price", selling_price)?;
    if let Some(discount) = discount {
        discount.validate()?;
    }
    Ok(())
}

async fn existing(conn: &mut SqliteConnection, product_id: &str) -> EngineResult<Product> {
    product::fetch(conn, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

/// Catalog operations. Obtain one through [`Engine::catalog`].
#[derive(Debug, Clone, Copy)]
pub struct CatalogService<'a> {
    engine: &'a Engine,
}

impl<'a> CatalogService<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        CatalogService { engine }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Adds a product with its opening stock.
    pub async fn create_product(&self, input: NewProduct) -> EngineResult<Product> {
        validate_product_name(&input.name)?;
        validate_category(&input.category)?;
        validate_pricing(input.cost_price, input.selling_price, input.discount.as_ref())?;
        validate_stock_quantity(input.quantity)?;

        let now = self.engine.now();
        let discount = input.discount;
        let product = Product {
            id: product::generate_product_id(),
            name: input.name.trim().to_string(),
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            category: input.category.trim().to_string(),
            cost_price: input.cost_price,
            selling_price: input.selling_price,
            quantity: input.quantity,
            reserved_quantity: 0,
            discount_type: discount.as_ref().map(|d| d.kind),
            discount_value: discount.as_ref().map(|d| d.value),
            discount_start_at: discount.as_ref().and_then(|d| d.start_at),
            discount_end_at: discount.as_ref().and_then(|d| d.end_at),
            visible_on_website: input.visible_on_website,
            is_archived: false,
            archived_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.engine.db().pool().acquire().await?;
        product::insert(&mut conn, &product).await?;

        info!(id = %product.id, name = %product.name, quantity = product.quantity, "Product created");
        Ok(product)
    }

    /// Replaces prices and the discount. Existing order and sale lines keep
    /// the prices they were created with.
    pub async fn update_pricing(
        &self,
        product_id: &str,
        pricing: PricingUpdate,
    ) -> EngineResult<Product> {
        validate_pricing(
            pricing.cost_price,
            pricing.selling_price,
            pricing.discount.as_ref(),
        )?;

        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;
        existing(&mut tx, product_id).await?;
        product::update_pricing(&mut tx, product_id, &pricing, now).await?;
        let updated = existing(&mut tx, product_id).await?;
        tx.commit().await?;

        info!(
            id = %product_id,
            selling_price = %updated.price(),
            discounted = updated.discount().is_some(),
            "Pricing updated"
        );
        Ok(updated)
    }

    pub async fn set_visibility(&self, product_id: &str, visible: bool) -> EngineResult<Product> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;
        existing(&mut tx, product_id).await?;
        product::set_visibility(&mut tx, product_id, visible, now).await?;
        let updated = existing(&mut tx, product_id).await?;
        tx.commit().await?;

        info!(id = %product_id, visible, "Visibility changed");
        Ok(updated)
    }

    /// Adds (`delta > 0`) or writes off (`delta < 0`) on-hand units.
    ///
    /// A write-off that would leave fewer units than are reserved fails with
    /// `InsufficientStock`. Archived products cannot be restocked.
    pub async fn restock(&self, product_id: &str, delta: i64) -> EngineResult<StockLevel> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;

        let current = existing(&mut tx, product_id).await?;
        if current.is_archived {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let level = ledger::adjust(&mut tx, product_id, delta, now).await?;
        tx.commit().await?;

        info!(
            id = %product_id,
            delta,
            quantity = level.quantity,
            reserved = level.reserved_quantity,
            "Stock adjusted"
        );
        Ok(level)
    }

    /// Soft-deletes a product.
    ///
    /// Fails with `ArchiveBlocked` while a pending order still holds a
    /// reservation on it. Archiving an archived product is a no-op.
    pub async fn archive(&self, product_id: &str) -> EngineResult<Product> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;

        let current = existing(&mut tx, product_id).await?;
        if current.is_archived {
            debug!(id = %product_id, "Product already archived");
            return Ok(current);
        }

        let pending = product::count_pending_references(&mut tx, product_id).await?;
        if pending > 0 {
            debug!(id = %product_id, pending, "Archive blocked by pending orders");
            return Err(CoreError::ArchiveBlocked(product_id.to_string()).into());
        }

        product::archive(&mut tx, product_id, now).await?;
        let archived = existing(&mut tx, product_id).await?;
        tx.commit().await?;

        info!(id = %product_id, "Product archived");
        Ok(archived)
    }

    /// Records a media reference, up to the configured per-product limit.
    pub async fn attach_media(
        &self,
        product_id: &str,
        url: &str,
        kind: MediaKind,
    ) -> EngineResult<ProductMedia> {
        validate_media_url(url)?;

        let now = self.engine.now();
        let max = self.engine.config().catalog.max_media_per_product;
        let mut tx = self.engine.db().begin_immediate().await?;

        let current = existing(&mut tx, product_id).await?;
        if current.is_archived {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let count = product::count_media(&mut tx, product_id).await?;
        validate_media_capacity(product_id, count, max)?;

        let media = ProductMedia {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            url: url.trim().to_string(),
            kind,
            created_at: now,
        };
        product::insert_media(&mut tx, &media).await?;
        tx.commit().await?;

        debug!(id = %product_id, count = count + 1, max, "Media attached");
        Ok(media)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Any product, archived or not.
    pub async fn get(&self, product_id: &str) -> EngineResult<Product> {
        self.engine
            .db()
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    pub async fn list(&self, filter: &ProductFilter) -> EngineResult<Page<Product>> {
        let page = filter.page.normalized();
        let (items, total) = self.engine.db().products().list(filter).await?;

        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// What the website shows right now, priced at the engine's clock.
    pub async fn storefront(&self) -> EngineResult<Vec<StorefrontProduct>> {
        let now = self.engine.now();
        self.storefront_at(now).await
    }

    /// What the website shows at `now`.
    pub async fn storefront_at(&self, now: DateTime<Utc>) -> EngineResult<Vec<StorefrontProduct>> {
        let products = self.engine.db().products().list_storefront().await?;
        Ok(products
            .iter()
            .map(|p| StorefrontProduct::from_product(p, now))
            .collect())
    }

    pub async fn media(&self, product_id: &str) -> EngineResult<Vec<ProductMedia>> {
        self.get(product_id).await?;
        Ok(self.engine.db().products().media(product_id).await?)
    }
}
