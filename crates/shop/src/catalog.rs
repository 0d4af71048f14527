//! Read-through cache of the lists shown in the trees.
//!
//! Lists are cached with `moka` until explicitly invalidated; there is no TTL
//! and no background refresh. Each list is invalidated on its own, so
//! refreshing addresses never refetches the catalog.

use std::future::Future;
use std::sync::Arc;

use moka::future::Cache;
use terminal_shop_core::VariantId;
use tracing::{debug, instrument};

use crate::terminal::{Address, Card, CommerceClient, Order, Product, ProductVariant, TerminalError};

/// Cache key for each cached list.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Addresses,
    Cards,
    Orders,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Addresses(Arc<Vec<Address>>),
    Cards(Arc<Vec<Card>>),
    Orders(Arc<Vec<Order>>),
}

/// Ties a list element type to its cache slot.
trait Cached: Sized {
    const KEY: CacheKey;
    fn wrap(list: Arc<Vec<Self>>) -> CacheValue;
    fn unwrap(value: CacheValue) -> Option<Arc<Vec<Self>>>;
}

macro_rules! cached {
    ($ty:ty, $variant:ident) => {
        impl Cached for $ty {
            const KEY: CacheKey = CacheKey::$variant;

            fn wrap(list: Arc<Vec<Self>>) -> CacheValue {
                CacheValue::$variant(list)
            }

            fn unwrap(value: CacheValue) -> Option<Arc<Vec<Self>>> {
                match value {
                    CacheValue::$variant(list) => Some(list),
                    _ => None,
                }
            }
        }
    };
}

cached!(Product, Products);
cached!(Address, Addresses);
cached!(Card, Cards);
cached!(Order, Orders);

/// A catalog variant together with the product it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogVariant {
    pub product: Product,
    pub variant: ProductVariant,
}

/// Read-through cache in front of a [`CommerceClient`].
#[derive(Clone)]
pub struct Catalog {
    client: Arc<dyn CommerceClient>,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create an empty cache over `client`.
    #[must_use]
    pub fn new(client: Arc<dyn CommerceClient>) -> Self {
        Self {
            client,
            cache: Cache::builder().max_capacity(16).build(),
        }
    }

    /// The product list, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is not cached and the fetch fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, TerminalError> {
        self.read_through(|| self.client.list_products()).await
    }

    /// Saved addresses, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is not cached and the fetch fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Arc<Vec<Address>>, TerminalError> {
        self.read_through(|| self.client.list_addresses()).await
    }

    /// Saved cards, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is not cached and the fetch fails.
    #[instrument(skip(self))]
    pub async fn cards(&self) -> Result<Arc<Vec<Card>>, TerminalError> {
        self.read_through(|| self.client.list_cards()).await
    }

    /// Order history, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is not cached and the fetch fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Arc<Vec<Order>>, TerminalError> {
        self.read_through(|| self.client.list_orders()).await
    }

    /// Look up a variant in the cached catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog must be fetched and the fetch fails.
    pub async fn find_variant(
        &self,
        variant_id: &VariantId,
    ) -> Result<Option<CatalogVariant>, TerminalError> {
        let products = self.products().await?;
        Ok(find_variant_in(&products, variant_id))
    }

    /// Drop one cached list; the next read refetches it.
    pub async fn invalidate(&self, key: CacheKey) {
        debug!(?key, "Invalidating cached list");
        self.cache.invalidate(&key).await;
    }

    /// Drop the cached product list.
    pub async fn invalidate_products(&self) {
        self.invalidate(CacheKey::Products).await;
    }

    /// Drop every cached list.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    async fn read_through<T, F, Fut>(&self, fetch: F) -> Result<Arc<Vec<T>>, TerminalError>
    where
        T: Cached,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, TerminalError>>,
    {
        if let Some(list) = self.cache.get(&T::KEY).await.and_then(T::unwrap) {
            debug!(key = ?T::KEY, "Cache hit");
            return Ok(list);
        }

        let list = Arc::new(fetch().await?);
        self.cache
            .insert(T::KEY, T::wrap(Arc::clone(&list)))
            .await;
        Ok(list)
    }
}

/// Find a variant and its product in a product list.
#[must_use]
pub fn find_variant_in(products: &[Product], variant_id: &VariantId) -> Option<CatalogVariant> {
    products.iter().find_map(|product| {
        product.variant(variant_id).map(|variant| CatalogVariant {
            product: product.clone(),
            variant: variant.clone(),
        })
    })
}
