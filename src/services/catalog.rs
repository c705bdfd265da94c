use std::sync::Arc;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{
        CategoryGroup, DeliveryArea, Product,
        catalog::{DeliveryAreaInput, ProductInput},
    },
    services::{ServiceError, ServiceResult},
    store::{ProductFilter, Store, StoreError},
};

/// Product and delivery-area management.
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Storefront listing: available products only, optionally narrowed to one group.
    pub async fn storefront_products(
        &self,
        group: Option<CategoryGroup>,
    ) -> ServiceResult<Vec<Product>> {
        let filter = ProductFilter {
            group,
            include_unavailable: false,
        };
        Ok(self.store.list_products(&filter).await?)
    }

    pub async fn all_products(&self) -> ServiceResult<Vec<Product>> {
        let filter = ProductFilter {
            group: None,
            include_unavailable: true,
        };
        Ok(self.store.list_products(&filter).await?)
    }

    pub async fn create_product(&self, input: ProductInput) -> ServiceResult<Product> {
        input.validate().map_err(ServiceError::Validation)?;
        let id = match &input.id {
            Some(id) => id.trim().to_string(),
            None => product_slug(&input.name),
        };
        let product = self.store.insert_product(id, &input).await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, input: ProductInput) -> ServiceResult<Product> {
        input.validate().map_err(ServiceError::Validation)?;
        let product = self
            .store
            .update_product(id, &input)
            .await
            .map_err(not_found("product"))?;
        info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> ServiceResult<()> {
        self.store
            .delete_product(id)
            .await
            .map_err(not_found("product"))?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn delivery_areas(&self) -> ServiceResult<Vec<DeliveryArea>> {
        Ok(self.store.list_delivery_areas().await?)
    }

    /// Exact, case-sensitive match on the area name chosen at checkout.
    pub async fn find_area_by_name(&self, name: &str) -> ServiceResult<DeliveryArea> {
        self.delivery_areas()
            .await?
            .into_iter()
            .find(|area| area.area == name.trim())
            .ok_or(ServiceError::NotFound("delivery area"))
    }

    pub async fn create_area(&self, input: DeliveryAreaInput) -> ServiceResult<DeliveryArea> {
        input.validate().map_err(ServiceError::Validation)?;
        let area = self.store.insert_delivery_area(&input).await?;
        info!(area_id = %area.id, area = %area.area, "Delivery area created");
        Ok(area)
    }

    pub async fn update_area(&self, id: Uuid, input: DeliveryAreaInput) -> ServiceResult<DeliveryArea> {
        input.validate().map_err(ServiceError::Validation)?;
        self.store
            .update_delivery_area(id, &input)
            .await
            .map_err(not_found("delivery area"))
    }

    pub async fn delete_area(&self, id: Uuid) -> ServiceResult<()> {
        self.store
            .delete_delivery_area(id)
            .await
            .map_err(not_found("delivery area"))
    }
}

fn not_found(what: &'static str) -> impl Fn(StoreError) -> ServiceError {
    move |err| match err {
        StoreError::NotFound => ServiceError::NotFound(what),
        other => ServiceError::Persistence(other),
    }
}

/// `"Black Crab (Large)"` becomes `black-crab-large-<4 random chars>`.
fn product_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 5);
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    if !slug.is_empty() && !slug.ends_with('-') {
        slug.push('-');
    }
    let mut rng = rand::thread_rng();
    slug.extend((0..4).map(|_| char::from_digit(rng.gen_range(0..36u32), 36).unwrap_or('0')));
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ProductCategory, catalog::ProductUnit},
        store::MemoryStore,
    };
    use rust_decimal::dec;

    fn product(name: &str, category: ProductCategory, available: bool) -> ProductInput {
        ProductInput {
            id: None,
            name: name.into(),
            name_localized: None,
            category,
            price: dec!(500),
            unit: ProductUnit::Kg,
            description: String::new(),
            image: String::new(),
            stock: 5,
            min_order_quantity: dec!(0.5),
            available,
        }
    }

    #[test]
    fn slug_is_lowercase_and_dashed() {
        let slug = product_slug("Black Crab (Large)");
        assert!(slug.starts_with("black-crab-large-"), "{slug}");
        assert_eq!(slug.len(), "black-crab-large-".len() + 4);
    }

    #[tokio::test]
    async fn storefront_hides_unavailable_and_filters_by_group() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        catalog
            .create_product(product("Green Crab", ProductCategory::GreenCrabs, true))
            .await
            .unwrap();
        catalog
            .create_product(product("Pomfret", ProductCategory::Fish, true))
            .await
            .unwrap();
        catalog
            .create_product(product("Lobster", ProductCategory::Lobsters, false))
            .await
            .unwrap();

        let crabs = catalog
            .storefront_products(Some(CategoryGroup::MudCrabs))
            .await
            .unwrap();
        assert_eq!(crabs.len(), 1);
        assert_eq!(crabs[0].name, "Green Crab");

        let fish = catalog
            .storefront_products(Some(CategoryGroup::FreshFish))
            .await
            .unwrap();
        assert_eq!(fish.len(), 1);
        assert_eq!(catalog.all_products().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn supplied_product_id_is_kept() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let mut input = product("Mud Crab", ProductCategory::MudCrabs, true);
        input.id = Some("crab-1".into());
        assert_eq!(catalog.create_product(input).await.unwrap().id, "crab-1");
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let input = product("Prawns", ProductCategory::Prawns, true);
        assert!(matches!(
            catalog.update_product("nope", input).await,
            Err(ServiceError::NotFound("product"))
        ));
        assert!(matches!(
            catalog.delete_area(Uuid::new_v4()).await,
            Err(ServiceError::NotFound("delivery area"))
        ));
    }

    #[tokio::test]
    async fn areas_are_found_by_exact_name() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        catalog
            .create_area(DeliveryAreaInput {
                area: "Bhandup".into(),
                charge: dec!(50),
            })
            .await
            .unwrap();

        assert_eq!(
            catalog.find_area_by_name("Bhandup").await.unwrap().charge,
            dec!(50)
        );
        assert!(matches!(
            catalog.find_area_by_name("bhandup").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            catalog
                .create_area(DeliveryAreaInput {
                    area: "Thane".into(),
                    charge: dec!(-1),
                })
                .await,
            Err(ServiceError::Validation(_))
        ));
    }
}
