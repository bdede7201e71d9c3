use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::IntoCondition,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::{
    goods_receipt_item, inventory_lot,
    location::{self, LocationType},
    pick_list_item,
    product::{self, UnitOfMeasure},
};
use crate::errors::ServiceError;
use crate::services::receipts::find_product_by_ean;

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE_SIZE: u64 = 1000;

fn default_case_size() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 64, message = "ean is required"))]
    pub ean: String,
    #[validate(length(min = 1, max = 64, message = "material_code is required"))]
    pub material_code: String,
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 128, message = "brand is required"))]
    pub brand: String,
    #[serde(default)]
    pub uom: UnitOfMeasure,
    pub mrp: Decimal,
    #[serde(default = "default_case_size")]
    #[validate(range(min = 1, message = "case_size must be at least 1"))]
    pub case_size: i32,
    #[serde(default)]
    pub min_qty: Decimal,
    #[serde(default)]
    pub max_qty: Decimal,
}

/// Partial product update. EAN, material code and unit of measure are fixed once created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 255, message = "name must not be blank"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 128, message = "brand must not be blank"))]
    pub brand: Option<String>,
    pub mrp: Option<Decimal>,
    #[validate(range(min = 1, message = "case_size must be at least 1"))]
    pub case_size: Option<i32>,
    pub min_qty: Option<Decimal>,
    pub max_qty: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLocation {
    #[validate(length(min = 1, max = 64, message = "code is required"))]
    pub code: String,
    #[serde(default)]
    pub location_type: LocationType,
    pub description: Option<String>,
    pub max_weight: Option<Decimal>,
    pub max_volume: Option<Decimal>,
}

/// Partial location update. Absent fields stay; `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateLocation {
    pub location_type: Option<LocationType>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub max_weight: Option<Option<Decimal>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<Decimal>)]
    pub max_volume: Option<Option<Decimal>>,
}

/// Offset pagination for catalogue listings.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Page {
    /// Rows to skip
    pub offset: Option<u64>,
    /// Rows to return, at most 1000 (default 100)
    pub limit: Option<u64>,
}

impl Page {
    fn bounds(self) -> (u64, u64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (self.offset.unwrap_or(0), limit)
    }
}

fn non_negative(value: Decimal, field: &str) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

/// Replenishment bounds: both non-negative, and min within max when max is set.
fn check_bounds(min_qty: Decimal, max_qty: Decimal) -> Result<(), ServiceError> {
    non_negative(min_qty, "min_qty")?;
    non_negative(max_qty, "max_qty")?;
    if max_qty > Decimal::ZERO && min_qty > max_qty {
        return Err(ServiceError::ValidationError(format!(
            "min_qty {} exceeds max_qty {}",
            min_qty.normalize(),
            max_qty.normalize()
        )));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    trimmed(value).filter(|v| !v.is_empty())
}

async fn references<C, E, F>(conn: &C, filter: F) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
    F: IntoCondition,
{
    E::find()
        .filter(filter)
        .count(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Products and shelf locations.
#[derive(Clone)]
pub struct MasterDataService {
    db_pool: Arc<DatabaseConnection>,
}

impl MasterDataService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Registers a product. EAN and material code must both be unused.
    #[instrument(skip(self, input), fields(ean = %input.ean))]
    pub async fn create_product(
        &self,
        input: CreateProduct,
        now: DateTime<Utc>,
    ) -> Result<product::Model, ServiceError> {
        let input = CreateProduct {
            ean: input.ean.trim().to_string(),
            material_code: input.material_code.trim().to_string(),
            name: input.name.trim().to_string(),
            brand: input.brand.trim().to_string(),
            ..input
        };
        input.validate()?;
        non_negative(input.mrp, "mrp")?;
        check_bounds(input.min_qty, input.max_qty)?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        if references::<_, product::Entity, _>(&txn, product::Column::Ean.eq(input.ean.as_str()))
            .await?
            > 0
        {
            return Err(ServiceError::Conflict(format!(
                "EAN {} is already registered",
                input.ean
            )));
        }
        if references::<_, product::Entity, _>(
            &txn,
            product::Column::MaterialCode.eq(input.material_code.as_str()),
        )
        .await?
            > 0
        {
            return Err(ServiceError::Conflict(format!(
                "Material code {} is already registered",
                input.material_code
            )));
        }

        let ean = input.ean.clone();
        let product = product::ActiveModel {
            ean: Set(input.ean),
            material_code: Set(input.material_code),
            name: Set(input.name),
            brand: Set(input.brand),
            uom: Set(input.uom),
            mrp: Set(input.mrp),
            case_size: Set(input.case_size),
            min_qty: Set(input.min_qty),
            max_qty: Set(input.max_qty),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            ServiceError::from_insert(e, || format!("Product with EAN {} already exists", ean))
        })?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    pub async fn list_products(&self, page: Page) -> Result<Vec<product::Model>, ServiceError> {
        let (offset, limit) = page.bounds();
        product::Entity::find()
            .order_by_asc(product::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: i32,
        input: UpdateProduct,
    ) -> Result<product::Model, ServiceError> {
        let input = UpdateProduct {
            name: trimmed(input.name),
            brand: trimmed(input.brand),
            ..input
        };
        input.validate()?;
        if let Some(mrp) = input.mrp {
            non_negative(mrp, "mrp")?;
        }

        let db = &*self.db_pool;
        let product = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        check_bounds(
            input.min_qty.unwrap_or(product.min_qty),
            input.max_qty.unwrap_or(product.max_qty),
        )?;

        let mut active: product::ActiveModel = product.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(brand) = input.brand {
            active.brand = Set(brand);
        }
        if let Some(mrp) = input.mrp {
            active.mrp = Set(mrp);
        }
        if let Some(case_size) = input.case_size {
            active.case_size = Set(case_size);
        }
        if let Some(min_qty) = input.min_qty {
            active.min_qty = Set(min_qty);
        }
        if let Some(max_qty) = input.max_qty {
            active.max_qty = Set(max_qty);
        }
        let product = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(product_id, "Product updated");
        Ok(product)
    }

    /// Removes a product nothing refers to. Stock, receipt lines and pick lines all block deletion.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let product = product::Entity::find_by_id(product_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let lots = references::<_, inventory_lot::Entity, _>(
            &txn,
            inventory_lot::Column::ProductId.eq(product_id),
        )
        .await?;
        let receipt_lines = references::<_, goods_receipt_item::Entity, _>(
            &txn,
            goods_receipt_item::Column::ProductId.eq(product_id),
        )
        .await?;
        let pick_lines = references::<_, pick_list_item::Entity, _>(
            &txn,
            pick_list_item::Column::ProductId.eq(product_id),
        )
        .await?;
        if lots + receipt_lines + pick_lines > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} is still referenced by {} lot(s), {} receipt line(s) and {} pick line(s)",
                product_id, lots, receipt_lines, pick_lines
            )));
        }

        product.delete(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id, "Product deleted");
        Ok(())
    }

    pub async fn find_product_by_ean(&self, ean: &str) -> Result<product::Model, ServiceError> {
        find_product_by_ean(&*self.db_pool, ean).await
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_location(
        &self,
        input: CreateLocation,
        now: DateTime<Utc>,
    ) -> Result<location::Model, ServiceError> {
        let input = CreateLocation {
            code: input.code.trim().to_string(),
            description: blank_to_none(input.description),
            ..input
        };
        input.validate()?;
        for (value, field) in [(input.max_weight, "max_weight"), (input.max_volume, "max_volume")] {
            if let Some(value) = value {
                non_negative(value, field)?;
            }
        }

        let code = input.code.clone();
        let location = location::ActiveModel {
            code: Set(input.code),
            location_type: Set(input.location_type),
            description: Set(input.description),
            max_weight: Set(input.max_weight),
            max_volume: Set(input.max_volume),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            ServiceError::from_insert(e, || format!("Location {} already exists", code))
        })?;

        info!(location_id = location.id, "Location created");
        Ok(location)
    }

    /// Every location, ordered by code.
    pub async fn list_locations(&self) -> Result<Vec<location::Model>, ServiceError> {
        location::Entity::find()
            .order_by_asc(location::Column::Code)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input))]
    pub async fn update_location(
        &self,
        location_id: i32,
        input: UpdateLocation,
    ) -> Result<location::Model, ServiceError> {
        for (value, field) in [(&input.max_weight, "max_weight"), (&input.max_volume, "max_volume")] {
            if let Some(Some(value)) = value {
                non_negative(*value, field)?;
            }
        }

        let db = &*self.db_pool;
        let location = location::Entity::find_by_id(location_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;

        let mut active: location::ActiveModel = location.into();
        if let Some(location_type) = input.location_type {
            active.location_type = Set(location_type);
        }
        if let Some(description) = input.description {
            active.description = Set(blank_to_none(description));
        }
        if let Some(max_weight) = input.max_weight {
            active.max_weight = Set(max_weight);
        }
        if let Some(max_volume) = input.max_volume {
            active.max_volume = Set(max_volume);
        }
        let location = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(location_id, "Location updated");
        Ok(location)
    }

    /// Removes an empty location that no pick line points at.
    #[instrument(skip(self))]
    pub async fn delete_location(&self, location_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let location = location::Entity::find_by_id(location_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;

        let lots = references::<_, inventory_lot::Entity, _>(
            &txn,
            inventory_lot::Column::LocationId.eq(location_id),
        )
        .await?;
        let pick_lines = references::<_, pick_list_item::Entity, _>(
            &txn,
            pick_list_item::Column::LocationId.eq(location_id),
        )
        .await?;
        if lots + pick_lines > 0 {
            return Err(ServiceError::Conflict(format!(
                "Location {} still holds {} lot(s) and {} pick line(s)",
                location.code, lots, pick_lines
            )));
        }

        location.delete(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(location_id, "Location deleted");
        Ok(())
    }
}
