use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;

use crate::error::ApiResult;
use crate::models::{DeleteReceipt, InsertReceipt, Product, ProductPatch, UpdateReceipt};
use crate::query::{ProductFilter, ProductQuery};

/// Persistence seam for the product routes. Each method is exactly one call
/// to the underlying document store. Reads return the stored documents
/// as they are, so fields this service never writes survive.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: Product) -> ApiResult<InsertReceipt>;

    async fn find(&self, query: &ProductQuery) -> ApiResult<Vec<Document>>;

    async fn find_by_id(&self, id: ObjectId) -> ApiResult<Option<Document>>;

    async fn update(&self, id: ObjectId, patch: &ProductPatch) -> ApiResult<UpdateReceipt>;

    async fn delete(&self, id: ObjectId) -> ApiResult<DeleteReceipt>;

    async fn count(&self, filter: &ProductFilter) -> ApiResult<u64>;
}
