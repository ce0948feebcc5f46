use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::{options::ClientOptions, Client, Collection, Database};

use crate::config::AppConfig;
use crate::error::ApiResult;
use crate::models::{DeleteReceipt, InsertReceipt, Product, ProductPatch, UpdateReceipt};
use crate::query::{ProductFilter, ProductQuery};
use crate::store::ProductStore;

pub const PRODUCTS_COLLECTION: &str = "products";

pub async fn connect(config: &AppConfig) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&config.database_url).await?;
    client_options.app_name = Some("zenova-server".to_string());

    let client = Client::with_options(client_options)?;
    let db = client.database(&config.database_name);

    // The driver connects lazily; ping so a bad URI fails at startup.
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await?;
    log::info!("Pinged MongoDB deployment, using database '{}'", config.database_name);

    Ok(db)
}

pub struct MongoProductStore {
    collection: Collection<Document>,
}

impl MongoProductStore {
    pub fn new(db: &Database) -> Self {
        MongoProductStore {
            collection: db.collection::<Document>(PRODUCTS_COLLECTION),
        }
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn insert(&self, product: Product) -> ApiResult<InsertReceipt> {
        let result = self
            .collection
            .insert_one(product.to_document()?, None)
            .await?;
        log::info!("Inserted product '{}' ({})", product.name, result.inserted_id);
        Ok(InsertReceipt {
            acknowledged: true,
            inserted_id: result.inserted_id,
        })
    }

    async fn find(&self, query: &ProductQuery) -> ApiResult<Vec<Document>> {
        let cursor = self
            .collection
            .find(query.filter.to_document(), query.find_options())
            .await?;
        let products: Vec<Document> = cursor.try_collect().await?;
        Ok(products)
    }

    async fn find_by_id(&self, id: ObjectId) -> ApiResult<Option<Document>> {
        let product = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(product)
    }

    async fn update(&self, id: ObjectId, patch: &ProductPatch) -> ApiResult<UpdateReceipt> {
        let update = doc! { "$set": patch.to_set_document()? };
        let result = self
            .collection
            .update_one(doc! { "_id": id }, update, None)
            .await?;
        log::info!("Updated product {} (modified {})", id, result.modified_count);
        Ok(UpdateReceipt {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete(&self, id: ObjectId) -> ApiResult<DeleteReceipt> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        log::info!("Deleted product {} (deleted {})", id, result.deleted_count);
        Ok(DeleteReceipt {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn count(&self, filter: &ProductFilter) -> ApiResult<u64> {
        let count = self
            .collection
            .count_documents(filter.to_document(), None)
            .await?;
        Ok(count)
    }
}
