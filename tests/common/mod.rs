#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};

use zenova_server::auth::TokenService;
use zenova_server::config::DeploymentMode;
use zenova_server::error::ApiResult;
use zenova_server::handlers;
use zenova_server::models::{
    to_bson_datetime, DeleteReceipt, InsertReceipt, Product, ProductPatch, UpdateReceipt,
};
use zenova_server::query::{ProductFilter, ProductQuery};
use zenova_server::store::ProductStore;

pub const SECRET: &str = "integration-secret";

/// Keeps stored documents in insertion order, evaluating queries the way
/// MongoDB would for the operators the query builder emits.
#[derive(Default)]
pub struct MemoryProductStore {
    documents: Mutex<Vec<Document>>,
}

impl MemoryProductStore {
    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        let documents = products
            .iter()
            .map(|product| product.to_document().unwrap())
            .collect();
        Self::with_documents(documents)
    }

    /// Seeds raw documents, assigning an `_id` where one is missing.
    pub fn with_documents(documents: Vec<Document>) -> Arc<Self> {
        let documents = documents
            .into_iter()
            .map(|mut document| {
                if !document.contains_key("_id") {
                    document.insert("_id", ObjectId::new());
                }
                document
            })
            .collect();
        Arc::new(MemoryProductStore {
            documents: Mutex::new(documents),
        })
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter_map(|document| document.get_object_id("_id").ok())
            .collect()
    }
}

fn has_id(document: &Document, id: ObjectId) -> bool {
    document.get_object_id("_id").ok() == Some(id)
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: Product) -> ApiResult<InsertReceipt> {
        let id = ObjectId::new();
        let mut document = product.to_document()?;
        document.insert("_id", id);
        self.documents.lock().unwrap().push(document);
        Ok(InsertReceipt {
            acknowledged: true,
            inserted_id: Bson::ObjectId(id),
        })
    }

    async fn find(&self, query: &ProductQuery) -> ApiResult<Vec<Document>> {
        Ok(query.apply(self.documents.lock().unwrap().iter()))
    }

    async fn find_by_id(&self, id: ObjectId) -> ApiResult<Option<Document>> {
        let documents = self.documents.lock().unwrap();
        Ok(documents.iter().find(|document| has_id(document, id)).cloned())
    }

    async fn update(&self, id: ObjectId, patch: &ProductPatch) -> ApiResult<UpdateReceipt> {
        let set = patch.to_set_document()?;
        let mut documents = self.documents.lock().unwrap();
        let (matched_count, modified_count) =
            match documents.iter_mut().find(|document| has_id(document, id)) {
                Some(document) => {
                    let before = document.clone();
                    for (key, value) in set {
                        document.insert(key, value);
                    }
                    (1, u64::from(*document != before))
                }
                None => (0, 0),
            };
        Ok(UpdateReceipt {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
        })
    }

    async fn delete(&self, id: ObjectId) -> ApiResult<DeleteReceipt> {
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|document| !has_id(document, id));
        Ok(DeleteReceipt {
            acknowledged: true,
            deleted_count: (before - documents.len()) as u64,
        })
    }

    async fn count(&self, filter: &ProductFilter) -> ApiResult<u64> {
        let documents = self.documents.lock().unwrap();
        Ok(documents.iter().filter(|document| filter.matches(document)).count() as u64)
    }
}

pub fn tokens() -> TokenService {
    TokenService::new(SECRET, DeploymentMode::Development)
}

pub fn app(
    store: Arc<MemoryProductStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let store: Arc<dyn ProductStore> = store;
    App::new()
        .app_data(web::Data::from(store))
        .configure(|cfg| handlers::configure(cfg, tokens()))
}

pub fn product(name: &str, category: &str, price: f64, day: u32, seller: &str) -> Product {
    Product {
        name: name.to_string(),
        category: category.to_string(),
        price,
        date_time: to_bson_datetime(Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()),
        seller_email: seller.to_string(),
        seller_name: None,
        description: None,
        image: None,
        brand: None,
        rating: None,
    }
}

/// Five products, ascending by price and by date.
pub fn catalogue() -> Vec<Product> {
    vec![
        product("Cleanser", "skincare", 8.0, 1, "a@zenova.io"),
        product("Serum", "skincare", 25.0, 2, "a@zenova.io"),
        product("Lipstick", "makeup", 30.0, 3, "b@zenova.io"),
        product("Night Cream", "skincare", 45.0, 4, "b@zenova.io"),
        product("Perfume", "fragrance", 60.0, 5, "a@zenova.io"),
    ]
}
