use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;

use crate::auth::{Claims, TokenService};
use crate::error::{bad_request, ApiError, ApiResult};
use crate::middleware::AuthGuard;
use crate::models::{
    to_json, CountResponse, IdentityPayload, NewProduct, ProductPatch, SuccessResponse,
};
use crate::query::{ListingParams, ProductFilter, ProductQuery, SearchParams};
use crate::store::ProductStore;

/// Registers every route. Guarded routes get their own [`AuthGuard`].
pub fn configure(cfg: &mut web::ServiceConfig, tokens: TokenService) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _req| bad_request(err)))
        .app_data(web::Data::new(tokens.clone()))
        .route("/", web::get().to(index))
        .route("/getJwtToken", web::post().to(issue_token))
        .route("/deleteJwtToken", web::post().to(revoke_token))
        .service(
            web::resource("/add-product")
                .wrap(AuthGuard::new(tokens.clone()))
                .route(web::post().to(add_product)),
        )
        .route("/all-products", web::get().to(all_products))
        .route("/product-details/{id}", web::get().to(product_details))
        .service(
            web::resource("/my-products")
                .wrap(AuthGuard::new(tokens.clone()))
                .route(web::get().to(my_products)),
        )
        .service(
            web::resource("/update-product/{id}")
                .wrap(AuthGuard::new(tokens.clone()))
                .route(web::patch().to(update_product)),
        )
        .service(
            web::resource("/delete-product/{id}")
                .wrap(AuthGuard::new(tokens))
                .route(web::delete().to(delete_product)),
        )
        .route("/all-products-by-pagination", web::get().to(paginated_products))
        .route("/products-count", web::get().to(products_count))
        .route("/search-products", web::get().to(search_products));
}

fn parse_id(raw: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("invalid product id".to_string()))
}

fn product_list(products: Vec<Document>) -> HttpResponse {
    let body: Vec<serde_json::Value> = products.into_iter().map(to_json).collect();
    HttpResponse::Ok().json(body)
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().body("Hello! From Zenova server")
}

async fn issue_token(
    tokens: web::Data<TokenService>,
    identity: web::Json<IdentityPayload>,
) -> ApiResult<HttpResponse> {
    let token = tokens.issue(&identity.email)?;
    log::info!("Issued session token for {}", identity.email);
    Ok(HttpResponse::Ok()
        .cookie(tokens.session_cookie(token))
        .json(SuccessResponse { success: true }))
}

async fn revoke_token(tokens: web::Data<TokenService>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(tokens.removal_cookie())
        .json(SuccessResponse { success: true })
}

async fn add_product(
    store: web::Data<dyn ProductStore>,
    data: web::Json<NewProduct>,
) -> ApiResult<HttpResponse> {
    let receipt = store.insert(data.into_inner().into_product()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

async fn all_products(store: web::Data<dyn ProductStore>) -> ApiResult<HttpResponse> {
    let products = store.find(&ProductQuery::all()).await?;
    Ok(product_list(products))
}

async fn product_details(
    store: web::Data<dyn ProductStore>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&id)?;
    match store.find_by_id(id).await? {
        Some(product) => Ok(HttpResponse::Ok().json(to_json(product))),
        None => Err(ApiError::NotFound("product not found".to_string())),
    }
}

async fn my_products(
    store: web::Data<dyn ProductStore>,
    claims: web::ReqData<Claims>,
) -> ApiResult<HttpResponse> {
    let query = ProductQuery::with_filter(ProductFilter::by_seller(claims.email.as_str()));
    let products = store.find(&query).await?;
    Ok(product_list(products))
}

async fn update_product(
    store: web::Data<dyn ProductStore>,
    id: web::Path<String>,
    patch: web::Json<ProductPatch>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&id)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }
    let receipt = store.update(id, &patch).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

async fn delete_product(
    store: web::Data<dyn ProductStore>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&id)?;
    let receipt = store.delete(id).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

async fn paginated_products(
    store: web::Data<dyn ProductStore>,
    params: web::Query<ListingParams>,
) -> ApiResult<HttpResponse> {
    let query = params.to_query()?;
    let products = store.find(&query).await?;
    Ok(product_list(products))
}

async fn products_count(
    store: web::Data<dyn ProductStore>,
    params: web::Query<ListingParams>,
) -> ApiResult<HttpResponse> {
    let count = store.count(&params.filter()).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

async fn search_products(
    store: web::Data<dyn ProductStore>,
    params: web::Query<SearchParams>,
) -> ApiResult<HttpResponse> {
    let products = store.find(&params.to_query()).await?;
    Ok(product_list(products))
}
