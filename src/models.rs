use chrono::{DateTime, Utc};
use mongodb::bson::{self, to_document, Bson, Document};
use serde::{Deserialize, Serialize};

/// Converts a chrono timestamp into the BSON date `date_Time` is stored as,
/// so the store orders it chronologically.
pub fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

/// Renders a stored document as relaxed extended JSON. Every stored field is
/// kept, including ones this service never writes.
pub fn to_json(document: Document) -> serde_json::Value {
    Bson::Document(document).into_relaxed_extjson()
}

/// A product document as inserted into the `products` collection. Reads
/// come back as raw [`Document`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(rename = "date_Time")]
    pub date_time: bson::DateTime,
    #[serde(rename = "sellerEmail")]
    pub seller_email: String,
    #[serde(rename = "sellerName", skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl Product {
    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        to_document(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(rename = "date_Time", default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(rename = "sellerEmail")]
    pub seller_email: String,
    #[serde(rename = "sellerName", default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl NewProduct {
    /// Builds the document to insert, stamping `date_Time` with the current
    /// time when the client did not send one.
    pub fn into_product(self) -> Product {
        Product {
            name: self.name,
            category: self.category,
            price: self.price,
            date_time: to_bson_datetime(self.date_time.unwrap_or_else(Utc::now)),
            seller_email: self.seller_email,
            seller_name: self.seller_name,
            description: self.description,
            image: self.image,
            brand: self.brand,
            rating: self.rating,
        }
    }
}

/// Partial update body. Only the fields that are present get `$set`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    // Written as a BSON date by `to_set_document`.
    #[serde(rename = "date_Time", skip_serializing)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(rename = "sellerEmail", skip_serializing_if = "Option::is_none")]
    pub seller_email: Option<String>,
    #[serde(rename = "sellerName", skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.date_time.is_none()
            && self.seller_email.is_none()
            && self.seller_name.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.brand.is_none()
            && self.rating.is_none()
    }

    /// The body of the `$set` operator: present fields only.
    pub fn to_set_document(&self) -> Result<Document, bson::ser::Error> {
        let mut set = to_document(self)?;
        if let Some(date_time) = self.date_time {
            set.insert("date_Time", to_bson_datetime(date_time));
        }
        Ok(set)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertReceipt {
    pub acknowledged: bool,
    pub inserted_id: Bson,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceipt {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Body of `POST /getJwtToken`. Any other claims the client sends are
/// accepted and ignored; only the email is signed.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityPayload {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Query string carried by every guarded route.
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::doc;
    use mongodb::bson::oid::ObjectId;

    fn serum() -> NewProduct {
        serde_json::from_value(serde_json::json!({
            "name": "Serum",
            "category": "skincare",
            "price": 25.0,
            "date_Time": "2024-03-01T10:00:00Z",
            "sellerEmail": "a@zenova.io",
            "description": "vitamin c",
        }))
        .unwrap()
    }

    #[test]
    fn new_product_uses_wire_field_names() {
        let product = serum().into_product();
        assert_eq!(product.seller_email, "a@zenova.io");
        assert_eq!(
            product.date_time,
            to_bson_datetime(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn inserted_date_is_a_bson_date() {
        let document = serum().into_product().to_document().unwrap();

        let stored = document.get_datetime("date_Time").unwrap();
        assert_eq!(
            stored.timestamp_millis(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(document.get_f64("price").unwrap(), 25.0);
        assert!(!document.contains_key("_id"));
        assert!(!document.contains_key("image"));
    }

    #[test]
    fn bson_dates_order_chronologically() {
        let earlier = to_bson_datetime(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        let later = to_bson_datetime(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::milliseconds(500),
        );
        assert!(earlier < later);
    }

    #[test]
    fn new_product_rejects_unknown_fields() {
        let result = serde_json::from_value::<NewProduct>(serde_json::json!({
            "name": "Serum",
            "category": "skincare",
            "price": 25.0,
            "sellerEmail": "a@zenova.io",
            "discount": 5,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_date_defaults_to_now() {
        let before = to_bson_datetime(Utc::now());
        let input: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "Toner",
            "category": "skincare",
            "price": 12.5,
            "sellerEmail": "a@zenova.io",
        }))
        .unwrap();
        assert!(input.into_product().date_time >= before);
    }

    #[test]
    fn set_document_holds_present_fields_only() {
        let patch: ProductPatch =
            serde_json::from_str(r#"{"price":30.0,"date_Time":"2024-07-01T08:00:00Z"}"#).unwrap();
        let set = patch.to_set_document().unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get_f64("price").unwrap(), 30.0);
        assert!(set.get_datetime("date_Time").is_ok());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProductPatch::default().is_empty());
        let patch: ProductPatch = serde_json::from_str(r#"{"brand":"Zen"}"#).unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn identity_payload_ignores_extra_claims() {
        let identity: IdentityPayload =
            serde_json::from_str(r#"{"email":"a@zenova.io","name":"Khaled","photo":"x.png"}"#)
                .unwrap();
        assert_eq!(identity.email, "a@zenova.io");
    }

    #[test]
    fn stored_documents_render_verbatim() {
        let id = ObjectId::new();
        let date = to_bson_datetime(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        let value = to_json(doc! {
            "_id": id,
            "name": "Serum",
            "price": "12",
            "date_Time": date,
            "quantity": 4,
            "tags": ["vegan", "new"],
        });

        assert_eq!(value["_id"]["$oid"], id.to_hex());
        assert_eq!(value["price"], "12");
        assert_eq!(value["date_Time"]["$date"], "2024-06-01T12:00:00Z");
        assert_eq!(value["quantity"], 4);
        assert_eq!(value["tags"], serde_json::json!(["vegan", "new"]));
    }
}
