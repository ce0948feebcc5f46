//! Product query builder.
//!
//! Turns the loosely typed query strings of the listing routes into a
//! [`ProductQuery`]: a [`ProductFilter`] plus sort and pagination options.
//! The query renders itself as a MongoDB filter document and `FindOptions`,
//! and the filter can also be evaluated against an in-memory stored document.

use std::cmp::Ordering;
use std::str::FromStr;

use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("page must be a positive integer, got '{0}'")]
    InvalidPage(String),
    #[error("size must be a positive integer, got '{0}'")]
    InvalidSize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortDirection::Ascending),
            "desc" | "descending" | "-1" => Ok(SortDirection::Descending),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    Date,
}

impl SortKey {
    pub fn field(self) -> &'static str {
        match self {
            SortKey::Price => "price",
            SortKey::Date => "date_Time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn to_document(self) -> Document {
        let mut sort = Document::new();
        sort.insert(self.key.field(), self.direction.as_i32());
        sort
    }

    /// Orders two stored documents the same way the store would.
    pub fn compare(self, a: &Document, b: &Document) -> Ordering {
        let field = self.key.field();
        let ordering = match self.key {
            SortKey::Price => number(a, field)
                .partial_cmp(&number(b, field))
                .unwrap_or(Ordering::Equal),
            SortKey::Date => a.get_datetime(field).ok().cmp(&b.get_datetime(field).ok()),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Inclusive price bounds. Never validated: `min > max` simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub price: Option<PriceRange>,
    pub seller_email: Option<String>,
    /// Case-insensitive substring of `name`.
    pub name_contains: Option<String>,
}

impl ProductFilter {
    pub fn by_seller(email: impl Into<String>) -> Self {
        ProductFilter {
            seller_email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn name_contains(text: impl Into<String>) -> Self {
        ProductFilter {
            name_contains: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();

        if let Some(category) = &self.category {
            filter.insert("category", category.as_str());
        }
        if let Some(range) = self.price {
            filter.insert("price", doc! { "$gte": range.min, "$lte": range.max });
        }
        if let Some(email) = &self.seller_email {
            filter.insert("sellerEmail", email.as_str());
        }
        if let Some(text) = &self.name_contains {
            filter.insert(
                "name",
                doc! { "$regex": regex::escape(text), "$options": "i" },
            );
        }

        filter
    }

    /// Mirrors the operators `to_document` emits. A non-numeric `price`
    /// never satisfies a range, as in MongoDB's type bracketing.
    pub fn matches(&self, document: &Document) -> bool {
        if let Some(category) = &self.category {
            if document.get_str("category").ok() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(range) = self.price {
            match number(document, "price") {
                Some(price) if price >= range.min && price <= range.max => {}
                _ => return false,
            }
        }
        if let Some(email) = &self.seller_email {
            if document.get_str("sellerEmail").ok() != Some(email.as_str()) {
                return false;
            }
        }
        if let Some(text) = &self.name_contains {
            let needle = text.to_lowercase();
            match document.get_str("name") {
                Ok(name) if name.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        true
    }
}

fn number(document: &Document, key: &str) -> Option<f64> {
    match document.get(key)? {
        Bson::Double(value) => Some(*value),
        Bson::Int32(value) => Some(f64::from(*value)),
        Bson::Int64(value) => Some(*value as f64),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub sort: Option<SortSpec>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl ProductQuery {
    pub fn all() -> Self {
        ProductQuery::default()
    }

    pub fn with_filter(filter: ProductFilter) -> Self {
        ProductQuery {
            filter,
            ..Default::default()
        }
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .sort(self.sort.map(SortSpec::to_document))
            .skip(self.skip)
            .limit(self.limit)
            .build()
    }

    /// Applies filter, sort and pagination to an in-memory collection.
    pub fn apply<'a, I>(&self, documents: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut selected: Vec<Document> = documents
            .into_iter()
            .filter(|document| self.filter.matches(document))
            .cloned()
            .collect();

        if let Some(sort) = self.sort {
            selected.sort_by(|a, b| sort.compare(a, b));
        }

        let skip = self.skip.unwrap_or(0) as usize;
        let limit = self.limit.map_or(usize::MAX, |limit| limit as usize);
        selected.into_iter().skip(skip).take(limit).collect()
    }
}

/// Query string of `/all-products-by-pagination` and `/products-count`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_price: Option<String>,
    pub sort_date: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl ListingParams {
    /// Builds the filter shared by the listing and counting routes.
    ///
    /// The price range only applies when both bounds parse; a single bound is
    /// dropped rather than treated as open-ended.
    pub fn filter(&self) -> ProductFilter {
        let category = self
            .category
            .as_deref()
            .filter(|category| !category.is_empty())
            .map(str::to_string);

        let min = self.min_price.as_deref().and_then(parse_price);
        let max = self.max_price.as_deref().and_then(parse_price);
        let price = match (min, max) {
            (Some(min), Some(max)) => Some(PriceRange { min, max }),
            _ => None,
        };

        ProductFilter {
            category,
            price,
            ..Default::default()
        }
    }

    /// Date sort wins over price sort when both are supplied.
    pub fn sort(&self) -> Option<SortSpec> {
        let by_price = self.sort_price.as_deref().and_then(|value| {
            value.parse().ok().map(|direction| SortSpec {
                key: SortKey::Price,
                direction,
            })
        });
        let by_date = self.sort_date.as_deref().and_then(|value| {
            value.parse().ok().map(|direction| SortSpec {
                key: SortKey::Date,
                direction,
            })
        });

        by_date.or(by_price)
    }

    pub fn to_query(&self) -> Result<ProductQuery, QueryError> {
        let (skip, limit) = match self.size.as_deref() {
            None => (None, None),
            Some(raw_size) => {
                let size = parse_positive(raw_size)
                    .ok_or_else(|| QueryError::InvalidSize(raw_size.to_string()))?;
                let raw_page = self.page.as_deref().unwrap_or("1");
                let skip = parse_positive(raw_page)
                    .and_then(|page| (page - 1).checked_mul(size))
                    .ok_or_else(|| QueryError::InvalidPage(raw_page.to_string()))?;
                (Some(skip), Some(size as i64))
            }
        };

        Ok(ProductQuery {
            filter: self.filter(),
            sort: self.sort(),
            skip,
            limit,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

impl SearchParams {
    pub fn to_query(&self) -> ProductQuery {
        match self.search.as_deref() {
            Some(text) if !text.is_empty() => {
                ProductQuery::with_filter(ProductFilter::name_contains(text))
            }
            _ => ProductQuery::all(),
        }
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_positive(raw: &str) -> Option<u64> {
    // i64::MAX bound keeps the limit representable for the driver.
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value >= 1 && *value <= i64::MAX as u64)
}
