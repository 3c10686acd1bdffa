use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Category filter value that means "no category filter"
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(rename = "discountPercentage", default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Set by the API on the object returned from DELETE
    #[serde(rename = "isDeleted", default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl Product {
    /// Price after the advertised discount
    pub fn discounted_price(&self) -> f64 {
        self.price * (1.0 - self.discount_percentage / 100.0)
    }

    pub fn brand_display(&self) -> &str {
        self.brand.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}' (expected asc or desc)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    pub limit: u32,
    pub skip: u32,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            sort_by: None,
            order: None,
            limit: 10,
            skip: 0,
        }
    }
}

/// One category entry as the API lists it: newer API versions return
/// objects, older ones bare slugs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryEntry {
    Slug(String),
    Detailed {
        #[serde(default)]
        slug: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl CategoryEntry {
    /// Slug preferred, then name
    pub fn into_slug(self) -> Option<String> {
        match self {
            CategoryEntry::Slug(slug) => Some(slug),
            CategoryEntry::Detailed { slug, name } => slug.or(name),
        }
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(rename = "discountPercentage")]
    pub discount_percentage: f64,
    pub stock: i64,
    pub brand: String,
    pub category: String,
    pub thumbnail: String,
    pub images: Vec<String>,
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "discountPercentage", skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

/// A field that failed validation and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn is_absolute_url(s: &str) -> bool {
    Url::parse(s).map(|u| u.has_host()).unwrap_or(false)
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.trim().chars().count() < 3 {
        errors.push(FieldError { field: "title", message: "must be at least 3 characters" });
    }
}

fn check_description(description: &str, errors: &mut Vec<FieldError>) {
    if description.trim().chars().count() < 10 {
        errors.push(FieldError { field: "description", message: "must be at least 10 characters" });
    }
}

fn check_price(price: f64, errors: &mut Vec<FieldError>) {
    if !(price >= 0.01) {
        errors.push(FieldError { field: "price", message: "must be greater than 0" });
    }
}

fn check_discount(discount: f64, errors: &mut Vec<FieldError>) {
    if !(0.0..=100.0).contains(&discount) {
        errors.push(FieldError { field: "discountPercentage", message: "must be between 0 and 100" });
    }
}

fn check_stock(stock: i64, errors: &mut Vec<FieldError>) {
    if stock < 0 {
        errors.push(FieldError { field: "stock", message: "cannot be negative" });
    }
}

fn check_brand(brand: &str, errors: &mut Vec<FieldError>) {
    if brand.trim().chars().count() < 2 {
        errors.push(FieldError { field: "brand", message: "is required" });
    }
}

fn check_category(category: &str, errors: &mut Vec<FieldError>) {
    if category.trim().is_empty() {
        errors.push(FieldError { field: "category", message: "is required" });
    }
}

fn check_thumbnail(thumbnail: &str, errors: &mut Vec<FieldError>) {
    if !thumbnail.is_empty() && !is_absolute_url(thumbnail) {
        errors.push(FieldError { field: "thumbnail", message: "must be a URL" });
    }
}

fn check_images(images: &[String], errors: &mut Vec<FieldError>) {
    if images.iter().any(|i| !is_absolute_url(i)) {
        errors.push(FieldError { field: "images", message: "must all be URLs" });
    }
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_title(&self.title, &mut errors);
        check_description(&self.description, &mut errors);
        check_price(self.price, &mut errors);
        check_discount(self.discount_percentage, &mut errors);
        check_stock(self.stock, &mut errors);
        check_brand(&self.brand, &mut errors);
        check_category(&self.category, &mut errors);
        check_thumbnail(&self.thumbnail, &mut errors);
        check_images(&self.images, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ProductPatch {
    /// Same rules as `ProductDraft::validate`, applied to the fields present.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(ref v) = self.title {
            check_title(v, &mut errors);
        }
        if let Some(ref v) = self.description {
            check_description(v, &mut errors);
        }
        if let Some(v) = self.price {
            check_price(v, &mut errors);
        }
        if let Some(v) = self.discount_percentage {
            check_discount(v, &mut errors);
        }
        if let Some(v) = self.stock {
            check_stock(v, &mut errors);
        }
        if let Some(ref v) = self.brand {
            check_brand(v, &mut errors);
        }
        if let Some(ref v) = self.category {
            check_category(v, &mut errors);
        }
        if let Some(ref v) = self.thumbnail {
            check_thumbnail(v, &mut errors);
        }
        if let Some(ref v) = self.images {
            check_images(v, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> ProductDraft {
        ProductDraft {
            title: "Desk Lamp".into(),
            description: "An adjustable LED desk lamp".into(),
            price: 24.99,
            discount_percentage: 5.0,
            stock: 12,
            brand: "Lumen".into(),
            category: "home-decoration".into(),
            thumbnail: "https://cdn.dummyjson.com/lamp.png".into(),
            images: vec![],
        }
    }

    #[test]
    fn test_valid_draft() {
        assert_eq!(valid_draft().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_draft_reports_every_field() {
        let draft = ProductDraft {
            title: "ab".into(),
            description: "short".into(),
            price: 0.0,
            discount_percentage: 120.0,
            stock: -1,
            brand: "x".into(),
            category: " ".into(),
            thumbnail: "not a url".into(),
            images: vec!["also not".into()],
        };
        let fields: Vec<_> = draft.validate().unwrap_err().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["title", "description", "price", "discountPercentage", "stock", "brand", "category", "thumbnail", "images"]
        );
    }

    #[test]
    fn test_empty_thumbnail_allowed() {
        let draft = ProductDraft {
            thumbnail: String::new(),
            ..valid_draft()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_nan_price_rejected() {
        let draft = ProductDraft {
            price: f64::NAN,
            ..valid_draft()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        let patch = ProductPatch {
            price: Some(9.5),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());
        assert!(ProductPatch::default().is_empty());

        let bad = ProductPatch {
            stock: Some(-3),
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err()[0].field, "stock");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ProductPatch {
            title: Some("New".into()),
            discount_percentage: Some(10.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"title": "New", "discountPercentage": 10.0}));
    }

    #[test]
    fn test_category_entries() {
        let entries: Vec<CategoryEntry> = serde_json::from_str(
            r#"["beauty", {"slug": "fragrances", "name": "Fragrances"}, {"name": "Furniture"}]"#,
        )
        .unwrap();
        let slugs: Vec<_> = entries.into_iter().filter_map(CategoryEntry::into_slug).collect();
        assert_eq!(slugs, vec!["beauty", "fragrances", "Furniture"]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_product_parses_api_shape() {
        let json = r#"{
            "id": 1,
            "title": "Essence Mascara Lash Princess",
            "description": "Popular mascara",
            "category": "beauty",
            "price": 9.99,
            "discountPercentage": 7.17,
            "rating": 4.94,
            "stock": 5,
            "tags": ["beauty", "mascara"],
            "brand": "Essence",
            "thumbnail": "https://cdn.dummyjson.com/thumb.png",
            "images": ["https://cdn.dummyjson.com/1.png"]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.brand_display(), "Essence");
        assert!((product.discounted_price() - 9.99 * (1.0 - 0.0717)).abs() < 1e-9);
        assert!(product.is_deleted.is_none());
    }
}
