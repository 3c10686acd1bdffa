//! Dashboard statistics computed from a sample of products and users.

use serde::{Deserialize, Serialize};

use super::{Product, ProductsResponse, UsersResponse};

/// Products with fewer units than this count as low stock
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Categories shown individually; the rest fold into "Others"
const TOP_CATEGORY_COUNT: usize = 5;

const TOP_RATED_COUNT: usize = 5;

const OTHERS_LABEL: &str = "Others";

/// Inclusive upper bounds of the price buckets; anything above the last is "500+"
const PRICE_BUCKETS: [(&str, f64); 3] = [("0-50", 50.0), ("50-100", 100.0), ("100-500", 500.0)];
const PRICE_OVERFLOW_LABEL: &str = "500+";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedProduct {
    pub name: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_users: u64,
    pub low_stock_count: usize,
    pub average_price: f64,
    pub average_rating: f64,
    pub category_count: usize,
    pub category_distribution: Vec<NamedCount>,
    pub price_ranges: Vec<NamedCount>,
    pub top_rated_products: Vec<RatedProduct>,
}

impl DashboardStats {
    /// Totals come from the responses' `total` (whole catalog); everything
    /// else is computed over the sampled products.
    pub fn compute(products: &ProductsResponse, users: &UsersResponse) -> Self {
        let sample = &products.products;

        Self {
            total_products: products.total,
            total_users: users.total,
            low_stock_count: sample.iter().filter(|p| p.stock < LOW_STOCK_THRESHOLD).count(),
            average_price: average(sample.iter().map(|p| p.price)),
            average_rating: average(sample.iter().map(|p| p.rating)),
            category_count: category_counts(sample).len(),
            category_distribution: category_distribution(sample),
            price_ranges: price_ranges(sample),
            top_rated_products: top_rated(sample),
        }
    }
}

fn average(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else {
        values.sum::<f64>() / n as f64
    }
}

/// Count per category in first-seen order.
fn category_counts(products: &[Product]) -> Vec<NamedCount> {
    let mut counts: Vec<NamedCount> = Vec::new();
    for product in products {
        match counts.iter_mut().find(|c| c.name == product.category) {
            Some(entry) => entry.value += 1,
            None => counts.push(NamedCount {
                name: product.category.clone(),
                value: 1,
            }),
        }
    }
    counts
}

fn category_distribution(products: &[Product]) -> Vec<NamedCount> {
    let mut counts = category_counts(products);
    // Stable: ties keep first-seen order
    counts.sort_by(|a, b| b.value.cmp(&a.value));

    let rest = counts.split_off(TOP_CATEGORY_COUNT.min(counts.len()));
    let others: usize = rest.iter().map(|c| c.value).sum();
    if others > 0 {
        counts.push(NamedCount {
            name: OTHERS_LABEL.to_string(),
            value: others,
        });
    }
    counts
}

fn price_ranges(products: &[Product]) -> Vec<NamedCount> {
    let mut ranges: Vec<NamedCount> = PRICE_BUCKETS
        .iter()
        .map(|(name, _)| name)
        .chain(std::iter::once(&PRICE_OVERFLOW_LABEL))
        .map(|name| NamedCount {
            name: name.to_string(),
            value: 0,
        })
        .collect();

    for product in products {
        let bucket = PRICE_BUCKETS
            .iter()
            .position(|(_, max)| product.price <= *max)
            .unwrap_or(PRICE_BUCKETS.len());
        ranges[bucket].value += 1;
    }
    ranges
}

fn top_rated(products: &[Product]) -> Vec<RatedProduct> {
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    sorted
        .into_iter()
        .take(TOP_RATED_COUNT)
        .map(|p| RatedProduct {
            name: p.title.clone(),
            rating: p.rating,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, category: &str, price: f64, rating: f64, stock: i64) -> Product {
        Product {
            id,
            title: format!("Product {}", id),
            description: String::new(),
            price,
            discount_percentage: 0.0,
            rating,
            stock,
            brand: None,
            category: category.to_string(),
            thumbnail: String::new(),
            images: vec![],
            is_deleted: None,
        }
    }

    fn products(list: Vec<Product>, total: u64) -> ProductsResponse {
        ProductsResponse {
            limit: list.len() as u64,
            products: list,
            total,
            skip: 0,
        }
    }

    fn users(total: u64) -> UsersResponse {
        UsersResponse {
            users: vec![],
            total,
            skip: 0,
            limit: 30,
        }
    }

    #[test]
    fn test_empty_sample() {
        let stats = DashboardStats::compute(&products(vec![], 0), &users(0));
        assert_eq!(stats.average_price, 0.0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.category_count, 0);
        assert!(stats.category_distribution.is_empty());
        assert!(stats.top_rated_products.is_empty());
        assert_eq!(
            stats.price_ranges.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["0-50", "50-100", "100-500", "500+"]
        );
        assert!(stats.price_ranges.iter().all(|r| r.value == 0));
    }

    #[test]
    fn test_totals_and_averages() {
        let sample = vec![
            product(1, "beauty", 10.0, 4.0, 5),
            product(2, "beauty", 30.0, 3.0, 10),
            product(3, "laptops", 50.0, 5.0, 100),
        ];
        let stats = DashboardStats::compute(&products(sample, 194), &users(208));
        assert_eq!(stats.total_products, 194);
        assert_eq!(stats.total_users, 208);
        assert_eq!(stats.low_stock_count, 1);
        assert!((stats.average_price - 30.0).abs() < 1e-9);
        assert!((stats.average_rating - 4.0).abs() < 1e-9);
        assert_eq!(stats.category_count, 2);
    }

    #[test]
    fn test_price_bucket_boundaries_are_inclusive() {
        let sample = vec![
            product(1, "a", 50.0, 0.0, 1),
            product(2, "a", 50.01, 0.0, 1),
            product(3, "a", 100.0, 0.0, 1),
            product(4, "a", 500.0, 0.0, 1),
            product(5, "a", 500.5, 0.0, 1),
        ];
        let stats = DashboardStats::compute(&products(sample, 5), &users(0));
        let values: Vec<usize> = stats.price_ranges.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1, 2, 1, 1]);
    }

    #[test]
    fn test_category_distribution_top_five_and_others() {
        let mut sample = Vec::new();
        let mut id = 0;
        // g (first seen) and h tie at 1; both fold into Others
        for (category, n) in [("g", 1), ("a", 5), ("b", 4), ("c", 3), ("d", 3), ("e", 2), ("h", 1)] {
            for _ in 0..n {
                id += 1;
                sample.push(product(id, category, 1.0, 1.0, 50));
            }
        }
        let stats = DashboardStats::compute(&products(sample, 19), &users(0));
        let dist: Vec<(&str, usize)> = stats
            .category_distribution
            .iter()
            .map(|c| (c.name.as_str(), c.value))
            .collect();
        assert_eq!(dist, vec![("a", 5), ("b", 4), ("c", 3), ("d", 3), ("e", 2), ("Others", 2)]);
        assert_eq!(stats.category_count, 7);
    }

    #[test]
    fn test_no_others_bucket_when_five_or_fewer() {
        let sample = vec![product(1, "x", 1.0, 1.0, 1), product(2, "y", 1.0, 1.0, 1)];
        let stats = DashboardStats::compute(&products(sample, 2), &users(0));
        assert!(stats.category_distribution.iter().all(|c| c.name != "Others"));
    }

    #[test]
    fn test_top_rated_stable_descending() {
        let sample = vec![
            product(1, "a", 1.0, 4.5, 1),
            product(2, "a", 1.0, 4.9, 1),
            product(3, "a", 1.0, 4.5, 1),
            product(4, "a", 1.0, 3.0, 1),
            product(5, "a", 1.0, 5.0, 1),
            product(6, "a", 1.0, 4.0, 1),
            product(7, "a", 1.0, 2.0, 1),
        ];
        let stats = DashboardStats::compute(&products(sample, 7), &users(0));
        let names: Vec<&str> = stats.top_rated_products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Product 5", "Product 2", "Product 1", "Product 3", "Product 6"]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = DashboardStats::compute(&products(vec![], 0), &users(0));
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("lowStockCount").is_some());
        assert!(json.get("topRatedProducts").is_some());
    }
}
