//! Plain-text rendering of API data.

use shopdash_core::models::{DashboardStats, Product, ProductsResponse, User, UsersResponse};
use shopdash_core::models::stats::LOW_STOCK_THRESHOLD;
use shopdash_core::utils::{format_price, format_rating, format_stock, page_summary, truncate_string};

const TITLE_WIDTH: usize = 36;
const CATEGORY_WIDTH: usize = 20;
const NAME_WIDTH: usize = 28;
const EMAIL_WIDTH: usize = 32;

/// Width of the bar for the largest value in a distribution
const BAR_WIDTH: usize = 30;

pub fn print_products(page: &ProductsResponse) {
    println!(
        "{:>5}  {:<tw$}  {:<cw$}  {:>10}  {:>6}  {:>9}",
        "ID", "TITLE", "CATEGORY", "PRICE", "RATING", "STOCK",
        tw = TITLE_WIDTH,
        cw = CATEGORY_WIDTH,
    );
    for product in &page.products {
        println!(
            "{:>5}  {:<tw$}  {:<cw$}  {:>10}  {:>6}  {:>9}",
            product.id,
            truncate_string(&product.title, TITLE_WIDTH),
            truncate_string(&product.category, CATEGORY_WIDTH),
            format_price(product.price),
            format!("{:.1}", product.rating),
            format_stock(product.stock, LOW_STOCK_THRESHOLD),
            tw = TITLE_WIDTH,
            cw = CATEGORY_WIDTH,
        );
    }
    println!("\n{}", page_summary(page.skip, page.products.len(), page.total));
}

pub fn print_product(product: &Product) {
    println!("#{} {}", product.id, product.title);
    println!("  Brand:     {}", product.brand_display());
    println!("  Category:  {}", product.category);
    if product.discount_percentage > 0.0 {
        println!(
            "  Price:     {} ({} after {:.0}% off)",
            format_price(product.price),
            format_price(product.discounted_price()),
            product.discount_percentage
        );
    } else {
        println!("  Price:     {}", format_price(product.price));
    }
    println!("  Rating:    {}", format_rating(product.rating));
    println!("  Stock:     {}", format_stock(product.stock, LOW_STOCK_THRESHOLD));
    if !product.description.is_empty() {
        println!("\n  {}", product.description);
    }
}

pub fn print_categories(categories: &[String]) {
    for category in categories {
        println!("{}", category);
    }
}

pub fn print_users(page: &UsersResponse) {
    println!(
        "{:>5}  {:<16}  {:<nw$}  {:<ew$}  {:<8}",
        "ID", "USERNAME", "NAME", "EMAIL", "ROLE",
        nw = NAME_WIDTH,
        ew = EMAIL_WIDTH,
    );
    for user in &page.users {
        println!(
            "{:>5}  {:<16}  {:<nw$}  {:<ew$}  {:<8}",
            user.id,
            truncate_string(&user.username, 16),
            truncate_string(&user.full_name(), NAME_WIDTH),
            truncate_string(&user.email, EMAIL_WIDTH),
            user.role.as_deref().unwrap_or("-"),
            nw = NAME_WIDTH,
            ew = EMAIL_WIDTH,
        );
    }
    println!("\n{}", page_summary(page.skip, page.users.len(), page.total));
}

pub fn print_user(user: &User) {
    println!("#{} {} ({})", user.id, user.full_name(), user.username);
    if !user.email.is_empty() {
        println!("  Email:  {}", user.email);
    }
    if let Some(ref phone) = user.phone {
        println!("  Phone:  {}", phone);
    }
    if let Some(age) = user.age {
        println!("  Age:    {}", age);
    }
    if let Some(ref role) = user.role {
        println!("  Role:   {}", role);
    }
}

pub fn print_stats(stats: &DashboardStats, age: &str) {
    println!("Dashboard (updated {})", age);
    println!();
    println!("  Products:       {}", stats.total_products);
    println!("  Users:          {}", stats.total_users);
    println!("  Categories:     {}", stats.category_count);
    println!("  Low stock:      {}", stats.low_stock_count);
    println!("  Average price:  {}", format_price(stats.average_price));
    println!("  Average rating: {}", format_rating(stats.average_rating));

    println!("\nCategories");
    print_distribution(stats.category_distribution.iter().map(|c| (c.name.as_str(), c.value)));

    println!("\nPrice ranges");
    print_distribution(stats.price_ranges.iter().map(|r| (r.name.as_str(), r.value)));

    println!("\nTop rated");
    for (rank, product) in stats.top_rated_products.iter().enumerate() {
        println!(
            "  {}. {:<tw$}  {}",
            rank + 1,
            truncate_string(&product.name, TITLE_WIDTH),
            format_rating(product.rating),
            tw = TITLE_WIDTH,
        );
    }
}

fn print_distribution<'a>(rows: impl Iterator<Item = (&'a str, usize)> + Clone) {
    let max = rows.clone().map(|(_, value)| value).max().unwrap_or(0);
    for (name, value) in rows {
        println!("  {:<cw$}  {:>4}  {}", truncate_string(name, CATEGORY_WIDTH), value, bar(value, max), cw = CATEGORY_WIDTH);
    }
}

fn bar(value: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    "#".repeat((value * BAR_WIDTH).div_ceil(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scales_to_max() {
        assert_eq!(bar(10, 10).len(), BAR_WIDTH);
        assert_eq!(bar(5, 10).len(), BAR_WIDTH / 2);
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(0, 0), "");
        // Any non-zero value gets at least one mark
        assert_eq!(bar(1, 1000).len(), 1);
    }
}
