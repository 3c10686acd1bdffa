/// Format a price with two decimals and a dollar sign
pub fn format_price(price: f64) -> String {
    if price < 0.0 {
        format!("-${:.2}", -price)
    } else {
        format!("${:.2}", price)
    }
}

/// Format a 0-5 rating with one decimal, e.g. "4.7/5"
pub fn format_rating(rating: f64) -> String {
    format!("{:.1}/5", rating)
}

/// Stock level with a low-stock marker
pub fn format_stock(stock: i64, low_threshold: i64) -> String {
    if stock < low_threshold {
        format!("{} (low)", stock)
    } else {
        stock.to_string()
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// "Showing 11-20 of 194", or "No results" for an empty page
pub fn page_summary(skip: u64, shown: usize, total: u64) -> String {
    if shown == 0 {
        "No results".to_string()
    } else {
        format!("Showing {}-{} of {}", skip + 1, skip + shown as u64, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(9.99), "$9.99");
        assert_eq!(format_price(1299.0), "$1299.00");
        assert_eq!(format_price(-3.5), "-$3.50");
    }

    #[test]
    fn test_format_rating_and_stock() {
        assert_eq!(format_rating(4.94), "4.9/5");
        assert_eq!(format_stock(5, 10), "5 (low)");
        assert_eq!(format_stock(10, 10), "10");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Crème brûlée", 8), "Crème...");
    }

    #[test]
    fn test_page_summary() {
        assert_eq!(page_summary(10, 10, 194), "Showing 11-20 of 194");
        assert_eq!(page_summary(0, 0, 0), "No results");
    }
}
