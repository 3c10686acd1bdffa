//! Data models for the store API.
//!
//! - `Product`, `ProductDraft`, `ProductPatch`: catalog entries and edit payloads
//! - `User`: customer/admin accounts
//! - `DashboardStats`: aggregates shown on the dashboard

pub mod product;
pub mod stats;
pub mod user;

pub use product::{
    CategoryEntry, FieldError, Product, ProductDraft, ProductFilters, ProductPatch, ProductsResponse,
    SortOrder, ALL_CATEGORIES,
};
pub use stats::{DashboardStats, NamedCount, RatedProduct};
pub use user::{User, UserFilters, UsersResponse};
