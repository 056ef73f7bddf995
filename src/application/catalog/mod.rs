mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{
    BannerView, CatalogError, CategoryView, CreateBannerCommand, CreateCategoryCommand,
    CreateProductCommand, Listing, ProductView, UpdateBannerCommand, UpdateCategoryCommand,
    UpdateProductCommand,
};
