//! Catalog browsing commands.

use clap::Subcommand;
use shopcart_client::StoreApi;
use shopcart_client::api::{Product, ProductQuery, SortOrder};
use shopcart_core::{Price, ProductId};

use super::CommandError;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products, optionally filtered
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Filter by brand
        #[arg(long)]
        brand: Option<String>,

        /// Minimum price
        #[arg(long)]
        min_price: Option<Price>,

        /// Maximum price
        #[arg(long)]
        max_price: Option<Price>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,

        /// Sort field (e.g. price, name, createdAt)
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending
        #[arg(long)]
        descending: bool,

        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Results per page
        #[arg(long, default_value_t = 12)]
        limit: u32,
    },
    /// Show one product in detail
    Show {
        /// Product id
        id: String,
    },
    /// List available categories
    Categories,
    /// List available brands
    Brands,
}

pub async fn health(api: &impl StoreApi) -> Result<(), CommandError> {
    let status = api.health().await?;
    println!("API status: {}", status.status);
    if let Some(message) = status.message {
        println!("  {message}");
    }
    Ok(())
}

pub async fn dispatch(api: &impl StoreApi, action: ProductsAction) -> Result<(), CommandError> {
    match action {
        ProductsAction::List {
            category,
            brand,
            min_price,
            max_price,
            search,
            sort,
            descending,
            page,
            limit,
        } => {
            let query = ProductQuery {
                category,
                brand,
                min_price,
                max_price,
                search,
                sort,
                order: Some(if descending {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                }),
                page: Some(page),
                limit: Some(limit),
            };
            list(api, &query).await
        }
        ProductsAction::Show { id } => show(api, &ProductId::new(id)).await,
        ProductsAction::Categories => {
            for category in api.categories().await? {
                println!("{category}");
            }
            Ok(())
        }
        ProductsAction::Brands => {
            for brand in api.brands().await? {
                println!("{brand}");
            }
            Ok(())
        }
    }
}

async fn list(api: &impl StoreApi, query: &ProductQuery) -> Result<(), CommandError> {
    let page = api.products(query).await?;

    if page.products.is_empty() {
        println!("No products found");
        return Ok(());
    }

    for product in &page.products {
        println!(
            "{:<26} {:>10}  {:<24} {}",
            product.id,
            product.price.to_string(),
            product.name,
            stock_label(product)
        );
    }

    if let Some(pagination) = &page.pagination {
        println!(
            "\nPage {} of {} ({} products)",
            pagination.page, pagination.pages, pagination.total
        );
    }
    Ok(())
}

async fn show(api: &impl StoreApi, id: &ProductId) -> Result<(), CommandError> {
    let product = api.product(id).await?;

    println!("{}", product.name);
    println!("  id:       {}", product.id);
    println!("  price:    {}", product.price);
    println!("  brand:    {}", product.brand);
    if let Some(category) = &product.category {
        println!("  category: {category}");
    }
    if let Some(rating) = &product.rating {
        println!("  rating:   {:.1} ({} reviews)", rating.average, rating.count);
    }
    println!("  stock:    {}", stock_label(&product));
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }
    Ok(())
}

fn stock_label(product: &Product) -> String {
    if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    }
}
