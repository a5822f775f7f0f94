//! Catalog browsing.

use clap::{Args, Subcommand};
use heirloom_core::{CategoryId, CurrencyCode, ProductId, TribeId};
use heirloom_storefront::api::ProductPage;
use heirloom_storefront::api::products::{DEFAULT_LIMIT, DEFAULT_PAGE, PageRequest};
use heirloom_storefront::catalog::{FilterKind, FilterOptions, ProductFilter};
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

use crate::output;

#[derive(Args)]
pub struct Paging {
    /// Page number (1-based)
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,

    /// Products per page
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
}

impl Paging {
    const fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// In-memory filters applied to the fetched page.
#[derive(Args)]
pub struct Filters {
    /// Only products from this tribe
    #[arg(long)]
    tribe: Option<String>,

    /// Only products from this region
    #[arg(long)]
    region: Option<String>,

    /// Only products in this category
    #[arg(long)]
    category: Option<String>,

    /// Case-insensitive match on name, tribe or description
    #[arg(long, short)]
    query: Option<String>,

    /// Print the available filter values instead of products
    #[arg(long)]
    options: bool,
}

impl Filters {
    fn build(&self) -> ProductFilter {
        let mut filter = ProductFilter::new();
        for (kind, value) in [
            (FilterKind::Tribe, &self.tribe),
            (FilterKind::Region, &self.region),
            (FilterKind::Category, &self.category),
        ] {
            if let Some(value) = value {
                filter.toggle(kind, value);
            }
        }
        if let Some(query) = &self.query {
            filter.set_query(query.as_str());
        }
        filter
    }
}

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products
    List {
        #[command(flatten)]
        paging: Paging,
        #[command(flatten)]
        filters: Filters,
    },
    /// List featured products
    Featured {
        #[command(flatten)]
        paging: Paging,
    },
    /// Search products on the server
    Search {
        /// Search text
        query: String,
        #[command(flatten)]
        paging: Paging,
    },
    /// List products in a category
    Category {
        /// Category id
        id: String,
        #[command(flatten)]
        paging: Paging,
    },
    /// List products from a tribe
    Tribe {
        /// Tribe id
        id: String,
        #[command(flatten)]
        paging: Paging,
    },
    /// Show one product by id
    Get {
        /// Product id
        id: String,
    },
    /// Show one product by slug
    Slug {
        /// Product slug
        slug: String,
    },
}

pub async fn run(action: ProductsAction, state: &Storefront) -> Result<(), AppError> {
    let client = state.client();
    let currency = state.config().pricing.currency;

    let (page, filters) = match action {
        ProductsAction::List { paging, filters } => {
            (client.get_products(paging.request()).await?, Some(filters))
        }
        ProductsAction::Featured { paging } => {
            (client.featured_products(paging.request()).await?, None)
        }
        ProductsAction::Search { query, paging } => {
            (client.search_products(&query, paging.request()).await?, None)
        }
        ProductsAction::Category { id, paging } => (
            client
                .products_by_category(&CategoryId::new(id), paging.request())
                .await?,
            None,
        ),
        ProductsAction::Tribe { id, paging } => (
            client
                .products_by_tribe(&TribeId::new(id), paging.request())
                .await?,
            None,
        ),
        ProductsAction::Get { id } => {
            let product = client.get_product(&ProductId::new(id)).await?;
            output::product(&product, currency);
            return Ok(());
        }
        ProductsAction::Slug { slug } => {
            let product = client.get_product_by_slug(&slug).await?;
            output::product(&product, currency);
            return Ok(());
        }
    };

    show_page(&page, filters.as_ref(), currency);
    Ok(())
}

fn show_page(page: &ProductPage, filters: Option<&Filters>, currency: CurrencyCode) {
    let Some(filters) = filters else {
        let all: Vec<_> = page.products.iter().collect();
        output::products(&all, page.pagination.as_ref(), currency);
        return;
    };

    if filters.options {
        let options = FilterOptions::from_products(&page.products);
        output::line(&format!("Tribes:     {}", options.tribes.join(", ")));
        output::line(&format!("Regions:    {}", options.regions.join(", ")));
        output::line(&format!("Categories: {}", options.categories.join(", ")));
        return;
    }

    let filter = filters.build();
    let matching = filter.apply(&page.products);
    // Pagination describes the server page, not the filtered subset
    let pagination = if filter.is_active() {
        None
    } else {
        page.pagination.as_ref()
    };
    output::products(&matching, pagination, currency);
}
