//! Category browsing.

use clap::Subcommand;
use heirloom_core::CategoryId;
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

use crate::output;

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List all categories
    List,
    /// List featured categories
    Featured,
    /// Show one category by id
    Get {
        /// Category id
        id: String,
    },
    /// Show one category by URL slug
    Slug {
        /// Category slug
        slug: String,
    },
}

pub async fn run(action: CategoriesAction, state: &Storefront) -> Result<(), AppError> {
    let client = state.client();

    match action {
        CategoriesAction::List => output::categories(&client.get_categories().await?),
        CategoriesAction::Featured => output::categories(&client.featured_categories().await?),
        CategoriesAction::Get { id } => {
            output::category(&client.get_category(&CategoryId::new(id)).await?);
        }
        CategoriesAction::Slug { slug } => {
            output::category(&client.get_category_by_slug(&slug).await?);
        }
    }
    Ok(())
}
