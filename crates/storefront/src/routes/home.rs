//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::state::AppState;
use crate::views::{Layout, ProductCard};

/// How many products the home page features.
const FEATURED_COUNT: usize = 8;

/// A category tile linking into the filtered product grid.
#[derive(Clone)]
pub struct CategoryTile {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub key: &'static str,
}

const TILES: [CategoryTile; 3] = [
    CategoryTile {
        title: "Men",
        subtitle: "Training gear built to move",
        key: "men",
    },
    CategoryTile {
        title: "Women",
        subtitle: "Performance fits for every session",
        key: "women",
    },
    CategoryTile {
        title: "Footwear",
        subtitle: "Grip, cushion and support",
        key: "footwear",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub tiles: &'static [CategoryTile],
    pub products: Vec<ProductCard>,
    pub error: Option<String>,
}

/// Display the home page.
#[instrument(skip(state, layout))]
pub async fn home(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let storage_url = &state.config().storage_url;

    let (products, error) = match state.api().list_products().await {
        Ok(products) => (
            products
                .iter()
                .take(FEATURED_COUNT)
                .map(|product| ProductCard::new(product, storage_url))
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::warn!("Failed to load featured products: {e}");
            (Vec::new(), Some(e.message_or("Failed to load products")))
        }
    };

    HomeTemplate {
        layout,
        tiles: &TILES,
        products,
        error,
    }
}
