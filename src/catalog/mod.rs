/// Catalog entities: genres, stars, movies and reviews
pub mod genres;
pub mod movies;
pub mod reviews;
pub mod stars;

pub use genres::{Genre, GenreManager, GenreRelation};
pub use movies::{Movie, MovieDetails, MovieRepository, MovieService};
pub use reviews::{Review, ReviewManager};
pub use stars::{CastRelation, MovieCredit, Star, StarManager};

use crate::{
    config::PaginationConfig,
    error::{CatalogError, CatalogResult},
};
use serde::Serialize;

/// Resolved pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Apply defaults and clamp `size` to the configured maximum
    pub fn resolve(
        page: Option<u32>,
        size: Option<u32>,
        config: &PaginationConfig,
    ) -> CatalogResult<Self> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(CatalogError::Validation("page must be at least 1".to_string()));
        }

        let size = size.unwrap_or(config.default_size);
        if size == 0 {
            return Err(CatalogError::Validation("size must be at least 1".to_string()));
        }

        Ok(Self {
            page,
            size: size.min(config.max_size),
        })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.size)
    }
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub size: u32,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, items: Vec<T>) -> Self {
        Self {
            page: request.page,
            size: request.size,
            total,
            items,
        }
    }
}
