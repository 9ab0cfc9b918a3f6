//! In-process pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Page selection query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    50
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

/// Slice a full result set down to the requested page.
pub fn paginate<T>(items: Vec<T>, params: &PageParams) -> Page<T> {
    let total = items.len();
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 100);

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total,
    }
}
