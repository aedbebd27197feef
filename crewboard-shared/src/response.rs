//! Response envelopes shared by every endpoint.
//!
//! Successful responses are wrapped as `{ "result": "OK", "data": ... }`, paged
//! listings add the page totals and sliced listings add `has_next`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const RESULT_OK: &str = "OK";

fn result_ok() -> String {
    RESULT_OK.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CommonApiResponse<T> {
    pub result: String,
    pub data: T,
}

impl<T> CommonApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            result: result_ok(),
            data,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PageApiResponse<T> {
    pub result: String,
    pub data: Vec<T>,
    pub total_pages: u64,
    pub total_elements: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SliceApiResponse<T> {
    pub result: String,
    pub data: Vec<T>,
    pub has_next: bool,
}

/// One page of a listing along with the totals for the whole result set.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
    pub total_elements: u64,
}

impl<T> From<Page<T>> for PageApiResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            result: result_ok(),
            data: page.items,
            total_pages: page.total_pages,
            total_elements: page.total_elements,
        }
    }
}

/// A window over a listing that only knows whether more items follow.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from a query that fetched one item more than `size`.
    pub fn from_overfetch(mut items: Vec<T>, size: usize) -> Self {
        let has_next = items.len() > size;
        items.truncate(size);
        Self { items, has_next }
    }
}

impl<T> From<Slice<T>> for SliceApiResponse<T> {
    fn from(slice: Slice<T>) -> Self {
        Self {
            result: result_ok(),
            data: slice.items,
            has_next: slice.has_next,
        }
    }
}
