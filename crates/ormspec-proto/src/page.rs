//! Paging descriptors and paged results.

use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    /// Maximum number of rows per page (at least 1).
    pub size: u32,
}

impl PageRequest {
    /// Create a page request.
    pub fn of(page: u32, size: u32) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::InvalidPage("page size must be at least 1".into()));
        }
        Ok(Self { page, size })
    }

    /// Request the first page with the given size.
    pub fn first(size: u32) -> Result<Self, Error> {
        Self::of(0, size)
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }

    /// The request for the following page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
        }
    }
}

/// One page of a larger result.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct Page<T> {
    /// Rows of this page.
    pub content: Vec<T>,
    /// Number of rows matching the query across all pages.
    pub total_elements: u64,
    /// The request this page answers.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Create a page.
    pub fn new(content: Vec<T>, total_elements: u64, request: PageRequest) -> Self {
        Self {
            content,
            total_elements,
            request,
        }
    }

    /// Total number of pages for the request's page size.
    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(self.request.size as u64)
    }

    /// Check if a following page has rows.
    pub fn has_next(&self) -> bool {
        (self.request.page as u64 + 1) < self.total_pages()
    }

    /// Number of rows on this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if this page has no rows.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Transform the rows while keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            request: self.request,
        }
    }
}
