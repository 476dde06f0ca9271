// ABOUTME: Page-number pagination for list endpoints
// ABOUTME: Parses page/limit query values and builds count/next/previous/results envelopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::pagination::{LIMIT_PARAM, PAGE_PARAM};
use crate::errors::{AppError, AppResult, ErrorCode};

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub limit: u32,
}

impl PageRequest {
    /// Parse raw `page` and `limit` query values
    ///
    /// `limit` falls back to `default_size` and is capped at `max_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is not a positive integer
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_size: u32,
        max_size: u32,
    ) -> AppResult<Self> {
        let page = parse_positive(PAGE_PARAM, page)?.unwrap_or(1);
        let limit = parse_positive(LIMIT_PARAM, limit)?
            .unwrap_or(default_size)
            .min(max_size.max(1));
        Ok(Self { page, limit })
    }

    /// Rows to skip
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// Rows to fetch
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Number of pages for `count` items; an empty collection still has one page
    #[must_use]
    pub fn total_pages(&self, count: i64) -> i64 {
        let limit = i64::from(self.limit);
        ((count + limit - 1) / limit).max(1)
    }

    /// Reject pages past the end of the collection
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the page does not exist
    pub fn ensure_exists(&self, count: i64) -> AppResult<()> {
        if i64::from(self.page) > self.total_pages(count) {
            return Err(AppError::new(
                ErrorCode::ResourceNotFound,
                "Invalid page.",
            ));
        }
        Ok(())
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> AppResult<Option<u32>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(value) if value >= 1 => Ok(Some(value)),
        _ => Err(AppError::invalid_field(
            name,
            format!("`{name}` must be a positive integer."),
        )),
    }
}

/// Paginated response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across all pages
    pub count: i64,
    /// Absolute URL of the next page
    pub next: Option<String>,
    /// Absolute URL of the previous page
    pub previous: Option<String>,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page, deriving `next`/`previous` links from the request URL
    #[must_use]
    pub fn new(results: Vec<T>, count: i64, request: PageRequest, request_url: &Url) -> Self {
        let current = i64::from(request.page);
        let next = (current < request.total_pages(count))
            .then(|| page_link(request_url, Some(request.page + 1)));
        let previous = match request.page {
            1 => None,
            // The first page is addressed without a page parameter
            2 => Some(page_link(request_url, None)),
            n => Some(page_link(request_url, Some(n - 1))),
        };
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Rewrite the `page` parameter of a URL, keeping every other parameter
fn page_link(base: &Url, page: Option<u32>) -> String {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    if !kept.is_empty() || page.is_some() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if let Some(page) = page {
            pairs.append_pair(PAGE_PARAM, &page.to_string());
        }
    }
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_defaults_and_cap() {
        let request = PageRequest::parse(None, None, 6, 100).unwrap();
        assert_eq!(request, PageRequest { page: 1, limit: 6 });

        let capped = PageRequest::parse(Some("3"), Some("500"), 6, 100).unwrap();
        assert_eq!(capped, PageRequest { page: 3, limit: 100 });
        assert_eq!(capped.offset(), 200);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PageRequest::parse(Some("0"), None, 6, 100).is_err());
        assert!(PageRequest::parse(None, Some("abc"), 6, 100).is_err());
        assert!(PageRequest::parse(Some("-1"), None, 6, 100).is_err());
    }

    #[test]
    fn test_links_keep_filters() {
        let request = PageRequest { page: 2, limit: 2 };
        let page = Page::new(
            vec![3, 4],
            5,
            request,
            &url("http://testserver/api/recipes/?tags=lunch&page=2&limit=2"),
        );

        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/api/recipes/?tags=lunch&limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://testserver/api/recipes/?tags=lunch&limit=2")
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let request = PageRequest { page: 1, limit: 6 };
        let page = Page::new(vec![1], 1, request, &url("http://testserver/api/users/"));
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
        assert_eq!(page.count, 1);
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let request = PageRequest { page: 2, limit: 6 };
        assert!(request.ensure_exists(0).is_err());
        assert!(request.ensure_exists(7).is_ok());
        assert!(PageRequest { page: 1, limit: 6 }.ensure_exists(0).is_ok());
    }
}
