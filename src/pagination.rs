use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const PAGE_SIZE: i64 = 10;

/// A validated 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(i64);

impl Page {
    pub fn parse(page: Option<i64>) -> Result<Self, ApiError> {
        match page {
            None => Ok(Self(1)),
            Some(n) if n > 0 => Ok(Self(n)),
            Some(_) => Err(ApiError::bad_request(
                "invalid_parameter_error",
                "Invalid value in query parameter page",
            )),
        }
    }

    pub fn number(self) -> i64 {
        self.0
    }

    pub fn limit(self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(self) -> i64 {
        (self.0 - 1).saturating_mul(PAGE_SIZE)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub total_pages: i64,
    pub total_items: i64,
    pub page: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_: String,
    pub first: String,
    pub next: String,
    pub previous: String,
    pub last: String,
}

/// Paginated list body: `{"meta": ..., "data": [...], "links": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponseData<T> {
    pub meta: Meta,
    pub data: Vec<T>,
    pub links: Links,
}

pub fn total_pages(total_items: i64) -> i64 {
    (total_items + PAGE_SIZE - 1) / PAGE_SIZE
}

impl<T> ListResponseData<T> {
    /// `path` is the request path, `params` the query parameters to repeat on every link.
    pub fn new(
        data: Vec<T>,
        total_items: i64,
        page: Page,
        path: &str,
        params: &[(&str, String)],
    ) -> Self {
        let total = total_pages(total_items);
        let n = page.number();
        let url = |p: i64| {
            let mut url = format!("{path}?");
            for (k, v) in params {
                url.push_str(&format!("{k}={v}&"));
            }
            url.push_str(&format!("page={p}"));
            url
        };

        let links = Links {
            self_: url(n),
            first: url(1),
            next: if n < total { url(n + 1) } else { String::new() },
            previous: if n > 1 { url((n - 1).min(total.max(1))) } else { String::new() },
            last: url(total.max(1)),
        };

        Self {
            meta: Meta {
                total_pages: total,
                total_items,
                page: n,
            },
            data,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_validates() {
        assert_eq!(Page::parse(None).unwrap().number(), 1);
        assert_eq!(Page::parse(Some(3)).unwrap().offset(), 20);
        assert_eq!(Page::parse(Some(1)).unwrap().limit(), PAGE_SIZE);
        assert!(Page::parse(Some(0)).is_err());
        assert!(Page::parse(Some(-1)).is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(25), 3);
    }

    #[test]
    fn links_for_middle_page() {
        let page = Page::parse(Some(2)).unwrap();
        let list: ListResponseData<u8> = ListResponseData::new(
            vec![],
            25,
            page,
            "/v1/searchCars",
            &[("fromDateTime", "10".into()), ("toDateTime", "20".into())],
        );
        assert_eq!(list.meta.total_pages, 3);
        assert_eq!(list.links.self_, "/v1/searchCars?fromDateTime=10&toDateTime=20&page=2");
        assert_eq!(list.links.next, "/v1/searchCars?fromDateTime=10&toDateTime=20&page=3");
        assert_eq!(list.links.previous, "/v1/searchCars?fromDateTime=10&toDateTime=20&page=1");
        assert_eq!(list.links.last, "/v1/searchCars?fromDateTime=10&toDateTime=20&page=3");
    }

    #[test]
    fn links_for_single_page() {
        let list: ListResponseData<u8> =
            ListResponseData::new(vec![1, 2], 2, Page::default(), "/v1/user", &[]);
        assert_eq!(list.links.first, "/v1/user?page=1");
        assert!(list.links.next.is_empty());
        assert!(list.links.previous.is_empty());

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["meta"]["totalPages"], 1);
        assert_eq!(json["meta"]["totalItems"], 2);
        assert_eq!(json["links"]["self"], "/v1/user?page=1");
    }
}
