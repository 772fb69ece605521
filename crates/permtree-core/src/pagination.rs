//! Paginated list results and navigation links.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::{Action, Resource, ResourceServer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRel {
    First,
    Prev,
    Next,
    Last,
}

/// A navigation link to another page of the same listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: LinkRel,
}

/// Wire name of the array holding a page's items.
pub trait Listed {
    const LIST_FIELD: &'static str;
}

impl Listed for ResourceServer {
    const LIST_FIELD: &'static str = "resourceServers";
}

impl Listed for Resource {
    const LIST_FIELD: &'static str = "resources";
}

impl Listed for Action {
    const LIST_FIELD: &'static str = "actions";
}

/// One page of a listing.
///
/// Serializes with camelCase keys; the items array is named after the
/// listed entity (see [`Listed`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T> {
    /// Number of items across all pages.
    pub total_results: u64,
    /// 1-based position of the first item on this page.
    pub start_index: u64,
    /// Number of items on this page.
    pub count: u64,
    pub items: Vec<T>,
    pub links: Vec<Link>,
}

impl<T> ListPage<T> {
    pub fn new(base: &str, items: Vec<T>, total: u64, limit: u64, offset: u64) -> Self {
        Self {
            total_results: total,
            start_index: offset + 1,
            count: items.len() as u64,
            items,
            links: build_pagination_links(base, limit, offset, total),
        }
    }
}

impl<T: Serialize + Listed> Serialize for ListPage<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut page = serializer.serialize_struct("ListPage", 5)?;
        page.serialize_field("totalResults", &self.total_results)?;
        page.serialize_field("startIndex", &self.start_index)?;
        page.serialize_field("count", &self.count)?;
        page.serialize_field(T::LIST_FIELD, &self.items)?;
        page.serialize_field("links", &self.links)?;
        page.end()
    }
}

pub type ResourceServerList = ListPage<ResourceServer>;
pub type ResourceList = ListPage<Resource>;
pub type ActionList = ListPage<Action>;

fn link(base: &str, offset: u64, limit: u64, rel: LinkRel) -> Link {
    Link {
        href: format!("{base}?offset={offset}&limit={limit}"),
        rel,
    }
}

/// Builds `first`/`prev`/`next`/`last` links for a page.
///
/// `first` and `prev` appear when `offset > 0`, `next` when more items
/// follow this page, `last` when this page starts before the last page.
/// A result set that fits on one page gets no links.
pub fn build_pagination_links(base: &str, limit: u64, offset: u64, total: u64) -> Vec<Link> {
    let mut links = Vec::new();
    if limit == 0 {
        return links;
    }

    if offset > 0 {
        links.push(link(base, 0, limit, LinkRel::First));
        links.push(link(base, offset.saturating_sub(limit), limit, LinkRel::Prev));
    }

    if offset + limit < total {
        links.push(link(base, offset + limit, limit, LinkRel::Next));
    }

    let last_page_offset = (total.saturating_sub(1) / limit) * limit;
    if offset < last_page_offset {
        links.push(link(base, last_page_offset, limit, LinkRel::Last));
    }

    links
}
