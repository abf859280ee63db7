//! Lazy forward-growing content listing.

use didl_parser::DigitalItem;

use crate::search::ContentSearch;
use crate::service::{browse_page, Browse, BROWSE_COUNT};

/// Iteration state over a [`ContentList`].
///
/// A fresh cursor sits before the first item; [`ContentList::next`]
/// advances it and [`ContentList::previous`] steps it back.
#[derive(Debug, Clone, Default)]
pub struct ContentCursor {
    current: Option<usize>,
}

/// Forward-growing view of a container's children.
///
/// The constructor fetches the first page; advancing past the tail
/// fetches the next `bulk_size` items as long as the device reports more.
/// Fetched items stay cached, so back-navigation never re-fetches.
pub struct ContentList<'s, B: Browse + ?Sized> {
    service: &'s B,
    root: String,
    bulk_size: u32,
    total_count: u32,
    browsed_count: u32,
    items: Vec<DigitalItem>,
    valid: bool,
}

impl<'s, B: Browse + ?Sized> ContentList<'s, B> {
    /// Browse the root of `search`, `bulk_size` items per page (clamped
    /// to [`BROWSE_COUNT`]).
    pub fn new(service: &'s B, search: &ContentSearch, bulk_size: u32) -> Self {
        Self::with_object_id(service, search.root(), bulk_size)
    }

    /// Browse the children of an explicit object id.
    pub fn with_object_id(service: &'s B, object_id: impl Into<String>, bulk_size: u32) -> Self {
        let bulk_size = if bulk_size > 0 && bulk_size < BROWSE_COUNT {
            bulk_size
        } else {
            BROWSE_COUNT
        };
        let mut list = Self {
            service,
            root: object_id.into(),
            bulk_size,
            total_count: 0,
            browsed_count: 0,
            items: Vec::new(),
            valid: false,
        };
        list.valid = list.fetch_tail();
        list
    }

    /// Whether the initial fetch succeeded.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Server-reported total for the browsed root.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// How many items have been fetched so far.
    pub fn browsed_count(&self) -> u32 {
        self.browsed_count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A cursor positioned before the first item.
    pub fn cursor(&self) -> ContentCursor {
        ContentCursor::default()
    }

    /// Advance the cursor and return the item it lands on.
    ///
    /// Reaching the cached tail triggers a fetch of the next page when
    /// the device reported more items; otherwise iteration ends.
    pub fn next(&mut self, cursor: &mut ContentCursor) -> Option<&DigitalItem> {
        let target = cursor.current.map_or(0, |current| current + 1);
        if target >= self.items.len() {
            if self.browsed_count >= self.total_count {
                return None;
            }
            if !self.fetch_tail() || target >= self.items.len() {
                return None;
            }
        }
        cursor.current = Some(target);
        Some(&self.items[target])
    }

    /// Step the cursor back one item.
    pub fn previous(&mut self, cursor: &mut ContentCursor) -> Option<&DigitalItem> {
        match cursor.current {
            Some(current) if current > 0 => {
                cursor.current = Some(current - 1);
                Some(&self.items[current - 1])
            }
            _ => None,
        }
    }

    /// The item under the cursor, when it is on one.
    pub fn item(&self, cursor: &ContentCursor) -> Option<&DigitalItem> {
        cursor.current.and_then(|current| self.items.get(current))
    }

    /// Fetch the next `bulk_size` items at the current tail.
    fn fetch_tail(&mut self) -> bool {
        match browse_page(self.service, &self.root, self.browsed_count, self.bulk_size) {
            Some(page) => {
                if let Some(total) = page.total {
                    self.total_count = total;
                }
                self.items.extend(page.items);
                self.browsed_count = self.items.len() as u32;
                true
            }
            None => false,
        }
    }
}
