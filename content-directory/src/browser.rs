//! Random-access windowed content view.

use didl_parser::DigitalItem;

use crate::search::ContentSearch;
use crate::service::{browse_page, Browse};

/// Windowed view over a container: holds exactly the items of
/// `[starting_index, starting_index + window_len)`.
///
/// [`ContentBrowser::browse`] re-positions the window, reusing cached
/// items when the requested range overlaps the current one: growth at the
/// same index fetches only the missing suffix, and a strict sub-range is
/// served without any fetch. Everything else drops the window and fetches
/// fresh — including a request starting exactly one past the window end.
pub struct ContentBrowser<'s, B: Browse + ?Sized> {
    service: &'s B,
    root: String,
    total_count: u32,
    starting_index: u32,
    window: Vec<DigitalItem>,
}

impl<'s, B: Browse + ?Sized> ContentBrowser<'s, B> {
    /// Open a window of `count` items at the root of `search`.
    pub fn new(service: &'s B, search: &ContentSearch, count: u32) -> Self {
        Self::with_object_id(service, search.root(), count)
    }

    /// Open a window of `count` items under an explicit object id.
    pub fn with_object_id(service: &'s B, object_id: impl Into<String>, count: u32) -> Self {
        let mut browser = Self {
            service,
            root: object_id.into(),
            total_count: 0,
            starting_index: 0,
            window: Vec::new(),
        };
        browser.fetch_append(0, count);
        browser
    }

    /// Server-reported total for the browsed root.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Index of the first item in the window.
    pub fn starting_index(&self) -> u32 {
        self.starting_index
    }

    /// The items currently in the window.
    pub fn window(&self) -> &[DigitalItem] {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Move the window to `[index, index + count)`, clamped to the total.
    ///
    /// Returns false (with an emptied window) when `index` is past the
    /// end, and false without state changes when a required fetch fails.
    pub fn browse(&mut self, index: u32, mut count: u32) -> bool {
        if index >= self.total_count {
            self.window.clear();
            self.starting_index = self.total_count;
            return false;
        }

        let size = self.window.len() as u32;
        if self.total_count < index + count {
            count = self.total_count - index;
        }

        if index == self.starting_index {
            if count == size {
                return true;
            }
            if count < size {
                self.window.truncate(count as usize);
                return true;
            }
            // grow in place: fetch only the missing suffix
            return self.fetch_append(self.starting_index + size, count - size);
        }

        if index > self.starting_index && index + count <= self.starting_index + size {
            // strict sub-range of the cached window
            let offset = (index - self.starting_index) as usize;
            self.window = self.window[offset..offset + count as usize].to_vec();
            self.starting_index = index;
            return true;
        }

        self.window.clear();
        self.starting_index = index;
        self.fetch_append(index, count)
    }

    /// Fetch `[index, index + count)` and append to the window. The total
    /// is only updated on success.
    fn fetch_append(&mut self, index: u32, count: u32) -> bool {
        match browse_page(self.service, &self.root, index, count) {
            Some(page) => {
                if let Some(total) = page.total {
                    self.total_count = total;
                }
                self.window.extend(page.items);
                true
            }
            None => false,
        }
    }
}
