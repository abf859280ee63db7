//! ContentDirectory façade and paged browse views.
//!
//! This crate binds the control and eventing planes together for the
//! ContentDirectory service: synchronous `Browse` calls through the SOAP
//! client, a [`ContentProperty`] snapshot fed by `upnp:propchange`
//! notifications, and two consumer-facing listing abstractions:
//!
//! - [`ContentList`]: lazy, forward-growing list with back-navigation,
//!   fetching `bulk_size` items at a time.
//! - [`ContentBrowser`]: random-access window of the listing, reusing
//!   cached items when a requested range overlaps the current window.
//!
//! Both are parameterized by a [`ContentSearch`] mapping a search
//! category to its object-id root (`A:ARTIST`, `Q:0`, ...).
//!
//! # Example
//!
//! ```no_run
//! use content_directory::{ContentDirectory, ContentList, ContentSearch, SearchCategory};
//! use soap_client::SoapClient;
//!
//! let directory = ContentDirectory::new(SoapClient::new(), "192.168.1.100", 1400);
//! let search = ContentSearch::new(SearchCategory::Artist);
//! let mut artists = ContentList::new(&directory, &search, 0);
//! let mut cursor = artists.cursor();
//! while let Some(artist) = artists.next(&mut cursor) {
//!     println!("{}", artist.title().unwrap_or("?"));
//! }
//! ```

mod browser;
mod error;
mod list;
mod search;
mod service;

pub use browser::ContentBrowser;
pub use error::{ContentError, Result};
pub use list::{ContentCursor, ContentList};
pub use search::{ContentSearch, SearchCategory};
pub use service::{
    Browse, ContentDirectory, ContentProperty, BROWSE_COUNT, CONTROL_PATH, EVENT_PATH, SCPD_PATH,
    SERVICE_NAME, SERVICE_TYPE,
};
