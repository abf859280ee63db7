//! Search categories and their content-tree roots.

/// What part of the device's content tree to browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchCategory {
    Artist,
    Album,
    Genre,
    Track,
    Radio,
    Queue,
}

/// A browse root: a search category plus an optional query suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSearch {
    category: SearchCategory,
    query: String,
}

impl ContentSearch {
    pub fn new(category: SearchCategory) -> Self {
        Self {
            category,
            query: String::new(),
        }
    }

    pub fn with_query(category: SearchCategory, query: impl Into<String>) -> Self {
        Self {
            category,
            query: query.into(),
        }
    }

    pub fn category(&self) -> SearchCategory {
        self.category
    }

    /// Object id addressing the root of this search.
    pub fn root(&self) -> String {
        let mut object_id = String::from(match self.category {
            SearchCategory::Artist => "A:ARTIST",
            SearchCategory::Album => "A:ALBUM",
            SearchCategory::Genre => "A:GENRE",
            SearchCategory::Track => "A:TRACKS",
            SearchCategory::Radio => "R:0",
            SearchCategory::Queue => "Q:0",
        });
        if !self.query.is_empty() {
            object_id.push(':');
            object_id.push_str(&self.query);
        }
        object_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_roots() {
        assert_eq!(ContentSearch::new(SearchCategory::Artist).root(), "A:ARTIST");
        assert_eq!(ContentSearch::new(SearchCategory::Album).root(), "A:ALBUM");
        assert_eq!(ContentSearch::new(SearchCategory::Genre).root(), "A:GENRE");
        assert_eq!(ContentSearch::new(SearchCategory::Track).root(), "A:TRACKS");
        assert_eq!(ContentSearch::new(SearchCategory::Radio).root(), "R:0");
        assert_eq!(ContentSearch::new(SearchCategory::Queue).root(), "Q:0");
    }

    #[test]
    fn query_is_appended() {
        assert_eq!(
            ContentSearch::with_query(SearchCategory::Artist, "Coltrane").root(),
            "A:ARTIST:Coltrane"
        );
        assert_eq!(
            ContentSearch::with_query(SearchCategory::Genre, "Jazz").root(),
            "A:GENRE:Jazz"
        );
    }
}
