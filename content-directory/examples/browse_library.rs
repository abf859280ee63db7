//! Browse a device's artist index from the command line.
//!
//! Usage: `cargo run --example browse_library -- 192.168.1.100`

use content_directory::{ContentDirectory, ContentList, ContentSearch, SearchCategory};
use soap_client::SoapClient;

fn main() {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.1.100".to_string());

    let directory = ContentDirectory::new(SoapClient::new(), host, 1400);
    let search = ContentSearch::new(SearchCategory::Artist);
    let mut artists = ContentList::new(&directory, &search, 20);
    if !artists.is_valid() {
        eprintln!("browse failed");
        return;
    }

    println!("{} artists:", artists.total_count());
    let mut cursor = artists.cursor();
    while let Some(artist) = artists.next(&mut cursor) {
        println!("  {}", artist.title().unwrap_or("<untitled>"));
    }
}
