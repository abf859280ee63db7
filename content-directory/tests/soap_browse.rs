//! End-to-end Browse tests: the real SOAP client against a mock device
//! control endpoint.

use std::sync::{Arc, Mutex};

use content_directory::{ContentDirectory, ContentList, ContentSearch, SearchCategory};
use didl_parser::{DigitalItem, ItemKind};
use soap_client::{Element, ElementList, SoapClient};
use warp::http::{Response, StatusCode};
use warp::hyper::body::Bytes;
use warp::Filter;

const PAGE_SIZE: u32 = 3;
const TOTAL: u32 = 5;

fn catalog() -> Vec<DigitalItem> {
    (0..TOTAL)
        .map(|i| {
            let properties: ElementList =
                [Element::new("dc:title", format!("Artist {i}"))].into_iter().collect();
            DigitalItem::new(
                format!("A:ARTIST/{i}"),
                "A:ARTIST",
                true,
                ItemKind::Container,
                properties,
            )
        })
        .collect()
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn browse_response(starting_index: u32) -> String {
    let items = catalog();
    let start = starting_index.min(TOTAL) as usize;
    let end = (starting_index + PAGE_SIZE).min(TOTAL) as usize;
    let page = &items[start..end];
    let didl = didl_parser::to_didl(page);
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Result>{}</Result><NumberReturned>{}</NumberReturned><TotalMatches>{TOTAL}</TotalMatches><UpdateID>1</UpdateID></u:BrowseResponse></s:Body></s:Envelope>"#,
        escape(&didl),
        page.len(),
    )
}

const FAULT_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode><errorDescription>No such object</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

fn extract_tag(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].to_string())
}

/// Mock ContentDirectory control endpoint. Serves the catalog in pages of
/// [`PAGE_SIZE`]; faults for object ids outside the catalog.
fn start_mock_device() -> (u16, Arc<Mutex<Vec<u32>>>) {
    let calls: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let route_calls = calls.clone();

    let routes = warp::post()
        .and(warp::body::bytes())
        .map(move |body: Bytes| {
            let body = String::from_utf8_lossy(&body).into_owned();
            let object_id = extract_tag(&body, "ObjectID").unwrap_or_default();
            let starting_index: u32 = extract_tag(&body, "StartingIndex")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            route_calls.lock().unwrap().push(starting_index);

            let (status, payload) = if object_id.starts_with("A:ARTIST") {
                (StatusCode::OK, browse_response(starting_index))
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, FAULT_RESPONSE.to_string())
            };
            let mut response = Response::new(payload.into_bytes());
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert("Content-Type", "text/xml; charset=\"utf-8\"".parse().unwrap());
            response
        });

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr.port(), calls)
}

#[tokio::test(flavor = "multi_thread")]
async fn browse_round_trip_decodes_the_listing() {
    let (port, _calls) = start_mock_device();

    tokio::task::spawn_blocking(move || {
        let directory = ContentDirectory::new(SoapClient::new(), "127.0.0.1", port);
        let vars = directory.browse("A:ARTIST", 0, PAGE_SIZE).expect("round trip");

        assert!(vars.is_response("Browse"));
        assert_eq!(vars.value_of("TotalMatches"), Some("5"));
        assert_eq!(vars.value_of("NumberReturned"), Some("3"));

        let items = didl_parser::parse(vars.value_of("Result").unwrap()).expect("didl");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title(), Some("Artist 0"));
        assert!(items[0].restricted);
    })
    .await
    .expect("blocking task");
}

#[tokio::test(flavor = "multi_thread")]
async fn content_list_pages_over_the_wire() {
    let (port, calls) = start_mock_device();

    let seen = tokio::task::spawn_blocking(move || {
        let directory = ContentDirectory::new(SoapClient::new(), "127.0.0.1", port);
        let search = ContentSearch::new(SearchCategory::Artist);
        let mut list = ContentList::new(&directory, &search, PAGE_SIZE);
        assert!(list.is_valid());
        assert_eq!(list.total_count(), TOTAL);

        let mut cursor = list.cursor();
        let mut seen = Vec::new();
        while let Some(item) = list.next(&mut cursor) {
            seen.push(item.title().unwrap_or("?").to_string());
        }
        seen
    })
    .await
    .expect("blocking task");

    assert_eq!(
        seen,
        vec!["Artist 0", "Artist 1", "Artist 2", "Artist 3", "Artist 4"]
    );
    // two pages: StartingIndex 0 and 3
    assert_eq!(calls.lock().unwrap().clone(), vec![0, 3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn fault_surfaces_as_fault_element_list() {
    let (port, _calls) = start_mock_device();

    tokio::task::spawn_blocking(move || {
        let directory = ContentDirectory::new(SoapClient::new(), "127.0.0.1", port);

        let vars = directory.browse("A:BAD", 0, PAGE_SIZE).expect("fault decodes");
        assert!(vars.is_fault());
        assert_eq!(vars.error_code(), Some(701));

        let mut list = ContentList::with_object_id(&directory, "A:BAD", PAGE_SIZE);
        assert!(!list.is_valid());
        assert_eq!(list.total_count(), 0);
        assert!(list.is_empty());
        let mut cursor = list.cursor();
        assert!(list.next(&mut cursor).is_none());
    })
    .await
    .expect("blocking task");
}
