//! End-to-end tests for the filtered, paged listing flow:
//! compile → count → fetch page → project. The store is a stub that
//! replays canned rows and records the queries it was given.

use std::sync::Mutex;

use async_trait::async_trait;
use dashgraph::{
    Error, FilterCompiler, FilterSpec, GraphStore, GraphValue, PageSpec, Projector,
    PropertyMap, Row, fetch_listing,
};

/// Replays one canned result per `execute` call, in order.
struct StubStore {
    responses: Mutex<Vec<Vec<Row>>>,
    queries: Mutex<Vec<String>>,
}

impl StubStore {
    fn new(responses: Vec<Vec<Row>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for StubStore {
    async fn execute(&self, query: &str, _params: PropertyMap) -> dashgraph::Result<Vec<Row>> {
        self.queries.lock().unwrap().push(query.to_owned());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::Store("no canned response left".into()));
        }
        Ok(responses.remove(0))
    }
}

fn count_row(total: i64) -> Row {
    let mut values = PropertyMap::new();
    values.insert("total".into(), GraphValue::Int(total));
    Row::new(values)
}

fn item_row(nome: &str, dt_criacao: i64, tags: Vec<&str>) -> Row {
    let item = GraphValue::map_from([
        ("nome", GraphValue::from(nome)),
        ("dtCriacao", GraphValue::Int(dt_criacao)),
        ("tags", GraphValue::from(tags)),
    ]);
    let mut values = PropertyMap::new();
    values.insert("item".into(), item);
    Row::new(values)
}

// ============================================================================
// 1. Full flow: count + page, projected rows, envelope math
// ============================================================================

#[tokio::test]
async fn test_paged_listing_flow() {
    let store = StubStore::new(vec![
        vec![count_row(23)],
        vec![
            item_row("Ana", 0, vec!["vip"]),
            item_row("Bia", 86_400_000, vec![]),
        ],
    ]);
    let spec = FilterSpec {
        page: Some(PageSpec { page: 2, limit: 10 }),
        ..Default::default()
    };

    let page = fetch_listing(
        &store,
        &FilterCompiler::default(),
        &Projector::default(),
        &spec,
        "dtUltimaAtualizacao",
    )
    .await
    .unwrap();

    assert_eq!(page.page, 2);
    assert_eq!(page.limit, 10);
    assert_eq!(page.total_items, 23);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.data.len(), 2);

    // Rows are projected: timestamps normalized, lists portable.
    assert_eq!(page.data[0]["nome"], "Ana");
    assert_eq!(page.data[0]["dtCriacao"], "1970-01-01T00:00:00.000Z");
    assert_eq!(page.data[0]["tags"], serde_json::json!(["vip"]));
    assert_eq!(page.data[1]["dtCriacao"], "1970-01-02T00:00:00.000Z");
}

// ============================================================================
// 2. The issued queries have the corrected listing shape
// ============================================================================

#[tokio::test]
async fn test_issued_queries() {
    let store = StubStore::new(vec![vec![count_row(0)], vec![]]);
    let spec = FilterSpec {
        tag_name: Some("vip".into()),
        page: Some(PageSpec { page: 1, limit: 10 }),
        ..Default::default()
    };

    fetch_listing(
        &store,
        &FilterCompiler::default(),
        &Projector::default(),
        &spec,
        "dtUltimaAtualizacao",
    )
    .await
    .unwrap();

    let queries = store.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].contains("RETURN count(DISTINCT n) AS total"));

    let listing = &queries[1];
    let regroup = listing.find("WITH DISTINCT n").unwrap();
    let order = listing.find("ORDER BY").unwrap();
    let skip = listing.find("SKIP $skip LIMIT $limit").unwrap();
    assert!(regroup < order && order < skip);
}

// ============================================================================
// 3. Store errors propagate untouched
// ============================================================================

#[tokio::test]
async fn test_store_error_passes_through() {
    let store = StubStore::new(vec![]);
    let result = fetch_listing(
        &store,
        &FilterCompiler::default(),
        &Projector::default(),
        &FilterSpec::default(),
        "dtCriacao",
    )
    .await;

    assert!(matches!(result, Err(Error::Store(_))));
}

// ============================================================================
// 4. Invalid specs never reach the store
// ============================================================================

#[tokio::test]
async fn test_invalid_filter_short_circuits() {
    let store = StubStore::new(vec![vec![count_row(0)], vec![]]);
    let spec = FilterSpec {
        page: Some(PageSpec { page: 0, limit: 10 }),
        ..Default::default()
    };

    let result = fetch_listing(
        &store,
        &FilterCompiler::default(),
        &Projector::default(),
        &spec,
        "dtCriacao",
    )
    .await;

    assert!(matches!(result, Err(Error::InvalidFilter { .. })));
    assert!(store.queries().is_empty());
}

// ============================================================================
// 5. Empty result set still yields a well-formed envelope
// ============================================================================

#[tokio::test]
async fn test_empty_result_envelope() {
    let store = StubStore::new(vec![vec![count_row(0)], vec![]]);
    let page = fetch_listing(
        &store,
        &FilterCompiler::default(),
        &Projector::default(),
        &FilterSpec::default(),
        "dtCriacao",
    )
    .await
    .unwrap();

    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.data.is_empty());
}
