//! Mock-based search tests using wiremock.
//!
//! Both sources are served by one mock server: Semantic Scholar under
//! `/graph/v1`, CrossRef at the root.

use std::sync::Arc;

use chrono::Datelike;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use literature_ranker::client::ScholarlyClient;
use literature_ranker::config::Config;
use literature_ranker::embedding::{EmbeddingBackend, SharedEmbedder};
use literature_ranker::models::{CandidatePaper, ConfidenceTier};
use literature_ranker::sources::{CrossRefSource, PaperSource, SemanticScholarSource, default_sources};
use literature_ranker::{LiteratureSearch, SearchError};

/// Engine over the mock server plus the model handle it uses.
fn setup_search(mock_server: &MockServer) -> (LiteratureSearch, Arc<SharedEmbedder>) {
    let config = Config::for_testing(&mock_server.uri());
    let client = ScholarlyClient::new(&config).unwrap();
    let embedder = Arc::new(SharedEmbedder::lazy(EmbeddingBackend::Hashing, None));
    let search = LiteratureSearch::new(default_sources(&client, &config), Arc::clone(&embedder));
    (search, embedder)
}

fn s2_paper_json(title: &str, year: i32, citations: u32) -> serde_json::Value {
    json!({
        "paperId": format!("id-{}", title.len()),
        "title": title,
        "abstract": null,
        "authors": [{"authorId": "1", "name": "Test Author"}],
        "year": year,
        "citationCount": citations,
        "venue": "Test Journal",
        "url": "https://www.semanticscholar.org/paper/test"
    })
}

fn s2_results(papers: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "total": papers.len(), "offset": 0, "data": papers })
}

fn crossref_work_json(title: &str, year: i32, citations: u32) -> serde_json::Value {
    json!({
        "DOI": "10.1234/test",
        "title": [title],
        "author": [{"given": "Test", "family": "Author"}],
        "issued": {"date-parts": [[year, 1, 1]]},
        "is-referenced-by-count": citations,
        "container-title": ["Test Journal"],
        "URL": "https://doi.org/10.1234/test"
    })
}

fn crossref_results(items: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "status": "ok", "message": { "total-results": items.len(), "items": items } })
}

async fn mount_s2(mock_server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock_server)
        .await;
}

async fn mount_crossref(mock_server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock_server)
        .await;
}

fn candidate(source: &str, title: &str, year: i32, citations: u32) -> CandidatePaper {
    CandidatePaper {
        source: source.to_string(),
        title: title.to_string(),
        year: Some(year),
        citations,
        ..Default::default()
    }
}

// =============================================================================
// Source Tests
// =============================================================================

#[tokio::test]
async fn test_semantic_scholar_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "bed nets"))
        .and(query_param("limit", "5"))
        .and(query_param("fields", "title,abstract,authors,year,citationCount,url,venue"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(s2_results(vec![s2_paper_json(
            "Bed nets", 2020, 3,
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::for_testing(&mock_server.uri());
    config.semantic_scholar_api_key = Some("secret".to_string());
    let client = ScholarlyClient::new(&config).unwrap();
    let source = SemanticScholarSource::new(client, &config);

    let papers = source.fetch("bed nets", 5).await;
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].source, "Semantic Scholar");
    assert_eq!(papers[0].title, "Bed nets");
    assert_eq!(papers[0].authors, vec!["Test Author"]);
    assert_eq!(papers[0].year, Some(2020));
    assert_eq!(papers[0].citations, 3);
}

#[tokio::test]
async fn test_crossref_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/works"))
        .and(query_param("query", "bed nets"))
        .and(query_param("rows", "4"))
        .and(query_param("mailto", "team@example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(crossref_results(vec![
            crossref_work_json("Nets in villages", 2018, 9),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::for_testing(&mock_server.uri());
    config.crossref_mailto = Some("team@example.org".to_string());
    let client = ScholarlyClient::new(&config).unwrap();
    let source = CrossRefSource::new(client, &config);

    let papers = source.fetch("bed nets", 4).await;
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].source, "CrossRef");
    assert_eq!(papers[0].authors, vec!["Test Author"]);
    assert_eq!(papers[0].year, Some(2018));
    assert_eq!(papers[0].venue.as_deref(), Some("Test Journal"));
}

#[tokio::test]
async fn test_source_truncates_oversized_response() {
    let mock_server = MockServer::start().await;
    mount_s2(
        &mock_server,
        s2_results((0..6).map(|i| s2_paper_json(&format!("paper {i}"), 2020, 1)).collect()),
    )
    .await;

    let config = Config::for_testing(&mock_server.uri());
    let source = SemanticScholarSource::new(ScholarlyClient::new(&config).unwrap(), &config);

    assert_eq!(source.fetch("paper", 2).await.len(), 2);
}

#[tokio::test]
async fn test_source_failures_become_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let client = ScholarlyClient::new(&config).unwrap();

    let s2 = SemanticScholarSource::new(client.clone(), &config);
    assert!(s2.try_fetch("x", 3).await.is_err());
    assert!(s2.fetch("x", 3).await.is_empty());

    let crossref = CrossRefSource::new(client, &config);
    assert!(crossref.fetch("x", 3).await.is_empty());
}

// =============================================================================
// End-to-end Search Tests
// =============================================================================

#[tokio::test]
async fn test_one_source_down() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_crossref(
        &mock_server,
        crossref_results(vec![
            crossref_work_json("Malaria bed nets", 2019, 10),
            crossref_work_json("Malaria drug resistance", 2015, 100),
            crossref_work_json("Rural clinic staffing", 2021, 0),
        ]),
    )
    .await;

    let (search, _) = setup_search(&mock_server);
    let papers = search.search("malaria", 5).await.unwrap();

    assert_eq!(papers.len(), 3);
    assert!(papers.iter().all(|p| p.paper.source == "CrossRef"));
    assert!(papers.iter().all(|p| p.is_scored()));
    assert_eq!(papers.iter().filter(|p| p.is_primary).count(), 1);
}

#[tokio::test]
async fn test_unreachable_source_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_crossref(
        &mock_server,
        crossref_results(vec![
            crossref_work_json("Malaria bed nets", 2019, 10),
            crossref_work_json("Malaria drug resistance", 2015, 100),
            crossref_work_json("Rural clinic staffing", 2021, 0),
        ]),
    )
    .await;

    // Nothing listens on port 1, so Semantic Scholar fails to connect.
    let mut config = Config::for_testing(&mock_server.uri());
    config.semantic_scholar_url = "http://127.0.0.1:1/graph/v1".to_string();
    let client = ScholarlyClient::new(&config).unwrap();
    let embedder = Arc::new(SharedEmbedder::lazy(EmbeddingBackend::Hashing, None));
    let search = LiteratureSearch::new(default_sources(&client, &config), embedder);

    let papers = search.search("malaria", 5).await.unwrap();

    assert_eq!(papers.len(), 3);
    assert!(papers.iter().all(|p| p.paper.source == "CrossRef"));
    assert!(papers.iter().all(|p| p.is_scored()));
}

#[tokio::test]
async fn test_both_sources_empty_never_loads_model() {
    let mock_server = MockServer::start().await;
    mount_s2(&mock_server, s2_results(vec![])).await;
    mount_crossref(&mock_server, crossref_results(vec![])).await;

    let (search, embedder) = setup_search(&mock_server);
    let papers = search.search("an obscure topic", 10).await.unwrap();

    assert!(papers.is_empty());
    assert!(!embedder.is_initialized());
}

#[tokio::test]
async fn test_single_relevant_hit() {
    let mock_server = MockServer::start().await;
    let this_year = chrono::Utc::now().year();

    let mut hit = s2_paper_json("Malaria prevention in rural clinics", this_year, 50);
    hit["abstract"] =
        json!("Community malaria prevention programmes in rural healthcare settings.");
    mount_s2(&mock_server, s2_results(vec![hit])).await;
    mount_crossref(&mock_server, crossref_results(vec![])).await;

    let (search, _) = setup_search(&mock_server);
    let papers = search.search("malaria prevention rural healthcare", 10).await.unwrap();

    assert_eq!(papers.len(), 1);
    let top = &papers[0];
    assert!(top.is_primary);
    assert_eq!(top.position, Some(1));
    assert_eq!(top.tier_label.as_deref(), Some("Primary Reference (Highest Confidence)"));
    assert!(matches!(
        top.confidence_tier,
        Some(ConfidenceTier::Highest | ConfidenceTier::High)
    ));
    assert!(top.relevance.unwrap() > 0.6);
}

#[tokio::test]
async fn test_truncation_happens_after_ranking() {
    let mock_server = MockServer::start().await;

    // Semantic Scholar: two weak matches. CrossRef: two strong ones.
    mount_s2(
        &mock_server,
        s2_results(vec![
            s2_paper_json("Soil chemistry of wetlands", 2010, 0),
            s2_paper_json("Urban traffic modelling", 2011, 0),
        ]),
    )
    .await;
    mount_crossref(
        &mock_server,
        crossref_results(vec![
            crossref_work_json("Malaria prevention with bed nets", 2020, 5),
            crossref_work_json("Malaria prevention in schools", 2019, 5),
        ]),
    )
    .await;

    let (search, _) = setup_search(&mock_server);
    let top = search.search("malaria prevention", 2).await.unwrap();

    let all = search
        .rank_only(
            "malaria prevention",
            vec![
                candidate("Semantic Scholar", "Soil chemistry of wetlands", 2010, 0),
                candidate("Semantic Scholar", "Urban traffic modelling", 2011, 0),
                candidate("CrossRef", "Malaria prevention with bed nets", 2020, 5),
                candidate("CrossRef", "Malaria prevention in schools", 2019, 5),
            ],
        )
        .await
        .into_papers();

    let got: Vec<_> = top.iter().map(|p| p.paper.title.as_str()).collect();
    let expected: Vec<_> = all[..2].iter().map(|p| p.paper.title.as_str()).collect();
    assert_eq!(got, expected);
    assert!(top.iter().all(|p| p.paper.source == "CrossRef"));
}

#[tokio::test]
async fn test_equal_scores_keep_source_order() {
    let mock_server = MockServer::start().await;
    mount_s2(&mock_server, s2_results(vec![s2_paper_json("Bed nets", 2020, 0)])).await;
    mount_crossref(&mock_server, crossref_results(vec![crossref_work_json("Bed nets", 2020, 0)]))
        .await;

    let (search, _) = setup_search(&mock_server);
    let papers = search.search("bed nets", 10).await.unwrap();

    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].paper.source, "Semantic Scholar");
    assert_eq!(papers[1].paper.source, "CrossRef");
}

#[tokio::test]
async fn test_validation_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (search, _) = setup_search(&mock_server);
    let err = search.search("", 5).await.unwrap_err();
    assert!(matches!(err, SearchError::Validation { .. }));
    assert!(err.to_user_message().contains("query"));
}
