//! Drives `CatalogClient` against a local server standing in for the remote
//! catalog API.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use marquee::catalog::{CatalogApi, CatalogClient};
use marquee::error::CatalogError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const API_KEY: &str = "test-key";

#[derive(Clone, Default)]
struct Remote {
    queries: Arc<Mutex<Vec<(String, String)>>>,
}

impl Remote {
    fn record(&self, path: &str, query: Option<String>) {
        self.queries
            .lock()
            .unwrap()
            .push((path.to_string(), query.unwrap_or_default()));
    }

    fn last_query(&self) -> String {
        self.queries.lock().unwrap().last().unwrap().1.clone()
    }
}

fn popular_page() -> Value {
    let results: Vec<Value> = (1..=20)
        .map(|i| {
            json!({
                "id": 1000 + i,
                "title": format!("Popular {i}"),
                "poster_path": format!("/p{i}.jpg"),
                "vote_average": 5.0 + (i as f64) / 10.0,
                "release_date": "2024-05-01",
                "overview": "not part of the summary",
                "genre_ids": [18]
            })
        })
        .collect();
    json!({ "page": 1, "results": results, "total_pages": 1 })
}

async fn popular(State(remote): State<Remote>, RawQuery(q): RawQuery) -> Json<Value> {
    remote.record("/movie/popular", q);
    Json(popular_page())
}

async fn search(State(remote): State<Remote>, RawQuery(q): RawQuery) -> Json<Value> {
    remote.record("/search/movie", q);
    Json(json!({
        "page": 1,
        "results": [
            {"id": 268, "title": "Batman", "poster_path": null, "vote_average": 7.2, "release_date": "1989-06-21"},
            {"id": 414906, "title": "The Batman", "poster_path": "/b.jpg", "vote_average": 7.7, "release_date": ""}
        ]
    }))
}

async fn movie(
    State(remote): State<Remote>,
    Path(id): Path<i64>,
    RawQuery(q): RawQuery,
) -> Response {
    remote.record("/movie/{id}", q);
    match id {
        27205 => Json(json!({
            "id": 27205,
            "title": "Inception",
            "vote_average": 8.4,
            "release_date": "2010-07-15",
            "runtime": 148,
            "budget": 160000000,
            "revenue": 825532764,
            "genres": [{"id": 28, "name": "Action"}],
            "credits": {"cast": [], "crew": [{"id": 525, "name": "Christopher Nolan", "job": "Director"}]},
            "videos": {"results": []},
            "similar": {"results": [], "page": 1},
            "reviews": {"results": []}
        }))
        .into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"status_code": 34, "status_message": "not found"})),
        )
            .into_response(),
    }
}

async fn videos(State(remote): State<Remote>, Path(id): Path<i64>, RawQuery(q): RawQuery) -> Response {
    remote.record("/movie/{id}/videos", q);
    let results = match id {
        27205 => json!([
            {"id": "1", "key": "teaser-key", "type": "Teaser", "site": "YouTube"},
            {"id": "2", "key": "vimeo-key", "type": "Trailer", "site": "Vimeo"},
            {"id": "3", "key": "YoHD9XEInc0", "type": "Trailer", "site": "YouTube", "name": "Official Trailer"},
            {"id": "4", "key": "second-trailer", "type": "Trailer", "site": "YouTube"}
        ]),
        1 => json!([
            {"id": "1", "key": "teaser-key", "type": "Teaser", "site": "YouTube"},
            {"id": "2", "key": "vimeo-key", "type": "Trailer", "site": "Vimeo"}
        ]),
        _ => return (StatusCode::OK, "<html>not json</html>").into_response(),
    };
    Json(json!({ "id": id, "results": results })).into_response()
}

async fn images(State(remote): State<Remote>, Path(id): Path<i64>, RawQuery(q): RawQuery) -> Json<Value> {
    remote.record("/movie/{id}/images", q);
    Json(json!({
        "id": id,
        "backdrops": [{"file_path": "/bd.jpg", "width": 1920, "height": 1080, "iso_639_1": null}],
        "posters": [{"file_path": "/p.jpg", "width": 500, "height": 750, "iso_639_1": "en"}]
    }))
}

async fn spawn_remote(app_routes: Router<Remote>) -> (String, Remote) {
    let remote = Remote::default();
    let app = app_routes.with_state(remote.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/3"), remote)
}

async fn catalog() -> (CatalogClient, Remote) {
    let routes = Router::new()
        .route("/3/movie/popular", get(popular))
        .route("/3/search/movie", get(search))
        .route("/3/movie/:id", get(movie))
        .route("/3/movie/:id/videos", get(videos))
        .route("/3/movie/:id/images", get(images));
    let (base, remote) = spawn_remote(routes).await;
    (CatalogClient::new(base, API_KEY), remote)
}

#[tokio::test]
async fn popular_returns_twenty_summaries_in_server_order() {
    let (client, remote) = catalog().await;
    let movies = client.fetch_popular().await.unwrap();
    assert_eq!(movies.len(), 20);
    let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
    assert_eq!(ids, (1001..=1020).collect::<Vec<_>>());
    assert_eq!(movies[0].title, "Popular 1");
    assert_eq!(movies[0].poster_path.as_deref(), Some("/p1.jpg"));
    assert_eq!(movies[0].release_date.as_deref(), Some("2024-05-01"));
    assert_eq!(remote.last_query(), format!("api_key={API_KEY}"));
}

#[tokio::test]
async fn search_sends_percent_encoded_query() {
    let (client, remote) = catalog().await;

    let movies = client.search("batman").await.unwrap();
    assert_eq!(remote.last_query(), format!("api_key={API_KEY}&query=batman"));
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].id, 268);
    assert_eq!(movies[1].release_date, None);

    client.search("spider-man: far from home & co").await.unwrap();
    assert_eq!(
        remote.last_query(),
        format!("api_key={API_KEY}&query=spider-man%3A%20far%20from%20home%20%26%20co")
    );
}

#[tokio::test]
async fn empty_search_is_passed_through() {
    let (client, remote) = catalog().await;
    client.search("").await.unwrap();
    let (path, query) = remote.queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(path, "/search/movie");
    assert_eq!(query, format!("api_key={API_KEY}&query="));
}

#[tokio::test]
async fn details_request_appends_sub_resources() {
    let (client, remote) = catalog().await;
    let detail = client.fetch_details(27205).await.unwrap();
    assert_eq!(detail.summary.title, "Inception");
    assert_eq!(detail.runtime, Some(148));
    assert_eq!(detail.genres[0].name, "Action");
    assert_eq!(detail.director().map(|d| d.name.as_str()), Some("Christopher Nolan"));
    assert_eq!(
        remote.last_query(),
        format!("api_key={API_KEY}&append_to_response=credits%2Cvideos%2Csimilar%2Creviews")
    );
}

#[tokio::test]
async fn details_fail_soft() {
    let (client, _) = catalog().await;
    assert!(client.fetch_details(404).await.is_none());
    assert!(client.fetch_details(500).await.is_none());

    assert!(matches!(
        client.try_fetch_details(404).await,
        Err(CatalogError::NotFound(_))
    ));
    assert!(matches!(
        client.try_fetch_details(500).await,
        Err(CatalogError::Service(_))
    ));
}

#[tokio::test]
async fn unreachable_catalog_fails_soft_and_reports_network_errors() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = CatalogClient::new(format!("http://{addr}/3"), API_KEY);

    assert!(client.fetch_details(27205).await.is_none());
    assert!(client.fetch_trailer(27205).await.is_none());
    assert!(matches!(
        client.fetch_popular().await,
        Err(CatalogError::Network(_))
    ));
}

#[tokio::test]
async fn trailer_is_first_youtube_trailer() {
    let (client, remote) = catalog().await;
    let trailer = client.fetch_trailer(27205).await.unwrap();
    assert_eq!(trailer.key, "YoHD9XEInc0");
    assert_eq!(trailer.name.as_deref(), Some("Official Trailer"));
    let (path, _) = remote.queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(path, "/movie/{id}/videos");
}

#[tokio::test]
async fn trailer_none_without_match_or_on_bad_payload() {
    let (client, _) = catalog().await;
    assert!(client.fetch_trailer(1).await.is_none());
    assert!(client.fetch_trailer(2).await.is_none());
}

#[tokio::test]
async fn missing_results_field_is_a_service_error() {
    async fn no_results() -> Json<Value> {
        Json(json!({ "page": 1 }))
    }
    let routes = Router::new().route("/3/movie/popular", get(no_results));
    let (base, _) = spawn_remote(routes).await;
    let client = CatalogClient::new(base, API_KEY);
    assert!(matches!(
        client.fetch_popular().await,
        Err(CatalogError::Service(_))
    ));
}

#[tokio::test]
async fn images_are_fetched() {
    let (client, _) = catalog().await;
    let images = client.fetch_images(27205).await.unwrap();
    assert_eq!(images.backdrops.len(), 1);
    assert_eq!(images.posters[0].iso_639_1.as_deref(), Some("en"));
    assert!(images.logos.is_empty());
}
