//! City endpoints
//!
//! Failure shapes differ per route:
//! - create: 409 + `[]`
//! - search: 500 + `[]`
//! - replace/patch: 409 + `{"error": <gateway code>}`
//! - get/delete: gateway status + `{"error": <code>}`
//!
//! Validation failures are 400 + `{"error": 400}` everywhere.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, CityId};
use crate::http::server::AppState;
use crate::models::{
    City, CreateCityRequest, Feature, FeatureCollection, OutputFormat, PatchCityRequest,
    ReplaceCityRequest, SearchParams,
};

fn render_one(city: City, format: OutputFormat) -> Result<Response, ApiError> {
    Ok(match format {
        OutputFormat::Json => Json(city).into_response(),
        OutputFormat::GeoJson => Json(Feature::from_city(city)?).into_response(),
    })
}

fn render_many(cities: Vec<City>, format: OutputFormat) -> Result<Response, ApiError> {
    Ok(match format {
        OutputFormat::Json => Json(cities).into_response(),
        OutputFormat::GeoJson => Json(FeatureCollection::from_cities(cities)?).into_response(),
    })
}

/// POST /cities - create a city, returning its id
async fn create_city(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCityRequest>,
) -> Result<Json<i64>, ApiError> {
    let city = req.into_city()?;
    let id = state
        .store
        .insert(&city)
        .await
        .map_err(|e| ApiError::from(e).empty_list(StatusCode::CONFLICT))?;

    tracing::info!(id, name = %city.name, "City created");
    Ok(Json(id))
}

/// GET /cities - text search
async fn list_cities(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Response, ApiError> {
    let query = params.text_query()?;
    let cities = state
        .store
        .search_text(&query)
        .await
        .map_err(ApiError::from)
        .and_then(|cities| render_many(cities, params.format()));

    cities.map_err(|e| e.empty_list(StatusCode::INTERNAL_SERVER_ERROR))
}

/// GET /citiesSpatial - text search within a bounding box
async fn search_spatial(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Response, ApiError> {
    let query = params.spatial_query()?;
    let cities = state
        .store
        .search_spatial(&query)
        .await
        .map_err(ApiError::from)
        .and_then(|cities| render_many(cities, params.format()));

    cities.map_err(|e| e.empty_list(StatusCode::INTERNAL_SERVER_ERROR))
}

/// GET /cities/{id} - get a single city
async fn get_city(
    State(state): State<Arc<AppState>>,
    CityId(id): CityId,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Response, ApiError> {
    let city = state.store.get_by_id(id).await?;
    render_one(city, params.format())
}

/// PUT /cities - replace every field of a city
async fn replace_city(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ReplaceCityRequest>,
) -> Result<Json<i64>, ApiError> {
    let city = req.into_city()?;
    let id = state
        .store
        .replace(&city)
        .await
        .map_err(|e| ApiError::from(e).conflict())?;

    Ok(Json(id))
}

/// PATCH /cities - overwrite only the provided fields
async fn patch_city(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PatchCityRequest>,
) -> Result<Json<i64>, ApiError> {
    let patch = req.into_patch()?;
    let id = state
        .store
        .update(patch)
        .await
        .map_err(|e| ApiError::from(e).conflict())?;

    Ok(Json(id))
}

/// DELETE /cities/{id} - delete a city (idempotent)
async fn delete_city(
    State(state): State<Arc<AppState>>,
    CityId(id): CityId,
) -> Result<Json<bool>, ApiError> {
    Ok(Json(state.store.delete_by_id(id).await?))
}

/// DELETE /citiesClear - delete every city
async fn clear_cities(State(state): State<Arc<AppState>>) -> Result<Json<bool>, ApiError> {
    Ok(Json(state.store.delete_all().await?))
}

/// City routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/cities",
            get(list_cities)
                .post(create_city)
                .put(replace_city)
                .patch(patch_city),
        )
        .route("/cities/{id}", get(get_city).delete(delete_city))
        .route("/citiesSpatial", get(search_spatial))
        .route("/citiesClear", delete(clear_cities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryCityStore;
    use crate::http::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PARIS: &str = r#"{"type":"Point","coordinates":[2.349014,48.864716]}"#;
    const MUNICH: &str = r#"{"type":"Point","coordinates":[11.576124,48.137154]}"#;
    const GARCHING: &str = r#"{"type":"Point","coordinates":[11.65,48.2]}"#;
    const MUNICH_BBOX: &str =
        "11.403882613956075,48.05050852663266,11.689117085660317,48.21482137789209";

    struct TestApp {
        store: Arc<MemoryCityStore>,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let store = Arc::new(MemoryCityStore::default());
            let router = build_router(AppState {
                store: store.clone(),
            });
            Self { store, router }
        }

        async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create(&self, name: &str, geometry: &str) -> i64 {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/cities",
                    Some(json!({
                        "name": name,
                        "description": "village",
                        "population": 500000,
                        "geometry": geometry,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body.as_i64().unwrap()
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trip() {
        let app = TestApp::new();
        let id = app.create("Paris", PARIS).await;

        let (status, body) = app.call(Method::GET, &format!("/api/cities/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(body["name"], "Paris");
        assert_eq!(body["description"], "village");
        assert_eq!(body["population"], 500000);

        let stored: Value = serde_json::from_str(body["geometry"].as_str().unwrap()).unwrap();
        let sent: Value = serde_json::from_str(PARIS).unwrap();
        assert_eq!(stored, sent);
    }

    #[tokio::test]
    async fn create_accepts_inline_geometry_object() {
        let app = TestApp::new();
        let (status, _) = app
            .call(
                Method::POST,
                "/api/cities",
                Some(json!({"name": "Lyon", "geometry": {"type": "Point", "coordinates": [4.83, 45.76]}})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn create_drops_elevation() {
        let app = TestApp::new();
        let (status, body) = app
            .call(
                Method::POST,
                "/api/cities",
                Some(json!({"name": "Z", "geometry": {"type": "Point", "coordinates": [1, 2, 3]}})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let id = body.as_i64().unwrap();

        let (_, body) = app.call(Method::GET, &format!("/api/cities/{id}"), None).await;
        let geometry: Value = serde_json::from_str(body["geometry"].as_str().unwrap()).unwrap();
        assert_eq!(geometry["coordinates"], json!([1, 2]));
    }

    #[tokio::test]
    async fn create_validation_is_400() {
        let app = TestApp::new();
        let (status, body) = app
            .call(Method::POST, "/api/cities", Some(json!({"description": "no name"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": 400}));

        let (status, _) = app
            .call(
                Method::POST,
                "/api/cities",
                Some(json!({"name": "x", "geometry": "{\"type\":\"Point\"}"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_store_failure_is_409_empty_array() {
        let app = TestApp::new();
        app.store.fail_all();

        let (status, body) = app
            .call(Method::POST, "/api/cities", Some(json!({"name": "Paris"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_json_400() {
        let app = TestApp::new();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/cities")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": 400}));
    }

    #[tokio::test]
    async fn get_missing_is_404() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/cities/309276", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": 404}));
    }

    #[tokio::test]
    async fn get_non_numeric_id_is_400() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/cities/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": 400}));
    }

    #[tokio::test]
    async fn get_geojson_feature() {
        let app = TestApp::new();
        let id = app.create("Paris", PARIS).await;

        let (status, body) = app
            .call(Method::GET, &format!("/api/cities/{id}?f=geojson"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "Feature");
        assert_eq!(body["id"], id);
        assert_eq!(body["properties"]["name"], "Paris");
        assert!(body["properties"].get("population").is_some());
        assert!(body["geometry"].is_object());
    }

    #[tokio::test]
    async fn text_search_limit() {
        let app = TestApp::new();
        for i in 0..15 {
            app.create(&format!("City {i}"), PARIS).await;
        }

        let (status, body) = app.call(Method::GET, "/api/cities?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 10);

        let (_, body) = app.call(Method::GET, "/api/cities", None).await;
        assert_eq!(body.as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn text_search_is_case_sensitive_substring() {
        let app = TestApp::new();
        app.create("Munich", MUNICH).await;
        app.create("Paris", PARIS).await;

        let (_, body) = app.call(Method::GET, "/api/cities?search=uni", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = app.call(Method::GET, "/api/cities?search=munich", None).await;
        assert!(body.as_array().unwrap().is_empty());

        // matches description too
        let (_, body) = app.call(Method::GET, "/api/cities?search=vill", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn text_search_wildcards_are_literal() {
        let app = TestApp::new();
        app.create("Munich", MUNICH).await;
        app.create("Saint_Denis", PARIS).await;

        let (_, body) = app.call(Method::GET, "/api/cities?search=_", None).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Saint_Denis"]);

        let (_, body) = app.call(Method::GET, "/api/cities?search=%25", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_limit_means_no_limit() {
        let app = TestApp::new();
        for i in 0..3 {
            app.create(&format!("City {i}"), PARIS).await;
        }

        let (status, body) = app.call(Method::GET, "/api/cities?limit=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) = app
            .call(Method::GET, "/api/citiesSpatial?limit=&bbox=", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let app = TestApp::new();

        for (method, uri) in [
            (Method::DELETE, "/api/cities"),
            (Method::POST, "/api/citiesClear"),
            (Method::PUT, "/api/cities/1"),
        ] {
            let (status, body) = app.call(method, uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, json!({"error": 405}));
        }
    }

    #[tokio::test]
    async fn search_bad_limit_is_400() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/cities?limit=ten", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": 400}));

        let (status, _) = app.call(Method::GET, "/api/cities?limit=-3", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_failure_is_500_empty_array() {
        let app = TestApp::new();
        app.store.fail_all();

        let (status, body) = app.call(Method::GET, "/api/cities", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!([]));

        let (status, body) = app.call(Method::GET, "/api/citiesSpatial", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn bounding_box_filter() {
        let app = TestApp::new();
        app.create("Munich", MUNICH).await;
        app.create("Garching", GARCHING).await;
        app.create("Paris", PARIS).await;

        let uri = format!("/api/citiesSpatial?bbox={MUNICH_BBOX}");
        let (status, body) = app.call(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Munich"));
        assert!(names.contains(&"Garching"));

        let (_, body) = app.call(Method::GET, &format!("{uri}&f=geojson"), None).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 2);

        // default bbox is the whole world
        let (_, body) = app.call(Method::GET, "/api/citiesSpatial", None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn bad_bbox_is_400() {
        let app = TestApp::new();
        let (status, body) = app
            .call(Method::GET, "/api/citiesSpatial?bbox=1,2,3", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": 400}));
    }

    #[tokio::test]
    async fn put_replaces_every_field() {
        let app = TestApp::new();
        let id = app.create("Paris", PARIS).await;

        let (status, body) = app
            .call(
                Method::PUT,
                "/api/cities",
                Some(json!({"id": id, "name": "BrusselsX", "population": 100000})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(id));

        let (_, body) = app.call(Method::GET, &format!("/api/cities/{id}"), None).await;
        assert_eq!(body["name"], "BrusselsX");
        assert_eq!(body["population"], 100000);
        assert!(body["description"].is_null());
        assert!(body["geometry"].is_null());
    }

    #[tokio::test]
    async fn put_without_id_is_400() {
        let app = TestApp::new();
        let (status, body) = app
            .call(Method::PUT, "/api/cities", Some(json!({"name": "x"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": 400}));
    }

    #[tokio::test]
    async fn put_unknown_id_is_409_with_code() {
        let app = TestApp::new();
        let (status, body) = app
            .call(Method::PUT, "/api/cities", Some(json!({"id": 77, "name": "x"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": 400}));
    }

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let app = TestApp::new();
        let id = app.create("Paris", PARIS).await;

        let (status, body) = app
            .call(Method::PATCH, "/api/cities", Some(json!({"id": id, "name": "BrusselsY"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(id));

        let (_, body) = app.call(Method::GET, &format!("/api/cities/{id}"), None).await;
        assert_eq!(body["name"], "BrusselsY");
        assert_eq!(body["description"], "village");
        assert_eq!(body["population"], 500000);
        assert_eq!(body["geometry"], PARIS);
    }

    #[tokio::test]
    async fn patch_zero_population_is_applied() {
        let app = TestApp::new();
        let id = app.create("Paris", PARIS).await;

        app.call(Method::PATCH, "/api/cities", Some(json!({"id": id, "population": 0})))
            .await;

        let (_, body) = app.call(Method::GET, &format!("/api/cities/{id}"), None).await;
        assert_eq!(body["population"], 0);
    }

    #[tokio::test]
    async fn patch_unknown_id_is_409_with_404_code() {
        let app = TestApp::new();
        let (status, body) = app
            .call(Method::PATCH, "/api/cities", Some(json!({"id": 5, "name": "x"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": 404}));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = TestApp::new();
        let id = app.create("Paris", PARIS).await;

        for _ in 0..2 {
            let (status, body) = app
                .call(Method::DELETE, &format!("/api/cities/{id}"), None)
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!(true));
        }

        let (status, _) = app.call(Method::GET, &format!("/api/cities/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clear_twice_then_empty() {
        let app = TestApp::new();
        app.create("Paris", PARIS).await;
        app.create("Munich", MUNICH).await;

        for _ in 0..2 {
            let (status, body) = app.call(Method::DELETE, "/api/citiesClear", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!(true));
        }

        let (_, body) = app.call(Method::GET, "/api/cities", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn delete_failure_passes_status_through() {
        let app = TestApp::new();
        app.store.fail_all();

        let (status, body) = app.call(Method::DELETE, "/api/citiesClear", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": 500}));
    }
}
