use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    auth::verify_bearer,
    cache::SlideQueryCache,
    dataset::{read_people, Dataset},
    error::ApiError,
    filter::{build_tag_params, categorize_tags, filter_slides, selected_tags_from_params},
    formatting::SLIDE_ID_PREFIX,
    models::{GeneratedTags, ReloadResponse, SlideLookupResponse, SlidesResponse, TagType},
    slides::find_slide_index,
    validation::ValidationReport,
    AppState,
};

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true, "timestamp": Utc::now() }))
}

/// Slides matching the tag selection in the query string.
///
/// The selection is categorized first, so at most one tag per filter
/// category applies and unknown tags are ignored. The echoed `params` are
/// the canonical form and double as the cache key.
pub async fn list_slides(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<SlidesResponse> {
    let dataset = state.snapshot().await;
    let categorized = categorize_tags(&selected_tags_from_params(&query), &dataset.catalog);
    let params = build_tag_params(&categorized, &BTreeMap::new());
    let key = SlideQueryCache::key(dataset.version, &params);

    let cached = state.cache.lock().await.get(&key);
    if let Some(hit) = cached {
        debug!(key = %key, "Slide query served from cache");
        return Json(hit.as_ref().clone());
    }

    let selected = categorized.selected();
    let slides = filter_slides(&dataset.slides, &selected, &dataset.catalog)
        .into_iter()
        .filter_map(|(idx, _)| dataset.payload(idx))
        .collect::<Vec<_>>();

    let response = Arc::new(SlidesResponse {
        dataset_version: dataset.version,
        generated_at: Utc::now(),
        total: dataset.slides.len(),
        matched: slides.len(),
        params,
        slides,
    });
    info!(
        version = dataset.version,
        selected = selected.len(),
        matched = response.matched,
        "Slide query evaluated"
    );

    cache_if_current(&state, dataset.version, key, response.clone()).await;
    Json(response.as_ref().clone())
}

/// Store a listing unless a reload has replaced its dataset in the meantime.
///
/// The version is read under the cache lock; a reload clears the cache
/// after swapping, so nothing stored here can outlive its dataset.
async fn cache_if_current(
    state: &AppState,
    version: u64,
    key: String,
    response: Arc<SlidesResponse>,
) -> bool {
    let mut cache = state.cache.lock().await;
    if state.snapshot().await.version != version {
        debug!(key = %key, version, "Skipping cache for superseded dataset");
        return false;
    }
    cache.set(key, response);
    true
}

/// Slide containing a person, looked up by ID, then name, then `slide-<id>`.
pub async fn get_slide(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<SlideLookupResponse>, ApiError> {
    let dataset = state.snapshot().await;
    let index = find_slide_index(&dataset.slides, &identifier).or_else(|| {
        identifier
            .strip_prefix(SLIDE_ID_PREFIX)
            .and_then(|id| find_slide_index(&dataset.slides, id))
    });

    let slide = index
        .and_then(|idx| dataset.payload(idx))
        .ok_or_else(|| ApiError::SlideNotFound(identifier.clone()))?;

    Ok(Json(SlideLookupResponse {
        dataset_version: dataset.version,
        slide,
    }))
}

pub async fn list_tags(State(state): State<AppState>) -> Json<GeneratedTags> {
    let dataset = state.snapshot().await;
    Json(dataset.catalog.generated().clone())
}

pub async fn tags_by_type(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tag_type = TagType::parse(&raw).ok_or(ApiError::UnknownTagType(raw))?;
    let dataset = state.snapshot().await;
    let tags = dataset.catalog.by_type(tag_type).cloned().collect::<Vec<_>>();

    Ok(Json(json!({
        "type": tag_type,
        "isFilter": tag_type.is_filter(),
        "tags": tags,
    })))
}

pub async fn validation_report(State(state): State<AppState>) -> Json<ValidationReport> {
    let dataset = state.snapshot().await;
    Json(dataset.report.clone())
}

/// Re-read the people file and swap in a new dataset version.
///
/// A failed read leaves the current dataset in place.
pub async fn reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiError> {
    verify_bearer(&headers, &state.config.admin_key)?;

    let people = read_people(&state.config.people_path).await.map_err(|err| {
        warn!(error = %err, "Dataset reload failed");
        ApiError::from(err)
    })?;

    let next = {
        let mut current = state.dataset.write().await;
        let next = Arc::new(Dataset::build(
            people,
            state.config.dataset_settings(),
            current.version + 1,
        ));
        *current = next.clone();
        next
    };
    state.cache.lock().await.clear();

    info!(
        version = next.version,
        people = next.people.len(),
        slides = next.slides.len(),
        "Dataset reloaded"
    );

    Ok(Json(ReloadResponse {
        dataset_version: next.version,
        loaded_at: next.loaded_at,
        people: next.people.len(),
        slides: next.slides.len(),
        tags: next.catalog.tags().len(),
        critical_issues: next.report.critical_count(),
    }))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{config::Config, people::fixtures::family, router};

    use super::*;

    fn state_with(config: Config) -> AppState {
        let dataset = Dataset::build(family(), config.dataset_settings(), 1);
        AppState::new(config, dataset)
    }

    fn test_state() -> AppState {
        state_with(Config {
            admin_key: "admin-secret".into(),
            admin_key_is_fallback: false,
            ..Config::default()
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).expect("json body");
        (status, body)
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        send(router(state.clone()), request).await
    }

    fn slide_ids(body: &Value) -> Vec<String> {
        body["slides"]
            .as_array()
            .expect("slides array")
            .iter()
            .map(|s| s["slideId"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (status, body) = get(&test_state(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn lists_all_slides_without_filters() {
        let (status, body) = get(&test_state(), "/v1/slides").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
        assert_eq!(body["matched"], 5);
        assert_eq!(body["datasetVersion"], 1);
        assert_eq!(
            slide_ids(&body),
            vec!["slide-govind", "slide-ravi", "slide-kavya", "slide-lata", "slide-hari"]
        );
        assert_eq!(body["slides"][1]["coupleNames"], "Ravi + Meera");
        assert_eq!(body["slides"][1]["childIndex"], "Child 1 / 3");
    }

    #[tokio::test]
    async fn filters_by_family_and_location() {
        let state = test_state();
        let (_, body) = get(&state, "/v1/slides?family=FAMILY_VAIDYA").await;
        assert_eq!(body["matched"], 1);
        assert_eq!(slide_ids(&body), vec!["slide-kavya"]);
        assert_eq!(body["params"]["family"], "FAMILY_VAIDYA");

        let (_, body) = get(&state, "/v1/slides?location=LOCATION_MUMBAI").await;
        assert_eq!(slide_ids(&body), vec!["slide-ravi"]);

        // Govind is the only Pune resident and is deceased.
        let (_, body) = get(&state, "/v1/slides?location=LOCATION_PUNE").await;
        assert_eq!(body["matched"], 0);
    }

    #[tokio::test]
    async fn unknown_tags_are_dropped_from_params() {
        let (_, body) = get(&test_state(), "/v1/slides?tags=NOT_A_TAG").await;
        assert_eq!(body["matched"], 5);
        assert_eq!(body["params"], json!({}));
    }

    #[tokio::test]
    async fn repeated_queries_hit_the_cache() {
        let state = test_state();
        get(&state, "/v1/slides?generation=GENERATION_1").await;
        get(&state, "/v1/slides?generation=GENERATION_1").await;
        get(&state, "/v1/slides").await;
        assert_eq!(state.cache.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn listings_for_a_replaced_dataset_are_not_cached() {
        let state = test_state();
        let stale = SlidesResponse {
            dataset_version: 1,
            generated_at: Utc::now(),
            total: 5,
            matched: 0,
            params: BTreeMap::new(),
            slides: Vec::new(),
        };

        let next = Dataset::build(family(), state.config.dataset_settings(), 2);
        *state.dataset.write().await = Arc::new(next);
        state.cache.lock().await.clear();

        let key = SlideQueryCache::key(1, &BTreeMap::new());
        assert!(!cache_if_current(&state, 1, key, Arc::new(stale.clone())).await);
        assert!(state.cache.lock().await.is_empty());

        let key = SlideQueryCache::key(2, &BTreeMap::new());
        assert!(cache_if_current(&state, 2, key, Arc::new(stale)).await);
        assert_eq!(state.cache.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn looks_up_slides_by_id_name_and_anchor() {
        let state = test_state();
        let (status, body) = get(&state, "/v1/slides/dev").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slide"]["index"], 2);

        let (_, body) = get(&state, "/v1/slides/Meera").await;
        assert_eq!(body["slide"]["slideId"], "slide-ravi");

        let (_, body) = get(&state, "/v1/slides/slide-lata").await;
        assert_eq!(body["slide"]["index"], 3);

        let (status, body) = get(&state, "/v1/slides/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SLIDE_NOT_FOUND");
    }

    #[tokio::test]
    async fn serves_tags_and_rejects_unknown_types() {
        let state = test_state();
        let (status, body) = get(&state, "/v1/tags").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tagLabels"]["NYC-Wedding"], "NYC Wedding");

        let (status, body) = get(&state, "/v1/tags/family").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isFilter"], true);
        assert!(body["tags"]
            .as_array()
            .expect("tags")
            .iter()
            .all(|t| t["type"] == "family"));

        let (status, body) = get(&state, "/v1/tags/colour").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_TAG_TYPE");
    }

    #[tokio::test]
    async fn validation_report_is_exposed() {
        let (status, body) = get(&test_state(), "/v1/validation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["criticalIssues"], 0);
        assert_eq!(body["stats"]["totalPeople"], 12);
    }

    #[tokio::test]
    async fn reload_requires_admin_key_and_bumps_version() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let mut people = family();
        people.truncate(2);
        file.write_all(serde_json::to_string(&people).expect("json").as_bytes())
            .expect("write");

        let state = state_with(Config {
            admin_key: "admin-secret".into(),
            admin_key_is_fallback: false,
            people_path: file.path().to_path_buf(),
            ..Config::default()
        });
        get(&state, "/v1/slides").await;

        let unauthorized = Request::builder()
            .method(Method::POST)
            .uri("/v1/admin/reload")
            .body(Body::empty())
            .expect("request");
        let (status, _) = send(router(state.clone()), unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let authorized = Request::builder()
            .method(Method::POST)
            .uri("/v1/admin/reload")
            .header(AUTHORIZATION, "Bearer admin-secret")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(router(state.clone()), authorized).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["datasetVersion"], 2);
        assert_eq!(body["people"], 2);
        assert!(state.cache.lock().await.is_empty());

        let (_, body) = get(&state, "/v1/slides").await;
        assert_eq!(body["datasetVersion"], 2);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn failed_reload_keeps_current_dataset() {
        let state = state_with(Config {
            admin_key: "admin-secret".into(),
            people_path: "/definitely/not/here.json".into(),
            ..Config::default()
        });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/admin/reload")
            .header(AUTHORIZATION, "Bearer admin-secret")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(router(state.clone()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "RELOAD_FAILED");
        assert_eq!(state.snapshot().await.version, 1);
    }
}
