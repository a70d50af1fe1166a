#![cfg(feature = "web")]

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::analyzer::{analyze_line_view_times, text_segments};
use crate::config::Config;
use crate::content::{AboutPage, Content, Level, Question};
use crate::downloader::{self, TEMPLATE_FILENAME};
use crate::graph::{self, ChartOptions};
use crate::loader::{self, ExcelImportError};
use crate::login::{self, LoginRequest, SESSION_COOKIE};
use crate::qr::{self, QrGenerationError};
use crate::result::{
    ContentLookup, MinimalResult, build_result_record, decode_minimal, encode_minimal,
    reconstruct_result, share_url,
};
use crate::saving;
use crate::speed::reading_statistics;
use crate::store::{
    ContentDraft, LabelDraft, LabelPatch, LevelDraft, LevelUpdate, Library, SiteInfoUpdate,
    StoreError,
};
use crate::tracker::ScrollData;

pub struct AppState {
    library: RwLock<Library>,
    config: Config,
    admin_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest {
    #[serde(default)]
    direction: String,
    #[serde(default)]
    level_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelAssignment {
    #[serde(default)]
    label_ids: Vec<String>,
}

#[derive(Deserialize)]
struct AboutUpdate {
    content: Option<String>,
    #[serde(default)]
    images: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSubmission {
    content_id: String,
    #[serde(default)]
    answers: Vec<Option<usize>>,
    #[serde(default)]
    reading_time_seconds: u64,
    #[serde(default)]
    scroll_data: Option<ScrollData>,
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Make sure the snapshot directory exists before the first save
    if let Some(parent) = std::path::Path::new(&config.data_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let library = match saving::load_library(&config.data_file) {
        Ok(library) => {
            log::info!("loaded library from {}", config.data_file);
            library
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "no library at {}, starting with the built-in levels",
                config.data_file
            );
            Library::new()
        }
        Err(error) => return Err(error.into()),
    };

    let admin_hash = match login::hash_password(&config.admin_password) {
        Ok(hash) => hash,
        Err(error) => return Err(error.into()),
    };

    let port = config.port;
    let app_state = Arc::new(AppState {
        library: RwLock::new(library),
        config,
        admin_hash,
    });

    // Public reads and the result pipeline
    let public = Router::new()
        .route("/api/contents", get(list_contents))
        .route("/api/contents/:id", get(get_content))
        .route("/api/contents/:id/labels", get(get_content_labels))
        .route("/api/levels", get(list_levels))
        .route("/api/levels/:id", get(get_level))
        .route("/api/labels", get(list_labels))
        .route("/api/about", get(get_about))
        .route("/api/site-info", get(get_site_info))
        .route("/api/results", post(submit_result))
        .route("/api/results/:token", get(get_result))
        .route("/api/results/:token/qr", get(get_result_qr))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/logout", post(admin_logout))
        .route("/api/admin/session", get(admin_session));

    // Everything that changes the library requires the admin cookie
    let admin = Router::new()
        .route("/api/contents", post(create_content))
        .route(
            "/api/contents/:id",
            put(update_content).delete(delete_content),
        )
        .route("/api/contents/:id/order", put(update_content_order))
        .route("/api/contents/batch-order", put(update_batch_order))
        .route("/api/contents/:id/labels", put(update_content_labels))
        .route("/api/levels", post(create_level))
        .route("/api/levels/:id", put(update_level).delete(delete_level))
        .route("/api/levels/:id/set-default", put(set_default_level))
        .route("/api/labels", post(create_label))
        .route("/api/labels/:id", put(update_label).delete(delete_label))
        .route("/api/about", put(update_about))
        .route("/api/site-info", put(update_site_info))
        .route("/api/excel/template", get(download_template))
        .route("/api/excel/upload", post(upload_workbook))
        .route("/api/excel/export/:id", get(export_content))
        .route_layer(middleware::from_fn(login::require_admin));

    let app = Router::new()
        .merge(public)
        .merge(admin)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    log::info!("listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}

// ----- contents -----

async fn list_contents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let library = state.library.read().unwrap();
    let contents: Vec<serde_json::Value> = library
        .contents_ordered()
        .into_iter()
        .map(content_view)
        .collect();
    Json(contents)
}

async fn get_content(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let library = state.library.read().unwrap();
    match library.content(&id) {
        Some(content) => Json(single_content_view(content)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Content not found"),
    }
}

async fn create_content(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ContentDraft>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.create_content(Uuid::new_v4().to_string(), draft) {
        Ok(created) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to create content")
            {
                return response;
            }
            (StatusCode::CREATED, Json(created)).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn update_content(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ContentDraft>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.update_content(&id, draft) {
        Ok(updated) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to update content")
            {
                return response;
            }
            Json(updated).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn delete_content(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let mut library = state.library.write().unwrap();
    match library.delete_content(&id) {
        Ok(()) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to delete content")
            {
                return response;
            }
            Json(json!({ "message": "Content deleted successfully" })).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn update_content_order(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OrderRequest>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.move_content(&id, &payload.direction, &payload.level_code) {
        Ok(()) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to update content order")
            {
                return response;
            }
            Json(json!({ "success": true })).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn update_batch_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let Some(updates) = payload.get("updates").and_then(serde_json::Value::as_array) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid updates format");
    };

    let mut pairs = Vec::with_capacity(updates.len());
    for update in updates {
        let id = update.get("id").and_then(serde_json::Value::as_str);
        let order_index = update.get("orderIndex").and_then(serde_json::Value::as_i64);
        match (id, order_index) {
            (Some(id), Some(order_index)) => pairs.push((id.to_string(), order_index)),
            _ => return error_response(StatusCode::BAD_REQUEST, "Invalid updates format"),
        }
    }

    let mut library = state.library.write().unwrap();
    match library.apply_batch_order(&pairs) {
        Ok(updated) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to update content order")
            {
                return response;
            }
            Json(json!({ "success": true, "updated": updated })).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn get_content_labels(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let library = state.library.read().unwrap();
    Json(library.content_labels(&id))
}

async fn update_content_labels(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LabelAssignment>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.set_content_labels(&id, &payload.label_ids) {
        Ok(labels) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to update content labels")
            {
                return response;
            }
            Json(labels).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

// ----- levels -----

async fn list_levels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let library = state.library.read().unwrap();
    let levels: Vec<serde_json::Value> = library
        .levels_with_counts()
        .into_iter()
        .map(|(level, count)| level_view(&level, count))
        .collect();
    Json(levels)
}

async fn get_level(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let library = state.library.read().unwrap();
    match library.level(&id) {
        Some(level) => {
            Json(level_view(level, library.level_content_count(&id))).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "レベルが見つかりません"),
    }
}

async fn create_level(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<LevelDraft>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.create_level(draft) {
        Ok(level) => {
            if let Some(response) =
                persist_library(&state, &library, "レベルの作成に失敗しました")
            {
                return response;
            }
            (StatusCode::CREATED, Json(level_view(&level, 0))).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn update_level(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<LevelUpdate>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.update_level(&id, update) {
        Ok(level) => {
            if let Some(response) =
                persist_library(&state, &library, "レベルの更新に失敗しました")
            {
                return response;
            }
            let count = library.level_content_count(&id);
            Json(level_view(&level, count)).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn delete_level(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Option<Json<serde_json::Value>>,
) -> Response {
    let target = payload
        .as_ref()
        .and_then(|json| json.0.get("targetLevelId"))
        .and_then(serde_json::Value::as_str);

    let mut library = state.library.write().unwrap();
    match library.delete_level(&id, target) {
        Ok(deletion) => {
            if let Some(response) =
                persist_library(&state, &library, "レベルの削除に失敗しました")
            {
                return response;
            }
            Json(json!({
                "message": "レベルが正常に削除されました",
                "movedContentsTo": deletion.moved_contents_to,
                "deletedContentCount": deletion.deleted_content_count,
            }))
            .into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn set_default_level(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.set_default_level(&id) {
        Ok(level) => {
            if let Some(response) =
                persist_library(&state, &library, "デフォルトレベルの設定に失敗しました")
            {
                return response;
            }
            let count = library.level_content_count(&id);
            Json(level_view(&level, count)).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

// ----- labels -----

async fn list_labels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let library = state.library.read().unwrap();
    let labels: Vec<serde_json::Value> = library
        .labels_sorted()
        .into_iter()
        .map(|(label, count)| label_view(&label, count))
        .collect();
    Json(labels)
}

async fn create_label(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<LabelDraft>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.create_label(Uuid::new_v4().to_string(), draft) {
        Ok(label) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to create label")
            {
                return response;
            }
            (StatusCode::CREATED, Json(label)).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn update_label(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<LabelPatch>,
) -> Response {
    let mut library = state.library.write().unwrap();
    match library.update_label(&id, patch) {
        Ok(label) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to update label")
            {
                return response;
            }
            Json(label).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

async fn delete_label(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let mut library = state.library.write().unwrap();
    match library.delete_label(&id) {
        Ok(()) => {
            if let Some(response) =
                persist_library(&state, &library, "Failed to delete label")
            {
                return response;
            }
            Json(json!({ "success": true })).into_response()
        }
        Err(error) => store_error_response(&error),
    }
}

// ----- about and site info -----

async fn get_about(State(state): State<Arc<AppState>>) -> Response {
    let library = state.library.read().unwrap();
    match library.about() {
        Some(about) => Json(about_view(about)).into_response(),
        None => Json(json!({ "id": null, "content": "", "images": null })).into_response(),
    }
}

async fn update_about(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AboutUpdate>,
) -> Response {
    let Some(content) = payload.content else {
        return error_response(StatusCode::BAD_REQUEST, "コンテンツが必要です");
    };
    let images = payload.images.filter(|images| !images.is_empty());

    let mut library = state.library.write().unwrap();
    let about = library.set_about(content, images);
    if let Some(response) = persist_library(
        &state,
        &library,
        "このサイトについての情報の更新に失敗しました",
    ) {
        return response;
    }
    Json(about_view(&about)).into_response()
}

async fn get_site_info(State(state): State<Arc<AppState>>) -> Response {
    {
        let library = state.library.read().unwrap();
        if let Some(info) = &library.site_info {
            return Json(info.clone()).into_response();
        }
    }

    // First request: materialize the default record and keep it
    let mut library = state.library.write().unwrap();
    let info = library.site_info().clone();
    if let Some(response) = persist_library(&state, &library, "Failed to fetch site info") {
        return response;
    }
    Json(info).into_response()
}

async fn update_site_info(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SiteInfoUpdate>,
) -> Response {
    let mut library = state.library.write().unwrap();
    let info = library.update_site_info(update);
    if let Some(response) = persist_library(&state, &library, "Failed to update site info") {
        return response;
    }
    Json(info).into_response()
}

// ----- Excel import/export -----

async fn download_template() -> Response {
    match downloader::content_template_workbook() {
        Ok(buffer) => xlsx_attachment(TEMPLATE_FILENAME, buffer),
        Err(error) => {
            log::error!("failed to build template workbook: {}", error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "テンプレートの生成に失敗しました",
            )
        }
    }
}

async fn upload_workbook(mut multipart: Multipart) -> Response {
    let mut file_data = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name() == Some("file") {
            file_data = field.bytes().await.unwrap_or_default().to_vec();
        }
    }

    if file_data.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "ファイルが選択されていません");
    }

    match loader::parse_content_workbook(&file_data) {
        Ok(imported) => Json(json!({ "success": true, "data": imported })).into_response(),
        Err(error) => {
            let status = match error {
                ExcelImportError::Unreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            error_response(status, &error.to_string())
        }
    }
}

async fn export_content(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let content = {
        let library = state.library.read().unwrap();
        match library.content(&id) {
            Some(content) => content.clone(),
            None => return error_response(StatusCode::NOT_FOUND, "Content not found"),
        }
    };

    match downloader::content_export_workbook(&content) {
        Ok(buffer) => xlsx_attachment(&format!("content_{}.xlsx", content.id), buffer),
        Err(error) => {
            log::error!("failed to export content {}: {}", content.id, error);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to export content")
        }
    }
}

// ----- results -----

async fn submit_result(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResultSubmission>,
) -> Response {
    let content = {
        let library = state.library.read().unwrap();
        match library.content(&payload.content_id) {
            Some(content) => content.clone(),
            None => return error_response(StatusCode::NOT_FOUND, "Content not found"),
        }
    };

    let scroll_data = payload.scroll_data.unwrap_or(ScrollData {
        total_scroll_events: 0,
        scroll_pattern: Vec::new(),
    });

    let record = build_result_record(
        &content,
        payload.answers.clone(),
        payload.reading_time_seconds,
        &scroll_data,
    );
    let statistics = reading_statistics(
        &content.text,
        payload.reading_time_seconds as f64,
        &content.level_code,
    );
    let analysis = analyze_line_view_times(&content.text, &scroll_data.scroll_pattern);
    let segments = analysis
        .as_ref()
        .map(|analysis| text_segments(&content.text, analysis));

    let minimal = MinimalResult {
        content_id: content.id.clone(),
        answers: payload.answers,
        timestamp: record.timestamp.clone(),
    };
    let token = match encode_minimal(&minimal) {
        Ok(token) => token,
        Err(error) => {
            log::error!("failed to encode result token: {}", error);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create result");
        }
    };

    let origin = request_origin(&headers, state.config.port);
    let share = share_url(&origin, &token);
    let qr_code = match qr::result_qr_data_uri(&share, record.accuracy) {
        Ok(data_uri) => data_uri,
        Err(error) => return qr_error_response(&error),
    };

    let chart_png = analysis.as_ref().and_then(|analysis| {
        match graph::reading_pace_chart(&analysis.progress_points, &ChartOptions::default()) {
            Ok(png) => Some(STANDARD.encode(png)),
            Err(error) => {
                log::warn!("could not render reading pace chart: {}", error);
                None
            }
        }
    });

    Json(json!({
        "result": record,
        "statistics": statistics,
        "analysis": analysis,
        "textSegments": segments,
        "token": token,
        "shareUrl": share,
        "qrCode": qr_code,
        "chartPng": chart_png,
    }))
    .into_response()
}

async fn get_result(Path(token): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    let minimal = match decode_minimal(&token) {
        Ok(minimal) => minimal,
        Err(_) => return error_response(StatusCode::NOT_FOUND, "Result not found"),
    };

    let lookup = {
        let library = state.library.read().unwrap();
        match library.content(&minimal.content_id) {
            Some(content) => ContentLookup::Found(content.clone()),
            None => ContentLookup::Missing,
        }
    };

    Json(reconstruct_result(&minimal, lookup)).into_response()
}

async fn get_result_qr(
    Path(token): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let minimal = match decode_minimal(&token) {
        Ok(minimal) => minimal,
        Err(_) => return error_response(StatusCode::NOT_FOUND, "Result not found"),
    };

    let lookup = {
        let library = state.library.read().unwrap();
        match library.content(&minimal.content_id) {
            Some(content) => ContentLookup::Found(content.clone()),
            None => ContentLookup::Missing,
        }
    };
    let reconstructed = reconstruct_result(&minimal, lookup);

    let origin = request_origin(&headers, state.config.port);
    let share = share_url(&origin, &token);
    match qr::result_qr_png(&share, reconstructed.accuracy) {
        Ok(png) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(Bytes::from(png)))
            .unwrap(),
        Err(error) => qr_error_response(&error),
    }
}

// ----- admin session -----

async fn admin_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Response {
    match login::verify_password(&payload.password, &state.admin_hash) {
        Ok(true) => {
            let mut cookie = Cookie::new(SESSION_COOKIE, login::create_session());
            cookie.set_path("/");
            cookie.set_http_only(true);
            (jar.add(cookie), Json(json!({ "success": true }))).into_response()
        }
        Ok(false) => error_response(StatusCode::UNAUTHORIZED, "パスワードが正しくありません"),
        Err(error) => {
            log::error!("password verification failed: {}", error);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "ログインに失敗しました")
        }
    }
}

async fn admin_logout(jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        login::destroy_session(cookie.value());
    }
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    (jar.remove(removal), Json(json!({ "success": true }))).into_response()
}

async fn admin_session(jar: CookieJar) -> impl IntoResponse {
    let authenticated = jar
        .get(SESSION_COOKIE)
        .map(|cookie| login::validate_session(cookie.value()))
        .unwrap_or(false);
    Json(json!({ "authenticated": authenticated }))
}

// ----- JSON views -----

/// Listing shape of a passage; `characterCount` here is the raw character
/// count of the body, not the weighted standard count.
fn content_view(content: &Content) -> serde_json::Value {
    json!({
        "id": content.id,
        "title": content.title,
        "level": content.level,
        "levelCode": content.level_code,
        "text": content.text,
        "explanation": content.explanation.clone().unwrap_or_default(),
        "characterCount": content.text.chars().count(),
        "images": content.images,
        "thumbnail": content.thumbnail,
        "orderIndex": content.order_index,
        "labelIds": content.label_ids,
        "questions": content
            .questions
            .iter()
            .map(question_view)
            .collect::<Vec<serde_json::Value>>(),
    })
}

/// Detail shape: the stored standard counts are exposed, with the raw
/// character count as fallback when none was entered.
fn single_content_view(content: &Content) -> serde_json::Value {
    let mut view = content_view(content);
    view["wordCount"] = json!(content.word_count);
    view["characterCount"] = match content.character_count {
        Some(count) if count > 0 => json!(count),
        _ => json!(content.text.chars().count()),
    };
    view
}

fn question_view(question: &Question) -> serde_json::Value {
    json!({
        "id": question.id,
        "question": question.question,
        "options": question.options,
        "correctAnswer": question.correct_answer,
        "explanation": question.explanation.clone().unwrap_or_default(),
    })
}

fn level_view(level: &Level, content_count: usize) -> serde_json::Value {
    json!({
        "id": level.id,
        "displayName": level.display_name,
        "altName": level.alt_name,
        "orderIndex": level.order_index,
        "isDefault": level.is_default,
        "_count": { "contents": content_count },
    })
}

fn label_view(label: &crate::content::Label, content_count: usize) -> serde_json::Value {
    json!({
        "id": label.id,
        "name": label.name,
        "color": label.color,
        "description": label.description,
        "_count": { "contents": content_count },
    })
}

fn about_view(about: &AboutPage) -> serde_json::Value {
    json!({
        "id": "default",
        "content": about.content,
        "images": about.images,
        "updatedAt": about.updated_at,
    })
}

// ----- helpers -----

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn store_error_response(error: &StoreError) -> Response {
    error_response(status_for(error), &error.to_string())
}

fn status_for(error: &StoreError) -> StatusCode {
    match error {
        StoreError::ContentNotFound
        | StoreError::ContentNotInLevel
        | StoreError::LevelNotFound
        | StoreError::LabelNotFound => StatusCode::NOT_FOUND,
        StoreError::ContentIdTaken
        | StoreError::LevelIdTaken
        | StoreError::LabelNameTaken => StatusCode::CONFLICT,
        StoreError::LevelFieldsMissing
        | StoreError::LevelIdInvalid
        | StoreError::LevelNameTooLong
        | StoreError::LevelAltNameTooLong
        | StoreError::DefaultLevelUndeletable
        | StoreError::MigrationTargetRequired
        | StoreError::MigrationTargetNotFound
        | StoreError::LabelNameRequired => StatusCode::BAD_REQUEST,
    }
}

fn qr_error_response(error: &QrGenerationError) -> Response {
    let status = match error {
        QrGenerationError::DataTooLong => StatusCode::BAD_REQUEST,
        QrGenerationError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &error.to_string())
}

/// Snapshot the library to disk; `None` means the save succeeded
fn persist_library(state: &AppState, library: &Library, failure_message: &str) -> Option<Response> {
    match saving::save_library(library, &state.config.data_file) {
        Ok(()) => None,
        Err(error) => {
            log::error!(
                "failed to save library to {}: {}",
                state.config.data_file,
                error
            );
            Some(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                failure_message,
            ))
        }
    }
}

fn request_origin(headers: &HeaderMap, port: u16) -> String {
    match headers.get(header::HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{}", host),
        None => format!("http://localhost:{}", port),
    }
}

fn xlsx_attachment(filename: &str, buffer: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(Bytes::from(buffer)))
        .unwrap()
}
