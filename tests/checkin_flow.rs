use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{SecondsFormat, Timelike, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use courtkeeper::config::Config;
use courtkeeper::state::AppState;
use courtkeeper::{app, db};

const COURT_LAT: f64 = -27.4698;
const COURT_LON: f64 = 153.0251;

// One degree of latitude is ~111.1 km, so these offsets put the caller
// roughly 15 m and 35 m from the court.
const OFFSET_15M: f64 = 0.000135;
const OFFSET_35M: f64 = 0.000315;

fn test_app() -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    let state = AppState::new(pool, Config::default());
    (app(state), tmp)
}

/// The current wall-clock minute, so a freshly booked slot covers "now".
fn current_slot() -> String {
    Utc::now()
        .with_second(0)
        .unwrap()
        .with_nanosecond(0)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn reserve(app: &Router, uid: &str, court_id: &str) {
    let request = Request::builder()
        .method("POST")
        .uri("/rsvps")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("uid={}", uid))
        .body(Body::from(
            json!({
                "courtId": court_id,
                "courtName": "Bris Court 42",
                "startsAt": current_slot(),
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn checkin_request(uid: &str, court_id: &str, lat_offset: f64) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/checkins")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("uid={}", uid))
        .body(Body::from(
            json!({
                "courtId": court_id,
                "courtName": "Bris Court 42",
                "courtLat": COURT_LAT,
                "courtLon": COURT_LON,
                "lat": COURT_LAT + lat_offset,
                "lon": COURT_LON,
                "accuracy": 8.0,
                "source": "gps",
            })
            .to_string(),
        ))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn checkin_in_range_succeeds_and_court_goes_live() {
    let (app, _tmp) = test_app();
    reserve(&app, "user-a", "bris-42").await;

    let response = app
        .clone()
        .oneshot(checkin_request("user-a", "bris-42", OFFSET_15M))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    let dist = body["dist"].as_f64().unwrap();
    assert!(dist > 10.0 && dist < 20.0, "dist {}", dist);
    assert_eq!(body["checkins"].as_array().unwrap().len(), 1);
    assert_eq!(body["checkins"][0]["user_id"], json!("user-a"));

    let active = app
        .oneshot(
            Request::builder()
                .uri("/checkins/active")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(active.status(), StatusCode::OK);
    let body = body_json(active).await;
    let ids = body["courtIds"].as_array().unwrap();
    assert!(ids.contains(&json!("bris-42")));
}

#[tokio::test]
async fn checkin_out_of_fence_reports_measured_distance() {
    let (app, _tmp) = test_app();
    reserve(&app, "user-a", "bris-42").await;

    let response = app
        .clone()
        .oneshot(checkin_request("user-a", "bris-42", OFFSET_35M))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("too far"));
    let dist = body["dist"].as_f64().unwrap();
    assert!(dist > 30.0 && dist < 40.0, "dist {}", dist);

    // The failed attempt must not have gone live.
    let active = app
        .oneshot(
            Request::builder()
                .uri("/checkins/active")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(active).await;
    assert!(body["courtIds"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn checkin_without_reservation_is_rejected() {
    let (app, _tmp) = test_app();

    let response = app
        .oneshot(checkin_request("user-a", "bris-42", OFFSET_15M))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("no active reservation"));
}

#[tokio::test]
async fn checkin_without_uid_cookie_is_unauthorized() {
    let (app, _tmp) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/checkins")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "courtId": "bris-42",
                "courtName": "Bris Court 42",
                "courtLat": COURT_LAT,
                "courtLon": COURT_LON,
                "lat": COURT_LAT,
                "lon": COURT_LON,
                "source": "gps",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn coordinates_far_from_claimed_court_fail_the_sanity_bound() {
    let (app, _tmp) = test_app();
    reserve(&app, "user-a", "bris-42").await;

    // ~1.1 km out: rejected before the tracker's fence is consulted.
    let response = app
        .oneshot(checkin_request("user-a", "bris-42", 0.01))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("too far"));
    assert!(body["dist"].as_f64().unwrap() > 500.0);
}

#[tokio::test]
async fn body_missing_coordinates_is_bad_request() {
    let (app, _tmp) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/checkins")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "uid=user-a")
        .body(Body::from(
            json!({ "courtId": "bris-42", "courtName": "Bris Court 42" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["error"], json!("invalid body"));
}

#[tokio::test]
async fn out_of_range_latitude_is_invalid() {
    let (app, _tmp) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/checkins")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "uid=user-a")
        .body(Body::from(
            json!({
                "courtId": "bris-42",
                "courtName": "Bris Court 42",
                "courtLat": COURT_LAT,
                "courtLon": COURT_LON,
                "lat": 95.0,
                "lon": COURT_LON,
                "source": "gps",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_source_is_invalid() {
    let (app, _tmp) = test_app();
    reserve(&app, "user-a", "bris-42").await;

    let request = Request::builder()
        .method("POST")
        .uri("/checkins")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "uid=user-a")
        .body(Body::from(
            json!({
                "courtId": "bris-42",
                "courtName": "Bris Court 42",
                "courtLat": COURT_LAT,
                "courtLon": COURT_LON,
                "lat": COURT_LAT,
                "lon": COURT_LON,
                "source": "carrier-pigeon",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn home_court_designations_are_counted() {
    let (app, _tmp) = test_app();

    for uid in ["user-a", "user-b"] {
        let request = Request::builder()
            .method("PUT")
            .uri("/courts/bris-42/home-court")
            .header(header::COOKIE, format!("uid={}", uid))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Switching home court moves the designation instead of duplicating it.
    let request = Request::builder()
        .method("PUT")
        .uri("/courts/park-7/home-court")
        .header(header::COOKIE, "uid=user-b")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let count = |court: &str| {
        Request::builder()
            .uri(format!("/courts/{}/home-court-count", court))
            .body(Body::empty())
            .unwrap()
    };
    let body = body_json(app.clone().oneshot(count("bris-42")).await.unwrap()).await;
    assert_eq!(body["count"], json!(1));
    let body = body_json(app.oneshot(count("park-7")).await.unwrap()).await;
    assert_eq!(body["count"], json!(1));
}

#[tokio::test]
async fn responses_mint_a_uid_cookie_for_new_browsers() {
    let (app, _tmp) = test_app();

    let bare = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(bare.headers().get(header::SET_COOKIE).is_some());

    let returning = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::COOKIE, "uid=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(returning.headers().get(header::SET_COOKIE).is_none());
}
