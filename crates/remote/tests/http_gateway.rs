use std::time::Duration;

use chrono::NaiveDate;
use course_core::model::{CourseId, SectionId, XpPeriod, XpSnapshot};
use remote::{
    ActivityGateway, HttpConfig, HttpGateway, ProgressionGateway, RemoteError, SectionGateway,
    XpHistoryGateway,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(HttpConfig::new(server.uri()).with_token("test-token")).unwrap()
}

#[tokio::test]
async fn complete_section_posts_flag_and_maps_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sections/s1/complete"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "isCompleted": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progressData": { "level": 2, "totalXp": 650, "currentLevelXp": 150 },
            "section": { "_id": "s1", "title": "Basics", "isCompleted": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = gateway(&server)
        .complete_section(&SectionId::new("s1"))
        .await
        .unwrap();
    let partial = completion.progression.unwrap();
    assert_eq!(partial.level, Some(2));
    assert_eq!(partial.total_xp, Some(650));
    assert_eq!(partial.level_progress, None);
    let section = completion.section.unwrap();
    assert_eq!(section.id(), &SectionId::new("s1"));
    assert!(section.is_completed());
}

#[tokio::test]
async fn missing_section_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sections/gone/complete"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .complete_section(&SectionId::new("gone"))
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::NotFound);
}

#[tokio::test]
async fn server_errors_keep_status_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile/progression"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let err = gateway(&server).fetch_progression().await.unwrap_err();
    assert_eq!(err, RemoteError::Status(503));
    assert!(err.is_transient());
}

#[tokio::test]
async fn progression_accepts_legacy_next_level_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile/progression"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "level": 3,
            "totalXp": 1075,
            "currentLevelXp": 25,
            "xpToNextLevel": 600,
            "levelProgress": 4.17
        })))
        .mount(&server)
        .await;

    let progression = gateway(&server).fetch_progression().await.unwrap();
    assert_eq!(progression.level, 3);
    assert_eq!(progression.total_xp_for_next_level, 600);
    assert!((progression.level_progress - 4.17).abs() < f64::EPSILON);
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile/progression"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = gateway(&server).fetch_progression().await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile/progression"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "level": 1 }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = HttpConfig::new(server.uri());
    config.timeout = Duration::from_millis(100);
    let err = HttpGateway::new(config)
        .unwrap()
        .fetch_progression()
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::Timeout);
}

#[tokio::test]
async fn xp_history_sends_period_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/activity/xp-history"))
        .and(query_param("period", "weekly"))
        .and(query_param("limit", "8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2023-11-12T00:00:00.000Z", "xp": 1200, "level": 3 },
            { "date": "2023-11-05", "xp": 900 }
        ])))
        .mount(&server)
        .await;

    let history = gateway(&server)
        .fetch_xp_history(XpPeriod::Weekly, 8)
        .await
        .unwrap();
    assert_eq!(
        history,
        vec![
            XpSnapshot::new(NaiveDate::from_ymd_opt(2023, 11, 12).unwrap(), 1200),
            XpSnapshot::new(NaiveDate::from_ymd_opt(2023, 11, 5).unwrap(), 900),
        ]
    );
}

#[tokio::test]
async fn activity_writes_post_camel_case_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/activity/level-up"))
        .and(body_json(json!({ "level": 4 })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/activity/section-completion"))
        .and(body_json(json!({ "courseId": "c1", "sectionId": "s2", "xpEarned": 250 })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    gateway.record_level_up(4).await.unwrap();
    gateway
        .record_section_completion(&CourseId::new("c1"), &SectionId::new("s2"), 250)
        .await
        .unwrap();
}
