use std::sync::Arc;

use chrono::{TimeZone, Utc};
use daybook_core::clock::SystemClock;
use daybook_core::error::DaybookError;
use daybook_core::source::{CalendarSource, Platform};
use daybook_core::EventTime;
use daybook_provider_google::GoogleCalendarSource;
use daybook_provider_google::token_store::{StoredToken, TokenResponse, TokenStore};
use mockito::Matcher;
use tempfile::TempDir;

const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

fn signed_in_source(dir: &TempDir, base_url: &str, scope: &str) -> GoogleCalendarSource {
    let store = TokenStore::new(dir.path().join("token.json"));
    let token = StoredToken::from_response(
        TokenResponse {
            access_token: "ya29.test".into(),
            token_type: Some("Bearer".into()),
            expires_in: Some(3600),
            expires_at: None,
            scope: scope.into(),
        },
        Utc::now(),
    );
    store.save(&token).unwrap();

    GoogleCalendarSource::new(store, Some(base_url), Platform::Web, Arc::new(SystemClock)).unwrap()
}

fn window() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    (
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
    )
}

#[tokio::test]
async fn test_fetch_events_sends_window_and_maps_items() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), READONLY_SCOPE);

    let body = r#"{
        "items": [
            {
                "id": "timed",
                "summary": "Planning",
                "start": {"dateTime": "2024-06-10T09:00:00Z"},
                "end": {"dateTime": "2024-06-10T10:00:00Z"}
            },
            {
                "id": "allday",
                "start": {"date": "2024-06-12"},
                "end": {"date": "2024-06-13"}
            },
            {"id": "cancelled-without-times"}
        ]
    }"#;

    let mock = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer ya29.test")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("timeMin".into(), "2024-06-01T00:00:00.000Z".into()),
            Matcher::UrlEncoded("timeMax".into(), "2024-06-30T23:59:59.000Z".into()),
            Matcher::UrlEncoded("showDeleted".into(), "false".into()),
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("maxResults".into(), "50".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let (start, end) = window();
    let events = source.fetch_events(start, end).await.unwrap();

    mock.assert_async().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Planning");
    assert_eq!(events[0].calendar_title, "Google Calendar");
    assert_eq!(events[1].title, "No Title");
    assert!(events[1].is_all_day());
    assert_eq!(events[1].end, Some(events[1].start.clone()));
    assert!(matches!(events[1].start, EventTime::Date(_)));
}

#[tokio::test]
async fn test_empty_response_is_empty_list() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), READONLY_SCOPE);

    let _mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"kind": "calendar#events"}"#)
        .create_async()
        .await;

    let (start, end) = window();
    assert!(source.fetch_events(start, end).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_event_is_skipped_not_fatal() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), READONLY_SCOPE);

    let body = r#"{
        "items": [
            {
                "id": "garbled",
                "summary": "Broken export",
                "start": {"dateTime": "next tuesday"},
                "end": {"dateTime": "2024-06-11T10:00:00Z"}
            },
            {
                "id": "fine",
                "summary": "Review",
                "start": {"dateTime": "2024-06-11T14:00:00Z"},
                "end": {"dateTime": "2024-06-11T15:00:00Z"}
            },
            {
                "id": "bad-day",
                "start": {"date": "June 12"},
                "end": {"date": "2024-06-13"}
            }
        ]
    }"#;

    let _mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let (start, end) = window();
    let events = source.fetch_events(start, end).await.unwrap();

    let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["fine"]);
}

#[tokio::test]
async fn test_401_is_unauthenticated() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), READONLY_SCOPE);

    let _mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error": {"code": 401, "message": "Invalid Credentials"}}"#)
        .create_async()
        .await;

    let (start, end) = window();
    let err = source.fetch_events(start, end).await.unwrap_err();

    assert!(matches!(err, DaybookError::Unauthenticated(ref m) if m.contains("Invalid Credentials")));
    assert!(err.needs_reauthentication());
}

#[tokio::test]
async fn test_403_scope_and_other_failures() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), READONLY_SCOPE);
    let (start, end) = window();

    let scope_mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(
            r#"{"error": {"code": 403, "message": "Request had insufficient authentication scopes."}}"#,
        )
        .create_async()
        .await;

    let err = source.fetch_events(start, end).await.unwrap_err();
    assert!(matches!(err, DaybookError::InsufficientScope(_)));
    scope_mock.remove_async().await;

    let _server_error = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let err = source.fetch_events(start, end).await.unwrap_err();
    assert!(matches!(err, DaybookError::Transient(ref m) if m.contains("503")));
}

#[tokio::test]
async fn test_token_without_calendar_scope_never_calls_api() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), "openid email");

    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (start, end) = window();
    let err = source.fetch_events(start, end).await.unwrap_err();

    assert!(matches!(err, DaybookError::InsufficientScope(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_calendar_list() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let source = signed_in_source(&dir, &server.url(), READONLY_SCOPE);

    let _mock = server
        .mock("GET", "/users/me/calendarList")
        .with_status(200)
        .with_body(
            r##"{"items": [
                {"id": "primary@example.com", "summary": "Me", "backgroundColor": "#16a765", "primary": true},
                {"id": "holidays@group.v.calendar.google.com", "summary": "Holidays"}
            ]}"##,
        )
        .create_async()
        .await;

    let calendars = source.get_calendars().await.unwrap();

    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[0].title, "Me");
    assert_eq!(calendars[0].color.as_deref(), Some("#16a765"));
    assert_eq!(calendars[1].color, None);
}

#[tokio::test]
async fn test_availability_by_platform() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::new(dir.path().join("token.json"));

    for (platform, available) in [
        (Platform::Web, true),
        (Platform::Android, true),
        (Platform::Ios, false),
    ] {
        let source =
            GoogleCalendarSource::new(store.clone(), None, platform, Arc::new(SystemClock)).unwrap();
        assert_eq!(source.is_available(), available);
    }
}
