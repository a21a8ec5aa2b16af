use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use lineup_api::{create_routes, AppState};
use lineup_core::config::{ReminderConfig, RotationConfig, VerificationConfig};
use lineup_dispatcher::{
    AssignmentService, DispatchSelector, EventReactors, NotificationFanout, RotationService,
    VerificationService,
};
use lineup_infrastructure::DatabaseManager;
use lineup_testing_utils::{CloserBuilder, MockPushProvider};

// 真实sqlite仓储 + mock推送组成的完整栈
async fn test_app() -> (Router, Arc<DatabaseManager>) {
    let database = Arc::new(DatabaseManager::new("sqlite::memory:", 1).await.unwrap());

    let lead_repo = database.lead_repository();
    let closer_repo = database.closer_repository();
    let activity_repo = database.activity_repository();
    let reminder_repo = database.reminder_repository();
    let token_repo = database.device_token_repository();

    let provider = Arc::new(MockPushProvider::new());
    let fanout = Arc::new(NotificationFanout::new(
        token_repo.clone(),
        provider,
        Duration::from_secs(5),
    ));
    let selector = Arc::new(DispatchSelector::new(closer_repo.clone(), lead_repo.clone()));
    let assignment = Arc::new(AssignmentService::new(
        lead_repo.clone(),
        activity_repo.clone(),
        fanout.clone(),
    ));
    let rotation = Arc::new(RotationService::new(
        closer_repo.clone(),
        activity_repo.clone(),
        RotationConfig::default().order_gap,
    ));
    let verification = Arc::new(VerificationService::new(
        lead_repo.clone(),
        activity_repo.clone(),
        selector.clone(),
        assignment.clone(),
        VerificationConfig::default(),
    ));
    let reactors = Arc::new(EventReactors::new(
        lead_repo,
        closer_repo,
        activity_repo,
        reminder_repo,
        token_repo,
        selector,
        assignment,
        rotation,
        verification,
        fanout,
        ReminderConfig::default(),
    ));

    let state = AppState {
        reactors,
        database: database.clone(),
        metrics_handle: None,
    };
    (create_routes(state), database)
}

async fn seed_closer(database: &DatabaseManager, id: &str, name: &str, order: i64) {
    let closer = CloserBuilder::new()
        .with_id(id)
        .with_name(name)
        .with_order(order)
        .build();
    database.closer_repository().create(&closer).await.unwrap();
}

fn request(method: &str, uri: &str, caller: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = caller {
        builder = builder
            .header("x-user-id", user_id)
            .header("x-user-role", role)
            .header("x-team-id", "team-1");
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _db) = test_app().await;
    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_metrics_disabled_returns_404() {
    let (app, _db) = test_app().await;
    let response = app
        .oneshot(request("GET", "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_lead_requires_identity() {
    let (app, _db) = test_app().await;
    let response = app
        .oneshot(request(
            "POST",
            "/api/leads",
            None,
            Some(json!({"customer_name": "王女士", "customer_phone": "555-0100"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_lead_dispatches_to_front_of_lineup() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;
    seed_closer(&db, "c-2", "李四", 2000).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/leads",
            Some(("setter-1", "SETTER")),
            Some(json!({
                "id": "lead-1",
                "customer_name": "王女士",
                "customer_phone": "555-0100",
                "customer_address": "幸福路1号"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["escalated"], false);
    assert_eq!(body["data"]["assigned_closer"]["id"], "c-1");
    assert_eq!(body["data"]["lead"]["assigned_closer_id"], "c-1");
}

#[tokio::test]
async fn test_create_lead_escalates_without_closers() {
    let (app, _db) = test_app().await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/leads",
            Some(("setter-1", "SETTER")),
            Some(json!({"id": "lead-1", "customer_name": "王女士", "customer_phone": "555-0100"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["escalated"], true);
    assert!(body["data"]["assigned_closer"].is_null());
}

#[tokio::test]
async fn test_get_lead_and_missing_lead() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;

    let create = request(
        "POST",
        "/api/leads",
        Some(("setter-1", "SETTER")),
        Some(json!({"id": "lead-1", "customer_name": "王女士", "customer_phone": "555-0100"})),
    );
    app.clone().oneshot(create).await.unwrap();

    let found = app
        .clone()
        .oneshot(request("GET", "/api/leads/lead-1", None, None))
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let body = body_json(found).await;
    assert_eq!(body["data"]["id"], "lead-1");

    let missing = app
        .oneshot(request("GET", "/api/leads/ghost", None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = body_json(missing).await;
    assert_eq!(body["error"]["type"], "LEAD_NOT_FOUND");
}

#[tokio::test]
async fn test_accept_and_disposition_flow() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;

    let create = request(
        "POST",
        "/api/leads",
        Some(("setter-1", "SETTER")),
        Some(json!({"id": "lead-1", "customer_name": "王女士", "customer_phone": "555-0100"})),
    );
    app.clone().oneshot(create).await.unwrap();

    // 非被指派人不能接单
    let wrong = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/leads/lead-1/accept",
            Some(("c-2", "CLOSER")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let accepted = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/leads/lead-1/accept",
            Some(("c-1", "CLOSER")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    let body = body_json(accepted).await;
    assert_eq!(body["data"]["lead"]["status"], "ACCEPTED");
    assert_eq!(body["data"]["already_accepted"], false);

    let disposed = app
        .oneshot(request(
            "POST",
            "/api/leads/lead-1/disposition",
            Some(("c-1", "CLOSER")),
            Some(json!({"disposition": "SOLD"})),
        ))
        .await
        .unwrap();
    assert_eq!(disposed.status(), StatusCode::OK);
    let body = body_json(disposed).await;
    assert_eq!(body["data"]["status"], "SOLD");
}

#[tokio::test]
async fn test_disposition_on_terminal_lead_conflicts() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;

    let create = request(
        "POST",
        "/api/leads",
        Some(("setter-1", "SETTER")),
        Some(json!({"id": "lead-1", "customer_name": "王女士", "customer_phone": "555-0100"})),
    );
    app.clone().oneshot(create).await.unwrap();
    for uri in ["/api/leads/lead-1/accept", "/api/leads/lead-1/disposition"] {
        let body = if uri.ends_with("disposition") {
            Some(json!({"disposition": "SOLD"}))
        } else {
            None
        };
        app.clone()
            .oneshot(request("POST", uri, Some(("c-1", "CLOSER")), body))
            .await
            .unwrap();
    }

    let again = app
        .oneshot(request(
            "POST",
            "/api/leads/lead-1/disposition",
            Some(("c-1", "CLOSER")),
            Some(json!({"disposition": "NO_SALE"})),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let body = body_json(again).await;
    assert_eq!(body["error"]["type"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_duty_toggle_and_reorder_permissions() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;

    // closer自己可以切换排班
    let off = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/closers/c-1/duty",
            Some(("c-1", "CLOSER")),
            Some(json!({"on_duty": false})),
        ))
        .await
        .unwrap();
    assert_eq!(off.status(), StatusCode::OK);
    let body = body_json(off).await;
    assert_eq!(body["data"]["closer"]["status"], "OFF_DUTY");

    // 非管理角色不能调位次
    let denied = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/closers/c-1/reorder",
            Some(("c-1", "CLOSER")),
            Some(json!({"order": 500})),
        ))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let reordered = app
        .oneshot(request(
            "POST",
            "/api/closers/c-1/reorder",
            Some(("mgr-1", "MANAGER")),
            Some(json!({"order": 500})),
        ))
        .await
        .unwrap();
    assert_eq!(reordered.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_token_registration_endpoints() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;

    let added = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/closers/c-1/tokens",
            Some(("c-1", "CLOSER")),
            Some(json!({"token": "device-token-1"})),
        ))
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        db.device_token_repository().tokens_for("c-1").await.unwrap(),
        vec!["device-token-1"]
    );

    let removed = app
        .oneshot(request(
            "POST",
            "/api/closers/c-1/tokens/remove",
            Some(("c-1", "CLOSER")),
            Some(json!({"token": "device-token-1"})),
        ))
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    assert!(db
        .device_token_repository()
        .tokens_for("c-1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_team_views() {
    let (app, db) = test_app().await;
    seed_closer(&db, "c-1", "张三", 1000).await;
    seed_closer(&db, "c-2", "李四", 2000).await;

    let create = request(
        "POST",
        "/api/leads",
        Some(("setter-1", "SETTER")),
        Some(json!({"id": "lead-1", "customer_name": "王女士", "customer_phone": "555-0100"})),
    );
    app.clone().oneshot(create).await.unwrap();

    let stats = app
        .clone()
        .oneshot(request("GET", "/api/teams/team-1/stats", None, None))
        .await
        .unwrap();
    assert_eq!(stats.status(), StatusCode::OK);
    let body = body_json(stats).await;
    assert_eq!(body["data"]["leads"]["total_leads"], 1);

    let lineup = app
        .clone()
        .oneshot(request("GET", "/api/teams/team-1/lineup", None, None))
        .await
        .unwrap();
    assert_eq!(lineup.status(), StatusCode::OK);
    let body = body_json(lineup).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let activity = app
        .clone()
        .oneshot(request("GET", "/api/teams/team-1/activity", None, None))
        .await
        .unwrap();
    assert_eq!(activity.status(), StatusCode::OK);
    let body = body_json(activity).await;
    assert!(!body["data"].as_array().unwrap().is_empty());

    let bad_limit = app
        .oneshot(request(
            "GET",
            "/api/teams/team-1/activity?limit=0",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(bad_limit.status(), StatusCode::BAD_REQUEST);
}
