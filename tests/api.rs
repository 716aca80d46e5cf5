use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tours_api::config::{AppConfig, Environment};
use tours_api::store::{Collection, Document, DocumentStore, InMemoryDocumentStore, StoreError};
use tours_api::{app, AppState, QuerySpec, UserService};
use tower::ServiceExt;
use uuid::Uuid;

fn tour(name: &str, price: u64, rating: f64, difficulty: &str) -> Value {
    json!({
        "name": name,
        "duration": 7,
        "maxGroupSize": 15,
        "difficulty": difficulty,
        "ratingsAverage": rating,
        "ratingsQuantity": 10,
        "price": price,
        "summary": "A tour worth taking",
        "imageCover": "cover.jpg",
        "startDates": ["2021-06-19,10:00", "2021-07-20,10:00"]
    })
}

fn sample_tours() -> Vec<Value> {
    vec![
        tour("The Forest Hiker", 397, 4.7, "easy"),
        tour("The Sea Explorer", 497, 4.8, "medium"),
        tour("The Snow Adventurer", 997, 4.5, "hard"),
        tour("The City Wanderer", 1197, 4.8, "easy"),
        tour("The Park Camper", 1497, 4.9, "medium"),
        tour("The Sports Lover", 2997, 4.7, "hard"),
        tour("The Wine Taster", 1997, 4.5, "easy"),
    ]
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

async fn seeded(environment: Environment) -> Router {
    let router = app(AppState::in_memory(environment));
    for t in sample_tours() {
        let (status, body) = send(&router, Method::POST, "/api/v1/tours", Some(t)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }
    router
}

fn names(body: &Value) -> Vec<&str> {
    body["data"]["tours"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn list_sorts_and_paginates() {
    let router = seeded(Environment::Development).await;
    let (status, body) = get(&router, "/api/v1/tours?sort=-price&limit=2&page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["results"], 2);
    assert!(body["requestedAt"].is_string());
    assert_eq!(names(&body), vec!["The Sports Lover", "The Wine Taster"]);

    let (_, body) = get(&router, "/api/v1/tours?sort=-price&limit=2&page=2").await;
    assert_eq!(names(&body), vec!["The Park Camper", "The City Wanderer"]);
}

#[tokio::test]
async fn list_filters_with_comparison_operators() {
    let router = seeded(Environment::Development).await;
    let (_, body) = get(&router, "/api/v1/tours?price%5Bgte%5D=1000&difficulty=easy&sort=price").await;
    assert_eq!(names(&body), vec!["The City Wanderer", "The Wine Taster"]);

    let (_, body) = get(&router, "/api/v1/tours?duration%5Blt%5D=7").await;
    assert_eq!(body["results"], 0);
}

#[tokio::test]
async fn list_projects_requested_fields() {
    let router = seeded(Environment::Development).await;
    let (_, body) = get(&router, "/api/v1/tours?fields=name,price&limit=1").await;
    let first = body["data"]["tours"][0].as_object().unwrap();
    let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["id", "name", "price"]);

    let (_, body) = get(&router, "/api/v1/tours?limit=1").await;
    let first = body["data"]["tours"][0].as_object().unwrap();
    assert!(!first.contains_key("__v"));
    assert!(!first.contains_key("createdAt"));
    assert_eq!(first["durationWeeks"], json!(1.0));
}

#[tokio::test]
async fn unsupported_dollar_operator_is_client_error() {
    let router = seeded(Environment::Production).await;
    let (status, body) = get(&router, "/api/v1/tours?price%5B%24where%5D=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn top_five_cheap_alias() {
    let router = seeded(Environment::Development).await;
    let (status, body) = get(&router, "/api/v1/tours/top-5-cheap").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 5);
    assert_eq!(
        names(&body),
        vec![
            "The Park Camper",
            "The Sea Explorer",
            "The City Wanderer",
            "The Forest Hiker",
            "The Sports Lover"
        ]
    );
    let first = body["data"]["tours"][0].as_object().unwrap();
    assert!(!first.contains_key("duration"));
    assert!(first.contains_key("summary"));
}

#[tokio::test]
async fn secret_tours_stay_hidden() {
    let router = seeded(Environment::Development).await;
    let mut secret = tour("The Secret Hideaway", 50, 5.0, "easy");
    secret["secretTour"] = json!(true);
    let (status, body) = send(&router, Method::POST, "/api/v1/tours", Some(secret)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["tour"]["id"].as_str().unwrap().to_string();

    let (_, body) = get(&router, "/api/v1/tours?limit=100").await;
    assert_eq!(body["results"], 7);
    let (status, _) = get(&router, &format!("/api/v1/tours/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = get(&router, "/api/v1/tours/tour-stats").await;
    let easy = body["data"]["stats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["difficulty"] == "easy")
        .cloned()
        .unwrap();
    assert_eq!(easy["numTours"], 3);
}

#[tokio::test]
async fn crud_round_trip() {
    let router = seeded(Environment::Development).await;
    let (status, body) = send(&router, Method::POST, "/api/v1/tours", Some(tour("The Northern Lights", 1497, 4.9, "medium"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tour"]["slug"], "the-northern-lights");
    let id = body["data"]["tour"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/tours/{}", id);

    let (status, body) = send(&router, Method::PATCH, &uri, Some(json!({"price": 1297}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tour"]["price"], 1297);

    let (status, body) = get(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tour"]["price"], 1297);

    let (status, body) = send(&router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = get(&router, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No tour found with that ID");
}

#[tokio::test]
async fn create_failures_are_client_errors() {
    let router = seeded(Environment::Production).await;
    let (status, body) = send(&router, Method::POST, "/api/v1/tours", Some(tour("The Forest Hiker", 1, 4.0, "easy"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert!(body["message"].as_str().unwrap().contains("Duplicate field value"));

    let (status, body) = send(&router, Method::POST, "/api/v1/tours", Some(json!({"price": 10}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("A tour must have a name"));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/tours")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let router = seeded(Environment::Production).await;
    let (status, body) = get(&router, "/api/v1/tours/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "fail", "message": "Invalid id: not-a-uuid"}));
}

#[tokio::test]
async fn undecodable_path_segments_use_the_error_envelope() {
    let router = seeded(Environment::Production).await;
    for uri in ["/api/v1/tours/%FF", "/api/v1/tours/monthly-plan/%FF", "/api/v1/users/%FF"] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], "fail", "{}", uri);
        assert!(body["message"].as_str().unwrap().contains("Invalid UTF-8"), "{}", uri);
    }
}

#[tokio::test]
async fn unsupported_operator_is_rejected_on_empty_and_unmatched_data() {
    let empty = app(AppState::in_memory(Environment::Production));
    let (status, body) = get(&empty, "/api/v1/tours?price%5B%24where%5D=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid filter operator: $where");

    let router = seeded(Environment::Production).await;
    let (status, _) = get(&router, "/api/v1/tours?difficulty=extreme&price%5B%24where%5D=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn monthly_plan_for_year() {
    let router = seeded(Environment::Development).await;
    let (status, body) = get(&router, "/api/v1/tours/monthly-plan/2021").await;
    assert_eq!(status, StatusCode::OK);
    let plan = body["data"]["plan"].as_array().unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0]["month"], 6);
    assert_eq!(plan[0]["numTourStarts"], 7);

    let (status, _) = get(&router, "/api/v1/tours/monthly-plan/twenty").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unmatched_route_is_not_found() {
    let router = seeded(Environment::Production).await;
    let (status, body) = get(&router, "/api/v1/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "fail", "message": "Can't find /api/v1/nowhere on this server!"}));

    let (status, body) = send(&router, Method::PUT, "/api/v1/tours", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Can't find /api/v1/tours on this server!");
}

#[tokio::test]
async fn users_are_read_only() {
    let state = AppState::in_memory(Environment::Development);
    UserService::seed(
        state.store.as_ref(),
        vec![json!({"name": "Leo Gillespie", "email": "leo@example.com", "role": "guide"})],
    )
    .await
    .unwrap();
    let router = app(state);

    let (status, body) = get(&router, "/api/v1/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 1);
    let id = body["data"]["users"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = get(&router, &format!("/api/v1/users/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "leo@example.com");

    let (status, body) = get(&router, &format!("/api/v1/users/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid ID");

    let (status, body) = send(&router, Method::POST, "/api/v1/users", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "This route is not yet defined!");
}

/// Store whose reads fail or panic.
struct BrokenStore {
    panic: bool,
}

impl BrokenStore {
    fn fail(&self) -> Result<(), StoreError> {
        if self.panic {
            panic!("store exploded");
        }
        Err(StoreError::Unavailable("connection reset".into()))
    }
}

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn find(&self, _: &Collection, _: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        tokio::task::yield_now().await;
        self.fail().map(|_| Vec::new())
    }
    async fn scan(&self, _: &Collection) -> Result<Vec<Document>, StoreError> {
        self.fail().map(|_| Vec::new())
    }
    async fn find_by_id(&self, _: &Collection, _: Uuid) -> Result<Option<Document>, StoreError> {
        self.fail().map(|_| None)
    }
    async fn insert(&self, _: &Collection, doc: Document) -> Result<Document, StoreError> {
        self.fail().map(|_| doc)
    }
    async fn update(&self, _: &Collection, _: Uuid, _: Document) -> Result<Option<Document>, StoreError> {
        self.fail().map(|_| None)
    }
    async fn delete(&self, _: &Collection, _: Uuid) -> Result<bool, StoreError> {
        self.fail().map(|_| false)
    }
    async fn ping(&self) -> Result<(), StoreError> {
        self.fail()
    }
}

fn broken(environment: Environment, panic: bool) -> Router {
    let config = AppConfig {
        environment,
        ..AppConfig::default()
    };
    app(AppState::new(Arc::new(BrokenStore { panic }), &config))
}

#[tokio::test]
async fn store_failure_in_production_is_generic() {
    let (status, body) = get(&broken(Environment::Production, false), "/api/v1/tours").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "message": "Something went very wrong!"}));
}

#[tokio::test]
async fn store_failure_in_development_has_diagnostics() {
    let (status, body) = get(&broken(Environment::Development, false), "/api/v1/tours").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["isOperational"], false);
    assert!(body["message"].as_str().unwrap().contains("connection reset"));
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn panics_become_one_generic_response() {
    // Inside a captured store call.
    let (status, body) = get(&broken(Environment::Production, true), "/api/v1/tours").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Something went very wrong!");

    // Outside capture: the readiness probe calls the store directly.
    let (status, body) = get(&broken(Environment::Production, true), "/ready").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "message": "Something went very wrong!"}));
}

#[tokio::test]
async fn readiness_reports_store_state() {
    let (status, body) = get(&app(AppState::in_memory(Environment::Production)), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");

    let (status, body) = get(&broken(Environment::Production, false), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}
