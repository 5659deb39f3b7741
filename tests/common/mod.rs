#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use pantry_client::{
    ApiClient, AppServices, Config,
    feedback::{AutoConfirm, ToastLog},
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Shared state of the fake backend: what it was asked, what it stores, and
/// switches that make individual routes misbehave.
#[derive(Default)]
pub struct Backend {
    requests: Mutex<Vec<Recorded>>,
    grocery: Mutex<Vec<Value>>,
    fridge_added: Mutex<Vec<Value>>,
    meal_plan: Mutex<Option<Value>>,
    meals_logged: Mutex<Vec<Value>>,
    water: AtomicU64,
    next_id: AtomicUsize,
    /// Answer fridge inserts with 422.
    pub reject_fridge_insert: AtomicBool,
    /// Store fridge inserts but answer with a status line instead of the item.
    pub bare_fridge_insert: AtomicBool,
    /// Drop the connection on fridge inserts without answering.
    pub drop_fridge_insert: AtomicBool,
}

impl Backend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn last_to(&self, method: Method, path: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
    }

    pub fn set_grocery(&self, items: Vec<Value>) {
        *self.grocery.lock().unwrap() = items;
    }

    pub fn grocery(&self) -> Vec<Value> {
        self.grocery.lock().unwrap().clone()
    }

    pub fn set_meal_plan(&self, plan: Value) {
        *self.meal_plan.lock().unwrap() = Some(plan);
    }

    pub fn meal_plan(&self) -> Option<Value> {
        self.meal_plan.lock().unwrap().clone()
    }

    pub fn water(&self) -> u64 {
        self.water.load(Ordering::SeqCst)
    }
}

pub struct MockServer {
    pub base_url: String,
    pub backend: Arc<Backend>,
}

pub async fn spawn_backend() -> MockServer {
    let backend = Arc::new(Backend::default());
    let app = Router::new().fallback(dispatch).with_state(Arc::clone(&backend));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend crashed");
    });

    MockServer {
        base_url: format!("http://{addr}"),
        backend,
    }
}

pub fn services(base_url: &str, confirm: bool) -> (AppServices, Arc<ToastLog>) {
    let toasts = Arc::new(ToastLog::new());
    let services = AppServices::new(
        ApiClient::unauthenticated(&Config::new(base_url)),
        toasts.clone(),
        Arc::new(AutoConfirm(confirm)),
    );
    (services, toasts)
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn fridge_fixture() -> Vec<Value> {
    vec![
        json!({
            "id": "f1",
            "ingredientName": "Milk",
            "name": "Milk",
            "category": "dairy",
            "quantity": 1,
            "unit": "liter",
            "expirationDate": "2099-01-01",
            "expiryDate": "2099-01-01",
            "location": "Main fridge"
        }),
        json!({
            "id": "f2",
            "ingredientName": "Spinach",
            "quantity": "2",
            "unit": "bunch",
            "expirationDate": "2000-01-01"
        }),
    ]
}

fn merge(mut target: Value, patch: &Value) -> Value {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    target
}

fn generated_plan(request: &Value) -> Value {
    json!({
        "_id": "mp-generated",
        "start_date": request["start_date"],
        "end_date": request["end_date"],
        "meals": {
            "monday": {
                "breakfast": { "recipe_id": "r1", "recipe_title": "Spinach omelette", "servings": 2 },
                "snacks": [{ "recipe_id": "r9", "recipe_title": "Trail mix" }]
            }
        }
    })
}

async fn dispatch(
    State(backend): State<Arc<Backend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    backend.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (Method::GET, ["fridge", "items"]) => {
            let mut items = fridge_fixture();
            items.extend(backend.fridge_added.lock().unwrap().iter().cloned());
            ok(json!({ "items": items }))
        }
        (Method::POST, ["fridge", "items"]) => {
            if backend.drop_fridge_insert.load(Ordering::SeqCst) {
                // the connection task dies with the handler, so the client sees a
                // closed socket instead of a response
                panic!("fridge insert dropped on purpose");
            }
            if backend.reject_fridge_insert.load(Ordering::SeqCst) {
                return fail(StatusCode::UNPROCESSABLE_ENTITY, "Fridge is full");
            }
            let id = backend.next_id.fetch_add(1, Ordering::SeqCst);
            let item = merge(body, &json!({ "id": format!("srv-{id}") }));
            backend.fridge_added.lock().unwrap().push(item.clone());
            if backend.bare_fridge_insert.load(Ordering::SeqCst) {
                return (
                    StatusCode::CREATED,
                    Json(json!({ "status": "success", "message": "Item added to fridge" })),
                )
                    .into_response();
            }
            ok(json!({ "item": item }))
        }
        (Method::PUT, ["fridge", "items", id]) => {
            let base = fridge_fixture()
                .into_iter()
                .find(|item| item["id"] == *id)
                .unwrap_or_else(|| json!({ "id": id, "name": "Unknown" }));
            ok(json!({ "item": merge(base, &body) }))
        }
        (Method::DELETE, ["fridge", "items", _]) => ok(json!({ "deleted": true })),
        (Method::GET, ["grocery", "items"]) => Json(json!({
            "listName": "Weekly shop",
            "items": backend.grocery(),
        }))
        .into_response(),
        (Method::POST, ["grocery", "toggle-purchased", index]) => {
            let mut items = backend.grocery.lock().unwrap();
            match index.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(item) => {
                    let purchased = item["purchased"].as_bool().unwrap_or(false);
                    item["purchased"] = json!(!purchased);
                    ok(json!({ "toggled": true }))
                }
                None => fail(StatusCode::NOT_FOUND, "Item not found"),
            }
        }
        (Method::DELETE, ["grocery", "purchased"]) => {
            backend
                .grocery
                .lock()
                .unwrap()
                .retain(|item| !item["purchased"].as_bool().unwrap_or(false));
            ok(json!({ "cleared": true }))
        }
        (Method::POST, ["grocery", "from-meal-plan"]) => ok(json!({
            "items": [
                { "name": "Eggs", "quantity": 6, "unit": "pieces", "category": "Dairy" },
                { "name": "Spinach", "quantity": "1", "unit": "bunch", "category": "Produce" }
            ]
        })),
        (Method::GET, ["meal-plans"]) => {
            let plans: Vec<Value> = backend.meal_plan().into_iter().collect();
            ok(json!({ "meal_plans": plans }))
        }
        (Method::POST, ["meal-plans", "generate"]) => {
            let plan = generated_plan(&body);
            backend.set_meal_plan(plan.clone());
            ok(json!({ "meal_plan": plan }))
        }
        (Method::POST, ["meal-plans"]) => {
            let plan = merge(body, &json!({ "_id": "mp-1" }));
            backend.set_meal_plan(plan.clone());
            ok(json!({ "meal_plan": plan }))
        }
        (Method::PUT, ["meal-plans", _]) => {
            backend.set_meal_plan(body.clone());
            ok(json!({ "meal_plan": body }))
        }
        (Method::GET, ["nutrition", "daily", date]) => {
            let meals: Vec<Value> = backend
                .meals_logged
                .lock()
                .unwrap()
                .iter()
                .filter(|meal| meal["date"] == *date)
                .cloned()
                .collect();
            let calories: f64 = meals
                .iter()
                .filter_map(|meal| meal["nutrition"]["calories"].as_f64())
                .sum();
            ok(json!({
                "nutrition": {
                    "total_nutrition": { "calories": calories, "protein": 30, "carbs": 40, "fat": 10 },
                    "meals": meals,
                    "water_intake": backend.water()
                }
            }))
        }
        (Method::POST, ["nutrition", "water-intake"]) => {
            backend
                .water
                .store(body["glasses"].as_u64().unwrap_or(0), Ordering::SeqCst);
            ok(json!({ "updated": true }))
        }
        (Method::POST, ["nutrition", "log-meal"]) => {
            let id = backend.next_id.fetch_add(1, Ordering::SeqCst);
            backend
                .meals_logged
                .lock()
                .unwrap()
                .push(merge(body, &json!({ "id": format!("meal-{id}") })));
            ok(json!({ "logged": true }))
        }
        (Method::GET, ["recipes", "r1"]) => ok(json!({
            "recipe": {
                "_id": "r1",
                "name": "Spinach omelette",
                "cooking_time": 10,
                "prep_time": 5,
                "servings": 2,
                "ingredients": ["eggs", { "name": "spinach", "quantity": 1, "unit": "bunch" }],
                "instructions": "Whisk.\nCook."
            }
        })),
        (Method::GET, ["recipes", _]) => fail(StatusCode::NOT_FOUND, "Recipe not found"),
        (Method::GET, ["settings", "gemini-api-key", "status"]) => {
            ok(json!({ "configured": false }))
        }
        (Method::POST, ["settings", "gemini-api-key", "test"]) => {
            let valid = body["api_key"].as_str() == Some("good-key");
            ok(json!({ "valid": valid }))
        }
        (Method::POST, ["settings", "gemini-api-key", "save"]) => ok(json!({ "saved": true })),
        (Method::GET, ["wrapped"]) => Json(json!({
            "data": [{ "id": "1", "name": "Milk", "quantity": 1, "unit": "liter" }]
        }))
        .into_response(),
        (Method::GET, ["null-data"]) => Json(json!({ "data": null, "count": 0 })).into_response(),
        (Method::GET, ["plain"]) => "pong".into_response(),
        _ => fail(StatusCode::NOT_FOUND, "Not found"),
    }
}
