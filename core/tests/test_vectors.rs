//! Verify every service operation against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector describes the session state, the call and its input, the
//! request the client must emit, a simulated response, and the expected
//! result or error. Bodies and results are compared as parsed JSON so field
//! ordering does not matter.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use taskhub_core::{
    ApiClient, ApiError, AuthService, Credentials, FakeTransport, HttpMethod, HttpResponse,
    NewTask, NewUser, SessionStore, Task, TaskPatch, TaskService, User, UserPatch, UserService,
};

const BASE_URL: &str = "http://localhost:7009";

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap()
}

/// Decode through the client type and re-encode, so defaults (e.g. a null
/// description) compare equal.
fn normalize<T: DeserializeOwned + Serialize>(value: &Value) -> Value {
    to_json(serde_json::from_value::<T>(value.clone()).unwrap())
}

fn input<T: DeserializeOwned>(case: &Value) -> T {
    serde_json::from_value(case["input"].clone()).unwrap()
}

fn input_id(case: &Value) -> i64 {
    case["input_id"].as_i64().unwrap()
}

async fn dispatch(resource: &str, case: &Value, client: ApiClient) -> Result<Value, ApiError> {
    let call = case["call"].as_str().unwrap();
    match (resource, call) {
        ("task", "list") => TaskService::new(client).list_all().await.map(to_json),
        ("task", "get") => TaskService::new(client).get_by_id(input_id(case)).await.map(to_json),
        ("task", "create") => TaskService::new(client)
            .create(&input::<NewTask>(case))
            .await
            .map(to_json),
        ("task", "update") => TaskService::new(client)
            .update(input_id(case), &input::<TaskPatch>(case))
            .await
            .map(to_json),
        ("task", "delete") => TaskService::new(client).remove(input_id(case)).await.map(to_json),
        ("user", "list") => UserService::new(client).list_all().await.map(to_json),
        ("user", "get") => UserService::new(client).get_by_id(input_id(case)).await.map(to_json),
        ("user", "create") => UserService::new(client)
            .create(&input::<NewUser>(case))
            .await
            .map(to_json),
        ("user", "update") => UserService::new(client)
            .update(input_id(case), &input::<UserPatch>(case))
            .await
            .map(to_json),
        ("user", "delete") => UserService::new(client).remove(input_id(case)).await.map(to_json),
        ("auth", "login") => {
            let creds: Credentials = input(case);
            AuthService::new(client)
                .login(&creds.email, &creds.password)
                .await
                .map(to_json)
        }
        other => panic!("unknown call: {other:?}"),
    }
}

fn expected_result(resource: &str, case: &Value) -> Value {
    let expected = &case["expected_result"];
    match (resource, case["call"].as_str().unwrap()) {
        ("task", "list") => normalize::<Vec<Task>>(expected),
        ("task", "delete") | ("user", "delete") => Value::Null,
        ("task", _) => normalize::<Task>(expected),
        ("user", "list") => normalize::<Vec<User>>(expected),
        ("user", _) => normalize::<User>(expected),
        _ => expected.clone(),
    }
}

async fn run_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let resource = vectors["resource"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        let session = Arc::new(SessionStore::in_memory());
        if let Some(token) = case["token"].as_str() {
            session.set_token(token).unwrap();
        }
        let transport = Arc::new(FakeTransport::new());
        if let Some(sim) = case.get("simulated_response") {
            transport.push_response(HttpResponse::new(
                sim["status"].as_u64().unwrap() as u16,
                sim["body"].as_str().unwrap(),
            ));
        }
        let client = ApiClient::new(BASE_URL, session.clone(), transport.clone());
        let token_before = session.get_token();

        let result = dispatch(resource, case, client).await;

        // Verify the emitted request, or that none was sent.
        let expected_req = &case["expected_request"];
        if expected_req.is_null() {
            assert_eq!(transport.request_count(), 0, "{name}: no request expected");
        } else {
            assert_eq!(transport.request_count(), 1, "{name}: exactly one request");
            let req = transport.last_request().unwrap();
            assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
            assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

            let expected_headers: Vec<(String, String)> = expected_req["headers"]
                .as_array()
                .unwrap()
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
                })
                .collect();
            assert_eq!(req.headers, expected_headers, "{name}: headers");

            match req.body.as_deref() {
                Some(body) => {
                    let body: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(body, expected_req["body"], "{name}: body");
                }
                None => assert!(expected_req["body"].is_null(), "{name}: body should be present"),
            }
        }

        // Verify the outcome.
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error["kind"].as_str().unwrap() {
                "Validation" => assert!(matches!(err, ApiError::Validation(_)), "{name}: expected Validation, got {err:?}"),
                "Request" => match err {
                    ApiError::Request { status, message } => {
                        assert_eq!(u64::from(status), expected_error["status"].as_u64().unwrap(), "{name}: status");
                        assert_eq!(message, expected_error["message"].as_str().unwrap(), "{name}: message");
                    }
                    other => panic!("{name}: expected Request, got {other:?}"),
                },
                other => panic!("{name}: unknown expected_error kind: {other}"),
            }
        } else {
            let value = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e:?}"));
            assert_eq!(value, expected_result(resource, case), "{name}: parsed result");
        }

        // Services never write the session.
        assert_eq!(session.get_token(), token_before, "{name}: session unchanged");
    }
}

#[tokio::test]
async fn task_test_vectors() {
    run_vectors(include_str!("../../test-vectors/task.json")).await;
}

#[tokio::test]
async fn user_test_vectors() {
    run_vectors(include_str!("../../test-vectors/user.json")).await;
}

#[tokio::test]
async fn auth_test_vectors() {
    run_vectors(include_str!("../../test-vectors/auth.json")).await;
}
