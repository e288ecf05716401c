//! Verify auth resolution and request building against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs and the expected header, params,
//! request or parse result. Bodies are compared as parsed JSON to avoid
//! false negatives from field ordering.

use kintone_core::{
    parse_response, resolve_auth, ApiError, ConfigurationError, HttpClient, HttpMethod,
    HttpResponse, PartialAuth, RequestTokenProvider,
};
use serde_json::{Map, Value};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[test]
fn auth_test_vectors() {
    let raw = include_str!("../../test-vectors/auth.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: PartialAuth = serde_json::from_value(case["input"].clone()).unwrap();
        let token = case.get("request_token").and_then(Value::as_str).map(str::to_string);
        let provider = token.map(|t| move || t.clone());
        let result = resolve_auth(input, provider.as_ref().map(|p| p as &dyn RequestTokenProvider));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "MissingRequestToken" => {
                    assert_eq!(err, ConfigurationError::MissingRequestToken, "{name}: error")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let resolved = result.unwrap();
        assert_eq!(resolved.auth.mode(), case["expected_mode"].as_str().unwrap(), "{name}: mode");
        let header = case["expected_header"].as_array().unwrap();
        assert_eq!(resolved.header.name(), header[0].as_str().unwrap(), "{name}: header name");
        assert_eq!(resolved.header.value(), header[1].as_str().unwrap(), "{name}: header value");
        assert_eq!(Value::Object(resolved.params), case["expected_params"], "{name}: params");
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();
    let client = HttpClient::new((), base_url, Vec::new(), Map::new());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let expected = &case["expected_request"];

        let req = client
            .build_request(method, case["path"].as_str().unwrap(), &case["params"])
            .unwrap();
        assert_eq!(req.method, method, "{name}: method");
        let url = format!("{base_url}{}", expected["url"].as_str().unwrap());
        assert_eq!(req.url, url, "{name}: url");

        match &expected["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: body should be None"),
            body => {
                let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent, body, "{name}: body");
                assert_eq!(
                    req.header("content-type"),
                    Some("application/json"),
                    "{name}: content-type"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["responses"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let result = parse_response::<Value>(response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            let matched = match expected_error.as_str().unwrap() {
                "Kintone" => matches!(err, ApiError::Kintone { .. }),
                "Http" => matches!(err, ApiError::Http { .. }),
                "Deserialization" => matches!(err, ApiError::Deserialization(_)),
                other => panic!("{name}: unknown expected_error: {other}"),
            };
            assert!(matched, "{name}: got {err:?}");
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}
