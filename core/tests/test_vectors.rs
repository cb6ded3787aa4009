//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and either the expected parse result or the expected error variant.
//! Results are compared as typed values, so key order in the vector bodies
//! does not matter.

use doggie_core::{
    ApiError, Approval, ClientConfig, DogClient, Favourite, HttpMethod, HttpRequest, HttpResponse,
    Item, MyItem, PostResult,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> DogClient {
    DogClient::new(
        ClientConfig::new("vector-key")
            .with_base_url(BASE_URL)
            .with_sub_id("vectors"),
    )
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

/// Method, full URL and header list must match exactly. A JSON body is
/// compared structurally when the vector carries one.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let pair = h.as_array().unwrap();
            (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn assert_error(name: &str, err: ApiError, expected: &str) {
    let matched = match expected {
        "BadStatus" => matches!(err, ApiError::BadStatus { .. }),
        "Decoding" => matches!(err, ApiError::Decoding(_)),
        "NoContent" => matches!(err, ApiError::NoContent),
        other => panic!("{name}: unknown expected_error: {other}"),
    };
    assert!(matched, "{name}: expected {expected}, got {err:?}");
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/search.json")) {
        let name = case["name"].as_str().unwrap();
        let page = case["input_page"].as_u64().unwrap() as u32;

        let req = c.build_fetch_items(page).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_fetch_items(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<Item> = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Favourites
// ---------------------------------------------------------------------------

#[test]
fn favourites_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/favourites.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_fetch_favourites().unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_fetch_favourites(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<Favourite> =
                    serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

#[test]
fn create_favourite_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/create_favourite.json")) {
        let name = case["name"].as_str().unwrap();
        let item_id = case["input_item_id"].as_str().unwrap();

        let req = c.build_create_favourite(item_id).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_favourite(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: PostResult = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

#[test]
fn delete_favourite_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/delete_favourite.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_favourite_id"].as_i64().unwrap();

        let req = c.build_delete_favourite(id).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_favourite(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => assert!(result.is_ok(), "{name}: expected success"),
        }
    }
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

#[test]
fn upload_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/upload.json")) {
        let name = case["name"].as_str().unwrap();

        let result = c.parse_upload_image(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let approval = match case["expected_approval"].as_str().unwrap() {
                    "Approved" => Approval::Approved,
                    "Rejected" => Approval::Rejected,
                    "Unknown" => Approval::Unknown,
                    other => panic!("{name}: unknown approval: {other}"),
                };
                assert_eq!(result.unwrap().approval(), approval, "{name}: approval");
            }
        }
    }
}

#[test]
fn my_uploads_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/my_uploads.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_fetch_my_uploads().unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_fetch_my_uploads(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<MyItem> = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}
