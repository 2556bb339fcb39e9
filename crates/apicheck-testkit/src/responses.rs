//! Canned responses

use apicheck::client::ApiResponse;
use serde_json::{Value, json};

/// A response with a JSON body and matching content type
pub fn json_response(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
        .with_header("content-type", "application/json; charset=utf-8")
}

/// A response with a plain text body
pub fn text_response(status: u16, body: &str) -> ApiResponse {
    ApiResponse::new(status, body.to_string()).with_header("content-type", "text/plain")
}

/// A paged user listing in the shape reqres.in returns
pub fn users_page(page: u64) -> Value {
    let first_id = (page.saturating_sub(1)) * 6 + 1;
    let data: Vec<Value> = (first_id..first_id + 6)
        .map(|id| {
            json!({
                "id": id,
                "email": format!("user{id}@reqres.in"),
                "first_name": format!("User{id}"),
                "last_name": "Test",
            })
        })
        .collect();

    json!({
        "page": page,
        "per_page": 6,
        "total": 12,
        "total_pages": 2,
        "data": data,
    })
}
