use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::error::ApiError;

/// Spring-style page of results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

/// Listings arrive either as a bare array or as a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page(Page<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Items(items) => items,
            Listing::Page(page) => page.content,
        }
    }
}

/// Decode a success body, unwrapping the `{ code, message, data }` envelope when present.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))?
    };

    serde_json::from_value(unwrap_envelope(value)).map_err(|e| ApiError::Decode(e.to_string()))
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if is_envelope(&map) => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("data")
        && (map.len() == 1
            || ["code", "message", "status", "success"]
                .iter()
                .any(|k| map.contains_key(*k)))
}

/// Best-effort extraction of the backend's error text.
pub fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    let from_body = serde_json::from_slice::<Value>(bytes).ok().and_then(|v| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty())
    });

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    })
}

/// Turn a backend response into `T` or a categorised error.
pub async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(error_message(status, &bytes)));
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status,
            message: error_message(status, &bytes),
        });
    }

    parse_body(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn unwraps_envelope_data() {
        let body = br#"{"code":1000,"message":"ok","data":{"id":7}}"#;
        let item: Item = parse_body(body).unwrap();
        assert_eq!(item, Item { id: 7 });
    }

    #[test]
    fn bare_object_with_data_field_is_kept() {
        #[derive(Deserialize)]
        struct WithData {
            data: String,
            other: u8,
        }
        let parsed: WithData = parse_body(br#"{"data":"x","other":2}"#).unwrap();
        assert_eq!(parsed.data, "x");
        assert_eq!(parsed.other, 2);
    }

    #[test]
    fn listing_accepts_page_and_array() {
        let page: Listing<Item> =
            parse_body(br#"{"data":{"content":[{"id":1},{"id":2}],"totalElements":2}}"#).unwrap();
        assert_eq!(page.into_items().len(), 2);

        let items: Listing<Item> = parse_body(br#"[{"id":3}]"#).unwrap();
        assert_eq!(items.into_items(), vec![Item { id: 3 }]);
    }

    #[test]
    fn error_message_prefers_backend_text() {
        let msg = error_message(StatusCode::BAD_REQUEST, br#"{"message":"Team is full"}"#);
        assert_eq!(msg, "Team is full");

        let fallback = error_message(StatusCode::NOT_FOUND, b"<html>");
        assert_eq!(fallback, "Not Found");
    }
}
