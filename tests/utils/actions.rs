use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

// ============================================================================
// Request Helpers
// ============================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub json: Value,
    /// `name=value` pairs from Set-Cookie, in header order
    pub cookies: Vec<(String, String)>,
}

impl TestResponse {
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(cookie_name, _)| cookie_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Cookie header replaying both session cookies
    pub fn session_cookies(&self) -> String {
        format!(
            "accessToken={}; refreshToken={}",
            self.cookie("accessToken").unwrap_or_default(),
            self.cookie("refreshToken").unwrap_or_default()
        )
    }
}

impl TestSetup {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        TestResponse {
            status,
            json,
            cookies,
        }
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Value,
        cookies: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookies) = cookies {
            request = request.header(header::COOKIE, cookies);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.json(Method::POST, uri, body, None).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_cookies(&self, uri: &str, cookies: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_with_cookies(&self, uri: &str, cookies: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, uri: &str, file_name: &str, content: &[u8]) -> TestResponse {
        const BOUNDARY: &str = "integration-boundary";
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/user/register",
            serde_json::json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, kind: &str, email: &str, password: &str) -> TestResponse {
        self.post(
            &format!("/api/{}/login", kind),
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn create_house(&self, body: Value) -> TestResponse {
        self.post("/api/house/create", body).await
    }
}

/// Listing body that passes validation
pub fn house_body(title: &str, location: &str, price: f64) -> Value {
    serde_json::json!({
        "title": title,
        "description": "Spacious home close to the metro line.",
        "location": location,
        "price": price,
        "images": ["https://cdn.mock/houses/front.webp"],
        "propertyType": "apartment",
        "furnishing": "semi",
        "carParking": false,
        "builtUpAreaSqFt": 1200,
        "bedrooms": "2",
        "bathrooms": "2"
    })
}
