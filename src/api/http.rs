use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::client::{ApiRequest, ApiResponse, Method, Transport};
use super::error::ApiError;

/// reqwest transport against a Supabase project URL
pub struct HttpTransport {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("g-trade-journal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        })
    }

    /// apikey on every call, bearer only when the request carries one
    fn build_headers(&self, request: &ApiRequest) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid API key: {}", e)))?,
        );

        if let Some(token) = &request.bearer {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid token: {}", e)))?,
            );
        }

        if let Some(prefer) = &request.prefer {
            headers.insert(
                "Prefer",
                HeaderValue::from_str(prefer)
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid Prefer header: {}", e)))?,
            );
        }

        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let headers = self.build_headers(request)?;

        let mut builder = match request.method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
            Method::Patch => self.http_client.patch(&url),
            Method::Delete => self.http_client.delete(&url),
        };
        builder = builder.headers(headers).query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_without_session() {
        let transport = HttpTransport::new("https://demo.supabase.co/", "anon-key").unwrap();
        let headers = transport.build_headers(&ApiRequest::get("/rest/v1/trades")).unwrap();

        assert_eq!(headers.get("apikey").unwrap(), "anon-key");
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(transport.base_url, "https://demo.supabase.co");
    }

    #[test]
    fn test_headers_with_session_and_prefer() {
        let transport = HttpTransport::new("https://demo.supabase.co", "anon-key").unwrap();
        let request = ApiRequest::post("/rest/v1/user_profiles")
            .bearer("jwt")
            .prefer("resolution=merge-duplicates");
        let headers = transport.build_headers(&request).unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer jwt");
        assert_eq!(headers.get("Prefer").unwrap(), "resolution=merge-duplicates");
    }

    #[test]
    fn test_rejects_header_injection() {
        let transport = HttpTransport::new("https://demo.supabase.co", "bad\nkey").unwrap();
        let result = transport.build_headers(&ApiRequest::get("/"));
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
