//! GraphQL transport
//!
//! [`GraphQlClient`] is the only seam through which the runner talks to the
//! application. [`HttpGraphQlClient`] posts `{query, variables}` to a single
//! endpoint, optionally with a bearer token.

use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// One GraphQL operation with its variable bindings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
    /// Top-level field invoked, e.g. `OrderCocktail` or `ListDrinkReadModels`
    #[serde(skip)]
    pub operation: String,
}

impl GraphQlRequest {
    #[must_use]
    pub fn new(operation: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
            operation: operation.into(),
        }
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// The `input` variable of a mutation, if any
    #[must_use]
    pub fn input(&self) -> Option<&Map<String, Value>> {
        self.variables.get("input").and_then(Value::as_object)
    }
}

/// Executes GraphQL operations against the application under test
#[async_trait]
pub trait GraphQlClient: Send + Sync + fmt::Debug {
    /// Execute `request`, returning the `data` payload
    ///
    /// # Errors
    /// Any [`TransportError`]; a response carrying GraphQL errors is
    /// `TransportError::GraphQl`.
    async fn execute(&self, request: &GraphQlRequest) -> Result<Value, TransportError>;
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Client posting to an HTTP GraphQL endpoint
#[derive(Clone)]
pub struct HttpGraphQlClient {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl fmt::Debug for HttpGraphQlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGraphQlClient")
            .field("url", &self.url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpGraphQlClient {
    /// Create an unauthenticated client
    ///
    /// # Errors
    /// `TransportError::Transport` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl GraphQlClient for HttpGraphQlClient {
    async fn execute(&self, request: &GraphQlRequest) -> Result<Value, TransportError> {
        tracing::debug!(operation = %request.operation, url = %self.url, "graphql request");

        let mut builder = self.http.post(&self.url).json(request);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let response = builder.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Unauthorized);
        }
        if status.is_client_error() {
            let body = response.bytes().await?;
            return Err(client_error(status, &body));
        }
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse = response.json().await?;
        decode_response(body)
    }
}

/// GraphQL-over-HTTP servers answer validation and variable coercion
/// failures with a 4xx status and an `errors` body.
fn client_error(status: StatusCode, body: &[u8]) -> TransportError {
    match serde_json::from_slice::<GraphQlResponse>(body) {
        Ok(response) if !response.errors.is_empty() => TransportError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ),
        _ => TransportError::Http {
            status: status.as_u16(),
        },
    }
}

fn decode_response(body: GraphQlResponse) -> Result<Value, TransportError> {
    if !body.errors.is_empty() {
        return Err(TransportError::GraphQl(
            body.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    match body.data {
        Some(Value::Null) | None => Err(TransportError::Decode(
            "response carried neither data nor errors".to_string(),
        )),
        Some(data) => Ok(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn decode(body: Value) -> Result<Value, TransportError> {
        decode_response(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn request_serializes_query_and_variables() {
        let request = GraphQlRequest::new("OrderCocktail", "mutation { x }")
            .with_variable("input", json!({"drink": "gimlet"}));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"query": "mutation { x }", "variables": {"input": {"drink": "gimlet"}}})
        );
        assert_eq!(request.input().unwrap()["drink"], "gimlet");
    }

    #[test]
    fn empty_variables_are_omitted() {
        let request = GraphQlRequest::new("ListDrinkReadModels", "query { x }");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"query": "query { x }"})
        );
    }

    #[test]
    fn errors_take_precedence_over_data() {
        let err = decode(json!({
            "data": {"OrderCocktail": null},
            "errors": [{"message": "drink is required", "path": ["OrderCocktail"]}]
        }))
        .unwrap_err();
        assert_eq!(err, TransportError::GraphQl(vec!["drink is required".into()]));
    }

    #[test]
    fn data_is_returned() {
        let data = decode(json!({"data": {"OrderCocktail": true}})).unwrap();
        assert_eq!(data, json!({"OrderCocktail": true}));
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        assert!(matches!(decode(json!({})), Err(TransportError::Decode(_))));
    }

    /// Serve one canned HTTP response on a local port
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/graphql")
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    async fn execute_against(
        status: &'static str,
        body: &'static str,
    ) -> Result<Value, TransportError> {
        let url = serve_once(status, body).await;
        let client = HttpGraphQlClient {
            http: reqwest::Client::builder().no_proxy().build().unwrap(),
            url,
            token: None,
        };
        client
            .execute(&GraphQlRequest::new("OrderCocktail", "mutation { OrderCocktail }"))
            .await
    }

    #[tokio::test]
    async fn bad_request_with_graphql_errors_is_a_rejection() {
        let err = execute_against(
            "400 Bad Request",
            r#"{"errors":[{"message":"Variable \"$input\" got invalid value null; Expected non-nullable type \"Float!\""}]}"#,
        )
        .await
        .unwrap_err();
        assert!(err.is_rejection());
        assert!(matches!(&err, TransportError::GraphQl(messages) if messages[0].contains("Float!")));
    }

    #[tokio::test]
    async fn bad_request_without_errors_stays_http() {
        let err = execute_against("400 Bad Request", "not json").await.unwrap_err();
        assert_eq!(err, TransportError::Http { status: 400 });
    }

    #[tokio::test]
    async fn status_mapping() {
        assert_eq!(
            execute_against("401 Unauthorized", "{}").await.unwrap_err(),
            TransportError::Unauthorized
        );
        assert_eq!(
            execute_against("403 Forbidden", r#"{"errors":[{"message":"forbidden"}]}"#)
                .await
                .unwrap_err(),
            TransportError::Unauthorized
        );
        assert_eq!(
            execute_against("502 Bad Gateway", r#"{"errors":[{"message":"upstream"}]}"#)
                .await
                .unwrap_err(),
            TransportError::Http { status: 502 }
        );
        assert_eq!(
            execute_against("200 OK", r#"{"data":{"OrderCocktail":true}}"#)
                .await
                .unwrap(),
            json!({"OrderCocktail": true})
        );
    }

    #[test]
    fn debug_hides_token() {
        let client = HttpGraphQlClient::new("http://localhost:3000/graphql", Duration::from_secs(1))
            .unwrap()
            .with_token("secret");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret"));
        assert!(client.is_authenticated());
    }
}
