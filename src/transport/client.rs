//! Minimal GraphQL client for the geospatial measures endpoint.
//!
//! The client only executes a query and hands back the JSON document; there is
//! no retry, paging or caching. Callers apply their own deadline via `timeout`.

use crate::error::GeoMeasuresError;
use crate::response::query_response::QueryResponse;
use crate::transport::error::TransportError;
use bon::bon;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.agrimetrics.co.uk/graphql";
pub const DEFAULT_API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Value>,
}

/// Executes GraphQL queries against a measures endpoint.
///
/// # Examples
///
/// ```
/// use geomeasures::GraphQlClient;
/// use std::time::Duration;
///
/// let client = GraphQlClient::builder()
///     .api_key("my-subscription-key")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// assert_eq!(client.endpoint(), "https://api.agrimetrics.co.uk/graphql");
/// # Ok::<(), geomeasures::TransportError>(())
/// ```
#[derive(Clone)]
pub struct GraphQlClient {
    http: Client,
    endpoint: String,
    api_key_header: String,
    api_key: String,
}

#[bon]
impl GraphQlClient {
    /// Builds a client. `endpoint` and `api_key_header` fall back to
    /// [`DEFAULT_ENDPOINT`] and [`DEFAULT_API_KEY_HEADER`]; without `timeout`
    /// requests never time out on the client side.
    ///
    /// # Errors
    ///
    /// [`TransportError::ClientBuild`] if the HTTP client cannot be initialised.
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        #[builder(into)] endpoint: Option<String>,
        #[builder(into)] api_key_header: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut http = Client::builder().gzip(true);
        if let Some(timeout) = timeout {
            http = http.timeout(timeout);
        }
        Ok(Self {
            http: http.build().map_err(TransportError::ClientBuild)?,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key_header: api_key_header.unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key_header(&self) -> &str {
        &self.api_key_header
    }

    /// Posts `query` (and `variables`, if any) and returns the response document.
    ///
    /// A document carrying GraphQL `errors` is still returned here; it is
    /// rejected when parsed into a [`QueryResponse`].
    ///
    /// # Errors
    ///
    /// [`TransportError::HttpStatus`] for a non-2xx response,
    /// [`TransportError::NetworkRequest`] when the request cannot be sent and
    /// [`TransportError::Decode`] when the body is not JSON.
    pub async fn execute(&self, query: &str, variables: Option<&Value>) -> Result<Value, TransportError> {
        let body = GraphQlRequest { query, variables };
        debug!("Posting GraphQL query ({} bytes) to {}", query.len(), self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .header(self.api_key_header.as_str(), self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::NetworkRequest(self.endpoint.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => TransportError::HttpStatus {
                        url: self.endpoint.clone(),
                        status,
                        source: e,
                    },
                    None => TransportError::NetworkRequest(self.endpoint.clone(), e),
                });
            }
        };

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(self.endpoint.clone(), e))
    }

    /// Executes a measures query and parses the result.
    ///
    /// ```no_run
    /// # use geomeasures::{GraphQlClient, GeoMeasuresError};
    /// # use serde_json::json;
    /// # async fn run(client: GraphQlClient) -> Result<(), GeoMeasuresError> {
    /// let response = client
    ///     .fetch_measures("query($id: ID!) { geospatialMeasures(geoFilter: $id) { soilPH { unit value location { centroid } } } }")
    ///     .variables(json!({ "id": "example" }))
    ///     .call()
    ///     .await?;
    /// let tables = response.scalar_measures(&["soilPH"]).call()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = fetch_measures)]
    #[doc(hidden)]
    pub async fn build_fetch_measures(
        &self,
        #[builder(start_fn)] query: &str,
        variables: Option<Value>,
    ) -> Result<QueryResponse, GeoMeasuresError> {
        let document = self.execute(query, variables.as_ref()).await?;
        let response = QueryResponse::from_json(&document)?;
        info!(
            "Fetched {} measures from {}",
            response.len(),
            self.endpoint
        );
        Ok(response)
    }
}

impl fmt::Debug for GraphQlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlClient")
            .field("endpoint", &self.endpoint)
            .field("api_key_header", &self.api_key_header)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
