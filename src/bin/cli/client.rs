use chrono::NaiveDate;
use reqwest::{Client, Url};
use wisdom21::dto::{
    AffectedDto, CategoryCountDto, CreateWisdomDto, DisplayDto, ExposureResultDto,
    RenameCategoryDto, RolloverRequestDto, RolloverResultDto, SetFavoriteDto, UpdateWisdomDto,
    WisdomQueryDto,
};
use wisdom21::models::Wisdom;
use wisdom21::scheduler::CycleSummary;

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
    /// The server URL cannot be used to build request URLs
    InvalidUrl(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
            ClientError::InvalidUrl(url) => write!(f, "Invalid server URL: {}", url),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Server { .. } | ClientError::InvalidUrl(_) => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// Builds query parameters from a WisdomQueryDto
fn build_query_params(query: &WisdomQueryDto) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = Vec::new();

    if let Some(state) = query.state {
        params.push(("state", state.to_string()));
    }
    if let Some(ref category) = query.category {
        params.push(("category", category.clone()));
    }
    if let Some(favorite) = query.favorite {
        params.push(("favorite", favorite.to_string()));
    }
    if let Some(ref search) = query.search {
        params.push(("search", search.clone()));
    }
    let sort = match query.sort {
        wisdom21::dto::SortOrder::Queue => "queue",
        wisdom21::dto::SortOrder::Created => "created",
        wisdom21::dto::SortOrder::Text => "text",
    };
    params.push(("sort", sort.to_string()));

    params
}

/// HTTP client wrapper for communicating with the wisdom21 server
pub struct WisdomClient {
    /// The base URL of the server (e.g. "http://localhost:3021")
    base_url: String,
    /// The underlying HTTP client
    client: Client,
}

impl WisdomClient {
    /// Creates a new WisdomClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the wisdom21 server
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Builds a URL under the base URL, percent-encoding each segment
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Wisdom endpoints ─────────────────────────────────────────────

    /// Lists wisdom matching the given filters
    pub async fn list_wisdom(&self, query: &WisdomQueryDto) -> Result<Vec<Wisdom>, ClientError> {
        let params = build_query_params(query);
        let response = self.client.get(self.url(&["wisdom"])?).query(&params).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Creates a new wisdom
    pub async fn create_wisdom(&self, text: String, source: Option<String>, category: Option<String>) -> Result<Wisdom, ClientError> {
        let dto = CreateWisdomDto { text, source, category };
        let response = self.client.post(self.url(&["wisdom"])?).json(&dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets a specific wisdom by ID, None if it does not exist
    pub async fn get_wisdom(&self, id: &str) -> Result<Option<Wisdom>, ClientError> {
        let response = self.client.get(self.url(&["wisdom", id])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Edits the text, source or category of a wisdom
    pub async fn update_wisdom(&self, id: &str, update: UpdateWisdomDto) -> Result<Wisdom, ClientError> {
        let response = self.client.patch(self.url(&["wisdom", id])?).json(&update).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Deletes a wisdom
    pub async fn delete_wisdom(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(self.url(&["wisdom", id])?).send().await.map_err(ClientError::Request)?.check().await?;
        Ok(())
    }

    /// Marks or unmarks a wisdom as favorite
    pub async fn set_favorite(&self, id: &str, favorite: bool) -> Result<Wisdom, ClientError> {
        let dto = SetFavoriteDto { favorite };
        let response = self.client.put(self.url(&["wisdom", id, "favorite"])?).json(&dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Cycle endpoints ──────────────────────────────────────────────

    /// Starts the 21-day cycle of a wisdom
    pub async fn activate(&self, id: &str) -> Result<Wisdom, ClientError> {
        let response = self.client.post(self.url(&["wisdom", id, "activate"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Takes a wisdom out of its cycle
    pub async fn deactivate(&self, id: &str) -> Result<Wisdom, ClientError> {
        let response = self.client.post(self.url(&["wisdom", id, "deactivate"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Records that a wisdom was shown
    pub async fn record_exposure(&self, id: &str) -> Result<ExposureResultDto, ClientError> {
        let response = self.client.post(self.url(&["wisdom", id, "exposures"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Lists all active wisdom
    pub async fn list_active(&self) -> Result<Vec<Wisdom>, ClientError> {
        let response = self.client.get(self.url(&["active"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Activates the front of the queue, optionally within one category
    pub async fn activate_next(&self, category: Option<&str>) -> Result<Option<Wisdom>, ClientError> {
        let mut request = self.client.post(self.url(&["active", "next"])?);
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        let response = request.send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Returns the wisdom that would be shown next without recording it
    pub async fn peek_next(&self) -> Result<Option<Wisdom>, ClientError> {
        let response = self.client.get(self.url(&["display", "next"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Shows the next wisdom, recording the exposure
    pub async fn show_next(&self) -> Result<DisplayDto, ClientError> {
        let response = self.client.post(self.url(&["display", "next"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Applies the daily rollover for `day`, or today if None
    pub async fn rollover(&self, day: Option<NaiveDate>) -> Result<RolloverResultDto, ClientError> {
        let dto = RolloverRequestDto { day };
        let response = self.client.post(self.url(&["rollover"])?).json(&dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets the per-state counts
    pub async fn summary(&self) -> Result<CycleSummary, ClientError> {
        let response = self.client.get(self.url(&["summary"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Category endpoints ───────────────────────────────────────────

    /// Lists categories with their counts
    pub async fn list_categories(&self) -> Result<Vec<CategoryCountDto>, ClientError> {
        let response = self.client.get(self.url(&["categories"])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Renames a category
    pub async fn rename_category(&self, name: &str, new_name: String) -> Result<AffectedDto, ClientError> {
        let dto = RenameCategoryDto { name: new_name };
        let response = self.client.put(self.url(&["categories", name])?).json(&dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Deletes a category, moving its wisdom to the default category
    pub async fn delete_category(&self, name: &str) -> Result<AffectedDto, ClientError> {
        let response = self.client.delete(self.url(&["categories", name])?).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }
}
