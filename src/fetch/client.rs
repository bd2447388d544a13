use async_trait::async_trait;
use reqwest::{Request, Response};

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;

    /// Whether requests sent through this client carry credentials.
    ///
    /// Decides how a 401/403 response is classified by [`super::fetch_bytes`].
    fn is_authenticated(&self) -> bool {
        false
    }
}
