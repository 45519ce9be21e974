use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::{debug, info, warn};

use super::OptimizerApi;
use crate::domain::allocation::validate_weight_total;
use crate::domain::pool::PoolManager;
use crate::shared::errors::ApiError;
use crate::shared::types::{ChainType, OptimizationResult, Pool, SimulationRequest};

pub const DEFAULT_API_BASE_URL: &str = "http://zo440ws8gg0s08wsg4k488c8.94.130.107.60.sslip.io/";
pub const DEFAULT_POOLS_URL: &str = "https://api.hydrex.fi/strategies";

/// HTTP client for the pool listing and the optimizer service
#[derive(Debug, Clone)]
pub struct HttpOptimizerClient {
    http_client: Client,
    base_url: Url,
    pools_url: Url,
}

impl HttpOptimizerClient {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_endpoints(DEFAULT_API_BASE_URL, DEFAULT_POOLS_URL)
    }

    pub fn with_endpoints(api_base_url: &str, pools_url: &str) -> Result<Self, ApiError> {
        Self::with_http_client(Client::new(), api_base_url, pools_url)
    }

    /// Same as `with_endpoints` over a preconfigured `reqwest::Client`
    pub fn with_http_client(
        http_client: Client,
        api_base_url: &str,
        pools_url: &str,
    ) -> Result<Self, ApiError> {
        // Url::join drops the last path segment unless the base ends with '/'
        let mut base = api_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::new(format!("Invalid API base URL {}: {}", api_base_url, e)))?;
        let pools_url = Url::parse(pools_url.trim())
            .map_err(|e| ApiError::new(format!("Invalid pools URL {}: {}", pools_url, e)))?;

        Ok(Self {
            http_client,
            base_url,
            pools_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn simulate_url(&self, chain: ChainType) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join("vestrategies/simulate-vote")
            .map_err(|e| ApiError::new(format!("Invalid simulate URL: {}", e)))?;
        url.query_pairs_mut().append_pair("chain", chain.as_str());
        Ok(url)
    }

    /// Voting power is floored; `blacklist` is only sent when non-empty
    pub fn optimizer_url(
        &self,
        voting_power: f64,
        max_pools: u32,
        chain: ChainType,
        blacklist: &[String],
    ) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join("optimizer")
            .map_err(|e| ApiError::new(format!("Invalid optimizer URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("votingPower", &(voting_power.floor() as i64).to_string())
                .append_pair("maxPools", &max_pools.to_string())
                .append_pair("chain", chain.as_str());
            if !blacklist.is_empty() {
                query.append_pair("blacklist", &blacklist.join(","));
            }
        }
        Ok(url)
    }

    async fn get_pool_listing(&self) -> Result<Vec<Pool>, ApiError> {
        debug!("Fetching pool listing from {}", self.pools_url);
        let response = self.http_client.get(self.pools_url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown status");
            warn!("⚠️ Pool listing returned status: {}", status);
            return Err(ApiError::with_status(
                format!("Failed to fetch pools: {}", reason),
                status.as_u16(),
            ));
        }
        let pools: Vec<Pool> = response.json().await?;
        Ok(pools)
    }
}

/// Turn a non-2xx response into `"<prefix>: <body>"` carrying the status
async fn error_from_body(prefix: &str, response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => e.to_string(),
    };
    ApiError::with_status(format!("{}: {}", prefix, body), status)
}

#[async_trait]
impl OptimizerApi for HttpOptimizerClient {
    async fn fetch_pools(&self, chain: ChainType) -> Result<Vec<Pool>, ApiError> {
        let pools = self.get_pool_listing().await?;
        let total = pools.len();
        let filtered = PoolManager::filter_for_chain(pools, chain);
        info!("✅ Loaded {} of {} pools for {}", filtered.len(), total, chain);
        Ok(filtered)
    }

    async fn fetch_all_pools(&self) -> Result<Vec<Pool>, ApiError> {
        self.get_pool_listing().await
    }

    async fn simulate_vote(
        &self,
        chain: ChainType,
        request: &SimulationRequest,
    ) -> Result<OptimizationResult, ApiError> {
        // Rejected locally, nothing is sent
        validate_weight_total(&request.weights)?;

        let url = self.simulate_url(chain)?;
        info!(
            %chain,
            pools = request.pools.len(),
            voting_power = request.voting_power,
            "🔍 Simulating vote"
        );

        let response = self.http_client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(error_from_body("Simulation failed", response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_optimal_allocation(
        &self,
        voting_power: f64,
        max_pools: u32,
        chain: ChainType,
        blacklist: &[String],
    ) -> Result<OptimizationResult, ApiError> {
        let url = self.optimizer_url(voting_power, max_pools, chain, blacklist)?;
        info!(
            %chain,
            max_pools,
            blacklisted = blacklist.len(),
            "🔍 Requesting optimal allocation"
        );

        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(error_from_body("Optimization failed", response).await);
        }
        Ok(response.json().await?)
    }
}
