/// Token approval records and the block explorer client
///
/// Explorer backends disagree on field names, so records stay raw JSON and are
/// read through `FieldResolver`s: an ordered list of candidate paths where the
/// first present, non-empty string wins.

use async_trait::async_trait;
use ethers::types::Address;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::core::error::FetchError;
use crate::utils::checksum;

/// One location a field may live at inside an approval entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Key(&'static str),
    Nested(&'static str, &'static str),
}

impl FieldPath {
    fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match self {
            FieldPath::Key(key) => value.get(key),
            FieldPath::Nested(outer, inner) => value.get(outer).and_then(|v| v.get(inner)),
        }
    }
}

/// Ordered first-match lookup for one logical field
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver {
    pub field: &'static str,
    pub candidates: &'static [FieldPath],
}

impl FieldResolver {
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a str> {
        self.candidates
            .iter()
            .filter_map(|path| path.lookup(value))
            .filter_map(Value::as_str)
            .find(|s| !s.trim().is_empty())
    }
}

pub const TOKEN_ADDRESS: FieldResolver = FieldResolver {
    field: "token",
    candidates: &[
        FieldPath::Key("token_address"),
        FieldPath::Key("contract_address"),
        FieldPath::Nested("token", "address"),
    ],
};

pub const SPENDER: FieldResolver = FieldResolver {
    field: "spender",
    candidates: &[
        FieldPath::Key("spender"),
        FieldPath::Key("spender_address"),
        FieldPath::Key("approved_spender"),
    ],
};

/// The approvals list only labels the two common spender keys
pub const DISPLAY_SPENDER: FieldResolver = FieldResolver {
    field: "spender",
    candidates: &[FieldPath::Key("spender"), FieldPath::Key("spender_address")],
};

pub const TOKEN_SYMBOL: FieldResolver = FieldResolver {
    field: "symbol",
    candidates: &[
        FieldPath::Key("token_symbol"),
        FieldPath::Nested("token", "symbol"),
    ],
};

/// An approval entry exactly as the explorer returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalRecord(Value);

impl ApprovalRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn token_address(&self) -> Option<&str> {
        TOKEN_ADDRESS.resolve(&self.0)
    }

    pub fn spender(&self) -> Option<&str> {
        SPENDER.resolve(&self.0)
    }

    pub fn display_spender(&self) -> &str {
        DISPLAY_SPENDER.resolve(&self.0).unwrap_or("Unknown")
    }

    pub fn token_symbol(&self) -> &str {
        TOKEN_SYMBOL.resolve(&self.0).unwrap_or("Unknown")
    }
}

/// Extract the approval list from an explorer response body.
///
/// The list lives under `items` or, on older backends, `result`. Anything else
/// is an empty list rather than an error.
pub fn parse_approvals(body: &Value) -> Vec<ApprovalRecord> {
    ["items", "result"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
        .map(|entries| entries.iter().cloned().map(ApprovalRecord::new).collect())
        .unwrap_or_default()
}

/// `GET` target for an account's approvals on one explorer
pub fn approvals_url(base_url: &str, account: &Address) -> String {
    format!(
        "{}/api/v2/addresses/{}/token-approvals",
        base_url.trim_end_matches('/'),
        checksum(account)
    )
}

/// Source of approval lists
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApprovalSource: Send + Sync {
    async fn fetch_approvals(
        &self,
        base_url: &str,
        account: Address,
    ) -> Result<Vec<ApprovalRecord>, FetchError>;
}

/// Blockscout v2 REST client
pub struct BlockscoutClient {
    client: Client,
}

impl BlockscoutClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ccc-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ApprovalSource for BlockscoutClient {
    async fn fetch_approvals(
        &self,
        base_url: &str,
        account: Address,
    ) -> Result<Vec<ApprovalRecord>, FetchError> {
        let url = approvals_url(base_url, &account);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let approvals = parse_approvals(&body);
        log::info!("Fetched {} approvals from {}", approvals.len(), base_url);

        Ok(approvals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_items_shape_with_primary_fields() {
        let body = json!({ "items": [ { "token_address": "0xA", "spender": "0xB" } ] });
        let approvals = parse_approvals(&body);

        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].token_address(), Some("0xA"));
        assert_eq!(approvals[0].spender(), Some("0xB"));
    }

    #[test]
    fn test_result_shape_fallback() {
        let entries = json!([
            { "token_address": "0xA", "spender": "0xB", "token_symbol": "USDC" },
            { "contract_address": "0xC", "spender_address": "0xD" }
        ]);
        let from_result = parse_approvals(&json!({ "result": entries.clone() }));
        let from_items = parse_approvals(&json!({ "items": entries }));

        assert_eq!(from_result.len(), 2);
        assert_eq!(from_result, from_items);
        assert_eq!(from_result[0].token_symbol(), "USDC");
        assert_eq!(from_result[1].token_address(), Some("0xC"));
        assert_eq!(from_result[1].spender(), Some("0xD"));
    }

    #[test]
    fn test_unrecognised_shape_is_empty() {
        assert!(parse_approvals(&json!({ "message": "ok" })).is_empty());
        assert!(parse_approvals(&json!({ "items": null })).is_empty());
        assert!(parse_approvals(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_items_takes_precedence_over_result() {
        let body = json!({ "items": [], "result": [ { "spender": "0xB" } ] });
        assert!(parse_approvals(&body).is_empty());
    }

    #[test]
    fn test_token_address_fallback_order() {
        let nested = ApprovalRecord::new(json!({ "token": { "address": "0xN", "symbol": "DAI" } }));
        assert_eq!(nested.token_address(), Some("0xN"));
        assert_eq!(nested.token_symbol(), "DAI");

        let both = ApprovalRecord::new(json!({ "token_address": "0xA", "contract_address": "0xC" }));
        assert_eq!(both.token_address(), Some("0xA"));

        let empty_primary = ApprovalRecord::new(json!({ "token_address": "", "contract_address": "0xC" }));
        assert_eq!(empty_primary.token_address(), Some("0xC"));
    }

    #[test]
    fn test_spender_tertiary_fallback() {
        let record = ApprovalRecord::new(json!({ "token_address": "0xA", "approved_spender": "0xS" }));
        assert_eq!(record.spender(), Some("0xS"));
        assert_eq!(record.display_spender(), "Unknown");
    }

    #[test]
    fn test_missing_fields() {
        let record = ApprovalRecord::new(json!({ "value": "1000", "spender": 42 }));
        assert_eq!(record.token_address(), None);
        assert_eq!(record.spender(), None);
        assert_eq!(record.token_symbol(), "Unknown");
    }

    #[test]
    fn test_approvals_url() {
        let account: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(
            approvals_url("https://base.blockscout.com/", &account),
            "https://base.blockscout.com/api/v2/addresses/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed/token-approvals"
        );
    }

    /// Answer a single HTTP request with a canned response; returns the base URL
    async fn serve_once(status: &'static str, content_type: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    fn account() -> Address {
        "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_status_error() {
        let base_url = serve_once("502 Bad Gateway", "text/plain", "").await;
        let client = BlockscoutClient::new(Duration::from_secs(5)).unwrap();

        let err = client.fetch_approvals(&base_url, account()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(status) if status == reqwest::StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn test_fetch_html_body_is_decode_error() {
        let base_url = serve_once("200 OK", "text/html", "<html><body>Maintenance</body></html>").await;
        let client = BlockscoutClient::new(Duration::from_secs(5)).unwrap();

        let err = client.fetch_approvals(&base_url, account()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_parses_items_over_http() {
        let base_url = serve_once(
            "200 OK",
            "application/json",
            r#"{"items":[{"token_symbol":"USDC","token_address":"0xA","spender":"0xB"}]}"#,
        )
        .await;
        let client = BlockscoutClient::new(Duration::from_secs(5)).unwrap();

        let approvals = client.fetch_approvals(&base_url, account()).await.unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].token_symbol(), "USDC");
        assert_eq!(approvals[0].spender(), Some("0xB"));
    }

    #[tokio::test]
    #[ignore] // Hits the public Gnosis explorer
    async fn test_live_blockscout_fetch() {
        let client = BlockscoutClient::new(Duration::from_secs(10)).unwrap();
        let account: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();

        match client.fetch_approvals("https://gnosis.blockscout.com", account).await {
            Ok(approvals) => println!("Fetched {} approvals", approvals.len()),
            Err(e) => println!("Fetch failed (expected offline): {}", e),
        }
    }
}
