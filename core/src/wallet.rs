use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{CoreError, CoreResult};

/// Base mainnet
pub const BASE_CHAIN_ID: &str = "0x2105";
/// Provider error code for a chain the wallet does not know yet
pub const CHAIN_NOT_ADDED: i64 = 4902;

const FLAG_FILE: &str = "wallet_connected";

/// Network description sent when the wallet must add a chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl ChainConfig {
    pub fn base_mainnet() -> Self {
        Self {
            chain_id: BASE_CHAIN_ID.to_string(),
            chain_name: "Base".to_string(),
            native_currency: NativeCurrency {
                name: "Ethereum".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://mainnet.base.org".to_string()],
            block_explorer_urls: vec!["https://basescan.org".to_string()],
        }
    }
}

/// EIP-1193 style wallet requests - allows for mocking in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorised, without prompting
    async fn accounts(&self) -> CoreResult<Vec<String>>;

    /// Ask the user to authorise accounts
    async fn request_accounts(&self) -> CoreResult<Vec<String>>;

    async fn chain_id(&self) -> CoreResult<String>;

    /// Latest balance in wei, hex encoded
    async fn balance(&self, address: &str) -> CoreResult<String>;

    async fn switch_chain(&self, chain_id: &str) -> CoreResult<()>;

    async fn add_chain(&self, config: &ChainConfig) -> CoreResult<()>;
}

/// What the UI knows about the connected wallet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub address: Option<String>,
    pub chain_id: Option<String>,
    /// ETH, four decimals
    pub balance: Option<String>,
}

impl WalletState {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

/// Persisted "wallet connected" marker, the only state kept across runs
#[derive(Debug, Clone)]
pub struct ConnectionFlag {
    path: Option<PathBuf>,
}

impl ConnectionFlag {
    /// Flag stored as a file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: Some(dir.join(FLAG_FILE)),
        }
    }

    /// Flag that is never persisted
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn is_set(&self) -> bool {
        self.path
            .as_ref()
            .and_then(|p| fs::read_to_string(p).ok())
            .map(|s| s.trim() == "true")
            .unwrap_or(false)
    }

    pub fn set(&self) {
        let Some(path) = &self.path else { return };
        let result = path
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| fs::write(path, "true"));
        if let Err(e) = result {
            warn!("Failed to persist wallet flag at {}: {}", path.display(), e);
        }
    }

    pub fn clear(&self) {
        let Some(path) = &self.path else { return };
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to clear wallet flag at {}: {}", path.display(), e);
            }
        }
    }
}

/// Wallet connection state and the flow that fills it
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    flag: ConnectionFlag,
    state: WalletState,
    error: Option<String>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, flag: ConnectionFlag) -> Self {
        Self {
            provider,
            flag,
            state: WalletState::default(),
            error: None,
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Last user-facing failure, cleared by the next connect attempt
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn short_address(&self) -> Option<String> {
        self.state.address.as_deref().map(short_address)
    }

    /// Connect the wallet and move it to Base.
    ///
    /// Failures end up in [`error`](Self::error). A failed chain switch
    /// leaves the wallet connected. Returns whether an account is connected.
    pub async fn connect(&mut self) -> bool {
        let Some(provider) = self.provider.clone() else {
            self.error = Some("No wallet detected. Configure a wallet RPC endpoint.".to_string());
            return false;
        };

        self.error = None;
        if let Err(e) = self.connect_with(provider.as_ref()).await {
            warn!("Wallet connection failed: {}", e);
            self.error = Some(connect_failure_message(&e));
        }
        self.is_connected()
    }

    async fn connect_with(&mut self, provider: &dyn WalletProvider) -> CoreResult<()> {
        let accounts = provider.request_accounts().await?;
        let Some(address) = accounts.into_iter().next() else {
            debug!("Wallet returned no accounts");
            return Ok(());
        };

        info!("Wallet connected: {}", short_address(&address));
        self.state.address = Some(address.clone());
        self.flag.set();

        let chain_id = provider.chain_id().await?;
        self.state.chain_id = Some(chain_id.clone());

        let balance = provider.balance(&address).await?;
        self.state.balance = Some(format_balance(&balance)?);

        if chain_id != BASE_CHAIN_ID {
            self.switch_to_base(provider).await;
        }
        Ok(())
    }

    async fn switch_to_base(&mut self, provider: &dyn WalletProvider) {
        match provider.switch_chain(BASE_CHAIN_ID).await {
            Ok(()) => {
                self.state.chain_id = Some(BASE_CHAIN_ID.to_string());
            }
            Err(CoreError::Wallet { code: CHAIN_NOT_ADDED, .. }) => {
                debug!("Base is unknown to the wallet, adding it");
                match provider.add_chain(&ChainConfig::base_mainnet()).await {
                    Ok(()) => self.state.chain_id = Some(BASE_CHAIN_ID.to_string()),
                    Err(e) => {
                        warn!("Adding Base failed: {}", e);
                        self.error = Some("Failed to add Base network to your wallet.".to_string());
                    }
                }
            }
            Err(e) => {
                warn!("Switching to Base failed: {}", e);
                self.error = Some("Failed to switch to Base network.".to_string());
            }
        }
    }

    /// Forget the wallet and the persisted flag
    pub fn disconnect(&mut self) {
        self.state = WalletState::default();
        self.error = None;
        self.flag.clear();
        info!("Wallet disconnected");
    }

    /// Reconnect on startup when the flag is set and the wallet still
    /// exposes an account
    pub async fn restore(&mut self) -> bool {
        if !self.flag.is_set() {
            return false;
        }
        let Some(provider) = self.provider.clone() else {
            return false;
        };
        match provider.accounts().await {
            Ok(accounts) if !accounts.is_empty() => self.connect().await,
            Ok(_) => false,
            Err(e) => {
                warn!("Checking saved wallet connection failed: {}", e);
                false
            }
        }
    }

    /// Poll the wallet's exposed accounts and follow any change.
    ///
    /// A wallet that no longer exposes an account disconnects the session.
    pub async fn sync(&mut self) {
        if !self.is_connected() {
            return;
        }
        let Some(provider) = self.provider.clone() else { return };
        match provider.accounts().await {
            Ok(accounts) => self.accounts_changed(accounts).await,
            Err(e) => warn!("Polling wallet accounts failed: {}", e),
        }
    }

    /// Follow an account change reported by the wallet
    pub async fn accounts_changed(&mut self, accounts: Vec<String>) {
        let Some(address) = accounts.into_iter().next() else {
            self.disconnect();
            return;
        };
        if self.state.address.as_deref() == Some(address.as_str()) {
            return;
        }
        self.state.address = Some(address.clone());
        if let Some(provider) = self.provider.clone() {
            match provider.balance(&address).await.and_then(|b| format_balance(&b)) {
                Ok(balance) => self.state.balance = Some(balance),
                Err(e) => warn!("Balance refresh failed: {}", e),
            }
        }
    }
}

fn connect_failure_message(error: &CoreError) -> String {
    match error {
        CoreError::Wallet { message, .. } if !message.is_empty() => message.clone(),
        _ => "Failed to connect wallet".to_string(),
    }
}

/// Hex wei to ETH with four decimals
pub fn format_balance(hex_wei: &str) -> CoreResult<String> {
    let digits = hex_wei.trim().trim_start_matches("0x").trim_start_matches("0X");
    let wei = if digits.is_empty() {
        0
    } else {
        u128::from_str_radix(digits, 16)
            .map_err(|e| CoreError::Wallet {
                code: -32602,
                message: format!("invalid balance '{}': {}", hex_wei, e),
            })?
    };
    Ok(format!("{:.4}", wei as f64 / 1e18))
}

/// `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Wallet reached through a JSON-RPC endpoint
pub struct JsonRpcWallet {
    http: HttpClient,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> CoreResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("Wallet RPC -> {}", request);

        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(CoreError::Wallet {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn call_string(&self, method: &str, params: Value) -> CoreResult<String> {
        match self.call(method, params).await? {
            Value::String(s) => Ok(s),
            other => Err(CoreError::Wallet {
                code: -32603,
                message: format!("{} returned {}", method, other),
            }),
        }
    }

    async fn call_accounts(&self, method: &str) -> CoreResult<Vec<String>> {
        let value = self.call(method, json!([])).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn accounts(&self) -> CoreResult<Vec<String>> {
        self.call_accounts("eth_accounts").await
    }

    async fn request_accounts(&self) -> CoreResult<Vec<String>> {
        self.call_accounts("eth_requestAccounts").await
    }

    async fn chain_id(&self) -> CoreResult<String> {
        self.call_string("eth_chainId", json!([])).await
    }

    async fn balance(&self, address: &str) -> CoreResult<String> {
        self.call_string("eth_getBalance", json!([address, "latest"])).await
    }

    async fn switch_chain(&self, chain_id: &str) -> CoreResult<()> {
        self.call("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await
            .map(|_| ())
    }

    async fn add_chain(&self, config: &ChainConfig) -> CoreResult<()> {
        self.call("wallet_addEthereumChain", json!([config])).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn connected_provider(chain: &'static str) -> MockWalletProvider {
        let mut provider = MockWalletProvider::new();
        provider
            .expect_request_accounts()
            .returning(|| Ok(vec![ADDRESS.to_string()]));
        provider
            .expect_chain_id()
            .returning(move || Ok(chain.to_string()));
        provider
            .expect_balance()
            .returning(|_| Ok("0xde0b6b3a7640000".to_string()));
        provider
    }

    fn session(provider: MockWalletProvider, dir: &TempDir) -> WalletSession {
        WalletSession::new(Some(Arc::new(provider)), ConnectionFlag::in_dir(dir.path()))
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance("0xde0b6b3a7640000").unwrap(), "1.0000");
        assert_eq!(format_balance("0x0").unwrap(), "0.0000");
        assert_eq!(format_balance("0x").unwrap(), "0.0000");
        assert_eq!(format_balance("0x2386f26fc10000").unwrap(), "0.0100");
        assert!(format_balance("0xzz").is_err());
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address(ADDRESS), "0x1234...5678");
        assert_eq!(short_address("0xabc"), "0xabc");
    }

    #[tokio::test]
    async fn test_connect_on_base() {
        let dir = TempDir::new().unwrap();
        let mut provider = connected_provider(BASE_CHAIN_ID);
        provider.expect_switch_chain().never();

        let mut wallet = session(provider, &dir);
        assert!(!wallet.is_connected());
        assert!(wallet.connect().await);
        assert_eq!(wallet.state().balance.as_deref(), Some("1.0000"));
        assert_eq!(wallet.short_address().as_deref(), Some("0x1234...5678"));
        assert_eq!(wallet.state().address.as_deref(), Some(ADDRESS));
        assert!(wallet.error().is_none());
        assert!(ConnectionFlag::in_dir(dir.path()).is_set());
    }

    #[tokio::test]
    async fn test_connect_adds_unknown_chain() {
        let dir = TempDir::new().unwrap();
        let mut provider = connected_provider("0x1");
        provider.expect_switch_chain().times(1).returning(|_| {
            Err(CoreError::Wallet {
                code: CHAIN_NOT_ADDED,
                message: "Unrecognized chain ID".into(),
            })
        });
        provider
            .expect_add_chain()
            .withf(|config| config.chain_id == BASE_CHAIN_ID)
            .times(1)
            .returning(|_| Ok(()));

        let mut wallet = session(provider, &dir);
        assert!(wallet.connect().await);
        assert_eq!(wallet.state().chain_id.as_deref(), Some(BASE_CHAIN_ID));
        assert!(wallet.error().is_none());
    }

    #[tokio::test]
    async fn test_switch_failure_keeps_connection() {
        let dir = TempDir::new().unwrap();
        let mut provider = connected_provider("0x1");
        provider.expect_switch_chain().returning(|_| {
            Err(CoreError::Wallet {
                code: 4001,
                message: "User rejected the request.".into(),
            })
        });
        provider.expect_add_chain().never();

        let mut wallet = session(provider, &dir);
        assert!(wallet.connect().await);
        assert_eq!(wallet.error(), Some("Failed to switch to Base network."));
        assert_eq!(wallet.state().chain_id.as_deref(), Some("0x1"));
    }

    #[tokio::test]
    async fn test_rejected_request_reports_message() {
        let dir = TempDir::new().unwrap();
        let mut provider = MockWalletProvider::new();
        provider.expect_request_accounts().returning(|| {
            Err(CoreError::Wallet {
                code: 4001,
                message: "User rejected the request.".into(),
            })
        });

        let mut wallet = session(provider, &dir);
        assert!(!wallet.connect().await);
        assert_eq!(wallet.error(), Some("User rejected the request."));
        assert!(!ConnectionFlag::in_dir(dir.path()).is_set());
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let mut wallet = WalletSession::new(None, ConnectionFlag::disabled());
        assert!(!wallet.connect().await);
        assert!(wallet.error().unwrap().starts_with("No wallet detected"));
        assert!(!wallet.restore().await);
    }

    #[tokio::test]
    async fn test_disconnect_clears_flag() {
        let dir = TempDir::new().unwrap();
        let mut wallet = session(connected_provider(BASE_CHAIN_ID), &dir);
        wallet.connect().await;

        wallet.disconnect();
        assert!(!wallet.is_connected());
        assert_eq!(wallet.state(), &WalletState::default());
        assert!(!ConnectionFlag::in_dir(dir.path()).is_set());
    }

    #[tokio::test]
    async fn test_restore_requires_flag_and_account() {
        let dir = TempDir::new().unwrap();

        let mut provider = connected_provider(BASE_CHAIN_ID);
        provider.expect_accounts().never();
        let mut wallet = session(provider, &dir);
        assert!(!wallet.restore().await);

        ConnectionFlag::in_dir(dir.path()).set();
        let mut provider = connected_provider(BASE_CHAIN_ID);
        provider
            .expect_accounts()
            .times(1)
            .returning(|| Ok(vec![ADDRESS.to_string()]));
        let mut wallet = session(provider, &dir);
        assert!(wallet.restore().await);
        assert!(wallet.is_connected());
    }

    #[tokio::test]
    async fn test_empty_accounts_change_disconnects() {
        let dir = TempDir::new().unwrap();
        let mut wallet = session(connected_provider(BASE_CHAIN_ID), &dir);
        wallet.connect().await;

        wallet.accounts_changed(vec![]).await;
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn test_sync_follows_account_switch() {
        let dir = TempDir::new().unwrap();
        let mut provider = connected_provider(BASE_CHAIN_ID);
        provider
            .expect_accounts()
            .times(1)
            .returning(|| Ok(vec!["0xabcdefabcdefabcdefabcdefabcdefabcdefabcd".to_string()]));
        let mut wallet = session(provider, &dir);
        wallet.connect().await;

        wallet.sync().await;
        assert_eq!(wallet.short_address().as_deref(), Some("0xabcd...abcd"));
        assert_eq!(wallet.state().balance.as_deref(), Some("1.0000"));
    }

    #[tokio::test]
    async fn test_sync_disconnects_when_accounts_vanish() {
        let dir = TempDir::new().unwrap();
        let mut provider = connected_provider(BASE_CHAIN_ID);
        provider.expect_accounts().times(1).returning(|| Ok(vec![]));
        let mut wallet = session(provider, &dir);
        wallet.connect().await;

        wallet.sync().await;
        assert!(!wallet.is_connected());
        assert!(!ConnectionFlag::in_dir(dir.path()).is_set());
    }

    #[tokio::test]
    async fn test_sync_skips_disconnected_wallet() {
        let dir = TempDir::new().unwrap();
        let mut provider = MockWalletProvider::new();
        provider.expect_accounts().never();
        let mut wallet = session(provider, &dir);

        wallet.sync().await;
        assert!(!wallet.is_connected());
    }
}
