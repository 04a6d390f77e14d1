//! Node proxy HTTP client.

use super::{LedgerClient, SignedTransaction};
use crate::amount::parse_decimal_u128;
use crate::error::{BingoError, Result};
use crate::types::{Account, NetworkConfig};
use crate::wallet::Address;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ProxyClient {
    url: String,
    client: Client,
}

impl ProxyClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BingoError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.url, path);
        tracing::debug!("GET {}", url);
        let response: ProxyResponse<T> = self.client.get(&url).send().await?.json().await?;
        response.into_data(path)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.url, path);
        tracing::debug!("POST {}", url);
        let response: ProxyResponse<T> = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        response.into_data(path)
    }
}

#[async_trait]
impl LedgerClient for ProxyClient {
    async fn network_config(&self) -> Result<NetworkConfig> {
        let data: NetworkConfigData = self.get("/network/config").await?;
        Ok(data.config.into())
    }

    async fn query_contract(
        &self,
        contract: &Address,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>> {
        let request = VmQueryRequest {
            sc_address: contract.to_string(),
            func_name: function.to_string(),
            args: args.iter().map(hex::encode).collect(),
        };
        let data: VmQueryData = self.post("/vm-values/query", &request).await?;
        data.data.into_return_data(function)
    }

    async fn get_account(&self, address: &Address) -> Result<Account> {
        let data: AccountData = self.get(&format!("/address/{}", address)).await?;
        Ok(Account {
            balance: parse_decimal_u128(&data.account.balance)?,
            nonce: data.account.nonce,
        })
    }

    async fn get_token_balance(&self, address: &Address, token: &str) -> Result<u128> {
        let data: TokenBalanceData = self
            .get(&format!("/address/{}/esdt/{}", address, token))
            .await?;
        parse_decimal_u128(&data.token_data.balance)
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> Result<String> {
        let data: SendData = self.post("/transaction/send", tx).await?;
        tracing::info!("Submitted transaction {}", data.tx_hash);
        Ok(data.tx_hash)
    }
}

#[derive(Debug, Deserialize)]
struct ProxyResponse<T> {
    data: Option<T>,
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

impl<T> ProxyResponse<T> {
    fn into_data(self, path: &str) -> Result<T> {
        if !self.error.is_empty() {
            return Err(BingoError::ledger(format!("{}: {}", path, self.error)));
        }
        if !self.code.is_empty() && self.code != "successful" {
            return Err(BingoError::ledger(format!("{}: code {}", path, self.code)));
        }
        self.data
            .ok_or_else(|| BingoError::invalid_response(format!("{}: missing data", path)))
    }
}

#[derive(Debug, Deserialize)]
struct NetworkConfigData {
    config: RawNetworkConfig,
}

#[derive(Debug, Deserialize)]
struct RawNetworkConfig {
    erd_chain_id: String,
    erd_denomination: u32,
    erd_min_gas_price: u64,
    erd_min_transaction_version: u32,
    erd_round_duration: i64,
    erd_start_time: i64,
}

impl From<RawNetworkConfig> for NetworkConfig {
    fn from(raw: RawNetworkConfig) -> Self {
        Self {
            chain_id: raw.erd_chain_id,
            denomination: raw.erd_denomination,
            min_gas_price: raw.erd_min_gas_price,
            min_transaction_version: raw.erd_min_transaction_version,
            round_duration_ms: raw.erd_round_duration,
            start_time: raw.erd_start_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VmQueryRequest {
    sc_address: String,
    func_name: String,
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VmQueryData {
    data: VmOutput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VmOutput {
    #[serde(default)]
    return_data: Option<Vec<Option<String>>>,
    #[serde(default)]
    return_code: String,
    #[serde(default)]
    return_message: String,
}

impl VmOutput {
    fn into_return_data(self, function: &str) -> Result<Vec<Vec<u8>>> {
        if !self.return_code.is_empty() && self.return_code != "ok" {
            return Err(BingoError::ledger(format!(
                "{}: {} {}",
                function, self.return_code, self.return_message
            )));
        }

        self.return_data
            .unwrap_or_default()
            .into_iter()
            .map(|entry| match entry {
                Some(encoded) => STANDARD.decode(encoded).map_err(|e| {
                    BingoError::invalid_response(format!("{}: bad return data: {}", function, e))
                }),
                None => Ok(Vec::new()),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AccountData {
    account: RawAccount,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    balance: String,
    nonce: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalanceData {
    token_data: RawTokenBalance,
}

#[derive(Debug, Deserialize)]
struct RawTokenBalance {
    balance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendData {
    tx_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_config_response() {
        let body = r#"{
            "data": { "config": {
                "erd_chain_id": "1",
                "erd_denomination": 18,
                "erd_min_gas_price": 1000000000,
                "erd_min_gas_limit": 50000,
                "erd_min_transaction_version": 1,
                "erd_round_duration": 6000,
                "erd_start_time": 1596117600
            }},
            "error": "",
            "code": "successful"
        }"#;
        let response: ProxyResponse<NetworkConfigData> = serde_json::from_str(body).unwrap();
        let config: NetworkConfig = response.into_data("/network/config").unwrap().config.into();
        assert_eq!(config.chain_id, "1");
        assert_eq!(config.round_duration_ms, 6000);
        assert_eq!(config.start_time, 1_596_117_600);
    }

    #[test]
    fn test_error_envelope() {
        let body = r#"{ "data": null, "error": "account not found", "code": "internal_issue" }"#;
        let response: ProxyResponse<AccountData> = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.into_data("/address/x"),
            Err(BingoError::Ledger(_))
        ));
    }

    #[test]
    fn test_vm_query_return_data() {
        let body = r#"{
            "data": { "data": {
                "returnData": ["Kg==", null, ""],
                "returnCode": "ok",
                "returnMessage": ""
            }},
            "code": "successful"
        }"#;
        let response: ProxyResponse<VmQueryData> = serde_json::from_str(body).unwrap();
        let values = response
            .into_data("/vm-values/query")
            .unwrap()
            .data
            .into_return_data("getRound")
            .unwrap();
        assert_eq!(values, vec![vec![42u8], vec![], vec![]]);
    }

    #[test]
    fn test_vm_query_empty_and_failed() {
        let empty = VmOutput {
            return_data: None,
            return_code: "ok".to_string(),
            return_message: String::new(),
        };
        assert!(empty.into_return_data("getPlayers").unwrap().is_empty());

        let failed = VmOutput {
            return_data: None,
            return_code: "user error".to_string(),
            return_message: "invalid function".to_string(),
        };
        assert!(matches!(
            failed.into_return_data("nope"),
            Err(BingoError::Ledger(_))
        ));
    }

    #[test]
    fn test_query_request_shape() {
        let request = VmQueryRequest {
            sc_address: "erd1contract".to_string(),
            func_name: "getUserTickets".to_string(),
            args: vec![hex::encode([0xab, 0xcd])],
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"scAddress":"erd1contract","funcName":"getUserTickets","args":["abcd"]}"#
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ProxyClient::new("https://gateway.example/").unwrap();
        assert_eq!(client.url(), "https://gateway.example");
    }
}
