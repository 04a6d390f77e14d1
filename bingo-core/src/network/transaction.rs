use crate::amount::u128_to_be_minimal;
use crate::error::Result;
use crate::types::NetworkConfig;
use crate::wallet::{Address, PrivateKey};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};

pub const BUY_TICKET_GAS_LIMIT: u64 = 10_000_000;
pub const EXTRACT_NUMBERS_GAS_LIMIT: u64 = 40_000_000;

pub const BUY_TICKET_FUNCTION: &str = "buy_ticket";
pub const EXTRACT_NUMBERS_FUNCTION: &str = "extract_numbers";

/// Unsigned contract call or transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub nonce: u64,
    /// Native base units.
    pub value: u128,
    pub receiver: Address,
    pub sender: Address,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub data: String,
    pub chain_id: String,
    pub version: u32,
}

/// Transaction in the node's JSON wire layout. Field order is part of the
/// signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<String>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<String>,
}

impl TransactionRequest {
    /// Call `data` on `receiver` with the network's default gas price,
    /// chain id and version.
    pub fn call(
        network: &NetworkConfig,
        sender: Address,
        receiver: Address,
        nonce: u64,
        value: u128,
        gas_limit: u64,
        data: impl Into<String>,
    ) -> Self {
        Self {
            nonce,
            value,
            receiver,
            sender,
            gas_price: network.min_gas_price,
            gas_limit,
            data: data.into(),
            chain_id: network.chain_id.clone(),
            version: network.min_transaction_version,
        }
    }

    fn unsigned(&self) -> SignedTransaction {
        SignedTransaction {
            nonce: self.nonce,
            value: self.value.to_string(),
            receiver: self.receiver.to_string(),
            sender: self.sender.to_string(),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: (!self.data.is_empty()).then(|| STANDARD.encode(self.data.as_bytes())),
            chain_id: self.chain_id.clone(),
            version: self.version,
            signature: None,
        }
    }

    /// Bytes covered by the signature.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.unsigned())?)
    }

    pub fn sign(&self, key: &PrivateKey) -> Result<SignedTransaction> {
        let payload = self.signing_payload()?;
        let signing_key = SigningKey::from_bytes(key.as_bytes());
        let signature = signing_key.sign(&payload);

        let mut signed = self.unsigned();
        signed.signature = Some(hex::encode(signature.to_bytes()));
        Ok(signed)
    }
}

/// Data field of a ticket purchase. Token rounds pay through a token
/// transfer carrying the call, with zero native value.
pub fn buy_ticket_data(token_identifier: Option<&str>, token_amount: u128) -> String {
    match token_identifier {
        Some(token) if !token.is_empty() => format!(
            "ESDTTransfer@{}@{}@{}",
            hex::encode(token.as_bytes()),
            hex::encode(u128_to_be_minimal(token_amount)),
            hex::encode(BUY_TICKET_FUNCTION.as_bytes())
        ),
        _ => BUY_TICKET_FUNCTION.to_string(),
    }
}
