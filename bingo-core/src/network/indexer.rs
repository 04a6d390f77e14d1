use super::Indexer;
use crate::amount::parse_decimal_u128;
use crate::error::{BingoError, Result};
use crate::types::{ResultRecord, TransactionStatus};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESULTS: usize = 1000;

/// Elasticsearch-backed transaction indexer.
#[derive(Clone)]
pub struct ElasticIndexer {
    url: String,
    client: Client,
}

impl ElasticIndexer {
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

    async fn search<T: DeserializeOwned>(&self, index: &str, query: &str, size: usize) -> Result<Vec<T>> {
        let url = format!("{}/{}/_search?size={}&q={}", self.url, index, size, query);
        tracing::debug!("GET {}", url);
        let result: SearchResult<T> = self.client.get(&url).send().await?.json().await?;
        Ok(result.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}

#[async_trait]
impl Indexer for ElasticIndexer {
    async fn transaction_status(&self, hash: &str) -> Result<TransactionStatus> {
        let hits: Vec<TransactionSource> = self
            .search("transactions", &format!("_id:{}", hash), 1)
            .await?;
        status_from_hits(hash, hits)
    }

    async fn transaction_results(&self, hash: &str) -> Result<Vec<ResultRecord>> {
        let hits: Vec<ResultSource> = self
            .search("scresults", &format!("originalTxHash:{}", hash), MAX_RESULTS)
            .await?;
        Ok(records_from_hits(hash, hits))
    }
}

/// Unreadable records are dropped so the rest of the batch still counts.
fn records_from_hits(hash: &str, hits: Vec<ResultSource>) -> Vec<ResultRecord> {
    hits.into_iter()
        .filter_map(|source| match ResultRecord::try_from(source) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Dropping result record of {}: {}", hash, e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchResult<T> {
    hits: Hits<T>,
}

#[derive(Debug, Deserialize)]
struct Hits<T> {
    #[serde(default = "Vec::new")]
    hits: Vec<Hit<T>>,
}

#[derive(Debug, Deserialize)]
struct Hit<T> {
    #[serde(rename = "_source")]
    source: T,
}

#[derive(Debug, Deserialize)]
struct TransactionSource {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ResultSource {
    #[serde(default)]
    receiver: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    data: Option<String>,
}

fn status_from_hits(hash: &str, hits: Vec<TransactionSource>) -> Result<TransactionStatus> {
    match hits.as_slice() {
        [hit] => Ok(TransactionStatus::from_indexer(&hit.status)),
        _ => Err(BingoError::invalid_response(format!(
            "expected one indexed transaction for {}, found {}",
            hash,
            hits.len()
        ))),
    }
}

impl TryFrom<ResultSource> for ResultRecord {
    type Error = BingoError;

    fn try_from(source: ResultSource) -> Result<Self> {
        let value = if source.value.is_empty() {
            0
        } else {
            parse_decimal_u128(&source.value)?
        };
        let data = match source.data {
            Some(encoded) => {
                let bytes = STANDARD.decode(encoded).map_err(|e| {
                    BingoError::invalid_response(format!("Bad result data: {}", e))
                })?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            None => String::new(),
        };

        Ok(Self {
            receiver: source.receiver,
            value,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_transaction_hit() {
        let body = r#"{"hits":{"total":{"value":1},"hits":[
            {"_id":"abc","_source":{"status":"success","nonce":3}}
        ]}}"#;
        let result: SearchResult<TransactionSource> = serde_json::from_str(body).unwrap();
        let hits = result.hits.hits.into_iter().map(|h| h.source).collect();
        assert_eq!(
            status_from_hits("abc", hits).unwrap(),
            TransactionStatus::Success
        );
    }

    #[test]
    fn test_hit_count_must_be_one() {
        assert!(matches!(
            status_from_hits("abc", vec![]),
            Err(BingoError::InvalidResponse(_))
        ));

        let two = vec![
            TransactionSource {
                status: "pending".to_string(),
            },
            TransactionSource {
                status: "success".to_string(),
            },
        ];
        assert!(status_from_hits("abc", two).is_err());
    }

    #[test]
    fn test_result_records() {
        let body = r#"{"hits":{"hits":[
            {"_source":{"receiver":"erd1a","value":"2000000000000000000","data":"QDZmNmI="}},
            {"_source":{"receiver":"erd1b","value":"0"}}
        ]}}"#;
        let result: SearchResult<ResultSource> = serde_json::from_str(body).unwrap();
        let records: Vec<ResultRecord> = result
            .hits
            .hits
            .into_iter()
            .map(|h| ResultRecord::try_from(h.source).unwrap())
            .collect();

        assert_eq!(records[0].value, 2 * 10u128.pow(18));
        assert!(records[0].is_ok_marker());
        assert_eq!(records[1].data, "");
    }

    #[test]
    fn test_empty_results() {
        let body = r#"{"hits":{"total":{"value":0},"hits":[]}}"#;
        let result: SearchResult<ResultSource> = serde_json::from_str(body).unwrap();
        assert!(result.hits.hits.is_empty());
    }

    #[test]
    fn test_unreadable_record_is_dropped() {
        let body = r#"{"hits":{"hits":[
            {"_source":{"receiver":"erd1a","value":"lots"}},
            {"_source":{"receiver":"erd1b","value":"50000"}}
        ]}}"#;
        let result: SearchResult<ResultSource> = serde_json::from_str(body).unwrap();
        let hits = result.hits.hits.into_iter().map(|h| h.source).collect();

        let records = records_from_hits("abc", hits);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].receiver, "erd1b");
        assert_eq!(records[0].value, 50_000);
    }

    #[test]
    fn test_bad_value_is_invalid_response() {
        let source = ResultSource {
            receiver: "erd1a".to_string(),
            value: "lots".to_string(),
            data: None,
        };
        assert!(matches!(
            ResultRecord::try_from(source),
            Err(BingoError::InvalidResponse(_))
        ));
    }
}
