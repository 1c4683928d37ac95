//! Peer RPC Client
//!
//! Outbound side of every internal endpoint: directory operations against a
//! key's root, blob fetches against replicas, and membership notices.
//! Each call is retried a bounded number of times with exponential backoff;
//! running out of attempts is reported as an error for that call.

use super::protocol::{
    ENDPOINT_HELLO, ENDPOINT_NOTIFY_JOIN, ENDPOINT_NOTIFY_LEAVE, HelloRequest, HelloResponse,
    MembershipNotice, NoticeResponse,
};
use super::types::Node;
use crate::blob::BlobTransport;
use crate::blob::protocol::{ENDPOINT_FETCH_BLOB, FetchBlobRequest};
use crate::config::NodeConfig;
use crate::directory::protocol::*;

use anyhow::Result;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone)]
pub struct PeerClient {
    http_client: reqwest::Client,
    attempts: u32,
    timeout: Duration,
    backoff: Duration,
    backoff_max: Duration,
}

impl PeerClient {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            attempts: u32::try_from(config.rpc_retries).unwrap_or(u32::MAX).max(1),
            timeout: config.rpc_timeout,
            backoff: config.rpc_backoff,
            backoff_max: config.rpc_backoff_max,
        }
    }

    /// Sleep before retry number `retry` (1-based): the base delay doubled per
    /// earlier retry, capped, plus up to half the base delay of jitter.
    fn backoff_delay(&self, retry: u32) -> Duration {
        let exponential = self
            .backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
            .min(self.backoff_max);
        let jitter_cap = duration_ms(self.backoff) / 2;
        exponential + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_cap))
    }

    /// POSTs `payload` as JSON, retrying transport failures. HTTP error statuses
    /// are returned to the caller untouched.
    async fn send_with_retry<T: Serialize>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<reqwest::Response> {
        let mut retry = 0;
        loop {
            let sent = self
                .http_client
                .post(url)
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await;

            match sent {
                Ok(response) => return Ok(response),
                Err(e) if retry + 1 >= self.attempts => {
                    return Err(anyhow::anyhow!(
                        "{} failed after {} attempts: {}",
                        url,
                        self.attempts,
                        e
                    ));
                }
                Err(e) => {
                    retry += 1;
                    let delay = self.backoff_delay(retry);
                    tracing::debug!("POST {} failed ({}), retry {} in {:?}", url, e, retry, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn call<Req, Resp>(&self, addr: SocketAddr, endpoint: &str, payload: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let response = self
            .send_with_retry(&format!("http://{}{}", addr, endpoint), payload)
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "{} on {} failed: {}",
                endpoint,
                addr,
                response.status()
            ));
        }

        Ok(response.json().await?)
    }

    // --- Membership ---

    pub async fn hello(&self, seed: SocketAddr, local: &Node) -> Result<HelloResponse> {
        self.call(seed, ENDPOINT_HELLO, &HelloRequest { node: *local })
            .await
    }

    pub async fn notify_join(&self, target: &Node, joiner: &Node) -> Result<()> {
        let _: NoticeResponse = self
            .call(
                target.address,
                ENDPOINT_NOTIFY_JOIN,
                &MembershipNotice { node: *joiner },
            )
            .await?;
        Ok(())
    }

    pub async fn notify_leave(&self, target: &Node, leaver: &Node) -> Result<()> {
        let _: NoticeResponse = self
            .call(
                target.address,
                ENDPOINT_NOTIFY_LEAVE,
                &MembershipNotice { node: *leaver },
            )
            .await?;
        Ok(())
    }

    // --- Remote directory ---

    pub async fn register(
        &self,
        root: &Node,
        key: &str,
        replica: &Node,
        timeout: Duration,
    ) -> Result<bool> {
        let payload = RegisterRequest {
            key: key.to_string(),
            replica: *replica,
            timeout_ms: duration_ms(timeout),
        };
        let response: RegisterResponse = self.call(root.address, ENDPOINT_REGISTER, &payload).await?;
        Ok(response.added)
    }

    pub async fn register_all(
        &self,
        target: &Node,
        registrations: HashMap<String, Vec<Node>>,
        timeout: Duration,
    ) -> Result<()> {
        let payload = RegisterAllRequest {
            registrations,
            timeout_ms: duration_ms(timeout),
        };
        let _: RegisterAllResponse = self
            .call(target.address, ENDPOINT_REGISTER_ALL, &payload)
            .await?;
        Ok(())
    }

    pub async fn unregister(&self, root: &Node, key: &str, replica: &Node) -> Result<bool> {
        let payload = UnregisterRequest {
            key: key.to_string(),
            replica: *replica,
        };
        let response: UnregisterResponse =
            self.call(root.address, ENDPOINT_UNREGISTER, &payload).await?;
        Ok(response.existed)
    }

    pub async fn unregister_all(&self, root: &Node, key: &str) -> Result<Vec<Node>> {
        let payload = KeyRequest {
            key: key.to_string(),
        };
        let response: ReplicasResponse = self
            .call(root.address, ENDPOINT_UNREGISTER_ALL, &payload)
            .await?;
        Ok(response.replicas)
    }

    pub async fn get(&self, root: &Node, key: &str) -> Result<Vec<Node>> {
        let payload = KeyRequest {
            key: key.to_string(),
        };
        let response: ReplicasResponse = self.call(root.address, ENDPOINT_GET, &payload).await?;
        Ok(response.replicas)
    }
}

#[async_trait::async_trait]
impl BlobTransport for PeerClient {
    async fn fetch_blob(&self, node: &Node, key: &str) -> Result<Option<Vec<u8>>> {
        let payload = FetchBlobRequest {
            key: key.to_string(),
        };
        let response = self
            .send_with_retry(
                &format!("http://{}{}", node.address, ENDPOINT_FETCH_BLOB),
                &payload,
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Blob fetch from {} failed: {}",
                node,
                response.status()
            ));
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_follows_config() {
        let client = PeerClient::new(&NodeConfig {
            rpc_backoff: Duration::from_millis(100),
            rpc_backoff_max: Duration::from_millis(300),
            ..NodeConfig::default()
        });

        for _ in 0..20 {
            let first = client.backoff_delay(1);
            assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));

            let second = client.backoff_delay(2);
            assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(250));

            let capped = client.backoff_delay(10);
            assert!(capped >= Duration::from_millis(300) && capped <= Duration::from_millis(350));
        }
    }

    #[test]
    fn test_zero_retries_still_makes_one_attempt() {
        let client = PeerClient::new(&NodeConfig {
            rpc_retries: 0,
            ..NodeConfig::default()
        });
        assert_eq!(client.attempts, 1);
    }
}
