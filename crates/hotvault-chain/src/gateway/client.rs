//! Bridge client implementing the collaborator traits over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use hotvault_core::config::GatewayConfig;
use hotvault_core::error::{AppError, ErrorKind};
use hotvault_core::result::AppResult;
use hotvault_core::traits::{
    DestinationRecord, DestinationRegistry, EscrowAccount, PaymentService, ProviderEventSender,
    ServiceApproval, StorageProviderClient, TransactionWatcher, TxReceipt,
};
use hotvault_core::types::{Address, DestinationId, PieceCid, ProviderId, TokenAmount, TxHash};

use super::dto::{
    AmountResponse, ApproveRequest, BridgeError, CreateDestinationRequest, DepositRequest,
    ProviderLookupResponse, TxResponse, UploadLine, UploadOutcome,
};

/// Receipt and upload calls block on the bridge until mining completes.
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// HTTP client for the SDK bridge.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base: String,
    client: Client,
}

impl GatewayClient {
    /// Creates a client for the configured bridge.
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;
        Ok(Self {
            base: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        debug!(path, "GET bridge");
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        debug!(path, "POST bridge");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BridgeError>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    let kind = if status.as_u16() == 404 {
        ErrorKind::NotFound
    } else if status.is_server_error() {
        ErrorKind::UpstreamUnavailable
    } else {
        ErrorKind::ExternalService
    };
    Err(AppError::new(kind, format!("Bridge returned {status}: {message}")))
}

#[async_trait]
impl PaymentService for GatewayClient {
    async fn wallet_balance(&self, token: &Address, owner: &Address) -> AppResult<TokenAmount> {
        let body: AmountResponse = self
            .get(&format!("/payments/{owner}/wallet?token={token}"))
            .await?;
        Ok(body.amount)
    }

    async fn escrow_account(&self, token: &Address, owner: &Address) -> AppResult<EscrowAccount> {
        self.get(&format!("/payments/{owner}/escrow?token={token}"))
            .await
    }

    async fn service_approval(
        &self,
        owner: &Address,
        spender: &Address,
    ) -> AppResult<ServiceApproval> {
        self.get(&format!("/payments/{owner}/approvals/{spender}"))
            .await
    }

    async fn rate_allowance_needed(
        &self,
        capacity_bytes: u64,
        with_cdn: bool,
    ) -> AppResult<TokenAmount> {
        let body: AmountResponse = self
            .get(&format!(
                "/storage/rate-needed?capacity_bytes={capacity_bytes}&with_cdn={with_cdn}"
            ))
            .await?;
        Ok(body.amount)
    }

    async fn deposit(&self, token: &Address, amount: TokenAmount) -> AppResult<TxHash> {
        let body: TxResponse = self
            .post(
                "/payments/deposit",
                &DepositRequest {
                    token: token.clone(),
                    amount,
                },
            )
            .await?;
        Ok(body.tx_hash)
    }

    async fn approve_service(
        &self,
        token: &Address,
        spender: &Address,
        rate_limit: TokenAmount,
        lockup_limit: TokenAmount,
    ) -> AppResult<TxHash> {
        let body: TxResponse = self
            .post(
                "/payments/approve",
                &ApproveRequest {
                    token: token.clone(),
                    spender: spender.clone(),
                    rate_limit,
                    lockup_limit,
                },
            )
            .await?;
        Ok(body.tx_hash)
    }
}

#[async_trait]
impl TransactionWatcher for GatewayClient {
    async fn wait_for_transaction(&self, tx: &TxHash) -> AppResult<TxReceipt> {
        let response = self
            .client
            .get(self.url(&format!("/transactions/{tx}/receipt")))
            .timeout(LONG_POLL_TIMEOUT)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl DestinationRegistry for GatewayClient {
    async fn list_client_destinations(&self, client: &Address) -> AppResult<Vec<DestinationRecord>> {
        self.get(&format!("/clients/{client}/destinations")).await
    }

    async fn resolve_provider_id(&self, destination: DestinationId) -> AppResult<Option<ProviderId>> {
        let body: ProviderLookupResponse = self
            .get(&format!("/destinations/{destination}/provider"))
            .await?;
        Ok(body.provider_id)
    }

    async fn create_destination(&self, client: &Address, with_cdn: bool) -> AppResult<TxHash> {
        let body: TxResponse = self
            .post(
                "/destinations",
                &CreateDestinationRequest {
                    client: client.clone(),
                    with_cdn,
                },
            )
            .await?;
        Ok(body.tx_hash)
    }

    async fn confirm_destination(&self, tx: &TxHash) -> AppResult<DestinationRecord> {
        let response = self
            .client
            .get(self.url(&format!("/destinations/created/{tx}")))
            .timeout(LONG_POLL_TIMEOUT)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl StorageProviderClient for GatewayClient {
    async fn upload(
        &self,
        destination: DestinationId,
        data: Bytes,
        events: ProviderEventSender,
    ) -> AppResult<PieceCid> {
        let mut response = self
            .client
            .post(self.url(&format!("/destinations/{destination}/upload")))
            .header(CONTENT_TYPE, "application/octet-stream")
            .timeout(LONG_POLL_TIMEOUT)
            .body(data)
            .send()
            .await?;
        if !response.status().is_success() {
            return decode(response).await;
        }

        // Events may follow the outcome line, so the stream is read to the end.
        let mut stream = UploadStream::default();
        while let Some(chunk) = response.chunk().await? {
            stream.feed(&chunk, &events)?;
        }
        stream.finish(&events)
    }
}

/// Incremental NDJSON decoder for the upload response body.
#[derive(Debug, Default)]
struct UploadStream {
    buffer: Vec<u8>,
    commp: Option<PieceCid>,
}

impl UploadStream {
    /// Consume one body chunk, forwarding every complete line.
    fn feed(&mut self, chunk: &[u8], events: &ProviderEventSender) -> AppResult<()> {
        self.buffer.extend_from_slice(chunk);
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.accept(&line, events)?;
        }
        Ok(())
    }

    /// Flush the trailing line and return the reported commitment.
    fn finish(mut self, events: &ProviderEventSender) -> AppResult<PieceCid> {
        let rest = std::mem::take(&mut self.buffer);
        self.accept(&rest, events)?;
        self.commp.ok_or_else(|| {
            AppError::transfer("Bridge closed the upload stream without an outcome")
        })
    }

    fn accept(&mut self, line: &[u8], events: &ProviderEventSender) -> AppResult<()> {
        if let Some(commp) = handle_line(line, events)? {
            if self.commp.is_some() {
                warn!(commp = %commp, "Ignoring repeated upload outcome");
            } else {
                self.commp = Some(commp);
            }
        }
        Ok(())
    }
}

/// Forward one NDJSON line; returns the commitment once the outcome arrives.
fn handle_line(line: &[u8], events: &ProviderEventSender) -> AppResult<Option<PieceCid>> {
    let text = std::str::from_utf8(line)
        .map_err(|e| AppError::with_source(ErrorKind::Serialization, "Upload stream is not UTF-8", e))?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<UploadLine>(text)? {
        UploadLine::Event(event) => {
            if events.send(event).is_err() {
                warn!("Upload progress receiver dropped");
            }
            Ok(None)
        }
        UploadLine::Outcome(UploadOutcome::Completed { commp }) => Ok(Some(commp)),
        UploadLine::Outcome(UploadOutcome::Failed { message }) => Err(AppError::transfer(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotvault_core::traits::ProviderEvent;
    use tokio::sync::mpsc;

    #[test]
    fn test_base_url_trimmed() {
        let config = GatewayConfig {
            url: "http://bridge:8787/".to_string(),
            ..GatewayConfig::default()
        };
        let client = GatewayClient::new(&config).expect("client");
        assert_eq!(client.url("/destinations"), "http://bridge:8787/destinations");
    }

    #[test]
    fn test_handle_line_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let out = handle_line(br#"{"event":"root_confirmed","root_ids":[4]}"#, &tx).expect("line");
        assert!(out.is_none());
        assert!(matches!(
            rx.try_recv(),
            Ok(ProviderEvent::RootConfirmed { .. })
        ));

        let out = handle_line(b"  \n", &tx).expect("blank");
        assert!(out.is_none());
    }

    #[test]
    fn test_handle_line_outcomes() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let commp = handle_line(br#"{"outcome":"completed","commp":"baga6ea4seaqabcd"}"#, &tx)
            .expect("line");
        assert_eq!(commp.map(|c| c.to_string()).as_deref(), Some("baga6ea4seaqabcd"));

        let err = handle_line(br#"{"outcome":"failed","message":"disk full"}"#, &tx)
            .expect_err("failure");
        assert_eq!(err.kind, ErrorKind::TransferFailed);
    }

    #[test]
    fn test_events_after_outcome_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut stream = UploadStream::default();
        stream
            .feed(
                b"{\"event\":\"transfer_complete\",\"commp\":\"baga6ea4seaqabcd\"}\n{\"outcome\":\"comp",
                &tx,
            )
            .expect("first chunk");
        stream
            .feed(b"leted\",\"commp\":\"baga6ea4seaqabcd\"}\n", &tx)
            .expect("second chunk");
        stream
            .feed(br#"{"event":"root_confirmed","root_ids":[9]}"#, &tx)
            .expect("trailing event");

        let commp = stream.finish(&tx).expect("outcome");
        assert_eq!(commp.to_string(), "baga6ea4seaqabcd");
        assert!(matches!(
            rx.try_recv(),
            Ok(ProviderEvent::TransferComplete { .. })
        ));
        match rx.try_recv() {
            Ok(ProviderEvent::RootConfirmed { root_ids }) => assert_eq!(root_ids.len(), 1),
            other => panic!("expected root confirmation, got {other:?}"),
        }
    }

    #[test]
    fn test_stream_without_outcome_fails() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut stream = UploadStream::default();
        stream
            .feed(b"{\"event\":\"root_submitted\",\"tx_hash\":null}\n", &tx)
            .expect("event");

        let err = stream.finish(&tx).expect_err("no outcome");
        assert_eq!(err.kind, ErrorKind::TransferFailed);
        assert!(matches!(
            rx.try_recv(),
            Ok(ProviderEvent::RootSubmitted { tx_hash: None })
        ));
    }
}
