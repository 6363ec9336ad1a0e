//! Wire types exchanged with the bridge.

use serde::{Deserialize, Serialize};

use hotvault_core::traits::ProviderEvent;
use hotvault_core::types::{Address, PieceCid, ProviderId, TokenAmount, TxHash};

/// A single amount in base units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountResponse {
    /// Amount as a decimal string.
    pub amount: TokenAmount,
}

/// A submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResponse {
    /// Transaction hash.
    pub tx_hash: TxHash,
}

/// Body of `POST /payments/deposit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Payment token.
    pub token: Address,
    /// Amount to deposit.
    pub amount: TokenAmount,
}

/// Body of `POST /payments/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Payment token.
    pub token: Address,
    /// Service contract being approved.
    pub spender: Address,
    /// Rate allowance per epoch.
    pub rate_limit: TokenAmount,
    /// Total lockup allowance.
    pub lockup_limit: TokenAmount,
}

/// Body of `POST /destinations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDestinationRequest {
    /// Owning client.
    pub client: Address,
    /// Requested CDN mode.
    pub with_cdn: bool,
}

/// Response of the provider lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderLookupResponse {
    /// Provider id, absent when the registry has none.
    pub provider_id: Option<ProviderId>,
}

/// One line of the newline-delimited upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadLine {
    /// A provider notification.
    Event(ProviderEvent),
    /// The final outcome.
    Outcome(UploadOutcome),
}

/// Final line of an upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The upload finished with this piece commitment.
    Completed {
        /// Piece commitment.
        commp: PieceCid,
    },
    /// The provider rejected the upload.
    Failed {
        /// Provider message.
        message: String,
    },
}

/// Error body returned by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeError {
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_lines_decode() {
        let line: UploadLine =
            serde_json::from_str(r#"{"event":"root_submitted","tx_hash":null}"#).expect("event");
        assert!(matches!(
            line,
            UploadLine::Event(ProviderEvent::RootSubmitted { tx_hash: None })
        ));

        let line: UploadLine =
            serde_json::from_str(r#"{"outcome":"completed","commp":"baga6ea4seaqxyz1"}"#)
                .expect("outcome");
        assert!(matches!(
            line,
            UploadLine::Outcome(UploadOutcome::Completed { .. })
        ));
    }

    #[test]
    fn test_amounts_are_strings() {
        let body: AmountResponse =
            serde_json::from_str(r#"{"amount":"19531249999977600"}"#).expect("amount");
        assert_eq!(body.amount, TokenAmount::from_u128(19_531_249_999_977_600));
    }
}
