//! Wire types for the Navigator API.
//!
//! Field names here are a compatibility contract with existing API
//! consumers and with the externally ingested store; do not rename them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity kind an identifier classifies into. The store's `HashTypes.Type`
/// column carries the wire tag; anything unrecognized maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Address,
    Block,
    SiacoinTransfer,
    SiafundTransfer,
    StorageProof,
    BlockReward,
    AllowancePost,
    CollateralPost,
    HostAnnouncement,
    Contract,
    Revision,
    ContractResolution,
    Unknown,
}

impl EntityKind {
    /// Maps a stored type tag to an entity kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "address" => Self::Address,
            "block" => Self::Block,
            "ScTx" => Self::SiacoinTransfer,
            "SfTx" => Self::SiafundTransfer,
            "storageproof" => Self::StorageProof,
            "blockreward" => Self::BlockReward,
            "allowancePost" => Self::AllowancePost,
            "collateralPost" => Self::CollateralPost,
            "host ann" => Self::HostAnnouncement,
            "contract" => Self::Contract,
            "revision" => Self::Revision,
            "contractresol" => Self::ContractResolution,
            _ => Self::Unknown,
        }
    }
}

/// Result of classifying an identifier: its stored type tag and the
/// canonical transaction-level hash all dependent lookups key on.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    #[serde(rename = "Type")]
    pub type_tag: String,
    #[serde(rename = "MasterHash")]
    pub master_hash: String,
}

impl Classification {
    pub fn kind(&self) -> EntityKind {
        EntityKind::from_tag(&self.type_tag)
    }
}

/// Ordered sequence of heterogeneous response sections. Callers depend on
/// section order, so this is a thin wrapper over a JSON array.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct CompositeRecord(Vec<Value>);

impl CompositeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a serialized section.
    pub fn push<T: Serialize>(&mut self, section: &T) {
        // Sections are plain tree-shaped structs; serialization cannot fail.
        let value = serde_json::to_value(section)
            .expect("composite sections serialize infallibly");
        self.0.push(value);
    }

    /// Appends an empty placeholder section (`{}`), used when a cascade
    /// stage finds nothing but the section slot must still exist.
    pub fn push_empty(&mut self) {
        self.0.push(Value::Object(serde_json::Map::new()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sections(&self) -> &[Value] {
        &self.0
    }
}

// ===== Ledger entries =====

/// One signed balance movement as listed in an address history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressTx {
    pub master_hash: String,
    pub sc_change: i64,
    pub sf_change: i64,
    pub height: i64,
    pub timestamp: i64,
    pub tx_type: String,
}

/// One signed balance movement in a batch address query, carrying both the
/// address and the transaction it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchTx {
    pub address: String,
    pub master_hash: String,
    pub sc_change: i64,
    pub sf_change: i64,
    pub height: i64,
    pub timestamp: i64,
    pub tx_type: String,
}

/// Per-address balance delta attached to a transaction-kind record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxDelta {
    pub address: String,
    pub sc_change: i64,
    pub sf_change: i64,
    pub tx_type: String,
}

/// Per-address balance delta without a transaction type, as attached to
/// announcement, revision and resolution records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlainDelta {
    pub address: String,
    pub sc_change: i64,
    pub sf_change: i64,
}

// ===== Entity metadata rows =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockMeta {
    pub height: i64,
    pub timestamp: i64,
    pub hash: String,
    pub miner_payout_address: String,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockTx {
    pub tx_hash: String,
    pub tx_type: String,
    pub total_amount_sc: i64,
    pub total_amount_sf: i64,
}

/// Transaction metadata shared by all transaction-like kinds and by the
/// storage proof stage of the contract cascade.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxMeta {
    pub hash_synonyms: Option<String>,
    pub height: i64,
    pub timestamp: i64,
    pub fees: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnnMeta {
    pub hash_synonyms: Option<String>,
    pub height: i64,
    pub timestamp: i64,
    pub fees: i64,
    #[serde(rename = "IP")]
    pub ip: String,
}

/// Stored contract outcome row. Monetary values are in coin units as the
/// ingester writes them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContractMeta {
    pub master_hash: String,
    pub contract_id: String,
    pub height: i64,
    pub timestamp: i64,
    pub window_start: i64,
    pub window_end: i64,
    pub status: String,
    pub current_file_size: i64,
    pub renter_value: f64,
    pub host_value: f64,
    pub valid_proof_2_value: f64,
    pub missed_proof_2_value: f64,
    pub missed_proof_3_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RevisionMeta {
    pub master_hash: String,
    pub contract_id: String,
    pub height: i64,
    pub timestamp: i64,
    pub new_file_size: i64,
    pub new_revision_number: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolutionMeta {
    pub master_hash: String,
    pub contract_id: String,
    pub height: i64,
    pub timestamp: i64,
    pub outcome: String,
    pub proof_posting_hash: Option<String>,
}

// ===== Response sections =====

/// Balance summary section of an address record.
#[derive(Debug, Serialize)]
pub struct AddressSummary {
    #[serde(rename = "balanceSc")]
    pub balance_sc: i64,
    #[serde(rename = "balanceSf")]
    pub balance_sf: i64,
    #[serde(rename = "TotalTxCount")]
    pub total_tx_count: usize,
    #[serde(rename = "firstSeen")]
    pub first_seen: i64,
    #[serde(rename = "last100Transactions")]
    pub last100_transactions: Vec<AddressTx>,
}

/// Trailing `transactions` section of block and transaction-kind records.
#[derive(Debug, Serialize)]
pub struct Transactions<T: Serialize> {
    pub transactions: Vec<T>,
}

/// Header section of a batch address response.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    #[serde(rename = "balanceSc")]
    pub balance_sc: i64,
    #[serde(rename = "balanceSf")]
    pub balance_sf: i64,
    #[serde(rename = "TotalTxCount")]
    pub total_tx_count: usize,
    pub page: usize,
}

/// Net balance of one requested address in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct AddressBalance {
    pub address: String,
    pub sc: i64,
    pub sf: i64,
}

#[derive(Debug, Serialize)]
pub struct AddressBalances {
    pub addresses: Vec<AddressBalance>,
}

/// One page of merged batch transactions.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    #[serde(rename = "last100Transactions")]
    pub last100_transactions: Vec<BatchTx>,
}

// ===== Contract reconciliation =====

/// One line of the fixed-width host contract file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEntry {
    pub contract_id: String,
    pub status: String,
    pub locked: String,
    pub risked: String,
    pub revenue: String,
}

/// A contract entry annotated with its stored outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledContract {
    pub contract_id: String,
    pub status: String,
    pub locked: String,
    pub risked: String,
    pub revenue: String,
    pub duration: i64,
    pub timestamp: i64,
    pub filesize: i64,
    pub statusnavigator: String,
}

/// Aggregate counts and revenue tally of a contract reconciliation.
#[derive(Debug, Default, Serialize)]
pub struct ReconcileSummary {
    pub countsuccess: u64,
    pub countfail: u64,
    pub countunused: u64,
    pub countongoing: u64,
    pub revenuegain: f64,
    pub revenuelost: f64,
    pub revenuenet: f64,
}

#[derive(Debug, Serialize)]
pub struct ReconciledContracts {
    pub contracts: Vec<ReconciledContract>,
}

#[derive(Debug, Serialize)]
pub struct ContractsNotFound {
    #[serde(rename = "contractsNotFound")]
    pub contracts_not_found: Vec<String>,
}

// ===== Request bodies =====

/// Body of the batch endpoints: `query` holds a newline-delimited address
/// list or the fixed-width contract file text. `page` tolerates both a
/// number and a numeric string, matching what deployed clients send.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub query: String,
    #[serde(default)]
    pub page: Option<PageField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PageField {
    Number(i64),
    Text(String),
}

impl PageField {
    /// Returns the page as an integer, if it parses as one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}
