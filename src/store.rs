//! Read-only access to the explorer store.
//!
//! The store is created and populated by an external ingestion process;
//! every method here is a read. Table and column names are that process's
//! contract and must not change. All user-supplied values are bound as
//! query parameters, never interpolated.

use anyhow::{Context, Result};
use sqlx::any::AnyRow;
use sqlx::{any::AnyPoolOptions, Any, Pool, QueryBuilder, Row};
use std::path::Path;

use crate::model::{
    AddressTx, AnnMeta, BatchTx, BlockMeta, BlockTx, Classification, ContractMeta, PlainDelta,
    ResolutionMeta, RevisionMeta, TxDelta, TxMeta,
};

/// Embedded reference schema, used by tests and local bring-up.
const SCHEMA_SQL: &str = include_str!("../sql/explorer_schema.sql");

/// Store connection configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database URL or SQLite file path.
    pub url: String,
    /// Connection pool size; concurrent requests share the pool rather
    /// than opening a connection per query.
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbBackend {
    Sqlite,
    Postgres,
}

/// Pooled handle to the explorer store.
#[derive(Clone)]
pub struct ExplorerDb {
    pool: Pool<Any>,
    backend: DbBackend,
}

impl ExplorerDb {
    /// Connect to the store.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let backend =
            if config.url.starts_with("postgres://") || config.url.starts_with("postgresql://") {
                DbBackend::Postgres
            } else {
                DbBackend::Sqlite
            };

        // Ensure parent directory exists for sqlite file databases.
        if backend == DbBackend::Sqlite {
            let is_memory = config.url == ":memory:" || config.url == "sqlite::memory:";
            let is_url = config.url.starts_with("sqlite:");
            if !is_memory && !is_url {
                if let Some(parent) = Path::new(&config.url).parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .context(format!("Failed to create directory: {}", parent.display()))?;
                }
            }
        }

        let database_url = match backend {
            DbBackend::Postgres => config.url.clone(),
            DbBackend::Sqlite => {
                if config.url == ":memory:" || config.url == "sqlite::memory:" {
                    "sqlite::memory:".to_string()
                } else if config.url.starts_with("sqlite:") {
                    config.url.clone()
                } else {
                    format!("sqlite://{}", config.url)
                }
            }
        };

        tracing::debug!(
            target: "navigator::store",
            "Connecting to store: {}",
            database_url
        );

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&database_url)
            .await
            .context("Failed to connect to explorer store")?;

        Ok(Self { pool, backend })
    }

    /// Selects the backend-specific form of a statement (placeholder
    /// syntax differs between sqlite and postgres).
    fn sql<'a>(&self, sqlite: &'a str, postgres: &'a str) -> &'a str {
        match self.backend {
            DbBackend::Sqlite => sqlite,
            DbBackend::Postgres => postgres,
        }
    }

    /// Creates the reference tables if they do not exist. Production
    /// stores are built by the ingester; this exists for tests and for
    /// bringing up an empty local database.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA_SQL.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }

            let sql_lines: Vec<&str> = statement
                .lines()
                .filter(|line| {
                    let trimmed = line.trim();
                    !trimmed.is_empty() && !trimmed.starts_with("--")
                })
                .collect();

            if sql_lines.is_empty() {
                continue;
            }

            let clean_sql = sql_lines.join("\n");

            sqlx::query(&clean_sql)
                .execute(&self.pool)
                .await
                .context(format!(
                    "Failed to execute SQL: {}",
                    clean_sql.lines().next().unwrap_or("")
                ))?;
        }

        tracing::debug!(target: "navigator::store", "Reference schema initialized");
        Ok(())
    }

    // ===== Classification =====

    /// Classifies an identifier: one lookup against the hash-type index.
    pub async fn classification(&self, hash: &str) -> sqlx::Result<Option<Classification>> {
        let sql = self.sql(
            "SELECT Type, MasterHash FROM HashTypes WHERE Hash = ?",
            "SELECT Type, MasterHash FROM HashTypes WHERE Hash = $1",
        );

        let row = sqlx::query(sql)
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Classification {
            type_tag: r.get(0),
            master_hash: r.get(1),
        }))
    }

    // ===== Ledger entries =====

    /// All ledger entries for one address.
    pub async fn address_changes(&self, address: &str) -> sqlx::Result<Vec<AddressTx>> {
        let sql = self.sql(
            "SELECT DISTINCT MasterHash, ScChange, SfChange, Height, Timestamp, TxType \
             FROM AddressChanges WHERE Address = ?",
            "SELECT DISTINCT MasterHash, ScChange, SfChange, Height, Timestamp, TxType \
             FROM AddressChanges WHERE Address = $1",
        );

        let rows = sqlx::query(sql).bind(address).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|r| AddressTx {
                master_hash: r.get(0),
                sc_change: r.get(1),
                sf_change: r.get(2),
                height: r.get(3),
                timestamp: r.get(4),
                tx_type: r.get(5),
            })
            .collect())
    }

    /// Ledger entries for every address in the batch, in one query.
    pub async fn batch_address_changes(&self, addresses: &[String]) -> sqlx::Result<Vec<BatchTx>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder = QueryBuilder::<Any>::new(
            "SELECT DISTINCT Address, MasterHash, ScChange, SfChange, Height, Timestamp, TxType \
             FROM AddressChanges WHERE Address IN (",
        );
        let mut separated = query_builder.separated(", ");
        for address in addresses {
            separated.push_bind(address.as_str());
        }
        separated.push_unseparated(")");

        let rows = query_builder.build().fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|r| BatchTx {
                address: r.get(0),
                master_hash: r.get(1),
                sc_change: r.get(2),
                sf_change: r.get(3),
                height: r.get(4),
                timestamp: r.get(5),
                tx_type: r.get(6),
            })
            .collect())
    }

    /// Per-address deltas of one transaction, deduplicated by address.
    pub async fn tx_deltas(&self, master_hash: &str) -> sqlx::Result<Vec<TxDelta>> {
        let sql = self.sql(
            "SELECT DISTINCT Address, ScChange, SfChange, TxType \
             FROM AddressChanges WHERE MasterHash = ?",
            "SELECT DISTINCT Address, ScChange, SfChange, TxType \
             FROM AddressChanges WHERE MasterHash = $1",
        );

        let rows = sqlx::query(sql)
            .bind(master_hash)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| TxDelta {
                address: r.get(0),
                sc_change: r.get(1),
                sf_change: r.get(2),
                tx_type: r.get(3),
            })
            .collect())
    }

    /// Per-address deltas without the transaction type, as attached to
    /// announcement, revision and resolution records.
    pub async fn plain_deltas(&self, master_hash: &str) -> sqlx::Result<Vec<PlainDelta>> {
        let sql = self.sql(
            "SELECT DISTINCT Address, ScChange, SfChange \
             FROM AddressChanges WHERE MasterHash = ?",
            "SELECT DISTINCT Address, ScChange, SfChange \
             FROM AddressChanges WHERE MasterHash = $1",
        );

        let rows = sqlx::query(sql)
            .bind(master_hash)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| PlainDelta {
                address: r.get(0),
                sc_change: r.get(1),
                sf_change: r.get(2),
            })
            .collect())
    }

    // ===== Entity metadata =====

    pub async fn block_info(&self, height: i64) -> sqlx::Result<Option<BlockMeta>> {
        let sql = self.sql(
            "SELECT Height, Timestamp, Hash, MinerPayoutAddress, TransactionCount \
             FROM BlockInfo WHERE Height = ?",
            "SELECT Height, Timestamp, Hash, MinerPayoutAddress, TransactionCount \
             FROM BlockInfo WHERE Height = $1",
        );

        let row = sqlx::query(sql)
            .bind(height)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| BlockMeta {
            height: r.get(0),
            timestamp: r.get(1),
            hash: r.get(2),
            miner_payout_address: r.get(3),
            transaction_count: r.get(4),
        }))
    }

    pub async fn block_transactions(&self, height: i64) -> sqlx::Result<Vec<BlockTx>> {
        let sql = self.sql(
            "SELECT TxHash, TxType, TotalAmountSc, TotalAmountSf \
             FROM BlockTransactions WHERE Height = ?",
            "SELECT TxHash, TxType, TotalAmountSc, TotalAmountSf \
             FROM BlockTransactions WHERE Height = $1",
        );

        let rows = sqlx::query(sql)
            .bind(height)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| BlockTx {
                tx_hash: r.get(0),
                tx_type: r.get(1),
                total_amount_sc: r.get(2),
                total_amount_sf: r.get(3),
            })
            .collect())
    }

    pub async fn tx_info(&self, tx_hash: &str) -> sqlx::Result<Option<TxMeta>> {
        let sql = self.sql(
            "SELECT HashSynonyms, Height, Timestamp, Fees FROM TxInfo WHERE TxHash = ?",
            "SELECT HashSynonyms, Height, Timestamp, Fees FROM TxInfo WHERE TxHash = $1",
        );

        let row = sqlx::query(sql)
            .bind(tx_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| TxMeta {
            hash_synonyms: r.get(0),
            height: r.get(1),
            timestamp: r.get(2),
            fees: r.get(3),
        }))
    }

    pub async fn host_announcement(&self, tx_hash: &str) -> sqlx::Result<Option<AnnMeta>> {
        let sql = self.sql(
            "SELECT HashSynonyms, Height, Timestamp, Fees, IP FROM HostAnnInfo WHERE TxHash = ?",
            "SELECT HashSynonyms, Height, Timestamp, Fees, IP FROM HostAnnInfo WHERE TxHash = $1",
        );

        let row = sqlx::query(sql)
            .bind(tx_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| AnnMeta {
            hash_synonyms: r.get(0),
            height: r.get(1),
            timestamp: r.get(2),
            fees: r.get(3),
            ip: r.get(4),
        }))
    }

    const CONTRACT_COLUMNS: &str =
        "MasterHash, ContractId, Height, Timestamp, WindowStart, WindowEnd, Status, \
         CurrentFileSize, RenterValue, HostValue, ValidProof2Value, MissedProof2Value, \
         MissedProof3Value";

    fn contract_from_row(row: &AnyRow) -> ContractMeta {
        ContractMeta {
            master_hash: row.get(0),
            contract_id: row.get(1),
            height: row.get(2),
            timestamp: row.get(3),
            window_start: row.get(4),
            window_end: row.get(5),
            status: row.get(6),
            current_file_size: row.get(7),
            renter_value: row.get(8),
            host_value: row.get(9),
            valid_proof_2_value: row.get(10),
            missed_proof_2_value: row.get(11),
            missed_proof_3_value: row.get(12),
        }
    }

    pub async fn contract_by_master(&self, master_hash: &str) -> sqlx::Result<Option<ContractMeta>> {
        let sqlite = format!(
            "SELECT {} FROM ContractInfo WHERE MasterHash = ?",
            Self::CONTRACT_COLUMNS
        );
        let postgres = format!(
            "SELECT {} FROM ContractInfo WHERE MasterHash = $1",
            Self::CONTRACT_COLUMNS
        );

        let row = sqlx::query(self.sql(&sqlite, &postgres))
            .bind(master_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::contract_from_row))
    }

    /// Stored contract rows for every id in the batch, ascending by
    /// height so that, for a duplicated id, the latest row wins matching.
    pub async fn contracts_by_ids(&self, contract_ids: &[&str]) -> sqlx::Result<Vec<ContractMeta>> {
        if contract_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder = QueryBuilder::<Any>::new(format!(
            "SELECT {} FROM ContractInfo WHERE ContractId IN (",
            Self::CONTRACT_COLUMNS
        ));
        let mut separated = query_builder.separated(", ");
        for contract_id in contract_ids {
            separated.push_bind(*contract_id);
        }
        separated.push_unseparated(") ORDER BY Height ASC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;

        Ok(rows.iter().map(Self::contract_from_row).collect())
    }

    fn revision_from_row(row: &AnyRow) -> RevisionMeta {
        RevisionMeta {
            master_hash: row.get(0),
            contract_id: row.get(1),
            height: row.get(2),
            timestamp: row.get(3),
            new_file_size: row.get(4),
            new_revision_number: row.get(5),
        }
    }

    const REVISION_COLUMNS: &str =
        "MasterHash, ContractId, Height, Timestamp, NewFileSize, NewRevisionNumber";

    pub async fn revision_by_contract(&self, contract_id: &str) -> sqlx::Result<Option<RevisionMeta>> {
        let sqlite = format!(
            "SELECT {} FROM RevisionsInfo WHERE ContractId = ?",
            Self::REVISION_COLUMNS
        );
        let postgres = format!(
            "SELECT {} FROM RevisionsInfo WHERE ContractId = $1",
            Self::REVISION_COLUMNS
        );

        let row = sqlx::query(self.sql(&sqlite, &postgres))
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::revision_from_row))
    }

    pub async fn revision_by_master(&self, master_hash: &str) -> sqlx::Result<Option<RevisionMeta>> {
        let sqlite = format!(
            "SELECT {} FROM RevisionsInfo WHERE MasterHash = ?",
            Self::REVISION_COLUMNS
        );
        let postgres = format!(
            "SELECT {} FROM RevisionsInfo WHERE MasterHash = $1",
            Self::REVISION_COLUMNS
        );

        let row = sqlx::query(self.sql(&sqlite, &postgres))
            .bind(master_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::revision_from_row))
    }

    fn resolution_from_row(row: &AnyRow) -> ResolutionMeta {
        ResolutionMeta {
            master_hash: row.get(0),
            contract_id: row.get(1),
            height: row.get(2),
            timestamp: row.get(3),
            outcome: row.get(4),
            proof_posting_hash: row.get(5),
        }
    }

    const RESOLUTION_COLUMNS: &str =
        "MasterHash, ContractId, Height, Timestamp, Outcome, ProofPostingHash";

    pub async fn resolution_by_contract(
        &self,
        contract_id: &str,
    ) -> sqlx::Result<Option<ResolutionMeta>> {
        let sqlite = format!(
            "SELECT {} FROM ContractResolutions WHERE ContractId = ?",
            Self::RESOLUTION_COLUMNS
        );
        let postgres = format!(
            "SELECT {} FROM ContractResolutions WHERE ContractId = $1",
            Self::RESOLUTION_COLUMNS
        );

        let row = sqlx::query(self.sql(&sqlite, &postgres))
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::resolution_from_row))
    }

    pub async fn resolution_by_master(
        &self,
        master_hash: &str,
    ) -> sqlx::Result<Option<ResolutionMeta>> {
        let sqlite = format!(
            "SELECT {} FROM ContractResolutions WHERE MasterHash = ?",
            Self::RESOLUTION_COLUMNS
        );
        let postgres = format!(
            "SELECT {} FROM ContractResolutions WHERE MasterHash = $1",
            Self::RESOLUTION_COLUMNS
        );

        let row = sqlx::query(self.sql(&sqlite, &postgres))
            .bind(master_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::resolution_from_row))
    }

    /// Executes a raw statement. Test fixtures only; the engine itself
    /// never writes.
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> sqlx::Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }
}
