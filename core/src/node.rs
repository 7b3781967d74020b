// Node client boundary — the chain interface this crate consumes
//
// Implementations live outside this crate. Methods are async because
// the node is remote; failures surface as node-collaborator faults
// with the node's rejection reason preserved where there is one.

use async_trait::async_trait;

use crate::crypto::Commitment;
use crate::error::Result;
use crate::slate::Transaction;

/// The chain tip as the node reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub height: u64,
    pub hash: [u8; 32],
}

/// Header data needed for reorg detection during scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub height: u64,
    pub hash: [u8; 32],
    pub timestamp: u64,
}

/// One unspent output as returned by the PMMR range queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    pub commit: Commitment,
    pub proof: Vec<u8>,
    pub is_coinbase: bool,
    pub height: u64,
    pub mmr_index: u64,
}

#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Current tip height and hash.
    async fn tip(&self) -> Result<Tip>;

    /// Header hash and timestamp at a height.
    async fn header(&self, height: u64) -> Result<HeaderInfo>;

    /// The (first, last) PMMR indices of the unspent-output set.
    async fn output_index_range(&self) -> Result<(u64, u64)>;

    /// A page of unspent outputs by PMMR index range.
    async fn outputs_by_index(&self, start: u64, end: u64) -> Result<Vec<ChainOutput>>;

    /// Look up a single unspent output by commitment. `None` means
    /// spent or never seen.
    async fn output(&self, commit: &Commitment) -> Result<Option<ChainOutput>>;

    /// The confirmation height of a kernel, searched by excess within
    /// `[min_height, max_height]`.
    async fn kernel_height(
        &self,
        excess: &Commitment,
        min_height: u64,
        max_height: u64,
    ) -> Result<Option<u64>>;

    /// Broadcast a finalized transaction. The node's rejection reason
    /// is surfaced verbatim inside the collaborator fault context.
    async fn broadcast(&self, tx: &Transaction) -> Result<()>;
}
