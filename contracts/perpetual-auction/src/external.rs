use commons::*;
use concordium_std::*;

use crate::state::{NodeKey, Phase, Round};

#[derive(Debug, Serialize, SchemaType)]
pub struct InitParams {
    /// Asset registry contract minting the auctioned assets.
    pub registry: ContractAddress,
    /// Wrapped currency contract used as the payout fallback.
    pub wrapped_token: ContractAddress,
    /// Account receiving every winning bid.
    pub beneficiary: AccountAddress,
    pub config: AuctionConfig,
}

/// Tunable auction parameters.
#[derive(Debug, Clone, Copy, Serialize, SchemaType)]
pub struct AuctionConfig {
    /// Minimum total bid accepted at all.
    pub reserve_price: Amount,
    /// Percentage a new top bid must clear over the current lead.
    pub min_increment: Percent,
    /// Length of a fresh round.
    pub round_duration: Duration,
    /// Minimum time-to-end enforced after a new leading bid.
    pub time_buffer: Duration,
}

/// Parameter to the `bid` entrypoint.
///
/// The hint names the node believed to sit immediately before the correct
/// insertion point. `NodeKey::Head` always works and means "this is the new
/// top bid"; a deeper hint keeps the insertion walk short. Hints are read
/// off `viewLedger`.
#[derive(Debug, Serialize, SchemaType)]
pub struct BidParams {
    pub hint: NodeKey,
}

/// Parameter to the `updateConfig` entrypoint.
#[derive(Debug, Clone, Copy, Serialize, SchemaType)]
pub enum ConfigUpdate {
    TimeBuffer(Duration),
    ReservePrice(Amount),
    MinIncrement(Percent),
    RoundDuration(Duration),
}

#[derive(Debug, Serialize, SchemaType)]
pub struct ViewResult {
    pub phase: Phase,
    pub round: Option<Round>,
    pub config: AuctionConfig,
    pub registry: ContractAddress,
    pub wrapped_token: ContractAddress,
    pub beneficiary: AccountAddress,
    /// Number of live bids in the current ledger.
    pub live_bids: u32,
}

/// One live bid, as returned by `viewLedger` in rank order.
#[derive(Debug, PartialEq, Eq, Serialize, SchemaType)]
pub struct LedgerEntry {
    pub bidder: AccountAddress,
    pub amount: Amount,
}

#[derive(Debug, Serialize, SchemaType)]
pub struct ViewBidResult {
    /// Amount committed in the current round's ledger.
    pub live: Amount,
    /// Credit swept out of settled rounds, claimable via `withdraw`.
    pub pending: Amount,
}
