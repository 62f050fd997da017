use commons::*;
use concordium_std::*;

use crate::external::{AuctionConfig, ConfigUpdate, InitParams};

/// Key into the bid ledger arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum NodeKey {
    /// Permanent sentinel ranked above every real bid.
    Head,
    /// Permanent sentinel ranked below every real bid.
    Tail,
    Bidder(AccountAddress),
}

/// One ledger entry. Live bids carry a strictly positive amount; the links
/// run strictly descending by amount from `Head` to `Tail`.
#[derive(Debug, Clone, Copy, Serialize, SchemaType)]
pub struct BidNode {
    pub amount: Amount,
    pub prev: NodeKey,
    pub next: NodeKey,
}

/// The ordered collection of all outstanding bids, stored as a doubly
/// linked list inside a map keyed by bidder identity.
///
/// `bids[x].next == y` iff `bids[y].prev == x` at all times; the node right
/// after `Head` is the current leading bid. Ties rank first-inserted-first.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct BidLedger<S: HasStateApi> {
    nodes: StateMap<NodeKey, BidNode, S>,
    /// Number of live bids, excluding the sentinels. Bounds every traversal.
    len: u32,
}

impl<S: HasStateApi> BidLedger<S> {
    pub fn new(state_builder: &mut StateBuilder<S>) -> Self {
        let mut nodes = state_builder.new_map();
        nodes.insert(
            NodeKey::Head,
            BidNode {
                amount: Amount::from_micro_ccd(u64::MAX),
                prev: NodeKey::Head,
                next: NodeKey::Tail,
            },
        );
        nodes.insert(
            NodeKey::Tail,
            BidNode {
                amount: Amount::zero(),
                prev: NodeKey::Head,
                next: NodeKey::Tail,
            },
        );
        Self { nodes, len: 0 }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Amount of the given bidder's live bid, if any.
    pub fn amount_of(&self, bidder: &AccountAddress) -> Option<Amount> {
        self.amount_at(&NodeKey::Bidder(*bidder))
    }

    /// Amount recorded at any node, sentinels included.
    pub fn amount_at(&self, key: &NodeKey) -> Option<Amount> {
        self.nodes.get(key).map(|node| node.amount)
    }

    /// The current leading bid: the node right after the head sentinel.
    pub fn leading(&self) -> Option<(AccountAddress, Amount)> {
        let next = self.nodes.get(&NodeKey::Head)?.next;
        match next {
            NodeKey::Bidder(account) => {
                let amount = self.nodes.get(&NodeKey::Bidder(account))?.amount;
                Some((account, amount))
            }
            _ => None,
        }
    }

    /// The leading bid as it will look once `excluded`'s node is gone.
    pub fn leading_excluding(&self, excluded: &AccountAddress) -> Option<(AccountAddress, Amount)> {
        let mut cursor = self.nodes.get(&NodeKey::Head)?.next;
        while let NodeKey::Bidder(account) = cursor {
            let node = self.nodes.get(&NodeKey::Bidder(account))?;
            if account != *excluded {
                return Some((account, node.amount));
            }
            cursor = node.next;
        }
        None
    }

    /// Splices the bidder's node out by relinking its neighbours. Returns
    /// zero when the bidder has no live bid.
    pub fn remove(&mut self, bidder: &AccountAddress) -> ContractResult<Amount> {
        let node = match self.nodes.remove_and_get(&NodeKey::Bidder(*bidder)) {
            Some(node) => node,
            None => return Ok(Amount::zero()),
        };
        self.set_next(node.prev, node.next)?;
        self.set_prev(node.next, node.prev)?;
        self.len -= 1;
        Ok(node.amount)
    }

    /// Inserts a new bid at its rank, walking forward from the hint.
    ///
    /// The hint must exist and rank at or above the new amount; a hint
    /// downstream of the bid fails with `InvalidHint` instead of being
    /// corrected, so stale or adversarial hints cannot reorder the list.
    /// The walk advances past equal amounts, placing a later equal bid
    /// after the existing one.
    pub fn insert(
        &mut self,
        bidder: AccountAddress,
        amount: Amount,
        hint: NodeKey,
    ) -> ContractResult<()> {
        let key = NodeKey::Bidder(bidder);
        ensure!(amount > Amount::zero(), AuctionError::BelowReserve);
        ensure!(hint != key, AuctionError::InvalidHint);
        let hint_node = match self.nodes.get(&hint) {
            Some(node) => *node,
            None => bail!(AuctionError::InvalidHint),
        };
        ensure!(amount <= hint_node.amount, AuctionError::InvalidHint);

        let mut prev = hint;
        let mut next = hint_node.next;
        let mut steps = 0u32;
        loop {
            let succ = match self.nodes.get(&next) {
                Some(node) => *node,
                None => bail!(AuctionError::LedgerInconsistent),
            };
            if succ.amount < amount {
                break;
            }
            ensure!(steps < self.len, AuctionError::LedgerInconsistent);
            steps += 1;
            prev = next;
            next = succ.next;
        }

        let previous = self.nodes.insert(key, BidNode { amount, prev, next });
        ensure!(previous.is_none(), AuctionError::LedgerInconsistent);
        self.set_next(prev, key)?;
        self.set_prev(next, key)?;
        self.len += 1;
        Ok(())
    }

    /// Ordered snapshot of all live bids, head to tail.
    pub fn walk(&self) -> ContractResult<Vec<(AccountAddress, Amount)>> {
        let mut out = Vec::with_capacity(self.len as usize);
        let mut cursor = self
            .nodes
            .get(&NodeKey::Head)
            .ok_or(AuctionError::LedgerInconsistent)?
            .next;
        while let NodeKey::Bidder(account) = cursor {
            let node = self
                .nodes
                .get(&NodeKey::Bidder(account))
                .ok_or(AuctionError::LedgerInconsistent)?;
            out.push((account, node.amount));
            ensure!(
                out.len() <= self.len as usize,
                AuctionError::LedgerInconsistent
            );
            cursor = node.next;
        }
        ensure!(cursor == NodeKey::Tail, AuctionError::LedgerInconsistent);
        Ok(out)
    }

    /// Empties the ledger, returning all live bids in rank order and
    /// relinking the sentinels.
    pub fn drain(&mut self) -> ContractResult<Vec<(AccountAddress, Amount)>> {
        let drained = self.walk()?;
        for (account, _) in drained.iter() {
            self.nodes.remove(&NodeKey::Bidder(*account));
        }
        self.set_next(NodeKey::Head, NodeKey::Tail)?;
        self.set_prev(NodeKey::Tail, NodeKey::Head)?;
        self.len = 0;
        Ok(drained)
    }

    fn set_next(&mut self, key: NodeKey, next: NodeKey) -> ContractResult<()> {
        match self.nodes.get_mut(&key) {
            Some(mut node) => {
                node.next = next;
                Ok(())
            }
            None => Err(AuctionError::LedgerInconsistent),
        }
    }

    fn set_prev(&mut self, key: NodeKey, prev: NodeKey) -> ContractResult<()> {
        match self.nodes.get_mut(&key) {
            Some(mut node) => {
                node.prev = prev;
                Ok(())
            }
            None => Err(AuctionError::LedgerInconsistent),
        }
    }
}

/// Lifecycle phase of the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Phase {
    /// New rounds are halted by an operator. Bidding on an already open
    /// round, withdrawing and `settleOnly` keep working.
    Paused,
    /// Rounds run and settle normally.
    Running,
    /// Asset minting failed. Behaves as paused until an operator resumes.
    Faulted,
}

/// One auction cycle for one asset. Kept after settlement until the next
/// round replaces it.
#[derive(Debug, Clone, Copy, Serialize, SchemaType)]
pub struct Round {
    pub asset_id: AssetId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub settled: bool,
}

/// Result of a successful `place_bid`, consumed by the event log.
#[derive(Debug, PartialEq, Eq)]
pub struct BidOutcome {
    pub asset_id: AssetId,
    pub total: Amount,
    pub extended: bool,
    pub end: Timestamp,
}

/// Result of a successful `settle`, consumed by the settlement invokes.
pub struct SettleOutcome {
    pub asset_id: AssetId,
    pub winner: Option<(AccountAddress, Amount)>,
}

/// The contract state.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Access control for operators and admins.
    pub authority: Authority<S>,
    /// Asset registry contract minting the auctioned assets.
    pub registry: ContractAddress,
    /// Wrapped currency contract used as the payout fallback.
    pub wrapped_token: ContractAddress,
    /// Account receiving every winning bid.
    pub beneficiary: AccountAddress,
    pub config: AuctionConfig,
    pub phase: Phase,
    pub round: Option<Round>,
    /// Ordered bids of the current round.
    pub ledger: BidLedger<S>,
    /// Funds owed to bidders, swept out of settled rounds.
    pub pending_returns: StateMap<AccountAddress, Amount, S>,
    /// Re-entrancy lock held while invoking other contracts.
    pub locked: bool,
}

fn saturating_add(timestamp: Timestamp, duration: Duration) -> Timestamp {
    timestamp
        .checked_add(duration)
        .unwrap_or_else(|| Timestamp::from_timestamp_millis(u64::MAX))
}

impl<S: HasStateApi> State<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, origin: Address, params: InitParams) -> Self {
        State {
            authority: Authority::new(state_builder, origin),
            registry: params.registry,
            wrapped_token: params.wrapped_token,
            beneficiary: params.beneficiary,
            config: params.config,
            phase: Phase::Paused,
            round: None,
            ledger: BidLedger::new(state_builder),
            pending_returns: state_builder.new_map(),
            locked: false,
        }
    }

    /// Places or replaces the caller's bid.
    ///
    /// A stale bid by the same account is withdrawn and its value recycled
    /// into the new total in the same call. Every precondition is checked
    /// before the ledger is touched, so a failed call leaves no trace.
    pub fn place_bid(
        &mut self,
        now: Timestamp,
        bidder: AccountAddress,
        attached: Amount,
        hint: NodeKey,
    ) -> ContractResult<BidOutcome> {
        let (asset_id, end) = match self.round {
            Some(round) if !round.settled && now < round.end => (round.asset_id, round.end),
            _ => bail!(AuctionError::AuctionClosed),
        };

        let recycled = self.ledger.amount_of(&bidder).unwrap_or_else(Amount::zero);
        let total = recycled + attached;
        ensure!(
            total > Amount::zero() && total >= self.config.reserve_price,
            AuctionError::BelowReserve
        );

        // The caller's own node is about to be withdrawn, so it cannot
        // serve as a hint.
        ensure!(hint != NodeKey::Bidder(bidder), AuctionError::InvalidHint);
        let hint_amount = self
            .ledger
            .amount_at(&hint)
            .ok_or(AuctionError::InvalidHint)?;
        ensure!(total <= hint_amount, AuctionError::InvalidHint);

        // Lead as it will look once the stale bid is gone.
        let lead = self.ledger.leading_excluding(&bidder);
        let is_top = hint == NodeKey::Head && lead.map_or(true, |(_, amount)| total > amount);

        let mut extended = false;
        let mut new_end = end;
        if is_top {
            if let Some((_, lead_amount)) = lead {
                ensure!(
                    total >= self.config.min_increment.min_raise(lead_amount),
                    AuctionError::InsufficientIncrement
                );
            }
            // A late leading bid resets the clock to a fixed buffer from
            // now, never accumulating.
            let buffered = saturating_add(now, self.config.time_buffer);
            if buffered > end {
                new_end = buffered;
                extended = true;
            }
        }

        self.ledger.remove(&bidder)?;
        self.ledger.insert(bidder, total, hint)?;
        if extended {
            if let Some(round) = self.round.as_mut() {
                round.end = new_end;
            }
        }

        Ok(BidOutcome {
            asset_id,
            total,
            extended,
            end: new_end,
        })
    }

    /// Removes the caller's bid and collects any pending credit.
    ///
    /// The leading bid can only leave through settlement; everything else
    /// is withdrawable at any time, including across rounds. Nothing owed
    /// is a successful no-op.
    pub fn withdraw(&mut self, caller: &AccountAddress) -> ContractResult<Amount> {
        if let Some((lead, _)) = self.ledger.leading() {
            ensure!(lead != *caller, AuctionError::StillLeading);
        }
        let live = self.ledger.remove(caller)?;
        let credit = self
            .pending_returns
            .remove_and_get(caller)
            .unwrap_or_else(Amount::zero);
        Ok(live + credit)
    }

    /// Marks the round settled and empties the ledger.
    ///
    /// The winner's node is removed with its amount routed to the caller
    /// for payment to the beneficiary; every losing bid is swept into
    /// `pending_returns`, so the next round always starts from a fresh
    /// ledger while funds stay claimable.
    pub fn settle(&mut self, now: Timestamp) -> ContractResult<SettleOutcome> {
        let asset_id = {
            let round = match self.round.as_mut() {
                Some(round) => round,
                None => bail!(AuctionError::NotStarted),
            };
            ensure!(!round.settled, AuctionError::AlreadySettled);
            ensure!(now >= round.end, AuctionError::TooEarly);
            round.settled = true;
            round.asset_id
        };

        let winner = self.ledger.leading();
        if let Some((account, _)) = winner {
            self.ledger.remove(&account)?;
        }
        for (account, amount) in self.ledger.drain()? {
            self.credit_return(account, amount);
        }

        Ok(SettleOutcome { asset_id, winner })
    }

    /// Records a freshly minted asset as the next round.
    pub fn open_round(&mut self, asset_id: AssetId, now: Timestamp) -> Round {
        let round = Round {
            asset_id,
            start: now,
            end: saturating_add(now, self.config.round_duration),
            settled: false,
        };
        self.round = Some(round);
        round
    }

    /// Whether a new round would be needed on resume.
    pub fn round_needed(&self) -> bool {
        self.round.map_or(true, |round| round.settled)
    }

    pub fn apply_config_update(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::TimeBuffer(buffer) => self.config.time_buffer = buffer,
            ConfigUpdate::ReservePrice(reserve) => self.config.reserve_price = reserve,
            ConfigUpdate::MinIncrement(pct) => self.config.min_increment = pct,
            ConfigUpdate::RoundDuration(duration) => self.config.round_duration = duration,
        }
    }

    pub fn pending_of(&self, account: &AccountAddress) -> Amount {
        self.pending_returns
            .get(account)
            .map(|amount| *amount)
            .unwrap_or_else(Amount::zero)
    }

    fn credit_return(&mut self, account: AccountAddress, amount: Amount) {
        let owed = self.pending_of(&account);
        self.pending_returns.insert(account, owed + amount);
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const REGISTRY: ContractAddress = ContractAddress {
        index: 8,
        subindex: 0,
    };
    const WRAPPED: ContractAddress = ContractAddress {
        index: 9,
        subindex: 0,
    };
    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const BENEFICIARY: AccountAddress = AccountAddress([7; 32]);
    const ALICE: AccountAddress = AccountAddress([2; 32]);
    const BOB: AccountAddress = AccountAddress([3; 32]);
    const CAROL: AccountAddress = AccountAddress([4; 32]);

    fn micro(n: u64) -> Amount {
        Amount::from_micro_ccd(n)
    }

    fn ts(seconds: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(seconds * 1000)
    }

    fn test_config() -> AuctionConfig {
        AuctionConfig {
            reserve_price: micro(10),
            min_increment: Percent::from_percent(5),
            round_duration: Duration::from_seconds(600),
            time_buffer: Duration::from_seconds(60),
        }
    }

    fn fresh_ledger() -> BidLedger<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        BidLedger::new(&mut state_builder)
    }

    /// State with one open round for asset 1, started at t = 0.
    fn open_state() -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(
            &mut state_builder,
            Address::Account(ADMIN),
            InitParams {
                registry: REGISTRY,
                wrapped_token: WRAPPED,
                beneficiary: BENEFICIARY,
                config: test_config(),
            },
        );
        state.phase = Phase::Running;
        state.open_round(1, ts(0));
        state
    }

    #[concordium_test]
    fn test_ledger_orders_descending() {
        let mut ledger = fresh_ledger();
        ledger.insert(CAROL, micro(30), NodeKey::Head).expect_report("insert");
        ledger.insert(ALICE, micro(10), NodeKey::Head).expect_report("insert");
        ledger.insert(BOB, micro(20), NodeKey::Head).expect_report("insert");

        let snapshot = ledger.walk().expect_report("walk");
        claim_eq!(
            snapshot,
            vec![(CAROL, micro(30)), (BOB, micro(20)), (ALICE, micro(10))]
        );
        claim_eq!(ledger.leading(), Some((CAROL, micro(30))));
        claim_eq!(ledger.len(), 3);
    }

    #[concordium_test]
    fn test_ledger_equal_amounts_keep_arrival_order() {
        let mut ledger = fresh_ledger();
        ledger.insert(ALICE, micro(20), NodeKey::Head).expect_report("insert");
        ledger.insert(BOB, micro(20), NodeKey::Head).expect_report("insert");
        ledger
            .insert(CAROL, micro(20), NodeKey::Bidder(ALICE))
            .expect_report("insert");

        // Later equal bids rank after existing ones, regardless of hint depth.
        let snapshot = ledger.walk().expect_report("walk");
        claim_eq!(
            snapshot,
            vec![(ALICE, micro(20)), (BOB, micro(20)), (CAROL, micro(20))]
        );
        claim_eq!(ledger.leading(), Some((ALICE, micro(20))));
    }

    #[concordium_test]
    fn test_ledger_rejects_downstream_or_dangling_hints() {
        let mut ledger = fresh_ledger();
        ledger.insert(ALICE, micro(10), NodeKey::Head).expect_report("insert");

        // Hint ranks below the new bid.
        claim_eq!(
            ledger.insert(BOB, micro(20), NodeKey::Bidder(ALICE)),
            Err(AuctionError::InvalidHint)
        );
        // Hint does not exist.
        claim_eq!(
            ledger.insert(BOB, micro(5), NodeKey::Bidder(CAROL)),
            Err(AuctionError::InvalidHint)
        );
        // Failed inserts leave the list untouched.
        claim_eq!(ledger.walk().expect_report("walk"), vec![(ALICE, micro(10))]);
    }

    #[concordium_test]
    fn test_ledger_deep_hint_insertion() {
        let mut ledger = fresh_ledger();
        ledger.insert(ALICE, micro(30), NodeKey::Head).expect_report("insert");
        ledger.insert(BOB, micro(20), NodeKey::Head).expect_report("insert");
        ledger.insert(CAROL, micro(10), NodeKey::Head).expect_report("insert");

        let dave = AccountAddress([5; 32]);
        ledger
            .insert(dave, micro(15), NodeKey::Bidder(BOB))
            .expect_report("insert");
        claim_eq!(
            ledger.walk().expect_report("walk"),
            vec![
                (ALICE, micro(30)),
                (BOB, micro(20)),
                (dave, micro(15)),
                (CAROL, micro(10))
            ]
        );
    }

    #[concordium_test]
    fn test_ledger_remove_relinks() {
        let mut ledger = fresh_ledger();
        ledger.insert(ALICE, micro(30), NodeKey::Head).expect_report("insert");
        ledger.insert(BOB, micro(20), NodeKey::Head).expect_report("insert");
        ledger.insert(CAROL, micro(10), NodeKey::Head).expect_report("insert");

        claim_eq!(ledger.remove(&BOB), Ok(micro(20)));
        claim_eq!(
            ledger.walk().expect_report("walk"),
            vec![(ALICE, micro(30)), (CAROL, micro(10))]
        );
        claim_eq!(ledger.len(), 2);

        // Removing an absent bidder is a no-op returning zero.
        claim_eq!(ledger.remove(&BOB), Ok(Amount::zero()));
        claim_eq!(ledger.len(), 2);

        // The spliced gap accepts a new insertion.
        ledger
            .insert(BOB, micro(25), NodeKey::Bidder(ALICE))
            .expect_report("insert");
        claim_eq!(ledger.leading(), Some((ALICE, micro(30))));
        claim_eq!(
            ledger.walk().expect_report("walk"),
            vec![(ALICE, micro(30)), (BOB, micro(25)), (CAROL, micro(10))]
        );
    }

    #[concordium_test]
    fn test_ledger_drain_empties() {
        let mut ledger = fresh_ledger();
        ledger.insert(ALICE, micro(30), NodeKey::Head).expect_report("insert");
        ledger.insert(BOB, micro(20), NodeKey::Head).expect_report("insert");

        let drained = ledger.drain().expect_report("drain");
        claim_eq!(drained, vec![(ALICE, micro(30)), (BOB, micro(20))]);
        claim!(ledger.is_empty());
        claim_eq!(ledger.leading(), None);
        claim_eq!(ledger.walk().expect_report("walk"), vec![]);

        // Sentinels survive a drain.
        ledger.insert(CAROL, micro(5), NodeKey::Head).expect_report("insert");
        claim_eq!(ledger.leading(), Some((CAROL, micro(5))));
    }

    #[concordium_test]
    fn test_bid_requires_open_round() {
        let mut state = open_state();
        state.round = None;
        claim_eq!(
            state.place_bid(ts(0), ALICE, micro(100), NodeKey::Head),
            Err(AuctionError::AuctionClosed)
        );

        let mut state = open_state();
        // The end time itself is already closed.
        claim_eq!(
            state.place_bid(ts(600), ALICE, micro(100), NodeKey::Head),
            Err(AuctionError::AuctionClosed)
        );
        claim!(state
            .place_bid(ts(599), ALICE, micro(100), NodeKey::Head)
            .is_ok());
    }

    #[concordium_test]
    fn test_bid_below_reserve() {
        let mut state = open_state();
        claim_eq!(
            state.place_bid(ts(1), ALICE, micro(9), NodeKey::Head),
            Err(AuctionError::BelowReserve)
        );
        claim!(state.ledger.is_empty());
        claim!(state
            .place_bid(ts(1), ALICE, micro(10), NodeKey::Head)
            .is_ok());
    }

    #[concordium_test]
    fn test_bid_recycles_previous_bid() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(100), NodeKey::Head)
            .expect_report("first bid");

        let outcome = state
            .place_bid(ts(2), ALICE, micro(50), NodeKey::Head)
            .expect_report("second bid");
        claim_eq!(outcome.total, micro(150));
        claim_eq!(state.ledger.len(), 1);
        claim_eq!(state.ledger.leading(), Some((ALICE, micro(150))));
    }

    #[concordium_test]
    fn test_bid_own_node_is_no_hint() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(100), NodeKey::Head)
            .expect_report("first bid");
        claim_eq!(
            state.place_bid(ts(2), ALICE, micro(50), NodeKey::Bidder(ALICE)),
            Err(AuctionError::InvalidHint)
        );
        // The stale bid survives the failed call.
        claim_eq!(state.ledger.leading(), Some((ALICE, micro(100))));
    }

    #[concordium_test]
    fn test_bid_increment_gate_at_exact_floor() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(1000), NodeKey::Head)
            .expect_report("lead bid");

        // 1000 * 105 / 100 = 1050: one unit below fails, the floor passes.
        claim_eq!(
            state.place_bid(ts(2), BOB, micro(1049), NodeKey::Head),
            Err(AuctionError::InsufficientIncrement)
        );
        let outcome = state
            .place_bid(ts(2), BOB, micro(1050), NodeKey::Head)
            .expect_report("raise");
        claim_eq!(outcome.total, micro(1050));
        claim_eq!(state.ledger.leading(), Some((BOB, micro(1050))));
    }

    #[concordium_test]
    fn test_bid_non_top_skips_increment_gate() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(1000), NodeKey::Head)
            .expect_report("lead bid");

        // A lower bid with a deep hint needs no increment.
        state
            .place_bid(ts(2), BOB, micro(999), NodeKey::Bidder(ALICE))
            .expect_report("under bid");
        // The head sentinel is also a valid hint for a non-top bid.
        state
            .place_bid(ts(3), CAROL, micro(500), NodeKey::Head)
            .expect_report("under bid via head");
        claim_eq!(
            state.ledger.walk().expect_report("walk"),
            vec![(ALICE, micro(1000)), (BOB, micro(999)), (CAROL, micro(500))]
        );
    }

    #[concordium_test]
    fn test_bid_extension_resets_to_buffer() {
        let mut state = open_state();

        // Far from the end: no extension.
        let outcome = state
            .place_bid(ts(100), ALICE, micro(1000), NodeKey::Head)
            .expect_report("bid");
        claim!(!outcome.extended);
        claim_eq!(state.round.expect_report("round").end, ts(600));

        // 50s remain, buffer is 60s: end resets to now + buffer.
        let outcome = state
            .place_bid(ts(550), BOB, micro(1050), NodeKey::Head)
            .expect_report("bid");
        claim!(outcome.extended);
        claim_eq!(state.round.expect_report("round").end, ts(610));

        // Another leading bid inside the buffer resets again, relative to
        // its own time, never accumulating.
        let outcome = state
            .place_bid(ts(560), CAROL, micro(1103), NodeKey::Head)
            .expect_report("bid");
        claim!(outcome.extended);
        claim_eq!(state.round.expect_report("round").end, ts(620));

        // A non-top bid near the end does not extend.
        let outcome = state
            .place_bid(ts(570), ALICE, micro(50), NodeKey::Bidder(CAROL))
            .expect_report("bid");
        claim!(!outcome.extended);
        claim_eq!(state.round.expect_report("round").end, ts(620));
    }

    #[concordium_test]
    fn test_withdraw_rules() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(1000), NodeKey::Head)
            .expect_report("bid");
        state
            .place_bid(ts(2), BOB, micro(1050), NodeKey::Head)
            .expect_report("bid");

        // The leader is locked in until settlement.
        claim_eq!(state.withdraw(&BOB), Err(AuctionError::StillLeading));
        // A losing bidder gets the full amount back.
        claim_eq!(state.withdraw(&ALICE), Ok(micro(1000)));
        claim_eq!(state.ledger.len(), 1);
        // Nothing owed is a successful no-op.
        claim_eq!(state.withdraw(&CAROL), Ok(Amount::zero()));
    }

    #[concordium_test]
    fn test_settle_preconditions() {
        let mut state = open_state();
        state.round = None;
        claim_eq!(
            state.settle(ts(600)).map(|o| o.asset_id),
            Err(AuctionError::NotStarted)
        );

        let mut state = open_state();
        claim_eq!(
            state.settle(ts(599)).map(|o| o.asset_id),
            Err(AuctionError::TooEarly)
        );
        claim!(state.settle(ts(600)).is_ok());
        claim_eq!(
            state.settle(ts(601)).map(|o| o.asset_id),
            Err(AuctionError::AlreadySettled)
        );
    }

    #[concordium_test]
    fn test_settle_sweeps_losers_into_credits() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(1000), NodeKey::Head)
            .expect_report("bid");
        state
            .place_bid(ts(2), BOB, micro(1050), NodeKey::Head)
            .expect_report("bid");
        state
            .place_bid(ts(3), CAROL, micro(500), NodeKey::Bidder(BOB))
            .expect_report("bid");

        let outcome = state.settle(ts(600)).expect_report("settle");
        claim_eq!(outcome.asset_id, 1);
        claim_eq!(outcome.winner, Some((BOB, micro(1050))));

        // Fresh ledger, losers turned into claimable credits.
        claim!(state.ledger.is_empty());
        claim_eq!(state.pending_of(&ALICE), micro(1000));
        claim_eq!(state.pending_of(&CAROL), micro(500));
        claim_eq!(state.pending_of(&BOB), Amount::zero());

        // Credits are paid out through withdraw.
        claim_eq!(state.withdraw(&ALICE), Ok(micro(1000)));
        claim_eq!(state.pending_of(&ALICE), Amount::zero());
    }

    #[concordium_test]
    fn test_settled_round_leaves_no_residue_in_next() {
        let mut state = open_state();
        state
            .place_bid(ts(1), ALICE, micro(1000), NodeKey::Head)
            .expect_report("bid");
        state
            .place_bid(ts(2), BOB, micro(1050), NodeKey::Head)
            .expect_report("bid");
        state.settle(ts(600)).expect_report("settle");
        state.open_round(2, ts(600));

        // The fresh round starts from an empty ledger.
        claim_eq!(state.ledger.walk().expect_report("walk"), vec![]);

        // Alice's lost bid does not recycle into her next bid; it stays a
        // pending credit.
        let outcome = state
            .place_bid(ts(601), ALICE, micro(50), NodeKey::Head)
            .expect_report("bid");
        claim_eq!(outcome.total, micro(50));
        claim_eq!(state.pending_of(&ALICE), micro(1000));
        claim_eq!(state.ledger.leading(), Some((ALICE, micro(50))));
    }
}
