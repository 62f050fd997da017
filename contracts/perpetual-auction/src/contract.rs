use commons::*;
use concordium_std::*;

use crate::events::AuctionEvents;
use crate::external::*;
use crate::payout::HostPayoutExt;
use crate::registry::HostRegistryExt;
use crate::state::{Phase, SettleOutcome, State};

/// Initialize the auction in the paused phase, with no round open.
///
/// The instance creator becomes the first admin. An operator starts the
/// first round by calling `unpause`.
#[init(contract = "PerpetualAuction", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params = InitParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(State::new(
        state_builder,
        Address::Account(ctx.init_origin()),
        params,
    ))
}

/// Place or raise a bid on the current round, attaching the raised value.
///
/// A previous bid by the same account is recycled into the new total, so
/// raising only requires attaching the difference. Bidding stays open on an
/// already running round even while new rounds are halted.
///
/// It rejects if:
/// - Sender is a contract.
/// - No round is open, or the round has ended or settled.
/// - The total is below the reserve price.
/// - The hint is missing, ranks below the bid, or is the caller's own node.
/// - A new top bid does not clear the minimum increment.
#[receive(
    mutable,
    payable,
    contract = "PerpetualAuction",
    name = "bid",
    parameter = "BidParams",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params = BidParams::deserial(&mut ctx.parameter_cursor())?;
    let bidder = match ctx.sender() {
        Address::Account(account) => account,
        Address::Contract(_) => bail!(AuctionError::OnlyAccountAddress),
    };
    ensure!(!host.state().locked, AuctionError::Reentered);

    let now = ctx.metadata().slot_time();
    let outcome = host.state_mut().place_bid(now, bidder, amount, params.hint)?;

    if outcome.extended {
        logger.log(&AuctionEvents::extended(outcome.asset_id, outcome.end))?;
    }
    logger.log(&AuctionEvents::bid_placed(
        outcome.asset_id,
        &bidder,
        outcome.total,
        outcome.extended,
    ))?;
    Ok(())
}

/// Withdraw the caller's outbid funds: the live non-leading bid of the
/// current round plus any credit swept out of settled rounds.
///
/// Pays directly when possible and falls back to the wrapped token when the
/// account cannot receive a transfer. Withdrawing nothing succeeds without
/// logging.
///
/// It rejects if:
/// - Sender is a contract.
/// - The caller holds the current leading bid.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "withdraw",
    enable_logger
)]
fn contract_withdraw<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let caller = match ctx.sender() {
        Address::Account(account) => account,
        Address::Contract(_) => bail!(AuctionError::OnlyAccountAddress),
    };
    ensure!(!host.state().locked, AuctionError::Reentered);

    let owed = host.state_mut().withdraw(&caller)?;
    if owed == Amount::zero() {
        return Ok(());
    }

    let wrapped_token = host.state().wrapped_token;
    host.state_mut().locked = true;
    let paid = host.pay_out(&wrapped_token, &caller, owed);
    host.state_mut().locked = false;
    paid?;

    logger.log(&AuctionEvents::withdrawn(&caller, owed))?;
    Ok(())
}

/// Settle the ended round and immediately open the next one.
///
/// Callable by anyone once the round end has passed. The winner receives
/// the asset and the beneficiary the winning amount; without a winner the
/// asset is burned. A fresh asset is then minted for the next round; if
/// minting fails the system enters the faulted phase instead of rejecting,
/// keeping the settlement.
///
/// It rejects if:
/// - New rounds are halted or faulted (use `settleOnly` there).
/// - No round was ever opened, the round has not ended, or it is already
///   settled.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "settleAndOpenNext",
    enable_logger
)]
fn contract_settle_and_open_next<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        host.state().phase == Phase::Running,
        AuctionError::ContractPaused
    );
    ensure!(!host.state().locked, AuctionError::Reentered);

    let now = ctx.metadata().slot_time();
    settle_round(host, now, logger)?;
    open_next(host, now, logger)
}

/// Settle the ended round while new rounds are halted or faulted, without
/// opening another. Lets bidders reclaim funds and the last winner receive
/// the asset even when the system is stopped.
///
/// It rejects if:
/// - The system is running normally (use `settleAndOpenNext` instead).
/// - No round was ever opened, the round has not ended, or it is already
///   settled.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "settleOnly",
    enable_logger
)]
fn contract_settle_only<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        host.state().phase != Phase::Running,
        AuctionError::NotPaused
    );
    ensure!(!host.state().locked, AuctionError::Reentered);

    settle_round(host, ctx.metadata().slot_time(), logger)
}

/// Halt opening of new rounds. The current round keeps accepting bids and
/// settles through `settleOnly`; withdrawals keep working.
///
/// It rejects if:
/// - Sender is neither an operator nor an admin.
/// - New rounds are already halted.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "pause",
    enable_logger
)]
fn contract_pause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(!host.state().locked, AuctionError::Reentered);
    ensure!(
        host.state().authority.has_operator_rights(&ctx.sender()),
        AuctionError::Unauthorized
    );
    ensure!(
        host.state().phase == Phase::Running,
        AuctionError::ContractPaused
    );

    host.state_mut().phase = Phase::Paused;
    logger.log(&AuctionEvents::Halted)?;
    Ok(())
}

/// Resume normal operation from the paused or faulted phase. Opens a fresh
/// round right away when the previous one already settled, otherwise the
/// still open round continues.
///
/// It rejects if:
/// - Sender is neither an operator nor an admin.
/// - The system is already running.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "unpause",
    enable_logger
)]
fn contract_unpause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(!host.state().locked, AuctionError::Reentered);
    ensure!(
        host.state().authority.has_operator_rights(&ctx.sender()),
        AuctionError::Unauthorized
    );
    ensure!(
        host.state().phase != Phase::Running,
        AuctionError::NotPaused
    );

    host.state_mut().phase = Phase::Running;
    logger.log(&AuctionEvents::Resumed)?;

    if host.state().round_needed() {
        open_next(host, ctx.metadata().slot_time(), logger)?;
    }
    Ok(())
}

/// Update one auction parameter. Takes effect for the current round
/// immediately, except that an already granted extension is never revoked.
///
/// It rejects if:
/// - Sender is neither an operator nor an admin.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "updateConfig",
    parameter = "ConfigUpdate",
    enable_logger
)]
fn contract_update_config<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(!host.state().locked, AuctionError::Reentered);
    ensure!(
        host.state().authority.has_operator_rights(&ctx.sender()),
        AuctionError::Unauthorized
    );

    let update = ConfigUpdate::deserial(&mut ctx.parameter_cursor())?;
    host.state_mut().apply_config_update(update);
    logger.log(&AuctionEvents::parameter(&update))?;
    Ok(())
}

/// Function to manage addresses that are allowed to maintain and modify the
/// state of the contract.
///
/// It rejects if:
/// - Fails to parse `AuthorityUpdateParams` parameters.
/// - Sender is not one of the admins.
#[receive(
    mutable,
    contract = "PerpetualAuction",
    name = "updateAuthority",
    parameter = "AuthorityUpdateParams"
)]
fn update_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<()> {
    ensure!(!host.state().locked, AuctionError::Reentered);
    let params = AuthorityUpdateParams::deserial(&mut ctx.parameter_cursor())?;
    let sender = ctx.sender();
    host.state_mut().authority.handle_update(sender, params)
}

/// Function to view addresses that are allowed to maintain and modify the
/// state of the contract.
#[receive(
    contract = "PerpetualAuction",
    name = "viewAuthority",
    parameter = "AuthorityViewParams",
    return_value = "Vec<Address>"
)]
fn view_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Vec<Address>> {
    let params = AuthorityViewParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().authority.handle_view(params))
}

/// View the phase, current round and configuration.
#[receive(
    contract = "PerpetualAuction",
    name = "view",
    return_value = "ViewResult"
)]
fn contract_view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ViewResult> {
    let state = host.state();
    Ok(ViewResult {
        phase: state.phase,
        round: state.round,
        config: state.config,
        registry: state.registry,
        wrapped_token: state.wrapped_token,
        beneficiary: state.beneficiary,
        live_bids: state.ledger.len(),
    })
}

/// View every live bid of the current round in rank order, leader first.
/// The bidder one position above the intended rank is the hint to pass to
/// `bid`.
#[receive(
    contract = "PerpetualAuction",
    name = "viewLedger",
    return_value = "Vec<LedgerEntry>"
)]
fn contract_view_ledger<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Vec<LedgerEntry>> {
    let entries = host
        .state()
        .ledger
        .walk()?
        .into_iter()
        .map(|(bidder, amount)| LedgerEntry { bidder, amount })
        .collect();
    Ok(entries)
}

/// View one account's live bid and pending credit.
#[receive(
    contract = "PerpetualAuction",
    name = "viewBid",
    parameter = "AccountAddress",
    return_value = "ViewBidResult"
)]
fn contract_view_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ViewBidResult> {
    let account = AccountAddress::deserial(&mut ctx.parameter_cursor())?;
    let state = host.state();
    Ok(ViewBidResult {
        live: state
            .ledger
            .amount_of(&account)
            .unwrap_or_else(Amount::zero),
        pending: state.pending_of(&account),
    })
}

/// Settle the current round and run the settlement invokes.
///
/// The round is marked settled and the ledger swept before any invoke, so
/// re-entering through the registry or the payout cannot observe a live
/// round.
fn settle_round<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    now: Timestamp,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let outcome = host.state_mut().settle(now)?;
    let registry = host.state().registry;
    let wrapped_token = host.state().wrapped_token;
    let beneficiary = host.state().beneficiary;

    host.state_mut().locked = true;
    let invoked = settlement_invokes(host, &outcome, &registry, &wrapped_token, &beneficiary);
    host.state_mut().locked = false;
    invoked?;

    match outcome.winner {
        Some((winner, amount)) => {
            logger.log(&AuctionEvents::settled(outcome.asset_id, Some(&winner), amount))?
        }
        None => logger.log(&AuctionEvents::settled(
            outcome.asset_id,
            None,
            Amount::zero(),
        ))?,
    }
    Ok(())
}

fn settlement_invokes<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    outcome: &SettleOutcome,
    registry: &ContractAddress,
    wrapped_token: &ContractAddress,
    beneficiary: &AccountAddress,
) -> ContractResult<()> {
    match outcome.winner {
        Some((winner, amount)) => {
            host.registry_transfer_ownership(registry, outcome.asset_id, winner)?;
            host.pay_out(wrapped_token, beneficiary, amount)?;
        }
        None => host.registry_burn(registry, outcome.asset_id)?,
    }
    Ok(())
}

/// Mint the next asset and open its round. A minting failure moves the
/// system to the faulted phase instead of rejecting, so a settlement that
/// happened in the same call is kept.
fn open_next<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    now: Timestamp,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let registry = host.state().registry;

    host.state_mut().locked = true;
    let minted = host.registry_mint(&registry);
    host.state_mut().locked = false;

    match minted {
        Ok(asset_id) => {
            let round = host.state_mut().open_round(asset_id, now);
            logger.log(&AuctionEvents::opened(round.asset_id, round.start, round.end))?;
        }
        Err(_) => {
            host.state_mut().phase = Phase::Faulted;
            logger.log(&AuctionEvents::Faulted)?;
        }
    }
    Ok(())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::state::NodeKey;
    use concordium_std::test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const ALICE: AccountAddress = AccountAddress([2; 32]);
    const BOB: AccountAddress = AccountAddress([3; 32]);
    const BENEFICIARY: AccountAddress = AccountAddress([7; 32]);
    const REGISTRY: ContractAddress = ContractAddress {
        index: 8,
        subindex: 0,
    };
    const WRAPPED: ContractAddress = ContractAddress {
        index: 9,
        subindex: 0,
    };

    fn ts(seconds: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(seconds * 1000)
    }

    fn init_params() -> InitParams {
        InitParams {
            registry: REGISTRY,
            wrapped_token: WRAPPED,
            beneficiary: BENEFICIARY,
            config: AuctionConfig {
                reserve_price: Amount::from_ccd(1),
                min_increment: Percent::from_percent(5),
                round_duration: Duration::from_seconds(600),
                time_buffer: Duration::from_seconds(60),
            },
        }
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let state = State::new(&mut state_builder, Address::Account(ADMIN), init_params());
        TestHost::new(state, state_builder)
    }

    fn parse_and_ok_mock<D: Deserial, S>(
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _amount, _balance, _state| {
            D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            Ok((false, Some(return_value.clone())))
        })
    }

    fn trap_mock<S>() -> MockFn<S> {
        MockFn::new(|_parameter, _amount, _balance, _state| {
            Err::<(bool, Option<()>), _>(CallContractError::Trap)
        })
    }

    fn mock_mint(host: &mut TestHost<State<TestStateApi>>, asset_id: AssetId) {
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("mint")),
            parse_and_ok_mock::<(), _>(asset_id),
        );
    }

    fn receive_ctx(sender: AccountAddress, slot_time: Timestamp) -> TestReceiveContext<'static> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender))
            .set_invoker(sender)
            .set_metadata_slot_time(slot_time);
        ctx
    }

    /// Host running a round for asset 1 opened at t = 0.
    fn running_host() -> TestHost<State<TestStateApi>> {
        let mut host = default_host();
        mock_mint(&mut host, 1);
        let ctx = receive_ctx(ADMIN, ts(0));
        let mut logger = TestLogger::init();
        contract_unpause(&ctx, &mut host, &mut logger).expect_report("unpause");
        host
    }

    fn bid(
        host: &mut TestHost<State<TestStateApi>>,
        bidder: AccountAddress,
        amount: Amount,
        hint: NodeKey,
        slot_time: Timestamp,
    ) -> ContractResult<()> {
        let params = to_bytes(&BidParams { hint });
        let mut ctx = receive_ctx(bidder, slot_time);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, host, amount, &mut logger)
    }

    #[concordium_test]
    fn test_init() {
        let mut ctx = TestInitContext::empty();
        let params = to_bytes(&init_params());
        ctx.set_init_origin(ADMIN).set_parameter(&params);
        let mut state_builder = TestStateBuilder::new();

        let state = contract_init(&ctx, &mut state_builder).expect_report("init");

        claim_eq!(state.phase, Phase::Paused);
        claim!(state.round.is_none());
        claim!(state.ledger.is_empty());
        claim!(!state.locked);
        claim!(state.authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(!state.authority.has_admin_rights(&Address::Account(ALICE)));
    }

    #[concordium_test]
    fn test_unpause_opens_first_round() {
        let mut host = default_host();
        mock_mint(&mut host, 1);
        let ctx = receive_ctx(ADMIN, ts(0));
        let mut logger = TestLogger::init();

        contract_unpause(&ctx, &mut host, &mut logger).expect_report("unpause");

        claim_eq!(host.state().phase, Phase::Running);
        let round = host.state().round.expect_report("round");
        claim_eq!(round.asset_id, 1);
        claim_eq!(round.start, ts(0));
        claim_eq!(round.end, ts(600));
        claim!(!round.settled);
        // Resumed, then Opened.
        claim_eq!(logger.logs.len(), 2);
        claim_eq!(logger.logs[0], to_bytes(&AuctionEvents::Resumed));
        claim_eq!(
            logger.logs[1],
            to_bytes(&AuctionEvents::opened(1, ts(0), ts(600)))
        );
    }

    #[concordium_test]
    fn test_unpause_requires_operator() {
        let mut host = default_host();
        mock_mint(&mut host, 1);
        let ctx = receive_ctx(ALICE, ts(0));
        let mut logger = TestLogger::init();

        claim_eq!(
            contract_unpause(&ctx, &mut host, &mut logger),
            Err(AuctionError::Unauthorized)
        );
        claim_eq!(host.state().phase, Phase::Paused);
    }

    #[concordium_test]
    fn test_unpause_mint_failure_faults() {
        let mut host = default_host();
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("mint")),
            trap_mock(),
        );
        let ctx = receive_ctx(ADMIN, ts(0));
        let mut logger = TestLogger::init();

        // The call itself succeeds; the failure is absorbed into the phase.
        contract_unpause(&ctx, &mut host, &mut logger).expect_report("unpause");

        claim_eq!(host.state().phase, Phase::Faulted);
        claim!(host.state().round.is_none());
        claim!(!host.state().locked);
        claim_eq!(logger.logs[1], to_bytes(&AuctionEvents::Faulted));
    }

    #[concordium_test]
    fn test_bid_rejects_contract_sender() {
        let mut host = running_host();
        let params = to_bytes(&BidParams {
            hint: NodeKey::Head,
        });
        let mut ctx = receive_ctx(ALICE, ts(1));
        ctx.set_sender(Address::Contract(WRAPPED));
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();

        claim_eq!(
            contract_bid(&ctx, &mut host, Amount::from_ccd(5), &mut logger),
            Err(AuctionError::OnlyAccountAddress)
        );
    }

    #[concordium_test]
    fn test_bid_rejected_while_locked() {
        let mut host = running_host();
        host.state_mut().locked = true;

        claim_eq!(
            bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1)),
            Err(AuctionError::Reentered)
        );
    }

    #[concordium_test]
    fn test_admin_entrypoints_rejected_while_locked() {
        let mut host = running_host();
        host.state_mut().locked = true;
        let mut logger = TestLogger::init();

        // Even operators cannot mutate state while an invoke is in flight.
        let ctx = receive_ctx(ADMIN, ts(1));
        claim_eq!(
            contract_pause(&ctx, &mut host, &mut logger),
            Err(AuctionError::Reentered)
        );
        claim_eq!(
            contract_unpause(&ctx, &mut host, &mut logger),
            Err(AuctionError::Reentered)
        );

        let update = to_bytes(&ConfigUpdate::ReservePrice(Amount::from_ccd(2)));
        let mut ctx = receive_ctx(ADMIN, ts(1));
        ctx.set_parameter(&update);
        claim_eq!(
            contract_update_config(&ctx, &mut host, &mut logger),
            Err(AuctionError::Reentered)
        );

        let authority_update = to_bytes(&AuthorityUpdateParams {
            field: AuthorityField::Operator,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(BOB),
        });
        let mut ctx = receive_ctx(ADMIN, ts(1));
        ctx.set_parameter(&authority_update);
        claim_eq!(
            update_authority(&ctx, &mut host),
            Err(AuctionError::Reentered)
        );

        claim_eq!(host.state().phase, Phase::Running);
        claim_eq!(host.state().config.reserve_price, Amount::from_ccd(1));
    }

    #[concordium_test]
    fn test_bid_logs_events() {
        let mut host = running_host();
        let params = to_bytes(&BidParams {
            hint: NodeKey::Head,
        });

        // Plain leading bid far from the end: only BidPlaced.
        let mut ctx = receive_ctx(ALICE, ts(1));
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, &mut host, Amount::from_ccd(5), &mut logger).expect_report("bid");
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvents::bid_placed(
                1,
                &ALICE,
                Amount::from_ccd(5),
                false
            ))
        );

        // Leading bid inside the buffer: Extended, then BidPlaced.
        let mut ctx = receive_ctx(BOB, ts(580));
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, &mut host, Amount::from_ccd(6), &mut logger).expect_report("bid");
        claim_eq!(logger.logs.len(), 2);
        claim_eq!(logger.logs[0], to_bytes(&AuctionEvents::extended(1, ts(640))));
        claim_eq!(
            logger.logs[1],
            to_bytes(&AuctionEvents::bid_placed(
                1,
                &BOB,
                Amount::from_ccd(6),
                true
            ))
        );
    }

    #[concordium_test]
    fn test_withdraw_pays_out() {
        let mut host = running_host();
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(2)).expect_report("bob bid");

        host.set_self_balance(Amount::from_ccd(11));
        let ctx = receive_ctx(ALICE, ts(3));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");

        claim!(host.transfer_occurred(&ALICE, Amount::from_ccd(5)));
        claim!(!host.state().locked);
        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvents::withdrawn(&ALICE, Amount::from_ccd(5)))
        );
        claim_eq!(host.state().ledger.amount_of(&ALICE), None);
    }

    #[concordium_test]
    fn test_withdraw_leader_rejected() {
        let mut host = running_host();
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(1)).expect_report("bid");

        let ctx = receive_ctx(BOB, ts(2));
        let mut logger = TestLogger::init();
        claim_eq!(
            contract_withdraw(&ctx, &mut host, &mut logger),
            Err(AuctionError::StillLeading)
        );
    }

    #[concordium_test]
    fn test_withdraw_nothing_is_noop() {
        let mut host = running_host();
        let ctx = receive_ctx(ALICE, ts(1));
        let mut logger = TestLogger::init();

        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");
        claim_eq!(logger.logs.len(), 0);
    }

    #[concordium_test]
    fn test_withdraw_falls_back_to_wrapped_token() {
        let mut host = running_host();
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(2)).expect_report("bob bid");

        // Direct transfers to Alice fail, so the value gets wrapped.
        host.make_account_missing(ALICE);
        host.setup_mock_entrypoint(
            WRAPPED,
            OwnedEntrypointName::new_unchecked(String::from("wrap")),
            parse_and_ok_mock::<crate::payout::WrapParams, _>(()),
        );
        host.set_self_balance(Amount::from_ccd(11));

        let ctx = receive_ctx(ALICE, ts(3));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");

        claim!(!host.transfer_occurred(&ALICE, Amount::from_ccd(5)));
        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvents::withdrawn(&ALICE, Amount::from_ccd(5)))
        );
    }

    #[concordium_test]
    fn test_settle_and_open_next_full_cycle() {
        let mut host = running_host();

        // Alice bids 10, Bob raises to 11, Alice pulls her 10 back out.
        bid(&mut host, ALICE, Amount::from_ccd(10), NodeKey::Head, ts(10))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(11), NodeKey::Head, ts(20)).expect_report("bob bid");
        host.set_self_balance(Amount::from_ccd(21));
        let ctx = receive_ctx(ALICE, ts(30));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");
        claim!(host.transfer_occurred(&ALICE, Amount::from_ccd(10)));

        // Round ends; anyone settles and the next round opens.
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("transferOwnership")),
            parse_and_ok_mock::<crate::registry::TransferOwnershipParams, _>(()),
        );
        mock_mint(&mut host, 2);
        host.set_self_balance(Amount::from_ccd(11));
        let ctx = receive_ctx(ALICE, ts(600));
        let mut logger = TestLogger::init();
        contract_settle_and_open_next(&ctx, &mut host, &mut logger).expect_report("settle");

        claim!(host.transfer_occurred(&BENEFICIARY, Amount::from_ccd(11)));
        claim!(!host.state().locked);
        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvents::settled(1, Some(&BOB), Amount::from_ccd(11)))
        );
        claim_eq!(
            logger.logs[1],
            to_bytes(&AuctionEvents::opened(2, ts(600), ts(1200)))
        );
        let round = host.state().round.expect_report("round");
        claim_eq!(round.asset_id, 2);
        claim!(!round.settled);
        claim!(host.state().ledger.is_empty());

        // The winner owes nothing and is owed nothing.
        claim_eq!(host.state().pending_of(&BOB), Amount::zero());
    }

    #[concordium_test]
    fn test_settle_without_bids_burns() {
        let mut host = running_host();
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("burn")),
            parse_and_ok_mock::<AssetId, _>(()),
        );
        mock_mint(&mut host, 2);

        let ctx = receive_ctx(ALICE, ts(600));
        let mut logger = TestLogger::init();
        contract_settle_and_open_next(&ctx, &mut host, &mut logger).expect_report("settle");

        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvents::settled(1, None, Amount::zero()))
        );
        claim_eq!(host.state().round.expect_report("round").asset_id, 2);
    }

    #[concordium_test]
    fn test_settle_and_open_next_too_early() {
        let mut host = running_host();
        let ctx = receive_ctx(ALICE, ts(599));
        let mut logger = TestLogger::init();

        claim_eq!(
            contract_settle_and_open_next(&ctx, &mut host, &mut logger),
            Err(AuctionError::TooEarly)
        );
    }

    #[concordium_test]
    fn test_settle_only_phase_gating() {
        let mut host = running_host();
        bid(&mut host, BOB, Amount::from_ccd(11), NodeKey::Head, ts(1)).expect_report("bid");

        // Running phase routes settlement through settleAndOpenNext.
        let ctx = receive_ctx(ALICE, ts(600));
        let mut logger = TestLogger::init();
        claim_eq!(
            contract_settle_only(&ctx, &mut host, &mut logger),
            Err(AuctionError::NotPaused)
        );

        // Halted: the ended round still settles, and no next round opens.
        let pause_ctx = receive_ctx(ADMIN, ts(600));
        contract_pause(&pause_ctx, &mut host, &mut logger).expect_report("pause");
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("transferOwnership")),
            parse_and_ok_mock::<crate::registry::TransferOwnershipParams, _>(()),
        );
        host.set_self_balance(Amount::from_ccd(11));
        contract_settle_only(&ctx, &mut host, &mut logger).expect_report("settle only");

        claim!(host.transfer_occurred(&BENEFICIARY, Amount::from_ccd(11)));
        claim_eq!(host.state().phase, Phase::Paused);
        claim!(host.state().round.expect_report("round").settled);
    }

    #[concordium_test]
    fn test_pause_gating_and_bidding_while_paused() {
        let mut host = running_host();

        // Only operators halt the system.
        let ctx = receive_ctx(ALICE, ts(1));
        let mut logger = TestLogger::init();
        claim_eq!(
            contract_pause(&ctx, &mut host, &mut logger),
            Err(AuctionError::Unauthorized)
        );

        let ctx = receive_ctx(ADMIN, ts(1));
        contract_pause(&ctx, &mut host, &mut logger).expect_report("pause");
        claim_eq!(host.state().phase, Phase::Paused);
        claim_eq!(logger.logs[0], to_bytes(&AuctionEvents::Halted));

        // Pausing twice rejects.
        claim_eq!(
            contract_pause(&ctx, &mut host, &mut logger),
            Err(AuctionError::ContractPaused)
        );

        // The already open round keeps accepting bids.
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(2))
            .expect_report("bid while paused");
        claim_eq!(
            host.state().ledger.leading(),
            Some((ALICE, Amount::from_ccd(5)))
        );
    }

    #[concordium_test]
    fn test_unpause_keeps_unsettled_round() {
        let mut host = running_host();
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1)).expect_report("bid");

        let ctx = receive_ctx(ADMIN, ts(2));
        let mut logger = TestLogger::init();
        contract_pause(&ctx, &mut host, &mut logger).expect_report("pause");

        // No new mint happens on resume while the round is still open.
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("mint")),
            trap_mock(),
        );
        let ctx = receive_ctx(ADMIN, ts(3));
        contract_unpause(&ctx, &mut host, &mut logger).expect_report("unpause");

        claim_eq!(host.state().phase, Phase::Running);
        claim_eq!(host.state().round.expect_report("round").asset_id, 1);
        claim_eq!(
            host.state().ledger.leading(),
            Some((ALICE, Amount::from_ccd(5)))
        );
    }

    #[concordium_test]
    fn test_update_config() {
        let mut host = running_host();

        let update = ConfigUpdate::ReservePrice(Amount::from_ccd(2));
        let params = to_bytes(&update);
        let mut ctx = receive_ctx(ALICE, ts(1));
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        claim_eq!(
            contract_update_config(&ctx, &mut host, &mut logger),
            Err(AuctionError::Unauthorized)
        );

        let mut ctx = receive_ctx(ADMIN, ts(1));
        ctx.set_parameter(&params);
        contract_update_config(&ctx, &mut host, &mut logger).expect_report("update");

        claim_eq!(host.state().config.reserve_price, Amount::from_ccd(2));
        claim_eq!(logger.logs[0], to_bytes(&AuctionEvents::parameter(&update)));

        // The new reserve binds immediately.
        claim_eq!(
            bid(&mut host, ALICE, Amount::from_ccd(1), NodeKey::Head, ts(2)),
            Err(AuctionError::BelowReserve)
        );
    }

    #[concordium_test]
    fn test_views() {
        let mut host = running_host();
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(2)).expect_report("bob bid");

        let ctx = receive_ctx(ALICE, ts(3));
        let view = contract_view(&ctx, &host).expect_report("view");
        claim_eq!(view.phase, Phase::Running);
        claim_eq!(view.live_bids, 2);
        claim_eq!(view.beneficiary, BENEFICIARY);
        claim_eq!(view.round.expect_report("round").asset_id, 1);

        let entries = contract_view_ledger(&ctx, &host).expect_report("view ledger");
        claim_eq!(
            entries,
            vec![
                LedgerEntry {
                    bidder: BOB,
                    amount: Amount::from_ccd(6)
                },
                LedgerEntry {
                    bidder: ALICE,
                    amount: Amount::from_ccd(5)
                }
            ]
        );

        let params = to_bytes(&ALICE);
        let mut ctx = receive_ctx(ALICE, ts(3));
        ctx.set_parameter(&params);
        let alice_bid = contract_view_bid(&ctx, &host).expect_report("view bid");
        claim_eq!(alice_bid.live, Amount::from_ccd(5));
        claim_eq!(alice_bid.pending, Amount::zero());
    }

    #[concordium_test]
    fn test_update_and_view_authority() {
        let mut host = default_host();

        let update = AuthorityUpdateParams {
            field: AuthorityField::Operator,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(BOB),
        };
        let params = to_bytes(&update);

        // Non-admins cannot touch the lists.
        let mut ctx = receive_ctx(ALICE, ts(1));
        ctx.set_parameter(&params);
        claim_eq!(
            update_authority(&ctx, &mut host),
            Err(AuctionError::Unauthorized)
        );

        let mut ctx = receive_ctx(ADMIN, ts(1));
        ctx.set_parameter(&params);
        update_authority(&ctx, &mut host).expect_report("update authority");
        claim!(host
            .state()
            .authority
            .has_operator_rights(&Address::Account(BOB)));

        let view_params = to_bytes(&AuthorityViewParams {
            field: AuthorityField::Operator,
            skip: 0,
            show: 10,
        });
        let mut ctx = receive_ctx(ALICE, ts(1));
        ctx.set_parameter(&view_params);
        let operators = view_authority(&ctx, &host).expect_report("view authority");
        claim_eq!(operators, vec![Address::Account(BOB)]);
    }

    #[concordium_test]
    fn test_settlement_kept_when_next_mint_fails() {
        let mut host = running_host();
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(2)).expect_report("bob bid");

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("transferOwnership")),
            parse_and_ok_mock::<crate::registry::TransferOwnershipParams, _>(()),
        );
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("mint")),
            trap_mock(),
        );
        host.set_self_balance(Amount::from_ccd(11));

        let ctx = receive_ctx(ALICE, ts(600));
        let mut logger = TestLogger::init();
        contract_settle_and_open_next(&ctx, &mut host, &mut logger).expect_report("settle");

        // The settlement stands even though no next round could open.
        claim!(host.transfer_occurred(&BENEFICIARY, Amount::from_ccd(6)));
        claim_eq!(host.state().phase, Phase::Faulted);
        claim!(host.state().round.expect_report("round").settled);
        claim!(!host.state().locked);
        claim_eq!(logger.logs[1], to_bytes(&AuctionEvents::Faulted));

        // Alice's swept funds are still claimable while faulted.
        host.set_self_balance(Amount::from_ccd(5));
        let ctx = receive_ctx(ALICE, ts(601));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");
        claim!(host.transfer_occurred(&ALICE, Amount::from_ccd(5)));
    }

    #[concordium_test]
    fn test_value_conserved_across_round() {
        const CAROL: AccountAddress = AccountAddress([4; 32]);
        let mut host = running_host();

        // Everything the contract holds is either a live bid or a pending
        // credit, at every point of the round.
        fn held(host: &TestHost<State<TestStateApi>>) -> Amount {
            let state = host.state();
            let live = state
                .ledger
                .walk()
                .expect_report("walk")
                .into_iter()
                .fold(Amount::zero(), |acc, (_, amount)| acc + amount);
            [ALICE, BOB, CAROL]
                .iter()
                .fold(live, |acc, account| acc + state.pending_of(account))
        }

        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(2)).expect_report("bob bid");
        bid(
            &mut host,
            CAROL,
            Amount::from_ccd(2),
            NodeKey::Bidder(ALICE),
            ts(3),
        )
        .expect_report("carol bid");
        claim_eq!(held(&host), Amount::from_ccd(13));

        // A withdrawal removes exactly what it pays out.
        host.set_self_balance(Amount::from_ccd(13));
        let ctx = receive_ctx(ALICE, ts(4));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");
        claim!(host.transfer_occurred(&ALICE, Amount::from_ccd(5)));
        claim_eq!(held(&host), Amount::from_ccd(8));

        // Settlement removes exactly the winning amount; the loser's bid
        // moves from the ledger into pending credit.
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("transferOwnership")),
            parse_and_ok_mock::<crate::registry::TransferOwnershipParams, _>(()),
        );
        mock_mint(&mut host, 2);
        host.set_self_balance(Amount::from_ccd(8));
        let ctx = receive_ctx(ALICE, ts(600));
        let mut logger = TestLogger::init();
        contract_settle_and_open_next(&ctx, &mut host, &mut logger).expect_report("settle");
        claim!(host.transfer_occurred(&BENEFICIARY, Amount::from_ccd(6)));
        claim_eq!(held(&host), Amount::from_ccd(2));

        // The last credit drains the books to zero.
        host.set_self_balance(Amount::from_ccd(2));
        let ctx = receive_ctx(CAROL, ts(601));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");
        claim!(host.transfer_occurred(&CAROL, Amount::from_ccd(2)));
        claim_eq!(held(&host), Amount::zero());
    }

    #[concordium_test]
    fn test_cross_round_credit_claimable() {
        let mut host = running_host();
        bid(&mut host, ALICE, Amount::from_ccd(5), NodeKey::Head, ts(1))
            .expect_report("alice bid");
        bid(&mut host, BOB, Amount::from_ccd(6), NodeKey::Head, ts(2)).expect_report("bob bid");

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked(String::from("transferOwnership")),
            parse_and_ok_mock::<crate::registry::TransferOwnershipParams, _>(()),
        );
        mock_mint(&mut host, 2);
        host.set_self_balance(Amount::from_ccd(11));
        let ctx = receive_ctx(ALICE, ts(600));
        let mut logger = TestLogger::init();
        contract_settle_and_open_next(&ctx, &mut host, &mut logger).expect_report("settle");

        // Alice lost round 1; her funds wait as credit into round 2.
        claim_eq!(host.state().pending_of(&ALICE), Amount::from_ccd(5));

        host.set_self_balance(Amount::from_ccd(5));
        let ctx = receive_ctx(ALICE, ts(700));
        let mut logger = TestLogger::init();
        contract_withdraw(&ctx, &mut host, &mut logger).expect_report("withdraw");
        claim!(host.transfer_occurred(&ALICE, Amount::from_ccd(5)));
        claim_eq!(host.state().pending_of(&ALICE), Amount::zero());
    }
}
