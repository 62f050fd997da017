//! A perpetual auction: the moment one round settles, the next one opens,
//! auctioning a freshly minted unique asset every cycle.
//!
//! Outstanding bids are kept in a strictly ordered linked ledger, so the
//! winner is always the node right after the head sentinel. Losing bids are
//! never refunded eagerly; they stay in the ledger (withdrawable at any
//! time) and are swept into claimable credits when a round settles.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod payout;
mod registry;
mod state;
