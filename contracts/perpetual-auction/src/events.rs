use commons::*;
use concordium_std::*;

use crate::external::ConfigUpdate;

/// Bid placed event data.
#[derive(Debug, Serial)]
pub struct BidPlacedEvent<'a> {
    /// Asset auctioned in the current round.
    pub asset_id: AssetId,
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Full amount now committed by the bidder.
    pub amount: Amount,
    /// Whether this bid pushed the round end time out.
    pub extended: bool,
}

/// Round extension event data.
#[derive(Debug, Serial)]
pub struct ExtendedEvent {
    pub asset_id: AssetId,
    /// New round end time.
    pub end: Timestamp,
}

/// Settlement event data.
#[derive(Debug, Serial)]
pub struct SettledEvent<'a> {
    pub asset_id: AssetId,
    /// Winning bidder, if any bid was placed.
    pub winner: Option<&'a AccountAddress>,
    /// Winning amount paid to the beneficiary; zero without a winner.
    pub amount: Amount,
}

/// Round opening event data.
#[derive(Debug, Serial)]
pub struct OpenedEvent {
    pub asset_id: AssetId,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Withdrawal event data.
#[derive(Debug, Serial)]
pub struct WithdrawnEvent<'a> {
    pub bidder: &'a AccountAddress,
    /// Live bid plus pending credit paid out.
    pub amount: Amount,
}

/// Parameter update event data.
#[derive(Debug, Serial)]
pub struct ParameterEvent<'a> {
    pub update: &'a ConfigUpdate,
}

/// Tagged event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    BidPlaced(BidPlacedEvent<'a>),
    Extended(ExtendedEvent),
    Settled(SettledEvent<'a>),
    Opened(OpenedEvent),
    Withdrawn(WithdrawnEvent<'a>),
    Parameter(ParameterEvent<'a>),
    /// New rounds halted by an operator.
    Halted,
    /// Rounds resumed by an operator.
    Resumed,
    /// Asset minting failed; new rounds halted until an operator resumes.
    Faulted,
}

impl<'a> AuctionEvents<'a> {
    pub fn bid_placed(
        asset_id: AssetId,
        bidder: &'a AccountAddress,
        amount: Amount,
        extended: bool,
    ) -> Self {
        Self::BidPlaced(BidPlacedEvent {
            asset_id,
            bidder,
            amount,
            extended,
        })
    }

    pub fn extended(asset_id: AssetId, end: Timestamp) -> Self {
        Self::Extended(ExtendedEvent { asset_id, end })
    }

    pub fn settled(asset_id: AssetId, winner: Option<&'a AccountAddress>, amount: Amount) -> Self {
        Self::Settled(SettledEvent {
            asset_id,
            winner,
            amount,
        })
    }

    pub fn opened(asset_id: AssetId, start: Timestamp, end: Timestamp) -> Self {
        Self::Opened(OpenedEvent {
            asset_id,
            start,
            end,
        })
    }

    pub fn withdrawn(bidder: &'a AccountAddress, amount: Amount) -> Self {
        Self::Withdrawn(WithdrawnEvent { bidder, amount })
    }

    pub fn parameter(update: &'a ConfigUpdate) -> Self {
        Self::Parameter(ParameterEvent { update })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::BidPlaced(event) => {
                out.write_u8(BID_PLACED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Extended(event) => {
                out.write_u8(EXTENDED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Settled(event) => {
                out.write_u8(SETTLED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Opened(event) => {
                out.write_u8(OPENED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Withdrawn(event) => {
                out.write_u8(WITHDRAWN_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Parameter(event) => {
                out.write_u8(PARAMETER_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Halted => out.write_u8(HALTED_TAG),
            AuctionEvents::Resumed => out.write_u8(RESUMED_TAG),
            AuctionEvents::Faulted => out.write_u8(FAULTED_TAG),
        }
    }
}
