/// Tag for the BidPlaced event.
pub const BID_PLACED_TAG: u8 = u8::MAX;

/// Tag for the RoundExtended event.
pub const EXTENDED_TAG: u8 = u8::MAX - 1;

/// Tag for the RoundSettled event.
pub const SETTLED_TAG: u8 = u8::MAX - 2;

/// Tag for the RoundOpened event.
pub const OPENED_TAG: u8 = u8::MAX - 3;

/// Tag for the BidWithdrawn event.
pub const WITHDRAWN_TAG: u8 = u8::MAX - 4;

/// Tag for the ParameterUpdated event.
pub const PARAMETER_TAG: u8 = u8::MAX - 5;

/// Tag for the Halted event.
pub const HALTED_TAG: u8 = u8::MAX - 6;

/// Tag for the Resumed event.
pub const RESUMED_TAG: u8 = u8::MAX - 7;

/// Tag for the Faulted event, logged when asset minting fails.
pub const FAULTED_TAG: u8 = u8::MAX - 8;
