use super::*;

/// The custom errors the auction contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum AuctionError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Only account addresses can bid or withdraw (Error code: -4).
    OnlyAccountAddress,
    /// Sender lacks the required rights (Error code: -5).
    Unauthorized,
    /// New rounds are halted, so settling must go through `settleOnly`
    /// (Error code: -6).
    ContractPaused,
    /// `settleOnly` is reserved for the halted contract (Error code: -7).
    NotPaused,
    /// No round is accepting bids, or the round end time has passed
    /// (Error code: -8).
    AuctionClosed,
    /// Total bid is below the reserve price (Error code: -9).
    BelowReserve,
    /// Supplied insertion hint is unknown or downstream of the bid
    /// (Error code: -10).
    InvalidHint,
    /// New top bid does not clear the minimum increment over the current
    /// lead (Error code: -11).
    InsufficientIncrement,
    /// The leading bid can only leave through settlement (Error code: -12).
    StillLeading,
    /// No round has ever been opened (Error code: -13).
    NotStarted,
    /// The current round was already settled (Error code: -14).
    AlreadySettled,
    /// The current round has not reached its end time (Error code: -15).
    TooEarly,
    /// The bid ledger links do not form a consistent list (Error code: -16).
    LedgerInconsistent,
    /// A state-mutating entrypoint was re-entered (Error code: -17).
    Reentered,
    /// Failed to invoke a contract (Error code: -18).
    InvokeContractError,
    /// Failed to pay out funds (Error code: -19).
    InvokeTransferError,
}

/// Mapping the logging errors to AuctionError.
impl From<LogError> for AuctionError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to AuctionError.
impl<T> From<CallContractError<T>> for AuctionError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping errors related to transfer invocations to AuctionError.
impl From<TransferError> for AuctionError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}
