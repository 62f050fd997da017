use super::*;

use core::convert::TryInto;

pub type ContractResult<A> = Result<A, AuctionError>;

/// Identifier the asset registry assigns to each minted asset.
pub type AssetId = u64;

/// Whole-percent value used for the minimum bid increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, SchemaType)]
pub struct Percent(u64);

impl Percent {
    pub fn from_percent(percent: u64) -> Self {
        Self(percent)
    }

    /// Smallest amount that beats `lead` by this percentage.
    ///
    /// Computed as `lead * (100 + pct) / 100` with integer flooring, so
    /// callers must overshoot whenever the division truncates.
    pub fn min_raise(self, lead: Amount) -> Amount {
        Amount::from_micro_ccd(
            (lead.micro_ccd as u128 * (100 + self.0 as u128) / 100)
                .try_into()
                .unwrap_or(u64::MAX),
        )
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_min_raise_floors() {
        let pct = Percent::from_percent(5);
        // 1050 floors exactly.
        claim_eq!(
            pct.min_raise(Amount::from_micro_ccd(1000)),
            Amount::from_micro_ccd(1050)
        );
        // 10 * 1.05 = 10.5 floors down to 10: a tie with the lead clears the gate.
        claim_eq!(
            pct.min_raise(Amount::from_micro_ccd(10)),
            Amount::from_micro_ccd(10)
        );
    }

    #[concordium_test]
    fn test_min_raise_zero_percent() {
        let pct = Percent::from_percent(0);
        claim_eq!(
            pct.min_raise(Amount::from_micro_ccd(777)),
            Amount::from_micro_ccd(777)
        );
    }

    #[concordium_test]
    fn test_min_raise_saturates() {
        let pct = Percent::from_percent(100);
        claim_eq!(
            pct.min_raise(Amount::from_micro_ccd(u64::MAX)),
            Amount::from_micro_ccd(u64::MAX)
        );
    }
}
