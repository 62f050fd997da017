use commons::*;
use concordium_cis2::{AdditionalData, Receiver};
use concordium_std::*;

/// Parameter to the wrapped currency `wrap` entrypoint.
#[derive(Debug, Serialize, SchemaType)]
pub struct WrapParams {
    /// Receiver of the wrapped tokens.
    pub to: Receiver,
    /// Extra data passed along when the receiver is a contract.
    pub data: AdditionalData,
}

pub trait HostPayoutExt<S>: HasHost<S> {
    /// Best-effort payout that a recipient cannot block.
    ///
    /// Tries a direct transfer first. If the recipient cannot take it, the
    /// value is wrapped into the fungible fallback token and credited to the
    /// recipient instead, so settlement and withdrawal always go through.
    fn pay_out(
        &mut self,
        wrapped_token: &ContractAddress,
        to: &AccountAddress,
        amount: Amount,
    ) -> ContractResult<()> {
        if amount == Amount::zero() {
            return Ok(());
        }
        if self.invoke_transfer(to, amount).is_ok() {
            return Ok(());
        }
        self.invoke_contract(
            wrapped_token,
            &WrapParams {
                to: Receiver::Account(*to),
                data: AdditionalData::empty(),
            },
            EntrypointName::new_unchecked("wrap"),
            amount,
        )
        .map_err(|_| AuctionError::InvokeTransferError)?;
        Ok(())
    }
}

impl<S, H: HasHost<S>> HostPayoutExt<S> for H {}
