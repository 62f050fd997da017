use commons::*;
use concordium_std::*;

/// Parameter to the registry `transferOwnership` entrypoint.
#[derive(Debug, Serialize, SchemaType)]
pub struct TransferOwnershipParams {
    pub id: AssetId,
    pub to: AccountAddress,
}

/// Client for the external asset registry.
///
/// The registry mints one fresh unique asset per round, burns assets from
/// rounds that end without a bid and transfers ownership to round winners.
pub trait HostRegistryExt<S>: HasHost<S> {
    fn registry_mint(&mut self, registry: &ContractAddress) -> ContractResult<AssetId> {
        let (_, return_value) = self.invoke_contract(
            registry,
            &(),
            EntrypointName::new_unchecked("mint"),
            Amount::zero(),
        )?;
        let mut return_value = return_value.ok_or(AuctionError::InvokeContractError)?;
        return_value
            .get()
            .map_err(|_| AuctionError::InvokeContractError)
    }

    fn registry_burn(&mut self, registry: &ContractAddress, id: AssetId) -> ContractResult<()> {
        self.invoke_contract(
            registry,
            &id,
            EntrypointName::new_unchecked("burn"),
            Amount::zero(),
        )?;
        Ok(())
    }

    fn registry_transfer_ownership(
        &mut self,
        registry: &ContractAddress,
        id: AssetId,
        to: AccountAddress,
    ) -> ContractResult<()> {
        self.invoke_contract(
            registry,
            &TransferOwnershipParams { id, to },
            EntrypointName::new_unchecked("transferOwnership"),
            Amount::zero(),
        )?;
        Ok(())
    }
}

impl<S, H: HasHost<S>> HostRegistryExt<S> for H {}
