use crate::AuctionError;
use concordium_std::*;

/// Access control for the auction contract.
///
/// Admins manage both lists. Operators are allowed to halt and resume the
/// auction and to update its parameters, but cannot change the lists.
#[derive(Debug, Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct Authority<S: HasStateApi> {
    /// Trusted addresses that manage the admin and operator lists.
    admins: StateSet<Address, S>,
    /// Addresses allowed to operate the auction (pause, unpause, configure).
    operators: StateSet<Address, S>,
}

impl<S: HasStateApi> Authority<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, admin: Address) -> Self {
        let mut admins = state_builder.new_set();
        admins.insert(admin);
        Self {
            admins,
            operators: state_builder.new_set(),
        }
    }

    pub fn has_admin_rights(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    pub fn has_operator_rights(&self, address: &Address) -> bool {
        self.operators.contains(address) || self.has_admin_rights(address)
    }

    pub fn handle_update(
        &mut self,
        sender: Address,
        update: AuthorityUpdateParams,
    ) -> Result<(), AuctionError> {
        ensure!(self.has_admin_rights(&sender), AuctionError::Unauthorized);

        let address_list = match update.field {
            AuthorityField::Operator => &mut self.operators,
            AuthorityField::Admin => &mut self.admins,
        };

        match update.kind {
            AuthorityUpdateKind::Remove => {
                address_list.remove(&update.address);
            }
            AuthorityUpdateKind::Add => {
                address_list.insert(update.address);
            }
        }

        Ok(())
    }

    pub fn handle_view(&self, view: AuthorityViewParams) -> Vec<Address> {
        let address_list = match view.field {
            AuthorityField::Operator => &self.operators,
            AuthorityField::Admin => &self.admins,
        };

        address_list
            .iter()
            .skip(view.skip as usize)
            .take(view.show as usize)
            .map(|a| *a)
            .collect()
    }
}

#[derive(Debug, SchemaType, Serialize)]
pub enum AuthorityField {
    Operator,
    Admin,
}

#[derive(Debug, SchemaType, Serialize)]
pub enum AuthorityUpdateKind {
    Remove,
    Add,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityUpdateParams {
    pub field: AuthorityField,
    pub kind: AuthorityUpdateKind,
    pub address: Address,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityViewParams {
    pub field: AuthorityField,
    pub skip: u32,
    pub show: u32,
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const OPERATOR: AccountAddress = AccountAddress([2; 32]);
    const USER: AccountAddress = AccountAddress([3; 32]);

    fn default_authority() -> Authority<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut authority = Authority::new(&mut state_builder, Address::Account(ADMIN));
        authority.operators.insert(Address::Account(OPERATOR));
        authority
    }

    #[concordium_test]
    fn test_admin_implies_operator() {
        let authority = default_authority();
        claim!(authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(authority.has_operator_rights(&Address::Account(ADMIN)));
        claim!(!authority.has_admin_rights(&Address::Account(OPERATOR)));
        claim!(authority.has_operator_rights(&Address::Account(OPERATOR)));
        claim!(!authority.has_operator_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_admin_manages_operators() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN),
            AuthorityUpdateParams {
                field: AuthorityField::Operator,
                kind: AuthorityUpdateKind::Add,
                address: Address::Account(USER),
            },
        );
        claim_eq!(result, Ok(()));
        claim!(authority.has_operator_rights(&Address::Account(USER)));

        let result = authority.handle_update(
            Address::Account(ADMIN),
            AuthorityUpdateParams {
                field: AuthorityField::Operator,
                kind: AuthorityUpdateKind::Remove,
                address: Address::Account(USER),
            },
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.has_operator_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_operator_cannot_manage_lists() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(OPERATOR),
            AuthorityUpdateParams {
                field: AuthorityField::Operator,
                kind: AuthorityUpdateKind::Add,
                address: Address::Account(USER),
            },
        );
        claim_eq!(result, Err(AuctionError::Unauthorized));
        claim!(!authority.has_operator_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_view_operators() {
        let authority = default_authority();
        let listed = authority.handle_view(AuthorityViewParams {
            field: AuthorityField::Operator,
            skip: 0,
            show: 10,
        });
        claim_eq!(listed, vec![Address::Account(OPERATOR)]);
    }
}
