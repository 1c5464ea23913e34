use crate::address::Address;
use crate::error::TypesError;
use crate::u256::U256;
use crate::units::{ether, tokens};
use std::collections::HashSet;

/// Labels of the development accounts used by the devnet preset.
pub const DEV_ACCOUNTS: [&str; 9] = [
    "deployer", "funder", "investor1", "investor2", "investor3", "investor4", "investor5",
    "recipient", "user",
];

/// Governance token parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    /// Maximum supply in whole tokens; minted to the deployer at deployment.
    pub max_supply: u64,
}

/// Token transfer from the deployer applied at genesis.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenAlloc {
    pub holder: Address,
    pub amount: U256,
}

/// Pre-funded native-currency account.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NativeAlloc {
    pub address: Address,
    pub balance: U256,
}

/// Initial treasury funding.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreasuryFunding {
    pub funder: Address,
    pub amount: U256,
}

/// Everything needed to stand up a DAO: the token, its distribution,
/// the quorum and the treasury's opening balance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenesisConfig {
    /// Deploys the token and receives the full supply
    pub deployer: Address,
    pub token: TokenParams,
    /// Absolute vote weight that `votes_for` must strictly exceed
    pub quorum: U256,
    #[cfg_attr(feature = "serde", serde(default))]
    pub allocations: Vec<TokenAlloc>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub native_balances: Vec<NativeAlloc>,
    pub treasury: Option<TreasuryFunding>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self::devnet()
    }
}

impl GenesisConfig {
    /// Local development configuration.
    ///
    /// A 1,000,000-token supply, 20% to each of five investors, a quorum of
    /// half the supply plus one base unit, every dev account holding 10,000
    /// units of native currency and 100 of them sent to the treasury.
    pub fn devnet() -> Self {
        let investors = ["investor1", "investor2", "investor3", "investor4", "investor5"];

        Self {
            deployer: Address::derive("deployer"),
            token: TokenParams {
                name: "GASton".to_string(),
                symbol: "GSNT".to_string(),
                max_supply: 1_000_000,
            },
            quorum: tokens(500_000).saturating_add(&U256::ONE),
            allocations: investors
                .iter()
                .map(|label| TokenAlloc {
                    holder: Address::derive(label),
                    amount: tokens(200_000),
                })
                .collect(),
            native_balances: DEV_ACCOUNTS
                .iter()
                .map(|label| NativeAlloc {
                    address: Address::derive(label),
                    balance: ether(10_000),
                })
                .collect(),
            treasury: Some(TreasuryFunding {
                funder: Address::derive("funder"),
                amount: ether(100),
            }),
        }
    }

    /// Maximum token supply in base units.
    pub fn max_supply_units(&self) -> Result<U256, TypesError> {
        U256::from(self.token.max_supply)
            .checked_mul(&U256::WEI_PER_UNIT)
            .ok_or(TypesError::U256Overflow)
    }

    /// Native balance configured for an address.
    pub fn native_balance_of(&self, address: &Address) -> U256 {
        self.native_balances
            .iter()
            .find(|a| &a.address == address)
            .map(|a| a.balance)
            .unwrap_or(U256::ZERO)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), TypesError> {
        let invalid = |msg: String| Err(TypesError::InvalidGenesis(msg));

        if self.deployer.is_zero() {
            return invalid("deployer cannot be the zero address".to_string());
        }
        if self.token.name.trim().is_empty() || self.token.symbol.trim().is_empty() {
            return invalid("token name and symbol are required".to_string());
        }
        if self.token.max_supply == 0 {
            return invalid("token max_supply must be positive".to_string());
        }

        let supply = self.max_supply_units()?;
        let mut allocated = U256::ZERO;
        for alloc in &self.allocations {
            if alloc.holder.is_zero() {
                return invalid("token allocation to the zero address".to_string());
            }
            if alloc.amount.is_zero() {
                return invalid("token allocation amount must be positive".to_string());
            }
            allocated = allocated
                .checked_add(&alloc.amount)
                .ok_or(TypesError::U256Overflow)?;
        }
        if allocated > supply {
            return invalid(format!(
                "allocations total {} exceeds max supply {}",
                allocated, supply
            ));
        }

        let mut seen = HashSet::new();
        for alloc in &self.native_balances {
            if !seen.insert(alloc.address) {
                return invalid(format!("duplicate native balance for {}", alloc.address));
            }
        }

        if let Some(funding) = &self.treasury {
            let available = self.native_balance_of(&funding.funder);
            if available < funding.amount {
                return invalid(format!(
                    "treasury funder {} holds {} but funding requires {}",
                    funding.funder, available, funding.amount
                ));
            }
        }

        Ok(())
    }
}
