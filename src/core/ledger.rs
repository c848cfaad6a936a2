use crate::core::error::LendingError;
use crate::core::token::{AccountId, TokenId};
use crate::core::trade::{Role, SettlementRecord};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

type BalanceKey = (AccountId, TokenId);

/// Account balances per (account, token), plus collateral locked by loans.
///
/// Stands in for the account layer of the state trie: the executor applies
/// each [`SettlementRecord`] here after the settlement engine produced it.
/// Applying a record either moves every amount or none of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceLedger {
    #[serde(with = "balances_serde")]
    balances: HashMap<BalanceKey, BigUint>,
    #[serde(with = "balances_serde")]
    locked: HashMap<BalanceKey, BigUint>,
}

mod balances_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        balances: &HashMap<BalanceKey, BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        // Sorted so the encoding is identical on every node.
        let sorted: BTreeMap<&BalanceKey, &BigUint> = balances.iter().collect();
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for ((account, token), amount) in sorted {
            map.serialize_entry(&format!("{}:{}", account, token), &amount.to_str_radix(10))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<BalanceKey, BigUint>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = HashMap<BalanceKey, BigUint>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"account:token\" keys and decimal string values")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = HashMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    let (account, token) = key
                        .split_once(':')
                        .ok_or_else(|| de::Error::custom(format!("invalid key: {key}")))?;
                    let account: AccountId = account.parse().map_err(de::Error::custom)?;
                    let token: TokenId = token.parse().map_err(de::Error::custom)?;
                    let amount = BigUint::parse_bytes(value.as_bytes(), 10)
                        .ok_or_else(|| de::Error::custom(format!("invalid amount: {value}")))?;
                    map.insert((account, token), amount);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spendable balance of `account` in `token`.
    pub fn balance(&self, account: &AccountId, token: &TokenId) -> BigUint {
        self.balances
            .get(&(*account, *token))
            .cloned()
            .unwrap_or_default()
    }

    /// Collateral of `token` locked by loans of `account`.
    pub fn locked(&self, account: &AccountId, token: &TokenId) -> BigUint {
        self.locked
            .get(&(*account, *token))
            .cloned()
            .unwrap_or_default()
    }

    pub fn credit(&mut self, account: &AccountId, token: &TokenId, amount: &BigUint) {
        if amount.is_zero() {
            return;
        }
        *self.balances.entry((*account, *token)).or_default() += amount;
    }

    pub fn debit(
        &mut self,
        account: &AccountId,
        token: &TokenId,
        amount: &BigUint,
    ) -> Result<(), LendingError> {
        let available = self.balance(account, token);
        if &available < amount {
            return Err(LendingError::InsufficientBalance {
                account: *account,
                token: *token,
                available,
                required: amount.clone(),
            });
        }
        if let Some(entry) = self.balances.get_mut(&(*account, *token)) {
            *entry -= amount;
        }
        Ok(())
    }

    /// Apply the fund flow of one settled match.
    ///
    /// The investor supplies the lent quantity, the borrower's collateral is
    /// moved to the locked book, the borrower is credited the net principal
    /// and the relayer is credited the fee.
    pub fn apply_settlement(
        &mut self,
        taker: &AccountId,
        maker: &AccountId,
        relayer: &AccountId,
        record: &SettlementRecord,
    ) -> Result<(), LendingError> {
        let (borrower, investor) = match record.borrower_side {
            Role::Taker => (taker, maker),
            Role::Maker => (maker, taker),
        };
        let borrower_leg = record.borrower();
        let investor_leg = record.investor();

        // Check every debit before mutating anything.
        let mut required: BTreeMap<BalanceKey, BigUint> = BTreeMap::new();
        *required
            .entry((*investor, investor_leg.out_token))
            .or_default() += &investor_leg.out_total;
        *required
            .entry((*borrower, borrower_leg.out_token))
            .or_default() += &record.collateral_locked_amount;
        for ((account, token), amount) in &required {
            let available = self.balance(account, token);
            if &available < amount {
                log::debug!(
                    "settlement rejected: {} holds {} of {}, needs {}",
                    account,
                    available,
                    token,
                    amount
                );
                return Err(LendingError::InsufficientBalance {
                    account: *account,
                    token: *token,
                    available,
                    required: amount.clone(),
                });
            }
        }

        self.debit(investor, &investor_leg.out_token, &investor_leg.out_total)?;
        self.debit(borrower, &borrower_leg.out_token, &record.collateral_locked_amount)?;
        if !record.collateral_locked_amount.is_zero() {
            *self
                .locked
                .entry((*borrower, borrower_leg.out_token))
                .or_default() += &record.collateral_locked_amount;
        }
        if let Some(in_token) = borrower_leg.in_token {
            self.credit(borrower, &in_token, &borrower_leg.in_total);
            self.credit(relayer, &in_token, &borrower_leg.fee);
        }
        Ok(())
    }

    /// Sum of spendable and locked balances of `token` across all accounts.
    pub fn total_supply(&self, token: &TokenId) -> BigUint {
        self.balances
            .iter()
            .chain(self.locked.iter())
            .filter(|((_, t), _)| t == token)
            .map(|(_, v)| v)
            .sum()
    }
}
