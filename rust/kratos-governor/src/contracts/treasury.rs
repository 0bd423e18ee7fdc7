// Treasury - Example privileged target guarded by governance
//
// Holds a balance for a fixed beneficiary. The only entry point is
// `releaseFunds()`, which moves the whole balance once.

use crate::contracts::execution::CallExecutor;
use crate::types::{selector, AccountId, Address, Balance, Call, Selector};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn release_funds_selector() -> Selector {
    selector("releaseFunds()")
}

/// Build the `releaseFunds()` call for a treasury
pub fn release_funds_call(treasury: Address) -> Call {
    Call::with_selector(treasury, 0, release_funds_selector(), &[])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    pub address: Address,
    pub beneficiary: AccountId,
    balance: Balance,
    released: bool,
    /// Amount paid out to the beneficiary so far
    paid_out: Balance,
}

impl Treasury {
    pub fn new(address: Address, beneficiary: AccountId, balance: Balance) -> Self {
        Self {
            address,
            beneficiary,
            balance,
            released: false,
            paid_out: 0,
        }
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn paid_out(&self) -> Balance {
        self.paid_out
    }

    fn release_funds(&mut self) -> Result<Balance, String> {
        if self.released {
            return Err("funds already released".to_string());
        }
        let amount = self.balance;
        self.balance = 0;
        self.paid_out = self.paid_out.saturating_add(amount);
        self.released = true;
        info!("💰 Treasury {} released {} to {}", self.address, amount, self.beneficiary);
        Ok(amount)
    }
}

impl CallExecutor for Treasury {
    fn execute_call(&mut self, call: &Call) -> Result<Vec<u8>, String> {
        if call.target != self.address {
            return Err(format!("no contract at {}", call.target));
        }
        if call.value != 0 {
            return Err("releaseFunds is not payable".to_string());
        }
        match call.selector() {
            Some((sel, args)) if sel == release_funds_selector() && args.is_empty() => {
                let amount = self.release_funds()?;
                Ok(amount.to_le_bytes().to_vec())
            }
            Some((sel, _)) => Err(format!("unknown selector 0x{}", hex::encode(sel))),
            None => Err("payload too short".to_string()),
        }
    }
}
