use std::fmt;

use crate::models::driver::Driver;

#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    Locked,
    InsufficientBalance { balance: f64, required: f64 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Locked => write!(f, "wallet is locked"),
            BlockReason::InsufficientBalance { balance, required } => {
                write!(f, "wallet balance {balance:.2} is below the required {required:.2}")
            }
        }
    }
}

/// Precondition gate for accepting new work. Callers must hold the driver's
/// map entry across this check and the assignment commit, so the balance
/// cannot drop between check and use.
pub fn check(driver: &Driver) -> Result<(), BlockReason> {
    if driver.wallet_locked {
        return Err(BlockReason::Locked);
    }

    if driver.wallet_balance < driver.min_required_balance {
        return Err(BlockReason::InsufficientBalance {
            balance: driver.wallet_balance,
            required: driver.min_required_balance,
        });
    }

    Ok(())
}
