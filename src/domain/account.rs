//! Virtual cash account.

/// Cash balance for one simulation run.
///
/// `deposit` and `withdraw` do not check for overdraft; the simulation
/// engine sizes positions by floor-dividing the balance by the entry
/// price, so a withdrawal never exceeds the balance.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    balance: f64,
    initial_balance: f64,
}

impl Account {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            initial_balance,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn deposit(&mut self, amount: f64) {
        self.balance += amount;
    }

    pub fn withdraw(&mut self, amount: f64) {
        self.balance -= amount;
    }
}
