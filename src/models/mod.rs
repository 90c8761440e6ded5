pub mod checkout_attempt;
pub mod receipt;
