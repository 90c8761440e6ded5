pub mod catalog;
pub mod checkout;
pub mod pricing;
pub mod receipt;
pub mod selection;
