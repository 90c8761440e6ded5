pub mod checkout;
pub mod receipts;
