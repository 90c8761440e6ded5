pub use pushkind_common::services::errors::{ServiceError, ServiceResult};

pub mod checkout;
pub mod main;
pub mod pricing;
pub mod receipts;
