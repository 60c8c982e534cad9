//! Built-in accounting record types.

use crate::error::Result;
use crate::http::HttpMethod;
use crate::schema::{ApiStem, LogicalType, PropertyDescriptor, RecordType, Registry};

pub const BANK_TRANSFER: &str = "BankTransfer";
pub const BANK_ACCOUNT: &str = "BankTransfer.BankAccount";

/// A transfer of money between two bank accounts.
pub fn bank_transfer() -> RecordType {
    RecordType::new(BANK_TRANSFER, "BankTransfers")
        .root_element("BankTransfer")
        .identity_field("BankTransferID")
        .api_stem(ApiStem::Core)
        .pageable(false)
        .methods(&[HttpMethod::Get, HttpMethod::Put])
        .property(PropertyDescriptor::object("FromBankAccount", BANK_ACCOUNT).required())
        .property(PropertyDescriptor::object("ToBankAccount", BANK_ACCOUNT).required())
        .property(PropertyDescriptor::new("Amount", LogicalType::String).required())
        .property(PropertyDescriptor::new("Date", LogicalType::Date))
        .property(PropertyDescriptor::new("BankTransferID", LogicalType::String))
        .property(PropertyDescriptor::new("CurrencyRate", LogicalType::Float))
        .property(PropertyDescriptor::new("FromBankTransactionID", LogicalType::String))
        .property(PropertyDescriptor::new("ToBankTransactionID", LogicalType::String))
        .property(PropertyDescriptor::new("HasAttachments", LogicalType::Boolean))
}

/// Source or destination account of a transfer.
pub fn bank_account() -> RecordType {
    RecordType::new(BANK_ACCOUNT, "Accounts")
        .root_element("BankAccount")
        .identity_field("AccountID")
        .property(PropertyDescriptor::new("AccountID", LogicalType::String))
        .property(PropertyDescriptor::new("Code", LogicalType::String))
        .property(PropertyDescriptor::new("Name", LogicalType::String))
}

/// Registry holding every built-in type.
pub fn registry() -> Result<Registry> {
    Registry::builder()
        .register(bank_transfer())
        .register(bank_account())
        .build()
}
