//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a row in one of the ledger tables.
pub type TransactionId = DatabaseId;
/// The ID of a row in the category lookup table.
pub type CategoryId = DatabaseId;
/// The ID of a row in the state lookup table.
pub type StateId = DatabaseId;
/// The ID of a row in the address table.
pub type AddressId = DatabaseId;
