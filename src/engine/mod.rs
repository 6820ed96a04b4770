pub mod boss;
pub mod ledger;
pub mod word;
