pub mod contract;

pub use contract::{ContractValidator, IMPLEMENTED_RULES};
