pub mod composition;
pub mod extraction;
pub mod function;
pub mod parameter;
pub mod scenario;
pub mod serialization;
pub mod validation;
