pub mod approvals;
pub mod auth;
pub mod inventory;
pub mod recipes;
pub mod tenancy;
pub mod waste;
