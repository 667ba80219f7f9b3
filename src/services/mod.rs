pub mod approval_service;
pub mod auth;
pub mod inventory_service;
pub mod tenancy_service;
pub mod waste_service;
