pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenancyRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod recipe_repo;
pub use recipe_repo::RecipeRepository;
pub mod waste_repo;
pub use waste_repo::WasteRepository;
pub mod approval_repo;
pub use approval_repo::ApprovalRepository;
