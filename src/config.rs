// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use rust_decimal::Decimal;

use crate::{
    db::{
        ApprovalRepository, InventoryRepository, RecipeRepository, TenancyRepository,
        UserRepository, WasteRepository,
    },
    services::{
        approval_service::ApprovalService, auth::AuthService, inventory_service::InventoryService,
        tenancy_service::TenancyService, waste_service::WasteService,
    },
};

// Teto padrão (em dinheiro) para auto-aplicação de ajustes por gerentes de
// filial, quando APPROVAL_COST_THRESHOLD não é definido.
const DEFAULT_COST_THRESHOLD: &str = "50";

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub tenancy_repo: TenancyRepository,
    pub auth_service: AuthService,
    pub tenancy_service: TenancyService,
    pub inventory_service: InventoryService,
    pub approval_service: ApprovalService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let cost_threshold: Decimal = env::var("APPROVAL_COST_THRESHOLD")
            .unwrap_or_else(|_| DEFAULT_COST_THRESHOLD.to_owned())
            .parse()
            .map_err(|e| anyhow::anyhow!("APPROVAL_COST_THRESHOLD inválido: {}", e))?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new();
        let tenancy_repo = TenancyRepository::new();
        let inventory_repo = InventoryRepository::new();
        let recipe_repo = RecipeRepository::new();
        let waste_repo = WasteRepository::new();
        let approval_repo = ApprovalRepository::new();

        let auth_service = AuthService::new(user_repo, jwt_secret.clone(), db_pool.clone());
        let tenancy_service = TenancyService::new(tenancy_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(
            inventory_repo.clone(),
            tenancy_repo.clone(),
            db_pool.clone(),
        );
        let waste_service = WasteService::new(
            inventory_repo,
            recipe_repo,
            waste_repo.clone(),
            inventory_service.clone(),
        );
        let approval_service = ApprovalService::new(
            approval_repo,
            waste_repo,
            inventory_service.clone(),
            waste_service,
            db_pool.clone(),
            cost_threshold,
        );

        Ok(Self {
            db_pool,
            jwt_secret,
            tenancy_repo,
            auth_service,
            tenancy_service,
            inventory_service,
            approval_service,
        })
    }
}
