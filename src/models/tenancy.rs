// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Tenant (O "Estabelecimento")
// ---
// A conta principal da operação (a rede de restaurantes)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Branch (A "Filial")
// ---
// A unidade física (restaurante, cozinha central, depósito)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Papel do membro dentro do tenant
// ---
// TENANT_ADMIN enxerga (e aprova) tudo; BRANCH_MANAGER é limitado à filial
// e ao teto de custo do portão de aprovação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "member_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    TenantAdmin,
    BranchManager,
}

// ---
// 4. TenantMember (A "Ponte" Usuário-Tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantMember {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: MemberRole,
    pub branch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
