// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Todos os erros de domínio são condições LOCAIS e recuperáveis: o handler
// devolve uma rejeição ao cliente e o livro-razão permanece exatamente como
// estava antes da chamada (a transação sofre rollback junto com o erro).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Erros de domínio do livro-razão ---
    #[error("Item não encontrado")]
    ItemNotFound,

    #[error("Receita não encontrada")]
    RecipeNotFound,

    #[error("Lote não encontrado")]
    BatchNotFound,

    #[error("Filial não encontrada")]
    BranchNotFound,

    #[error("Pedido de aprovação não encontrado")]
    ApprovalNotFound,

    #[error("Quantidade inválida")]
    InvalidAmount,

    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },

    // Um ingrediente da cascata de desperdício não pôde ser atendido.
    // Carrega o item que falhou; NENHUMA baixa da cascata é mantida.
    #[error("Cascata de desperdício falhou no item {item_id}")]
    CascadeFailure { item_id: Uuid },

    #[error("Pedido de aprovação já foi resolvido")]
    AlreadyResolved,

    // A transação não pôde ser serializada; o chamador deve tentar de novo.
    #[error("Conflito de concorrência, tente novamente")]
    ConcurrencyConflict,

    // --- Autenticação / autorização (camada fina) ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    // --- Infraestrutura ---
    #[error("Erro de banco de dados")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Conversão manual (em vez de #[from]) para reconhecer falhas de
// serialização do Postgres: 40001 (serialization_failure) e 40P01
// (deadlock_detected) são retryable e viram ConcurrencyConflict.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if code == "40001" || code == "40P01" {
                    return AppError::ConcurrencyConflict;
                }
            }
        }
        AppError::DatabaseError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::ItemNotFound => (StatusCode::NOT_FOUND, "Item não encontrado.".to_string()),
            AppError::RecipeNotFound => {
                (StatusCode::NOT_FOUND, "Receita não encontrada.".to_string())
            }
            AppError::BatchNotFound => (StatusCode::NOT_FOUND, "Lote não encontrado.".to_string()),
            AppError::BranchNotFound => {
                (StatusCode::NOT_FOUND, "Filial não encontrada.".to_string())
            }
            AppError::ApprovalNotFound => (
                StatusCode::NOT_FOUND,
                "Pedido de aprovação não encontrado.".to_string(),
            ),
            AppError::InvalidAmount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "A quantidade informada é inválida.".to_string(),
            ),
            AppError::InsufficientStock {
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!(
                    "Estoque insuficiente: disponível {}, solicitado {}.",
                    available, requested
                ),
            ),
            AppError::CascadeFailure { item_id } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!(
                    "Estoque insuficiente para o ingrediente {} da receita; nenhuma baixa foi aplicada.",
                    item_id
                ),
            ),
            AppError::AlreadyResolved => (
                StatusCode::CONFLICT,
                "Este pedido de aprovação já foi resolvido.".to_string(),
            ),
            AppError::ConcurrencyConflict => (
                StatusCode::CONFLICT,
                "Conflito de concorrência; tente novamente.".to_string(),
            ),
            AppError::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "Este e-mail já está em uso.".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "E-mail ou senha inválidos.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.".to_string(),
            ),

            // Todos os outros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
