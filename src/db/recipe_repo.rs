// src/db/recipe_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::recipes::{Recipe, RecipeIngredient},
};

// Receitas são entrada somente-leitura para o núcleo: o resolvedor de
// cascata consulta rendimento e ingredientes, nada mais. O CRUD de receitas
// pertence a outro serviço.
#[derive(Clone)]
pub struct RecipeRepository;

impl RecipeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_recipe<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Recipe>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recipe =
            sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1 AND tenant_id = $2")
                .bind(recipe_id)
                .bind(tenant_id)
                .fetch_optional(executor)
                .await?;
        Ok(recipe)
    }

    pub async fn list_ingredients<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            r#"
            SELECT * FROM recipe_ingredients
            WHERE recipe_id = $1 AND tenant_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(recipe_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(ingredients)
    }
}
