//! Catálogo de palavras-chave. A unicidade é garantida sem distinguir
//! maiúsculas por um índice sobre `LOWER(termo)`; o catálogo também cresce
//! implicitamente quando os docentes etiquetam propostas.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::PalavraChave;
use crate::schema::{palavra_chave, proposta_palavra_chave};
use crate::state::AppState;
use crate::utils::resposta::ApiResponse;

diesel::sql_function! {
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

#[derive(Serialize)]
pub struct PalavraChaveCatalogo {
    pub id: i32,
    pub termo: String,
    pub total_propostas: i64,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct TermoRequest {
    pub termo: String,
}

fn validar_termo(termo: &str) -> AppResult<String> {
    let limpo = termo.trim();
    if limpo.chars().count() < 2 {
        return Err(AppError::bad_request(
            "A palavra-chave deve ter pelo menos 2 caracteres",
        ));
    }
    Ok(limpo.to_string())
}

fn existe_termo(
    conn: &mut PgConnection,
    termo: &str,
    excluir_id: Option<i32>,
) -> AppResult<bool> {
    let mut query = palavra_chave::table
        .select(palavra_chave::id)
        .filter(lower(palavra_chave::termo).eq(termo.to_lowercase()))
        .into_boxed();
    if let Some(id) = excluir_id {
        query = query.filter(palavra_chave::id.ne(id));
    }
    Ok(query.first::<i32>(conn).optional()?.is_some())
}

pub async fn listar(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<PalavraChaveCatalogo>>>> {
    let mut conn = state.db()?;

    let termos: Vec<PalavraChave> = palavra_chave::table
        .order(palavra_chave::termo.asc())
        .load(&mut conn)?;

    let usos: Vec<(i32, i64)> = proposta_palavra_chave::table
        .group_by(proposta_palavra_chave::palavra_chave_id)
        .select((proposta_palavra_chave::palavra_chave_id, count_star()))
        .load(&mut conn)?;
    let usos: HashMap<i32, i64> = usos.into_iter().collect();

    Ok(ApiResponse::dados(
        termos
            .into_iter()
            .map(|registo| PalavraChaveCatalogo {
                total_propostas: *usos.get(&registo.id).unwrap_or(&0),
                id: registo.id,
                termo: registo.termo,
                data_criacao: registo.data_criacao,
            })
            .collect(),
    ))
}

pub async fn obter(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<PalavraChaveCatalogo>>> {
    let mut conn = state.db()?;

    let registo: PalavraChave = palavra_chave::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Palavra-chave não encontrada"))?;

    let total_propostas: i64 = proposta_palavra_chave::table
        .filter(proposta_palavra_chave::palavra_chave_id.eq(id))
        .select(count_star())
        .first(&mut conn)?;

    Ok(ApiResponse::dados(PalavraChaveCatalogo {
        id: registo.id,
        termo: registo.termo,
        total_propostas,
        data_criacao: registo.data_criacao,
    }))
}

pub async fn criar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<TermoRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PalavraChaveCatalogo>>)> {
    if user.is_aluno() {
        return Err(AppError::forbidden("Acesso restrito a docentes"));
    }

    let termo = validar_termo(&payload.termo)?;
    let mut conn = state.db()?;

    if existe_termo(&mut conn, &termo, None)? {
        return Err(AppError::conflict("Palavra-chave já existe"));
    }

    let criada: PalavraChave = diesel::insert_into(palavra_chave::table)
        .values(crate::models::NovaPalavraChave { termo })
        .get_result(&mut conn)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::dados(PalavraChaveCatalogo {
            id: criada.id,
            termo: criada.termo,
            total_propostas: 0,
            data_criacao: criada.data_criacao,
        }),
    ))
}

pub async fn atualizar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<TermoRequest>,
) -> AppResult<Json<ApiResponse<PalavraChaveCatalogo>>> {
    if user.is_aluno() {
        return Err(AppError::forbidden("Acesso restrito a docentes"));
    }

    let termo = validar_termo(&payload.termo)?;
    let mut conn = state.db()?;

    let existente: PalavraChave = palavra_chave::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Palavra-chave não encontrada"))?;

    if existe_termo(&mut conn, &termo, Some(id))? {
        return Err(AppError::conflict("Palavra-chave já existe"));
    }

    let atualizada: PalavraChave = if termo == existente.termo {
        existente
    } else {
        diesel::update(palavra_chave::table.find(id))
            .set(palavra_chave::termo.eq(&termo))
            .get_result(&mut conn)?
    };

    let total_propostas: i64 = proposta_palavra_chave::table
        .filter(proposta_palavra_chave::palavra_chave_id.eq(id))
        .select(count_star())
        .first(&mut conn)?;

    Ok(ApiResponse::dados(PalavraChaveCatalogo {
        id: atualizada.id,
        termo: atualizada.termo,
        total_propostas,
        data_criacao: atualizada.data_criacao,
    }))
}

/// Remover um termo do catálogo remove também as associações às propostas.
pub async fn eliminar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;
    let mut conn = state.db()?;

    let removidos = diesel::delete(palavra_chave::table.find(id)).execute(&mut conn)?;
    if removidos == 0 {
        return Err(AppError::not_found("Palavra-chave não encontrada"));
    }

    Ok(StatusCode::NO_CONTENT)
}
