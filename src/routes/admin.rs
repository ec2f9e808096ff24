//! Gestão de contas pelo administrador: aprovação, rejeição, mudança de tipo
//! e remoção. Todas as operações exigem o tipo administrador.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use tracing::info;

use crate::auth::{password, AuthenticatedUser, TIPO_ADMINISTRADOR, TIPO_ALUNO, TIPO_DOCENTE};
use crate::error::{AppError, AppResult};
use crate::models::{NovoUtilizador, Utilizador};
use crate::routes::utilizadores::UtilizadorDto;
use crate::schema::utilizador;
use crate::state::AppState;
use crate::utils::resposta::ApiResponse;

#[derive(Deserialize, Default)]
pub struct FiltroUtilizadores {
    pub aprovado: Option<bool>,
    pub tipo: Option<String>,
}

#[derive(Deserialize)]
pub struct AlterarTipoRequest {
    pub tipo: String,
}

#[derive(Deserialize)]
pub struct CriarUtilizadorRequest {
    pub nome: String,
    pub email: String,
    pub palavra_passe: String,
    pub tipo: String,
    pub aprovado: Option<bool>,
    pub gabinete: Option<String>,
    pub departamento: Option<String>,
    pub numero_aluno: Option<String>,
    pub curso: Option<String>,
}

fn validar_tipo(tipo: &str) -> AppResult<()> {
    if tipo != TIPO_ADMINISTRADOR && tipo != TIPO_DOCENTE && tipo != TIPO_ALUNO {
        return Err(AppError::bad_request(
            "Tipo inválido. Valores: administrador, docente, aluno",
        ));
    }
    Ok(())
}

fn carregar_utilizador(conn: &mut PgConnection, id: i32) -> AppResult<Utilizador> {
    utilizador::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Utilizador não encontrado"))
}

pub async fn listar_utilizadores(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filtro): Query<FiltroUtilizadores>,
) -> AppResult<Json<ApiResponse<Vec<UtilizadorDto>>>> {
    user.ensure_admin()?;
    let mut conn = state.db()?;

    let mut query = utilizador::table.into_boxed();
    if let Some(aprovado) = filtro.aprovado {
        query = query.filter(utilizador::aprovado.eq(aprovado));
    }
    if let Some(tipo) = filtro.tipo.as_deref() {
        query = query.filter(utilizador::tipo.eq(tipo.to_string()));
    }

    let contas: Vec<Utilizador> = query.order(utilizador::data_criacao.desc()).load(&mut conn)?;
    Ok(ApiResponse::dados(
        contas.into_iter().map(UtilizadorDto::from).collect(),
    ))
}

/// Contas criadas pelo administrador nascem aprovadas, salvo indicação em
/// contrário.
pub async fn criar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CriarUtilizadorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UtilizadorDto>>)> {
    user.ensure_admin()?;

    let nome = payload.nome.trim();
    let email = payload.email.trim().to_lowercase();
    if nome.is_empty() {
        return Err(AppError::bad_request("O nome é obrigatório"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("Email inválido"));
    }
    if payload.palavra_passe.len() < 8 {
        return Err(AppError::bad_request(
            "A palavra-passe deve ter pelo menos 8 caracteres",
        ));
    }
    validar_tipo(&payload.tipo)?;

    let mut conn = state.db()?;
    let duplicado: Option<i32> = utilizador::table
        .filter(utilizador::email.eq(&email))
        .select(utilizador::id)
        .first(&mut conn)
        .optional()?;
    if duplicado.is_some() {
        return Err(AppError::conflict("Email já registado"));
    }

    let novo = NovoUtilizador {
        nome: nome.to_string(),
        email,
        palavra_passe: Some(password::hash_password(&payload.palavra_passe)?),
        tipo: payload.tipo,
        aprovado: payload.aprovado.unwrap_or(true),
        google_id: None,
        gabinete: payload.gabinete,
        departamento: payload.departamento,
        numero_aluno: payload.numero_aluno,
        curso: payload.curso,
    };
    let criado: Utilizador = diesel::insert_into(utilizador::table)
        .values(&novo)
        .get_result(&mut conn)?;
    info!(utilizador_id = criado.id, tipo = %criado.tipo, "conta criada pelo administrador");

    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem("Utilizador criado", criado.into()),
    ))
}

pub async fn obter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UtilizadorDto>>> {
    user.ensure_admin()?;
    let mut conn = state.db()?;
    let conta = carregar_utilizador(&mut conn, id)?;
    Ok(ApiResponse::dados(conta.into()))
}

pub async fn aprovar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UtilizadorDto>>> {
    user.ensure_admin()?;
    let mut conn = state.db()?;
    let conta = carregar_utilizador(&mut conn, id)?;
    if conta.aprovado {
        return Err(AppError::bad_request("Utilizador já está aprovado"));
    }

    let aprovado: Utilizador = diesel::update(utilizador::table.find(id))
        .set(utilizador::aprovado.eq(true))
        .get_result(&mut conn)?;
    info!(utilizador_id = id, "conta aprovada");

    Ok(ApiResponse::com_mensagem(
        "Utilizador aprovado",
        aprovado.into(),
    ))
}

/// Rejeitar devolve a conta ao estado por aprovar; não elimina dados.
pub async fn rejeitar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UtilizadorDto>>> {
    user.ensure_admin()?;
    if id == user.id {
        return Err(AppError::bad_request("Não pode rejeitar a própria conta"));
    }
    let mut conn = state.db()?;
    carregar_utilizador(&mut conn, id)?;

    let rejeitado: Utilizador = diesel::update(utilizador::table.find(id))
        .set(utilizador::aprovado.eq(false))
        .get_result(&mut conn)?;
    info!(utilizador_id = id, "conta rejeitada");

    Ok(ApiResponse::com_mensagem(
        "Utilizador rejeitado",
        rejeitado.into(),
    ))
}

pub async fn alterar_tipo(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AlterarTipoRequest>,
) -> AppResult<Json<ApiResponse<UtilizadorDto>>> {
    user.ensure_admin()?;

    let tipo = payload.tipo.as_str();
    validar_tipo(tipo)?;

    let mut conn = state.db()?;
    carregar_utilizador(&mut conn, id)?;

    let alterado: Utilizador = diesel::update(utilizador::table.find(id))
        .set(utilizador::tipo.eq(tipo))
        .get_result(&mut conn)?;
    info!(utilizador_id = id, tipo, "tipo de conta alterado");

    Ok(ApiResponse::com_mensagem(
        "Tipo de utilizador alterado",
        alterado.into(),
    ))
}

/// Eliminar uma conta arrasta propostas, candidaturas e associações por
/// cascata na base de dados. O administrador não pode eliminar-se a si
/// próprio.
pub async fn eliminar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;
    if id == user.id {
        return Err(AppError::bad_request("Não pode eliminar a própria conta"));
    }

    let mut conn = state.db()?;
    let removidos = diesel::delete(utilizador::table.find(id)).execute(&mut conn)?;
    if removidos == 0 {
        return Err(AppError::not_found("Utilizador não encontrado"));
    }
    info!(utilizador_id = id, "conta eliminada");

    Ok(StatusCode::NO_CONTENT)
}
