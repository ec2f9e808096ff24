use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, TIPO_ADMINISTRADOR};
use crate::error::{AppError, AppResult};
use crate::models::{NovaUnidadeCurricular, Proposta, UnidadeCurricular, Utilizador};
use crate::routes::propostas::{montar_resumos, PropostaResumo};
use crate::schema::{proposta, unidade_curricular, utilizador};
use crate::state::AppState;
use crate::utils::json::double_option;
use crate::utils::resposta::ApiResponse;
use crate::estados::PropostaEstado;

#[derive(Serialize)]
pub struct UcDto {
    pub id: i32,
    pub nome: String,
    pub codigo: String,
    pub descricao: Option<String>,
    pub ano_letivo: Option<String>,
    pub docente_id: i32,
    pub docente_nome: String,
    pub data_criacao: DateTime<Utc>,
}

fn montar_uc(uc: UnidadeCurricular, docente_nome: String) -> UcDto {
    UcDto {
        id: uc.id,
        nome: uc.nome,
        codigo: uc.codigo,
        descricao: uc.descricao,
        ano_letivo: uc.ano_letivo,
        docente_id: uc.docente_id,
        docente_nome,
        data_criacao: uc.data_criacao,
    }
}

#[derive(Deserialize)]
pub struct CriarUcRequest {
    pub nome: String,
    pub codigo: String,
    pub descricao: Option<String>,
    pub ano_letivo: Option<String>,
}

fn carregar_uc(conn: &mut PgConnection, id: i32) -> AppResult<UnidadeCurricular> {
    unidade_curricular::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Unidade curricular não encontrada"))
}

fn autorizar_gestao(uc: &UnidadeCurricular, user: &AuthenticatedUser) -> AppResult<()> {
    if uc.docente_id == user.id || user.tipo == TIPO_ADMINISTRADOR {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Apenas o docente responsável pode gerir esta unidade curricular",
        ))
    }
}

pub async fn criar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CriarUcRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UcDto>>)> {
    user.ensure_docente()?;

    let nome = payload.nome.trim().to_string();
    let codigo = payload.codigo.trim().to_string();
    if nome.is_empty() {
        return Err(AppError::bad_request("O nome é obrigatório"));
    }
    if codigo.is_empty() {
        return Err(AppError::bad_request("O código é obrigatório"));
    }

    let mut conn = state.db()?;

    let duplicada: Option<i32> = unidade_curricular::table
        .filter(unidade_curricular::codigo.eq(&codigo))
        .select(unidade_curricular::id)
        .first(&mut conn)
        .optional()?;
    if duplicada.is_some() {
        return Err(AppError::conflict(
            "Já existe uma unidade curricular com este código",
        ));
    }

    let nova = NovaUnidadeCurricular {
        nome,
        codigo,
        descricao: payload.descricao,
        ano_letivo: payload.ano_letivo,
        docente_id: user.id,
    };
    let criada: UnidadeCurricular = diesel::insert_into(unidade_curricular::table)
        .values(&nova)
        .get_result(&mut conn)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem("Unidade curricular criada", montar_uc(criada, user.nome)),
    ))
}

pub async fn listar(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<UcDto>>>> {
    let mut conn = state.db()?;

    let linhas: Vec<(UnidadeCurricular, Utilizador)> = unidade_curricular::table
        .inner_join(utilizador::table)
        .order(unidade_curricular::nome.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        linhas
            .into_iter()
            .map(|(uc, docente)| montar_uc(uc, docente.nome))
            .collect(),
    ))
}

pub async fn minhas(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<UcDto>>>> {
    user.ensure_docente()?;
    let mut conn = state.db()?;

    let linhas: Vec<UnidadeCurricular> = unidade_curricular::table
        .filter(unidade_curricular::docente_id.eq(user.id))
        .order(unidade_curricular::nome.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        linhas
            .into_iter()
            .map(|uc| montar_uc(uc, user.nome.clone()))
            .collect(),
    ))
}

pub async fn obter(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<UcDto>>> {
    let mut conn = state.db()?;
    let uc = carregar_uc(&mut conn, id)?;
    let docente: Utilizador = utilizador::table.find(uc.docente_id).first(&mut conn)?;
    Ok(ApiResponse::dados(montar_uc(uc, docente.nome)))
}

#[derive(Deserialize, Default)]
pub struct AtualizarUcRequest {
    pub nome: Option<String>,
    pub codigo: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ano_letivo: Option<Option<String>>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = unidade_curricular)]
struct UcChangeset {
    nome: Option<String>,
    codigo: Option<String>,
    descricao: Option<Option<String>>,
    ano_letivo: Option<Option<String>>,
}

pub async fn atualizar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AtualizarUcRequest>,
) -> AppResult<Json<ApiResponse<UcDto>>> {
    let mut conn = state.db()?;
    let uc = carregar_uc(&mut conn, id)?;
    autorizar_gestao(&uc, &user)?;

    let mut changeset = UcChangeset::default();
    if let Some(nome) = payload.nome {
        let nome = nome.trim().to_string();
        if nome.is_empty() {
            return Err(AppError::bad_request("O nome é obrigatório"));
        }
        changeset.nome = Some(nome);
    }
    if let Some(codigo) = payload.codigo {
        let codigo = codigo.trim().to_string();
        if codigo.is_empty() {
            return Err(AppError::bad_request("O código é obrigatório"));
        }
        if codigo != uc.codigo {
            let duplicada: Option<i32> = unidade_curricular::table
                .filter(unidade_curricular::codigo.eq(&codigo))
                .filter(unidade_curricular::id.ne(id))
                .select(unidade_curricular::id)
                .first(&mut conn)
                .optional()?;
            if duplicada.is_some() {
                return Err(AppError::conflict(
                    "Já existe uma unidade curricular com este código",
                ));
            }
        }
        changeset.codigo = Some(codigo);
    }
    changeset.descricao = payload.descricao;
    changeset.ano_letivo = payload.ano_letivo;

    let nada_para_alterar = changeset.nome.is_none()
        && changeset.codigo.is_none()
        && changeset.descricao.is_none()
        && changeset.ano_letivo.is_none();
    let atualizada = if nada_para_alterar {
        uc
    } else {
        diesel::update(unidade_curricular::table.find(id))
            .set(&changeset)
            .get_result(&mut conn)?
    };

    let docente: Utilizador = utilizador::table
        .find(atualizada.docente_id)
        .first(&mut conn)?;
    Ok(ApiResponse::com_mensagem(
        "Unidade curricular atualizada",
        montar_uc(atualizada, docente.nome),
    ))
}

/// As propostas ligadas à UC ficam sem UC (a referência passa a nula) em vez
/// de serem eliminadas.
pub async fn eliminar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let uc = carregar_uc(&mut conn, id)?;
    autorizar_gestao(&uc, &user)?;

    diesel::delete(unidade_curricular::table.find(id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn propostas_da_uc(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<PropostaResumo>>>> {
    let mut conn = state.db()?;
    carregar_uc(&mut conn, id)?;

    let mut query = proposta::table
        .inner_join(utilizador::table)
        .filter(proposta::uc_id.eq(id))
        .into_boxed();
    if user.is_aluno() {
        query = query.filter(proposta::estado.eq(PropostaEstado::Publicada.as_str()));
    }

    let linhas: Vec<(Proposta, Utilizador)> = query
        .order(proposta::data_criacao.desc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(montar_resumos(&mut conn, linhas)?))
}
