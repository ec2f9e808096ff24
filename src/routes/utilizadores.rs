//! Listagens públicas (dentro da sessão) de docentes e alunos, usadas pelos
//! seletores de coorientadores e de alunos associados.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::auth::{AuthenticatedUser, TIPO_ALUNO, TIPO_DOCENTE};
use crate::error::{AppError, AppResult};
use crate::models::{UnidadeCurricular, Utilizador};
use crate::schema::{unidade_curricular, utilizador};
use crate::state::AppState;
use crate::utils::resposta::ApiResponse;

#[derive(Serialize)]
pub struct UtilizadorDto {
    pub id: i32,
    pub nome: String,
    pub email: String,
    pub tipo: String,
    pub aprovado: bool,
    pub gabinete: Option<String>,
    pub departamento: Option<String>,
    pub numero_aluno: Option<String>,
    pub curso: Option<String>,
    pub data_criacao: DateTime<Utc>,
}

impl From<Utilizador> for UtilizadorDto {
    fn from(value: Utilizador) -> Self {
        Self {
            id: value.id,
            nome: value.nome,
            email: value.email,
            tipo: value.tipo,
            aprovado: value.aprovado,
            gabinete: value.gabinete,
            departamento: value.departamento,
            numero_aluno: value.numero_aluno,
            curso: value.curso,
            data_criacao: value.data_criacao,
        }
    }
}

#[derive(Serialize)]
pub struct DocenteDetalhe {
    #[serde(flatten)]
    pub utilizador: UtilizadorDto,
    pub unidades_curriculares: Vec<UcResumo>,
}

#[derive(Serialize)]
pub struct UcResumo {
    pub id: i32,
    pub nome: String,
    pub codigo: String,
    pub ano_letivo: Option<String>,
}

pub async fn listar_docentes(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<UtilizadorDto>>>> {
    let mut conn = state.db()?;

    let docentes: Vec<Utilizador> = utilizador::table
        .filter(utilizador::tipo.eq(TIPO_DOCENTE))
        .filter(utilizador::aprovado.eq(true))
        .order(utilizador::nome.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        docentes.into_iter().map(UtilizadorDto::from).collect(),
    ))
}

pub async fn obter_docente(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<DocenteDetalhe>>> {
    let mut conn = state.db()?;

    let docente: Utilizador = utilizador::table
        .find(id)
        .filter(utilizador::tipo.eq(TIPO_DOCENTE))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Docente não encontrado"))?;

    let ucs: Vec<UnidadeCurricular> = unidade_curricular::table
        .filter(unidade_curricular::docente_id.eq(docente.id))
        .order(unidade_curricular::nome.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(DocenteDetalhe {
        utilizador: docente.into(),
        unidades_curriculares: ucs
            .into_iter()
            .map(|uc| UcResumo {
                id: uc.id,
                nome: uc.nome,
                codigo: uc.codigo,
                ano_letivo: uc.ano_letivo,
            })
            .collect(),
    }))
}

/// Os alunos não podem enumerar os colegas; a listagem serve os docentes ao
/// associarem alunos a propostas.
pub async fn listar_alunos(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<UtilizadorDto>>>> {
    if user.is_aluno() {
        return Err(AppError::forbidden("Acesso restrito a docentes"));
    }

    let mut conn = state.db()?;
    let alunos: Vec<Utilizador> = utilizador::table
        .filter(utilizador::tipo.eq(TIPO_ALUNO))
        .filter(utilizador::aprovado.eq(true))
        .order(utilizador::nome.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        alunos.into_iter().map(UtilizadorDto::from).collect(),
    ))
}
