use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{AuthenticatedUser, TIPO_ADMINISTRADOR};
use crate::error::{AppError, AppResult};
use crate::estados::{CandidaturaEstado, PropostaEstado};
use crate::models::{Candidatura, NovaCandidatura, NovoPropostaAluno, Proposta, Utilizador};
use crate::permissions;
use crate::routes::propostas::carregar_proposta;
use crate::schema::{anexo_candidatura, candidatura, proposta, proposta_aluno, utilizador};
use crate::state::AppState;
use crate::utils::resposta::ApiResponse;

#[derive(Serialize)]
pub struct CandidaturaDto {
    pub id: i32,
    pub aluno_id: i32,
    pub proposta_id: i32,
    pub estado: String,
    pub observacoes: Option<String>,
    pub feedback_docente: Option<String>,
    pub data_submissao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

impl From<Candidatura> for CandidaturaDto {
    fn from(value: Candidatura) -> Self {
        Self {
            id: value.id,
            aluno_id: value.aluno_id,
            proposta_id: value.proposta_id,
            estado: value.estado,
            observacoes: value.observacoes,
            feedback_docente: value.feedback_docente,
            data_submissao: value.data_submissao,
            data_atualizacao: value.data_atualizacao,
        }
    }
}

#[derive(Serialize)]
pub struct CandidaturaResumo {
    #[serde(flatten)]
    pub candidatura: CandidaturaDto,
    pub proposta_titulo: String,
    pub proposta_estado: String,
}

#[derive(Serialize)]
pub struct CandidaturaComAluno {
    #[serde(flatten)]
    pub candidatura: CandidaturaDto,
    pub aluno_nome: String,
    pub aluno_email: String,
}

#[derive(Deserialize)]
pub struct SubmeterCandidaturaRequest {
    pub proposta_id: i32,
    pub observacoes: Option<String>,
}

#[derive(Deserialize)]
pub struct DecidirCandidaturaRequest {
    pub estado: String,
    pub feedback_docente: Option<String>,
}

pub(crate) fn carregar_candidatura(conn: &mut PgConnection, id: i32) -> AppResult<Candidatura> {
    candidatura::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Candidatura não encontrada"))
}

/// Submeter exige proposta publicada; a restrição de unicidade por par
/// (aluno, proposta) é verificada antes do insert para devolver uma mensagem
/// específica.
pub async fn submeter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SubmeterCandidaturaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CandidaturaDto>>)> {
    user.ensure_aluno()?;
    let mut conn = state.db()?;

    let alvo = carregar_proposta(&mut conn, payload.proposta_id)?;
    if alvo.estado != PropostaEstado::Publicada.as_str() {
        return Err(AppError::bad_request(
            "Só é possível submeter candidaturas a propostas publicadas",
        ));
    }

    let repetida: Option<i32> = candidatura::table
        .filter(candidatura::aluno_id.eq(user.id))
        .filter(candidatura::proposta_id.eq(payload.proposta_id))
        .select(candidatura::id)
        .first(&mut conn)
        .optional()?;
    if repetida.is_some() {
        return Err(AppError::conflict(
            "Já submeteu uma candidatura a esta proposta",
        ));
    }

    let nova = NovaCandidatura {
        aluno_id: user.id,
        proposta_id: payload.proposta_id,
        observacoes: payload
            .observacoes
            .map(|texto| texto.trim().to_string())
            .filter(|texto| !texto.is_empty()),
    };
    let criada: Candidatura = diesel::insert_into(candidatura::table)
        .values(&nova)
        .get_result(&mut conn)?;
    info!(
        candidatura_id = criada.id,
        proposta_id = criada.proposta_id,
        aluno_id = user.id,
        "candidatura submetida"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem("Candidatura submetida", criada.into()),
    ))
}

pub async fn minhas(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<CandidaturaResumo>>>> {
    user.ensure_aluno()?;
    let mut conn = state.db()?;

    let linhas: Vec<(Candidatura, Proposta)> = candidatura::table
        .inner_join(proposta::table)
        .filter(candidatura::aluno_id.eq(user.id))
        .order(candidatura::data_submissao.desc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        linhas
            .into_iter()
            .map(|(registo, alvo)| CandidaturaResumo {
                candidatura: registo.into(),
                proposta_titulo: alvo.titulo,
                proposta_estado: alvo.estado,
            })
            .collect(),
    ))
}

/// As candidaturas de uma proposta só são visíveis ao orientador (e ao
/// administrador); a existência da proposta é resolvida primeiro.
pub async fn por_proposta(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<CandidaturaComAluno>>>> {
    let mut conn = state.db()?;
    let alvo = carregar_proposta(&mut conn, id)?;

    if user.tipo != TIPO_ADMINISTRADOR
        && !permissions::can_decide_candidatura(alvo.orientador_id, user.id)
    {
        return Err(AppError::forbidden(
            "Apenas o orientador pode consultar as candidaturas",
        ));
    }

    let linhas: Vec<(Candidatura, Utilizador)> = candidatura::table
        .inner_join(utilizador::table)
        .filter(candidatura::proposta_id.eq(id))
        .order(candidatura::data_submissao.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        linhas
            .into_iter()
            .map(|(registo, aluno)| CandidaturaComAluno {
                candidatura: registo.into(),
                aluno_nome: aluno.nome,
                aluno_email: aluno.email,
            })
            .collect(),
    ))
}

pub async fn obter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<CandidaturaDto>>> {
    let mut conn = state.db()?;
    let registo = carregar_candidatura(&mut conn, id)?;
    let alvo = carregar_proposta(&mut conn, registo.proposta_id)?;

    if !permissions::can_view_candidatura(registo.aluno_id, alvo.orientador_id, user.id, &user.tipo)
    {
        return Err(AppError::forbidden(
            "Sem permissão para consultar esta candidatura",
        ));
    }

    Ok(ApiResponse::dados(registo.into()))
}

/// Decisão do orientador. Aceitar associa o aluno à proposta na mesma
/// transação; a associação é ignorada se já existir, pelo que repetir a
/// decisão não duplica nada.
pub async fn decidir(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<DecidirCandidaturaRequest>,
) -> AppResult<Json<ApiResponse<CandidaturaDto>>> {
    let mut conn = state.db()?;
    let registo = carregar_candidatura(&mut conn, id)?;
    let alvo = carregar_proposta(&mut conn, registo.proposta_id)?;

    if !permissions::can_decide_candidatura(alvo.orientador_id, user.id) {
        return Err(AppError::forbidden(
            "Apenas o orientador pode decidir esta candidatura",
        ));
    }

    let novo_estado = CandidaturaEstado::parse(&payload.estado).ok_or_else(|| {
        AppError::bad_request(format!(
            "Estado inválido. Valores: {}",
            CandidaturaEstado::valores()
        ))
    })?;
    let estado_atual = CandidaturaEstado::parse(&registo.estado)
        .ok_or_else(|| AppError::internal(format!("estado desconhecido: {}", registo.estado)))?;
    if !estado_atual.transicao_permitida(novo_estado) {
        return Err(AppError::bad_request(format!(
            "Transição de {estado_atual} para {novo_estado} não é permitida"
        )));
    }

    let feedback = payload
        .feedback_docente
        .map(|texto| texto.trim().to_string())
        .filter(|texto| !texto.is_empty());

    let atualizada = conn.transaction::<Candidatura, AppError, _>(|conn| {
        let atualizada: Candidatura = diesel::update(candidatura::table.find(id))
            .set((
                candidatura::estado.eq(novo_estado.as_str()),
                candidatura::feedback_docente.eq(feedback.as_deref()),
                candidatura::data_atualizacao.eq(Utc::now()),
            ))
            .get_result(conn)?;

        if novo_estado == CandidaturaEstado::Aceite {
            diesel::insert_into(proposta_aluno::table)
                .values(&NovoPropostaAluno {
                    proposta_id: atualizada.proposta_id,
                    aluno_id: atualizada.aluno_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        Ok(atualizada)
    })?;
    info!(
        candidatura_id = id,
        estado = %novo_estado,
        "candidatura decidida"
    );

    Ok(ApiResponse::com_mensagem(
        "Candidatura atualizada",
        atualizada.into(),
    ))
}

/// O aluno pode retirar a candidatura enquanto estiver pendente. Os ficheiros
/// anexados são removidos depois de o registo sair da base de dados.
pub async fn retirar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let registo = carregar_candidatura(&mut conn, id)?;

    if registo.aluno_id != user.id {
        return Err(AppError::forbidden(
            "Só o autor pode retirar a candidatura",
        ));
    }
    if registo.estado != CandidaturaEstado::Pendente.as_str() {
        return Err(AppError::bad_request(
            "Só candidaturas pendentes podem ser retiradas",
        ));
    }

    let caminhos: Vec<String> = anexo_candidatura::table
        .filter(anexo_candidatura::candidatura_id.eq(id))
        .select(anexo_candidatura::caminho)
        .load(&mut conn)?;

    diesel::delete(candidatura::table.find(id)).execute(&mut conn)?;

    for caminho in caminhos {
        if let Err(err) = state.storage.delete_file(&caminho).await {
            warn!(caminho, error = %err, "falha a remover ficheiro de anexo");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
