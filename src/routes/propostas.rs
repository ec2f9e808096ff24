use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::estados::PropostaEstado;
use crate::models::{
    Anexo, NovaProposta, NovoPropostaAluno, NovoPropostaCoorientador, NovoPropostaPalavraChave,
    PalavraChave, Proposta, UnidadeCurricular, Utilizador,
};
use crate::permissions;
use crate::routes::anexos::AnexoDto;
use crate::schema::{
    anexo, candidatura, palavra_chave, proposta, proposta_aluno, proposta_coorientador,
    proposta_palavra_chave, unidade_curricular, utilizador,
};
use crate::state::AppState;
use crate::utils::json::double_option;
use crate::utils::resposta::{mensagem, ApiResponse};
use crate::auth::{AuthenticatedUser, TIPO_ALUNO, TIPO_DOCENTE};

diesel::sql_function! {
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

const MIN_TITULO: usize = 10;
const MIN_DESCRICAO: usize = 50;

#[derive(Serialize)]
pub struct ResumoUtilizador {
    pub id: i32,
    pub nome: String,
    pub email: String,
}

impl From<Utilizador> for ResumoUtilizador {
    fn from(value: Utilizador) -> Self {
        Self {
            id: value.id,
            nome: value.nome,
            email: value.email,
        }
    }
}

#[derive(Serialize)]
pub struct PalavraChaveDto {
    pub id: i32,
    pub termo: String,
}

impl From<PalavraChave> for PalavraChaveDto {
    fn from(value: PalavraChave) -> Self {
        Self {
            id: value.id,
            termo: value.termo,
        }
    }
}

#[derive(Serialize)]
pub struct ResumoUc {
    pub id: i32,
    pub nome: String,
    pub codigo: String,
}

#[derive(Serialize)]
pub struct PropostaResumo {
    pub id: i32,
    pub titulo: String,
    pub estado: String,
    pub orientador_id: i32,
    pub orientador_nome: String,
    pub uc_id: Option<i32>,
    pub palavras_chave: Vec<String>,
    pub total_candidaturas: i64,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct PropostaDetalhe {
    pub id: i32,
    pub titulo: String,
    pub descricao_objetivos: String,
    pub estado: String,
    pub orientador: ResumoUtilizador,
    pub uc: Option<ResumoUc>,
    pub coorientadores: Vec<ResumoUtilizador>,
    pub alunos: Vec<ResumoUtilizador>,
    pub palavras_chave: Vec<PalavraChaveDto>,
    pub anexos: Vec<AnexoDto>,
    pub total_candidaturas: i64,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CriarPropostaRequest {
    pub titulo: String,
    pub descricao_objetivos: String,
    pub estado: Option<String>,
    pub uc_id: Option<i32>,
    #[serde(default)]
    pub coorientadores: Vec<i32>,
    #[serde(default)]
    pub alunos: Vec<i32>,
    #[serde(default)]
    pub palavras_chave: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct FiltroPropostas {
    pub estado: Option<String>,
    pub orientador_id: Option<i32>,
    pub uc_id: Option<i32>,
    pub palavra_chave: Option<String>,
    pub pesquisa: Option<String>,
    pub limite: Option<i64>,
    pub pagina: Option<i64>,
}

fn validar_titulo(titulo: &str) -> AppResult<String> {
    let limpo = titulo.trim();
    if limpo.chars().count() < MIN_TITULO {
        return Err(AppError::bad_request(
            "O título deve ter pelo menos 10 caracteres",
        ));
    }
    Ok(limpo.to_string())
}

fn validar_descricao(descricao: &str) -> AppResult<String> {
    let limpo = descricao.trim();
    if limpo.chars().count() < MIN_DESCRICAO {
        return Err(AppError::bad_request(
            "A descrição de objetivos deve ter pelo menos 50 caracteres",
        ));
    }
    Ok(limpo.to_string())
}

fn parse_estado(raw: &str) -> AppResult<PropostaEstado> {
    PropostaEstado::parse(raw).ok_or_else(|| {
        AppError::bad_request(format!(
            "Estado inválido. Valores: {}",
            PropostaEstado::valores()
        ))
    })
}

pub(crate) fn carregar_proposta(conn: &mut PgConnection, id: i32) -> AppResult<Proposta> {
    proposta::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Proposta não encontrada"))
}

fn validar_docente(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let tipo: Option<String> = utilizador::table
        .find(id)
        .select(utilizador::tipo)
        .first(conn)
        .optional()?;
    match tipo.as_deref() {
        Some(TIPO_DOCENTE) => Ok(()),
        Some(_) => Err(AppError::bad_request(format!(
            "O utilizador {id} não é um docente"
        ))),
        None => Err(AppError::bad_request(format!(
            "O utilizador {id} não existe"
        ))),
    }
}

fn validar_aluno(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let tipo: Option<String> = utilizador::table
        .find(id)
        .select(utilizador::tipo)
        .first(conn)
        .optional()?;
    match tipo.as_deref() {
        Some(TIPO_ALUNO) => Ok(()),
        Some(_) => Err(AppError::bad_request(format!(
            "O utilizador {id} não é um aluno"
        ))),
        None => Err(AppError::bad_request(format!(
            "O utilizador {id} não existe"
        ))),
    }
}

/// Procura o termo sem distinguir maiúsculas; cria-o se ainda não existir.
/// O índice único sobre `LOWER(termo)` cobre a corrida entre pedido e insert.
pub(crate) fn resolver_palavra_chave(
    conn: &mut PgConnection,
    termo: &str,
) -> AppResult<PalavraChave> {
    let limpo = termo.trim();
    if limpo.chars().count() < 2 {
        return Err(AppError::bad_request(
            "A palavra-chave deve ter pelo menos 2 caracteres",
        ));
    }

    let existente: Option<PalavraChave> = palavra_chave::table
        .filter(lower(palavra_chave::termo).eq(limpo.to_lowercase()))
        .first(conn)
        .optional()?;
    if let Some(registo) = existente {
        return Ok(registo);
    }

    Ok(diesel::insert_into(palavra_chave::table)
        .values(crate::models::NovaPalavraChave {
            termo: limpo.to_string(),
        })
        .get_result(conn)?)
}

fn carregar_detalhe(conn: &mut PgConnection, id: i32) -> AppResult<PropostaDetalhe> {
    let registo = carregar_proposta(conn, id)?;

    let orientador: Utilizador = utilizador::table.find(registo.orientador_id).first(conn)?;

    let uc: Option<UnidadeCurricular> = match registo.uc_id {
        Some(uc_id) => unidade_curricular::table.find(uc_id).first(conn).optional()?,
        None => None,
    };

    let coorientadores: Vec<Utilizador> = proposta_coorientador::table
        .inner_join(utilizador::table)
        .filter(proposta_coorientador::proposta_id.eq(id))
        .select(utilizador::all_columns)
        .order(utilizador::nome.asc())
        .load(conn)?;

    let alunos: Vec<Utilizador> = proposta_aluno::table
        .inner_join(utilizador::table)
        .filter(proposta_aluno::proposta_id.eq(id))
        .select(utilizador::all_columns)
        .order(utilizador::nome.asc())
        .load(conn)?;

    let palavras: Vec<PalavraChave> = proposta_palavra_chave::table
        .inner_join(palavra_chave::table)
        .filter(proposta_palavra_chave::proposta_id.eq(id))
        .select(palavra_chave::all_columns)
        .order(palavra_chave::termo.asc())
        .load(conn)?;

    let anexos: Vec<Anexo> = anexo::table
        .filter(anexo::proposta_id.eq(id))
        .order(anexo::data_upload.asc())
        .load(conn)?;

    let total_candidaturas: i64 = candidatura::table
        .filter(candidatura::proposta_id.eq(id))
        .select(count_star())
        .first(conn)?;

    Ok(PropostaDetalhe {
        id: registo.id,
        titulo: registo.titulo,
        descricao_objetivos: registo.descricao_objetivos,
        estado: registo.estado,
        orientador: orientador.into(),
        uc: uc.map(|uc| ResumoUc {
            id: uc.id,
            nome: uc.nome,
            codigo: uc.codigo,
        }),
        coorientadores: coorientadores.into_iter().map(Into::into).collect(),
        alunos: alunos.into_iter().map(Into::into).collect(),
        palavras_chave: palavras.into_iter().map(Into::into).collect(),
        anexos: anexos.into_iter().map(Into::into).collect(),
        total_candidaturas,
        data_criacao: registo.data_criacao,
    })
}

/// A criação é transacional: ou a proposta entra com todas as associações
/// pedidas, ou nada fica gravado.
pub async fn criar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CriarPropostaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PropostaDetalhe>>)> {
    user.ensure_docente()?;

    let titulo = validar_titulo(&payload.titulo)?;
    let descricao_objetivos = validar_descricao(&payload.descricao_objetivos)?;
    let estado = match payload.estado.as_deref() {
        Some(raw) => parse_estado(raw)?,
        None => PropostaEstado::Rascunho,
    };

    let mut conn = state.db()?;
    let criada = conn.transaction::<Proposta, AppError, _>(|conn| {
        let nova = NovaProposta {
            titulo,
            descricao_objetivos,
            estado: estado.as_str().to_string(),
            orientador_id: user.id,
            uc_id: payload.uc_id,
        };
        let registo: Proposta = diesel::insert_into(proposta::table)
            .values(&nova)
            .get_result(conn)?;

        for docente_id in &payload.coorientadores {
            validar_docente(conn, *docente_id)?;
            diesel::insert_into(proposta_coorientador::table)
                .values(&NovoPropostaCoorientador {
                    proposta_id: registo.id,
                    coorientador_id: *docente_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        for aluno_id in &payload.alunos {
            validar_aluno(conn, *aluno_id)?;
            diesel::insert_into(proposta_aluno::table)
                .values(&NovoPropostaAluno {
                    proposta_id: registo.id,
                    aluno_id: *aluno_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        for termo in &payload.palavras_chave {
            let registo_termo = resolver_palavra_chave(conn, termo)?;
            diesel::insert_into(proposta_palavra_chave::table)
                .values(&NovoPropostaPalavraChave {
                    proposta_id: registo.id,
                    palavra_chave_id: registo_termo.id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        Ok(registo)
    })?;

    info!(proposta_id = criada.id, orientador_id = user.id, "proposta criada");
    let detalhe = carregar_detalhe(&mut conn, criada.id)?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem("Proposta criada", detalhe),
    ))
}

/// Alunos veem apenas propostas publicadas; docentes e administradores podem
/// filtrar por qualquer estado.
pub async fn listar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filtro): Query<FiltroPropostas>,
) -> AppResult<Json<ApiResponse<Vec<PropostaResumo>>>> {
    let mut conn = state.db()?;

    let mut query = proposta::table
        .inner_join(utilizador::table)
        .into_boxed();

    if user.is_aluno() {
        query = query.filter(proposta::estado.eq(PropostaEstado::Publicada.as_str()));
    } else if let Some(raw) = filtro.estado.as_deref() {
        let estado = parse_estado(raw)?;
        query = query.filter(proposta::estado.eq(estado.as_str()));
    }
    if let Some(orientador_id) = filtro.orientador_id {
        query = query.filter(proposta::orientador_id.eq(orientador_id));
    }
    if let Some(uc_id) = filtro.uc_id {
        query = query.filter(proposta::uc_id.eq(uc_id));
    }
    if let Some(termo) = filtro.palavra_chave.as_deref() {
        let alvo = proposta_palavra_chave::table
            .inner_join(palavra_chave::table)
            .filter(lower(palavra_chave::termo).eq(termo.trim().to_lowercase()))
            .select(proposta_palavra_chave::proposta_id);
        query = query.filter(proposta::id.eq_any(alvo));
    }
    if let Some(pesquisa) = filtro.pesquisa.as_deref() {
        let padrao = format!("%{}%", pesquisa.trim());
        query = query.filter(
            proposta::titulo
                .ilike(padrao.clone())
                .or(proposta::descricao_objetivos.ilike(padrao)),
        );
    }

    let limite = filtro.limite.unwrap_or(100).clamp(1, 500);
    let pagina = filtro.pagina.unwrap_or(1).max(1);

    let linhas: Vec<(Proposta, Utilizador)> = query
        .order(proposta::data_criacao.desc())
        .limit(limite)
        .offset((pagina - 1).saturating_mul(limite))
        .load(&mut conn)?;

    Ok(ApiResponse::dados(montar_resumos(&mut conn, linhas)?))
}

pub(crate) fn montar_resumos(
    conn: &mut PgConnection,
    linhas: Vec<(Proposta, Utilizador)>,
) -> AppResult<Vec<PropostaResumo>> {
    let ids: Vec<i32> = linhas.iter().map(|(registo, _)| registo.id).collect();

    let termos: Vec<(i32, String)> = proposta_palavra_chave::table
        .inner_join(palavra_chave::table)
        .filter(proposta_palavra_chave::proposta_id.eq_any(&ids))
        .select((proposta_palavra_chave::proposta_id, palavra_chave::termo))
        .load(conn)?;
    let mut termos_por_proposta: HashMap<i32, Vec<String>> = HashMap::new();
    for (proposta_id, termo) in termos {
        termos_por_proposta.entry(proposta_id).or_default().push(termo);
    }

    let contagens: Vec<(i32, i64)> = candidatura::table
        .filter(candidatura::proposta_id.eq_any(&ids))
        .group_by(candidatura::proposta_id)
        .select((candidatura::proposta_id, count_star()))
        .load(conn)?;
    let contagens: HashMap<i32, i64> = contagens.into_iter().collect();

    Ok(linhas
        .into_iter()
        .map(|(registo, orientador)| PropostaResumo {
            id: registo.id,
            titulo: registo.titulo,
            estado: registo.estado,
            orientador_id: orientador.id,
            orientador_nome: orientador.nome,
            uc_id: registo.uc_id,
            palavras_chave: termos_por_proposta.remove(&registo.id).unwrap_or_default(),
            total_candidaturas: *contagens.get(&registo.id).unwrap_or(&0),
            data_criacao: registo.data_criacao,
        })
        .collect())
}

/// Propostas em que o docente é orientador ou coorientador.
pub async fn minhas(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<PropostaResumo>>>> {
    user.ensure_docente()?;
    let mut conn = state.db()?;

    let como_coorientador = proposta_coorientador::table
        .filter(proposta_coorientador::coorientador_id.eq(user.id))
        .select(proposta_coorientador::proposta_id);

    let linhas: Vec<(Proposta, Utilizador)> = proposta::table
        .inner_join(utilizador::table)
        .filter(
            proposta::orientador_id
                .eq(user.id)
                .or(proposta::id.eq_any(como_coorientador)),
        )
        .order(proposta::data_criacao.desc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(montar_resumos(&mut conn, linhas)?))
}

/// Propostas às quais o aluno foi associado (candidatura aceite ou associação
/// direta pelo docente).
pub async fn atribuidas(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<PropostaResumo>>>> {
    user.ensure_aluno()?;
    let mut conn = state.db()?;

    let associadas = proposta_aluno::table
        .filter(proposta_aluno::aluno_id.eq(user.id))
        .select(proposta_aluno::proposta_id);

    let linhas: Vec<(Proposta, Utilizador)> = proposta::table
        .inner_join(utilizador::table)
        .filter(proposta::id.eq_any(associadas))
        .order(proposta::data_criacao.desc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(montar_resumos(&mut conn, linhas)?))
}

pub async fn obter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<PropostaDetalhe>>> {
    let mut conn = state.db()?;
    let detalhe = carregar_detalhe(&mut conn, id)?;

    // Rascunhos só são visíveis a quem controla a proposta.
    if detalhe.estado == PropostaEstado::Rascunho.as_str()
        && user.tipo != crate::auth::TIPO_ADMINISTRADOR
        && !permissions::can_edit_proposta(&mut conn, id, user.id)?
    {
        return Err(AppError::forbidden(
            "Sem permissão para consultar esta proposta",
        ));
    }

    Ok(ApiResponse::dados(detalhe))
}

#[derive(Deserialize, Default)]
pub struct AtualizarPropostaRequest {
    pub titulo: Option<String>,
    pub descricao_objetivos: Option<String>,
    pub estado: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub uc_id: Option<Option<i32>>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = proposta)]
struct PropostaChangeset {
    titulo: Option<String>,
    descricao_objetivos: Option<String>,
    estado: Option<String>,
    uc_id: Option<Option<i32>>,
}

pub async fn atualizar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AtualizarPropostaRequest>,
) -> AppResult<Json<ApiResponse<PropostaDetalhe>>> {
    let mut conn = state.db()?;
    carregar_proposta(&mut conn, id)?;
    if !permissions::can_edit_proposta(&mut conn, id, user.id)? {
        return Err(AppError::forbidden(
            "Sem permissão para editar esta proposta",
        ));
    }

    let mut changeset = PropostaChangeset::default();
    if let Some(titulo) = payload.titulo.as_deref() {
        changeset.titulo = Some(validar_titulo(titulo)?);
    }
    if let Some(descricao) = payload.descricao_objetivos.as_deref() {
        changeset.descricao_objetivos = Some(validar_descricao(descricao)?);
    }
    if let Some(raw) = payload.estado.as_deref() {
        changeset.estado = Some(parse_estado(raw)?.as_str().to_string());
    }
    changeset.uc_id = payload.uc_id;

    let nada_para_alterar = changeset.titulo.is_none()
        && changeset.descricao_objetivos.is_none()
        && changeset.estado.is_none()
        && changeset.uc_id.is_none();
    if nada_para_alterar {
        return Err(AppError::bad_request("Nenhum campo para atualizar"));
    }

    diesel::update(proposta::table.find(id))
        .set(&changeset)
        .execute(&mut conn)?;

    let detalhe = carregar_detalhe(&mut conn, id)?;
    Ok(ApiResponse::com_mensagem("Proposta atualizada", detalhe))
}

/// Eliminar é exclusivo do orientador; coorientadores só editam. Os ficheiros
/// dos anexos são removidos depois de a transação de base de dados confirmar.
pub async fn eliminar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let registo = carregar_proposta(&mut conn, id)?;
    if !permissions::can_delete_proposta(&registo, user.id) {
        return Err(AppError::forbidden(
            "Apenas o orientador pode eliminar a proposta",
        ));
    }

    let caminhos: Vec<String> = anexo::table
        .filter(anexo::proposta_id.eq(id))
        .select(anexo::caminho)
        .load(&mut conn)?;

    diesel::delete(proposta::table.find(id)).execute(&mut conn)?;
    info!(proposta_id = id, "proposta eliminada");

    for caminho in caminhos {
        if let Err(err) = state.storage.delete_file(&caminho).await {
            warn!(caminho, error = %err, "falha a remover ficheiro de anexo");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AssociarCoorientadorRequest {
    pub docente_id: i32,
}

#[derive(Deserialize)]
pub struct AssociarAlunoRequest {
    pub aluno_id: i32,
}

#[derive(Deserialize)]
pub struct AssociarPalavraChaveRequest {
    pub termo: String,
}

pub(crate) fn autorizar_edicao(
    conn: &mut PgConnection,
    proposta_id: i32,
    docente_id: i32,
) -> AppResult<()> {
    carregar_proposta(conn, proposta_id)?;
    if !permissions::can_edit_proposta(conn, proposta_id, docente_id)? {
        return Err(AppError::forbidden(
            "Sem permissão para editar esta proposta",
        ));
    }
    Ok(())
}

/// Associações repetidas não são erro; o insert é ignorado quando o par já
/// existe.
pub async fn adicionar_coorientador(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AssociarCoorientadorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<()>>)> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;
    validar_docente(&mut conn, payload.docente_id)?;

    diesel::insert_into(proposta_coorientador::table)
        .values(&NovoPropostaCoorientador {
            proposta_id: id,
            coorientador_id: payload.docente_id,
        })
        .on_conflict_do_nothing()
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, mensagem("Coorientador associado")))
}

pub async fn remover_coorientador(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, docente_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;

    let removidos = diesel::delete(
        proposta_coorientador::table
            .filter(proposta_coorientador::proposta_id.eq(id))
            .filter(proposta_coorientador::coorientador_id.eq(docente_id)),
    )
    .execute(&mut conn)?;
    if removidos == 0 {
        return Err(AppError::not_found("Associação não encontrada"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn associar_aluno(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AssociarAlunoRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<()>>)> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;
    validar_aluno(&mut conn, payload.aluno_id)?;

    diesel::insert_into(proposta_aluno::table)
        .values(&NovoPropostaAluno {
            proposta_id: id,
            aluno_id: payload.aluno_id,
        })
        .on_conflict_do_nothing()
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, mensagem("Aluno associado")))
}

pub async fn remover_aluno(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, aluno_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;

    let removidos = diesel::delete(
        proposta_aluno::table
            .filter(proposta_aluno::proposta_id.eq(id))
            .filter(proposta_aluno::aluno_id.eq(aluno_id)),
    )
    .execute(&mut conn)?;
    if removidos == 0 {
        return Err(AppError::not_found("Associação não encontrada"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn adicionar_palavra_chave(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AssociarPalavraChaveRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PalavraChaveDto>>)> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;

    let registo = conn.transaction::<PalavraChave, AppError, _>(|conn| {
        let registo = resolver_palavra_chave(conn, &payload.termo)?;
        diesel::insert_into(proposta_palavra_chave::table)
            .values(&NovoPropostaPalavraChave {
                proposta_id: id,
                palavra_chave_id: registo.id,
            })
            .on_conflict_do_nothing()
            .execute(conn)?;
        Ok(registo)
    })?;

    Ok((StatusCode::CREATED, ApiResponse::dados(registo.into())))
}

pub async fn remover_palavra_chave(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, palavra_chave_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;

    let removidos = diesel::delete(
        proposta_palavra_chave::table
            .filter(proposta_palavra_chave::proposta_id.eq(id))
            .filter(proposta_palavra_chave::palavra_chave_id.eq(palavra_chave_id)),
    )
    .execute(&mut conn)?;
    if removidos == 0 {
        return Err(AppError::not_found("Associação não encontrada"));
    }

    Ok(StatusCode::NO_CONTENT)
}
