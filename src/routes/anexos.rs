//! Anexos de propostas e de candidaturas. O ficheiro só é persistido depois
//! de a entidade e as permissões estarem resolvidas; se o registo na base de
//! dados falhar a seguir, o ficheiro acabado de escrever é removido.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    Anexo, AnexoCandidatura, NovoAnexo, NovoAnexoCandidatura,
};
use crate::permissions;
use crate::routes::candidaturas::carregar_candidatura;
use crate::routes::propostas::{autorizar_edicao, carregar_proposta};
use crate::schema::{anexo, anexo_candidatura};
use crate::state::AppState;
use crate::utils::resposta::ApiResponse;
use crate::utils::upload::{
    attachment_content_disposition, read_ficheiro, storage_key, TIPOS_CANDIDATURA, TIPOS_PROPOSTA,
};

#[derive(Serialize)]
pub struct AnexoDto {
    pub id: i32,
    pub proposta_id: i32,
    pub nome_ficheiro: String,
    pub tipo: String,
    pub tamanho_bytes: i64,
    pub data_upload: DateTime<Utc>,
}

impl From<Anexo> for AnexoDto {
    fn from(value: Anexo) -> Self {
        Self {
            id: value.id,
            proposta_id: value.proposta_id,
            nome_ficheiro: value.nome_ficheiro,
            tipo: value.tipo,
            tamanho_bytes: value.tamanho_bytes,
            data_upload: value.data_upload,
        }
    }
}

#[derive(Serialize)]
pub struct AnexoCandidaturaDto {
    pub id: i32,
    pub candidatura_id: i32,
    pub nome_ficheiro: String,
    pub tipo: String,
    pub tamanho_bytes: i64,
    pub data_upload: DateTime<Utc>,
}

impl From<AnexoCandidatura> for AnexoCandidaturaDto {
    fn from(value: AnexoCandidatura) -> Self {
        Self {
            id: value.id,
            candidatura_id: value.candidatura_id,
            nome_ficheiro: value.nome_ficheiro,
            tipo: value.tipo,
            tamanho_bytes: value.tamanho_bytes,
            data_upload: value.data_upload,
        }
    }
}

async fn remover_orfao(state: &AppState, caminho: &str) {
    if let Err(err) = state.storage.delete_file(caminho).await {
        warn!(caminho, error = %err, "falha a remover ficheiro órfão");
    }
}

fn resposta_download(nome_ficheiro: &str, conteudo: Vec<u8>) -> impl IntoResponse {
    let mime = mime_guess::from_path(nome_ficheiro).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_content_disposition(nome_ficheiro),
            ),
        ],
        conteudo,
    )
}

pub async fn upload_anexo_proposta(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<AnexoDto>>)> {
    let mut conn = state.db()?;
    autorizar_edicao(&mut conn, id, user.id)?;

    let ficheiro = read_ficheiro(&mut multipart, state.config.max_file_size, TIPOS_PROPOSTA).await?;
    let caminho = storage_key("propostas", id, ficheiro.tipo);
    let tamanho = ficheiro.bytes.len() as i64;
    state.storage.put_file(&caminho, ficheiro.bytes).await?;

    let novo = NovoAnexo {
        proposta_id: id,
        nome_ficheiro: ficheiro.nome_original,
        caminho: caminho.clone(),
        tipo: ficheiro.tipo.to_string(),
        tamanho_bytes: tamanho,
    };
    let registo: Anexo = match diesel::insert_into(anexo::table)
        .values(&novo)
        .get_result(&mut conn)
    {
        Ok(registo) => registo,
        Err(err) => {
            remover_orfao(&state, &caminho).await;
            return Err(err.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem("Anexo carregado", registo.into()),
    ))
}

pub async fn listar_anexos_proposta(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<AnexoDto>>>> {
    let mut conn = state.db()?;
    carregar_proposta(&mut conn, id)?;

    let registos: Vec<Anexo> = anexo::table
        .filter(anexo::proposta_id.eq(id))
        .order(anexo::data_upload.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        registos.into_iter().map(Into::into).collect(),
    ))
}

pub async fn obter_anexo_proposta(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<AnexoDto>>> {
    let mut conn = state.db()?;
    let registo: Anexo = anexo::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Anexo não encontrado"))?;
    Ok(ApiResponse::dados(registo.into()))
}

pub async fn download_anexo_proposta(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;
    let registo: Anexo = anexo::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Anexo não encontrado"))?;

    let conteudo = state.storage.get_file(&registo.caminho).await?;
    Ok(resposta_download(&registo.nome_ficheiro, conteudo))
}

pub async fn eliminar_anexo_proposta(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let registo: Anexo = anexo::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Anexo não encontrado"))?;
    autorizar_edicao(&mut conn, registo.proposta_id, user.id)?;

    diesel::delete(anexo::table.find(id)).execute(&mut conn)?;
    remover_orfao(&state, &registo.caminho).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_anexo_candidatura(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<AnexoCandidaturaDto>>)> {
    let mut conn = state.db()?;
    let registo = carregar_candidatura(&mut conn, id)?;
    if registo.aluno_id != user.id {
        return Err(AppError::forbidden(
            "Só o autor pode anexar ficheiros à candidatura",
        ));
    }

    let ficheiro =
        read_ficheiro(&mut multipart, state.config.max_file_size, TIPOS_CANDIDATURA).await?;
    let caminho = storage_key("candidaturas", id, ficheiro.tipo);
    let tamanho = ficheiro.bytes.len() as i64;
    state.storage.put_file(&caminho, ficheiro.bytes).await?;

    let novo = NovoAnexoCandidatura {
        candidatura_id: id,
        nome_ficheiro: ficheiro.nome_original,
        caminho: caminho.clone(),
        tipo: ficheiro.tipo.to_string(),
        tamanho_bytes: tamanho,
    };
    let criado: AnexoCandidatura = match diesel::insert_into(anexo_candidatura::table)
        .values(&novo)
        .get_result(&mut conn)
    {
        Ok(criado) => criado,
        Err(err) => {
            remover_orfao(&state, &caminho).await;
            return Err(err.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem("Anexo carregado", criado.into()),
    ))
}

fn autorizar_consulta_candidatura(
    conn: &mut PgConnection,
    candidatura_id: i32,
    user: &AuthenticatedUser,
) -> AppResult<()> {
    let registo = carregar_candidatura(conn, candidatura_id)?;
    let alvo = carregar_proposta(conn, registo.proposta_id)?;
    if !permissions::can_view_candidatura(registo.aluno_id, alvo.orientador_id, user.id, &user.tipo)
    {
        return Err(AppError::forbidden(
            "Sem permissão para consultar esta candidatura",
        ));
    }
    Ok(())
}

pub async fn listar_anexos_candidatura(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<AnexoCandidaturaDto>>>> {
    let mut conn = state.db()?;
    autorizar_consulta_candidatura(&mut conn, id, &user)?;

    let registos: Vec<AnexoCandidatura> = anexo_candidatura::table
        .filter(anexo_candidatura::candidatura_id.eq(id))
        .order(anexo_candidatura::data_upload.asc())
        .load(&mut conn)?;

    Ok(ApiResponse::dados(
        registos.into_iter().map(Into::into).collect(),
    ))
}

pub async fn download_anexo_candidatura(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;
    let registo: AnexoCandidatura = anexo_candidatura::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Anexo não encontrado"))?;
    autorizar_consulta_candidatura(&mut conn, registo.candidatura_id, &user)?;

    let conteudo = state.storage.get_file(&registo.caminho).await?;
    Ok(resposta_download(&registo.nome_ficheiro, conteudo))
}

pub async fn eliminar_anexo_candidatura(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let registo: AnexoCandidatura = anexo_candidatura::table
        .find(id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("Anexo não encontrado"))?;
    let dona = carregar_candidatura(&mut conn, registo.candidatura_id)?;
    if dona.aluno_id != user.id {
        return Err(AppError::forbidden(
            "Só o autor pode remover anexos da candidatura",
        ));
    }

    diesel::delete(anexo_candidatura::table.find(registo.id)).execute(&mut conn)?;
    remover_orfao(&state, &registo.caminho).await;

    Ok(StatusCode::NO_CONTENT)
}
