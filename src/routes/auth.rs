use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{password, AuthenticatedUser, TIPO_ALUNO, TIPO_DOCENTE};
use crate::error::{AppError, AppResult};
use crate::models::{NovoUtilizador, Utilizador};
use crate::routes::utilizadores::UtilizadorDto;
use crate::schema::utilizador;
use crate::state::AppState;
use crate::utils::json::double_option;
use crate::utils::resposta::ApiResponse;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct RegistarRequest {
    pub nome: String,
    pub email: String,
    pub palavra_passe: String,
    pub tipo: String,
    pub gabinete: Option<String>,
    pub departamento: Option<String>,
    pub numero_aluno: Option<String>,
    pub curso: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub palavra_passe: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub utilizador: UtilizadorDto,
}

/// Contas novas ficam por aprovar até o administrador as verificar. Só tipos
/// aluno e docente podem ser pedidos no registo.
pub async fn registar(
    State(state): State<AppState>,
    Json(payload): Json<RegistarRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UtilizadorDto>>)> {
    let nome = payload.nome.trim();
    let email = payload.email.trim().to_lowercase();

    if nome.is_empty() {
        return Err(AppError::bad_request("O nome é obrigatório"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("Email inválido"));
    }
    if payload.palavra_passe.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "A palavra-passe deve ter pelo menos 8 caracteres",
        ));
    }
    if payload.tipo != TIPO_ALUNO && payload.tipo != TIPO_DOCENTE {
        return Err(AppError::bad_request(
            "Tipo de conta inválido. Valores: aluno, docente",
        ));
    }

    let mut conn = state.db()?;

    let duplicado: Option<Utilizador> = utilizador::table
        .filter(utilizador::email.eq(&email))
        .first(&mut conn)
        .optional()?;
    if duplicado.is_some() {
        return Err(AppError::conflict("Email já registado"));
    }

    if let Some(numero) = payload.numero_aluno.as_deref() {
        let repetido: Option<i32> = utilizador::table
            .filter(utilizador::numero_aluno.eq(numero))
            .select(utilizador::id)
            .first(&mut conn)
            .optional()?;
        if repetido.is_some() {
            return Err(AppError::conflict("Número de aluno já registado"));
        }
    }

    let novo = NovoUtilizador {
        nome: nome.to_string(),
        email,
        palavra_passe: Some(password::hash_password(&payload.palavra_passe)?),
        tipo: payload.tipo,
        aprovado: false,
        google_id: None,
        gabinete: payload.gabinete,
        departamento: payload.departamento,
        numero_aluno: payload.numero_aluno,
        curso: payload.curso,
    };

    let criado: Utilizador = diesel::insert_into(utilizador::table)
        .values(&novo)
        .get_result(&mut conn)?;
    info!(utilizador_id = criado.id, tipo = %criado.tipo, "conta registada");

    Ok((
        StatusCode::CREATED,
        ApiResponse::com_mensagem(
            "Conta criada. Aguarda aprovação do administrador.",
            criado.into(),
        ),
    ))
}

/// Credenciais erradas e emails desconhecidos produzem o mesmo 401; contas
/// por aprovar recebem um 403 distinto para o frontend poder explicar.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let email = payload.email.trim().to_lowercase();
    let mut conn = state.db()?;

    let conta: Utilizador = utilizador::table
        .filter(utilizador::email.eq(&email))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::unauthorized("Credenciais inválidas"))?;

    // Contas criadas via Google não têm palavra-passe local.
    let hash = conta
        .palavra_passe
        .as_deref()
        .ok_or_else(|| AppError::unauthorized("Credenciais inválidas"))?;

    if !password::verify_password(&payload.palavra_passe, hash)? {
        return Err(AppError::unauthorized("Credenciais inválidas"));
    }

    if !conta.aprovado {
        return Err(AppError::forbidden("Utilizador não verificado"));
    }

    let token = state.jwt.generate_token(&conta)?;
    Ok(ApiResponse::dados(LoginResponse {
        token,
        utilizador: conta.into(),
    }))
}

pub async fn perfil(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<UtilizadorDto>>> {
    let mut conn = state.db()?;
    let conta: Utilizador = utilizador::table.find(user.id).first(&mut conn)?;
    Ok(ApiResponse::dados(conta.into()))
}

#[derive(Deserialize, Default)]
pub struct AtualizarPerfilRequest {
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub gabinete: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub departamento: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub numero_aluno: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub curso: Option<Option<String>>,
    pub palavra_passe: Option<String>,
    pub palavra_passe_atual: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = utilizador)]
struct PerfilChangeset {
    nome: Option<String>,
    gabinete: Option<Option<String>>,
    departamento: Option<Option<String>>,
    numero_aluno: Option<Option<String>>,
    curso: Option<Option<String>>,
    palavra_passe: Option<String>,
}

pub async fn atualizar_perfil(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<AtualizarPerfilRequest>,
) -> AppResult<Json<ApiResponse<UtilizadorDto>>> {
    let mut conn = state.db()?;
    let atual: Utilizador = utilizador::table.find(user.id).first(&mut conn)?;

    let mut changeset = PerfilChangeset::default();

    if let Some(nome) = payload.nome {
        let nome = nome.trim().to_string();
        if nome.is_empty() {
            return Err(AppError::bad_request("O nome é obrigatório"));
        }
        changeset.nome = Some(nome);
    }
    if let Some(nova) = payload.palavra_passe {
        if nova.len() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(
                "A palavra-passe deve ter pelo menos 8 caracteres",
            ));
        }
        // Mudar a palavra-passe exige a confirmação da atual.
        let hash = atual.palavra_passe.as_deref().ok_or_else(|| {
            AppError::bad_request("Esta conta não tem palavra-passe local")
        })?;
        let confirmacao = payload.palavra_passe_atual.as_deref().ok_or_else(|| {
            AppError::bad_request("A palavra-passe atual é obrigatória para a alterar")
        })?;
        if !password::verify_password(confirmacao, hash)? {
            return Err(AppError::unauthorized("Palavra-passe atual incorreta"));
        }
        changeset.palavra_passe = Some(password::hash_password(&nova)?);
    }
    changeset.gabinete = payload.gabinete;
    changeset.departamento = payload.departamento;
    changeset.numero_aluno = payload.numero_aluno;
    changeset.curso = payload.curso;

    let nada_para_alterar = changeset.nome.is_none()
        && changeset.palavra_passe.is_none()
        && changeset.gabinete.is_none()
        && changeset.departamento.is_none()
        && changeset.numero_aluno.is_none()
        && changeset.curso.is_none();
    if nada_para_alterar {
        return Ok(ApiResponse::dados(atual.into()));
    }

    let atualizado: Utilizador = diesel::update(utilizador::table.find(user.id))
        .set(&changeset)
        .get_result(&mut conn)?;

    Ok(ApiResponse::com_mensagem(
        "Perfil atualizado",
        atualizado.into(),
    ))
}
