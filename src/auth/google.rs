//! Autenticação Google OAuth2.
//!
//! O `state` do fluxo transporta o tipo de conta pedido no arranque
//! (aluno ou docente); valores desconhecidos caem para docente. A resolução
//! da conta segue três passos: google_id existente, vínculo por email, ou
//! criação de conta nova por aprovar.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{TIPO_ALUNO, TIPO_DOCENTE};
use crate::error::{AppError, AppResult};
use crate::models::{NovoUtilizador, Utilizador};
use crate::schema::utilizador;
use crate::state::AppState;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Deserialize)]
pub struct GoogleStartQuery {
    pub tipo: Option<String>,
}

#[derive(Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

fn normalize_tipo(state_param: Option<&str>) -> &'static str {
    match state_param {
        Some(TIPO_ALUNO) => TIPO_ALUNO,
        _ => TIPO_DOCENTE,
    }
}

fn oauth_config(state: &AppState) -> AppResult<(String, String)> {
    match (
        state.config.google_client_id.clone(),
        state.config.google_client_secret.clone(),
    ) {
        (Some(id), Some(secret)) => Ok((id, secret)),
        _ => Err(AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Autenticação Google não está configurada",
        )),
    }
}

pub async fn google_start(
    State(state): State<AppState>,
    Query(params): Query<GoogleStartQuery>,
) -> AppResult<Redirect> {
    let (client_id, _) = oauth_config(&state)?;
    let tipo = normalize_tipo(params.tipo.as_deref());

    let mut authorize = url::Url::parse(GOOGLE_AUTH_URL)
        .map_err(|err| AppError::internal(format!("invalid authorize url: {err}")))?;
    authorize
        .query_pairs_mut()
        .append_pair("client_id", &client_id)
        .append_pair("redirect_uri", &state.config.google_callback_url)
        .append_pair("response_type", "code")
        .append_pair("scope", "openid email profile")
        .append_pair("state", tipo);

    Ok(Redirect::temporary(authorize.as_str()))
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<GoogleCallbackQuery>,
) -> AppResult<Redirect> {
    let (client_id, client_secret) = oauth_config(&state)?;
    let tipo = normalize_tipo(params.state.as_deref()).to_string();

    let client = reqwest::Client::new();
    let token: TokenResponse = client
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("code", params.code.as_str()),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("redirect_uri", state.config.google_callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(AppError::internal)?
        .error_for_status()
        .map_err(|err| {
            warn!(error = %err, "google token exchange rejected");
            AppError::unauthorized("Código de autorização Google inválido")
        })?
        .json()
        .await
        .map_err(AppError::internal)?;

    let perfil: UserInfo = client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(&token.access_token)
        .send()
        .await
        .map_err(AppError::internal)?
        .json()
        .await
        .map_err(AppError::internal)?;

    let email = perfil.email.ok_or_else(|| {
        AppError::bad_request("Não foi possível obter o email da conta Google")
    })?;
    let nome = perfil.name.unwrap_or_else(|| "Utilizador Google".to_string());

    let mut conn = state.db()?;
    let conta = resolve_google_account(&mut conn, &perfil.sub, &email, &nome, &tipo)?;

    let destino = if conta.aprovado {
        let token = state.jwt.generate_token(&conta)?;
        format!("{}/auth/callback?token={}", state.config.frontend_url, token)
    } else {
        format!("{}/auth/callback?pendente=1", state.config.frontend_url)
    };

    Ok(Redirect::temporary(&destino))
}

fn resolve_google_account(
    conn: &mut PgConnection,
    google_id: &str,
    email: &str,
    nome: &str,
    tipo: &str,
) -> AppResult<Utilizador> {
    // 1. conta já vinculada a este google_id
    let existente: Option<Utilizador> = utilizador::table
        .filter(utilizador::google_id.eq(google_id))
        .first(conn)
        .optional()?;
    if let Some(conta) = existente {
        return Ok(conta);
    }

    // 2. conta registada tradicionalmente com o mesmo email: vincular
    let por_email: Option<Utilizador> = utilizador::table
        .filter(utilizador::email.eq(email))
        .first(conn)
        .optional()?;
    if let Some(conta) = por_email {
        let vinculada: Utilizador = diesel::update(utilizador::table.find(conta.id))
            .set(utilizador::google_id.eq(google_id))
            .get_result(conn)?;
        info!(utilizador_id = vinculada.id, "conta Google vinculada por email");
        return Ok(vinculada);
    }

    // 3. conta nova, por aprovar
    let nova = NovoUtilizador {
        nome: nome.to_string(),
        email: email.to_string(),
        palavra_passe: None,
        tipo: tipo.to_string(),
        aprovado: false,
        google_id: Some(google_id.to_string()),
        gabinete: None,
        departamento: None,
        numero_aluno: None,
        curso: None,
    };
    let criada: Utilizador = diesel::insert_into(utilizador::table)
        .values(&nova)
        .get_result(conn)?;
    info!(utilizador_id = criada.id, tipo, "conta criada via Google");
    Ok(criada)
}
