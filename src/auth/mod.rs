pub mod google;
pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub const TIPO_ADMINISTRADOR: &str = "administrador";
pub const TIPO_DOCENTE: &str = "docente";
pub const TIPO_ALUNO: &str = "aluno";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub nome: String,
    pub tipo: String,
    pub aprovado: bool,
}

impl AuthenticatedUser {
    pub fn is_docente(&self) -> bool {
        self.tipo == TIPO_DOCENTE
    }

    pub fn is_aluno(&self) -> bool {
        self.tipo == TIPO_ALUNO
    }

    pub fn ensure_docente(&self) -> AppResult<()> {
        if self.is_docente() {
            Ok(())
        } else {
            Err(AppError::forbidden("Acesso restrito a docentes"))
        }
    }

    pub fn ensure_aluno(&self) -> AppResult<()> {
        if self.is_aluno() {
            Ok(())
        } else {
            Err(AppError::forbidden("Acesso restrito a alunos"))
        }
    }

    pub fn ensure_admin(&self) -> AppResult<()> {
        if self.tipo == TIPO_ADMINISTRADOR {
            Ok(())
        } else {
            Err(AppError::forbidden("Acesso restrito a administradores"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized("Token não fornecido"))?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized("Token inválido ou expirado"))?;

        Ok(AuthenticatedUser {
            id: claims.sub,
            email: claims.email,
            nome: claims.nome,
            tipo: claims.tipo,
            aprovado: claims.aprovado,
        })
    }
}
