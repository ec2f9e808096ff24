use axum::Json;
use serde::Serialize;

/// Envelope comum de resposta: `{sucesso, mensagem?, dados?}`.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub sucesso: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dados: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn dados(dados: T) -> Json<Self> {
        Json(Self {
            sucesso: true,
            mensagem: None,
            dados: Some(dados),
        })
    }

    pub fn com_mensagem(mensagem: impl Into<String>, dados: T) -> Json<Self> {
        Json(Self {
            sucesso: true,
            mensagem: Some(mensagem.into()),
            dados: Some(dados),
        })
    }
}

pub fn mensagem(texto: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        sucesso: true,
        mensagem: Some(texto.into()),
        dados: None,
    })
}
