use axum::extract::Multipart;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Tipos aceites em anexos de propostas.
pub const TIPOS_PROPOSTA: &[&str] = &["pdf", "doc", "docx", "txt"];
/// Candidaturas aceitam adicionalmente arquivos zip.
pub const TIPOS_CANDIDATURA: &[&str] = &["pdf", "doc", "docx", "txt", "zip"];

pub struct UploadedFile {
    pub nome_original: String,
    pub tipo: &'static str,
    pub bytes: Vec<u8>,
}

pub fn tipo_por_extensao(nome: &str) -> Option<&'static str> {
    let extensao = nome.rsplit_once('.')?.1.to_ascii_lowercase();
    match extensao.as_str() {
        "pdf" => Some("pdf"),
        "doc" => Some("doc"),
        "docx" => Some("docx"),
        "txt" => Some("txt"),
        "zip" => Some("zip"),
        _ => None,
    }
}

/// Lê o campo `ficheiro` do multipart e valida tipo e tamanho. Nada é escrito
/// em disco aqui; o chamador só persiste depois de resolver existência e
/// permissões.
pub async fn read_ficheiro(
    multipart: &mut Multipart,
    max_bytes: u64,
    tipos_permitidos: &[&str],
) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("multipart inválido: {err}")))?
    {
        if field.name() != Some("ficheiro") {
            continue;
        }

        let nome_original = field
            .file_name()
            .map(|nome| nome.to_string())
            .filter(|nome| !nome.is_empty())
            .ok_or_else(|| AppError::bad_request("Nome do ficheiro em falta"))?;

        let tipo = tipo_por_extensao(&nome_original)
            .filter(|tipo| tipos_permitidos.contains(tipo))
            .ok_or_else(|| {
                AppError::bad_request(format!(
                    "Tipo de ficheiro não permitido. Aceites: {}",
                    tipos_permitidos.join(", ")
                ))
            })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("erro a ler o ficheiro: {err}")))?
            .to_vec();

        if bytes.len() as u64 > max_bytes {
            return Err(AppError::bad_request(
                "Ficheiro excede o tamanho máximo permitido",
            ));
        }

        return Ok(UploadedFile {
            nome_original,
            tipo,
            bytes,
        });
    }

    Err(AppError::bad_request("Nenhum ficheiro foi enviado"))
}

/// Chave de armazenamento única por entidade, preservando apenas a extensão.
pub fn storage_key(prefixo: &str, entidade_id: i32, tipo: &str) -> String {
    format!("{prefixo}/{entidade_id}/{}.{tipo}", Uuid::new_v4())
}

pub fn attachment_content_disposition(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}
