use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = utilizador)]
pub struct Utilizador {
    pub id: i32,
    pub nome: String,
    pub email: String,
    pub palavra_passe: Option<String>,
    pub tipo: String,
    pub aprovado: bool,
    pub google_id: Option<String>,
    pub gabinete: Option<String>,
    pub departamento: Option<String>,
    pub numero_aluno: Option<String>,
    pub curso: Option<String>,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = utilizador)]
pub struct NovoUtilizador {
    pub nome: String,
    pub email: String,
    pub palavra_passe: Option<String>,
    pub tipo: String,
    pub aprovado: bool,
    pub google_id: Option<String>,
    pub gabinete: Option<String>,
    pub departamento: Option<String>,
    pub numero_aluno: Option<String>,
    pub curso: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = unidade_curricular)]
#[diesel(belongs_to(Utilizador, foreign_key = docente_id))]
pub struct UnidadeCurricular {
    pub id: i32,
    pub nome: String,
    pub codigo: String,
    pub descricao: Option<String>,
    pub ano_letivo: Option<String>,
    pub docente_id: i32,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = unidade_curricular)]
pub struct NovaUnidadeCurricular {
    pub nome: String,
    pub codigo: String,
    pub descricao: Option<String>,
    pub ano_letivo: Option<String>,
    pub docente_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = proposta)]
pub struct Proposta {
    pub id: i32,
    pub titulo: String,
    pub descricao_objetivos: String,
    pub estado: String,
    pub orientador_id: i32,
    pub uc_id: Option<i32>,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = proposta)]
pub struct NovaProposta {
    pub titulo: String,
    pub descricao_objetivos: String,
    pub estado: String,
    pub orientador_id: i32,
    pub uc_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = proposta_coorientador)]
#[diesel(belongs_to(Proposta))]
#[diesel(primary_key(proposta_id, coorientador_id))]
pub struct PropostaCoorientador {
    pub proposta_id: i32,
    pub coorientador_id: i32,
    pub data_associacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = proposta_coorientador)]
pub struct NovoPropostaCoorientador {
    pub proposta_id: i32,
    pub coorientador_id: i32,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = proposta_aluno)]
#[diesel(belongs_to(Proposta))]
#[diesel(primary_key(proposta_id, aluno_id))]
pub struct PropostaAluno {
    pub proposta_id: i32,
    pub aluno_id: i32,
    pub data_associacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = proposta_aluno)]
pub struct NovoPropostaAluno {
    pub proposta_id: i32,
    pub aluno_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = palavra_chave)]
pub struct PalavraChave {
    pub id: i32,
    pub termo: String,
    pub data_criacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = palavra_chave)]
pub struct NovaPalavraChave {
    pub termo: String,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = proposta_palavra_chave)]
#[diesel(belongs_to(Proposta))]
#[diesel(belongs_to(PalavraChave))]
#[diesel(primary_key(proposta_id, palavra_chave_id))]
pub struct PropostaPalavraChave {
    pub proposta_id: i32,
    pub palavra_chave_id: i32,
    pub data_associacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = proposta_palavra_chave)]
pub struct NovoPropostaPalavraChave {
    pub proposta_id: i32,
    pub palavra_chave_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = anexo)]
#[diesel(belongs_to(Proposta))]
pub struct Anexo {
    pub id: i32,
    pub proposta_id: i32,
    pub nome_ficheiro: String,
    pub caminho: String,
    pub tipo: String,
    pub tamanho_bytes: i64,
    pub data_upload: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = anexo)]
pub struct NovoAnexo {
    pub proposta_id: i32,
    pub nome_ficheiro: String,
    pub caminho: String,
    pub tipo: String,
    pub tamanho_bytes: i64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = candidatura)]
#[diesel(belongs_to(Proposta))]
pub struct Candidatura {
    pub id: i32,
    pub aluno_id: i32,
    pub proposta_id: i32,
    pub estado: String,
    pub observacoes: Option<String>,
    pub feedback_docente: Option<String>,
    pub data_submissao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = candidatura)]
pub struct NovaCandidatura {
    pub aluno_id: i32,
    pub proposta_id: i32,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = anexo_candidatura)]
#[diesel(belongs_to(Candidatura))]
pub struct AnexoCandidatura {
    pub id: i32,
    pub candidatura_id: i32,
    pub nome_ficheiro: String,
    pub caminho: String,
    pub tipo: String,
    pub tamanho_bytes: i64,
    pub data_upload: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = anexo_candidatura)]
pub struct NovoAnexoCandidatura {
    pub candidatura_id: i32,
    pub nome_ficheiro: String,
    pub caminho: String,
    pub tipo: String,
    pub tamanho_bytes: i64,
}
