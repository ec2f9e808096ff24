mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, dados_from, TestApp};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct CandidaturaInfo {
    id: i32,
    estado: String,
    feedback_docente: Option<String>,
}

#[derive(Deserialize)]
struct PropostaDetalhe {
    id: i32,
    alunos: Vec<PessoaInfo>,
    total_candidaturas: i64,
}

#[derive(Deserialize)]
struct PessoaInfo {
    id: i32,
}

async fn criar_proposta(app: &TestApp, token: &str, estado: &str) -> Result<i32> {
    let resposta = app
        .post_json(
            "/api/propostas",
            &json!({
                "titulo": "Sistemas distribuídos",
                "descricao_objetivos": "Estudo experimental de algoritmos de consenso distribuído em clusters de pequena dimensão.",
                "estado": estado
            }),
            Some(token),
        )
        .await?;
    anyhow::ensure!(
        resposta.status() == StatusCode::CREATED,
        "proposta não criada: {}",
        resposta.status()
    );
    let detalhe: PropostaDetalhe = dados_from(resposta.into_body()).await?;
    Ok(detalhe.id)
}

#[tokio::test]
async fn ciclo_de_vida_da_candidatura() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    let aluno_id = app
        .insert_user("Aluno", "aluno@uni.pt", "segredo123", "aluno", true)
        .await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;
    let aluno = app.login_token("aluno@uni.pt", "segredo123").await?;

    let proposta_id = criar_proposta(&app, &doc, "publicada").await?;

    let submissao = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": proposta_id, "observacoes": "Tenho experiência em Raft" }),
            Some(&aluno),
        )
        .await?;
    assert_eq!(submissao.status(), StatusCode::CREATED);
    let candidatura: CandidaturaInfo = dados_from(submissao.into_body()).await?;
    assert_eq!(candidatura.estado, "pendente");

    // Uma candidatura por aluno por proposta.
    let repetida = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": proposta_id }),
            Some(&aluno),
        )
        .await?;
    assert_eq!(repetida.status(), StatusCode::CONFLICT);

    let aceite = app
        .put_json(
            &format!("/api/candidaturas/{}/estado", candidatura.id),
            &json!({ "estado": "aceite", "feedback_docente": "Bem-vinda ao projeto" }),
            Some(&doc),
        )
        .await?;
    assert_eq!(aceite.status(), StatusCode::OK);
    let decidida: CandidaturaInfo = dados_from(aceite.into_body()).await?;
    assert_eq!(decidida.estado, "aceite");
    assert_eq!(decidida.feedback_docente.as_deref(), Some("Bem-vinda ao projeto"));

    // Aceitar associa o aluno à proposta.
    let detalhe = app
        .get(&format!("/api/propostas/{proposta_id}"), Some(&doc))
        .await?;
    let detalhe: PropostaDetalhe = dados_from(detalhe.into_body()).await?;
    assert_eq!(detalhe.alunos.len(), 1);
    assert_eq!(detalhe.alunos[0].id, aluno_id);
    assert_eq!(detalhe.total_candidaturas, 1);

    // Repetir a decisão não duplica a associação.
    let repetir_aceite = app
        .put_json(
            &format!("/api/candidaturas/{}/estado", candidatura.id),
            &json!({ "estado": "aceite" }),
            Some(&doc),
        )
        .await?;
    assert_eq!(repetir_aceite.status(), StatusCode::OK);
    let detalhe = app
        .get(&format!("/api/propostas/{proposta_id}"), Some(&doc))
        .await?;
    let detalhe: PropostaDetalhe = dados_from(detalhe.into_body()).await?;
    assert_eq!(detalhe.alunos.len(), 1);

    // O orientador pode reconsiderar.
    let reconsiderada = app
        .put_json(
            &format!("/api/candidaturas/{}/estado", candidatura.id),
            &json!({ "estado": "rejeitada" }),
            Some(&doc),
        )
        .await?;
    assert_eq!(reconsiderada.status(), StatusCode::OK);
    let final_estado: CandidaturaInfo = dados_from(reconsiderada.into_body()).await?;
    assert_eq!(final_estado.estado, "rejeitada");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn candidaturas_exigem_proposta_publicada() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Aluno", "aluno@uni.pt", "segredo123", "aluno", true)
        .await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;
    let aluno = app.login_token("aluno@uni.pt", "segredo123").await?;

    let rascunho_id = criar_proposta(&app, &doc, "rascunho").await?;
    let recusada = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": rascunho_id }),
            Some(&aluno),
        )
        .await?;
    assert_eq!(recusada.status(), StatusCode::BAD_REQUEST);

    // Proposta inexistente resolve para 404 antes de qualquer outra regra.
    let inexistente = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": 424242 }),
            Some(&aluno),
        )
        .await?;
    assert_eq!(inexistente.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn decisao_reservada_ao_orientador() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Orientadora", "ana@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Outro Docente", "bruno@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Aluno", "carla@uni.pt", "segredo123", "aluno", true)
        .await?;
    app.insert_user("Outro Aluno", "david@uni.pt", "segredo123", "aluno", true)
        .await?;
    let ana = app.login_token("ana@uni.pt", "segredo123").await?;
    let bruno = app.login_token("bruno@uni.pt", "segredo123").await?;
    let carla = app.login_token("carla@uni.pt", "segredo123").await?;
    let david = app.login_token("david@uni.pt", "segredo123").await?;

    let proposta_id = criar_proposta(&app, &ana, "publicada").await?;
    let submissao = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": proposta_id }),
            Some(&carla),
        )
        .await?;
    let candidatura: CandidaturaInfo = dados_from(submissao.into_body()).await?;

    let intruso = app
        .put_json(
            &format!("/api/candidaturas/{}/estado", candidatura.id),
            &json!({ "estado": "aceite" }),
            Some(&bruno),
        )
        .await?;
    assert_eq!(intruso.status(), StatusCode::FORBIDDEN);

    // Outro aluno não consulta candidaturas alheias.
    let alheia = app
        .get(&format!("/api/candidaturas/{}", candidatura.id), Some(&david))
        .await?;
    assert_eq!(alheia.status(), StatusCode::FORBIDDEN);

    // Estado desconhecido é rejeitado com a lista de valores.
    let invalido = app
        .put_json(
            &format!("/api/candidaturas/{}/estado", candidatura.id),
            &json!({ "estado": "talvez" }),
            Some(&ana),
        )
        .await?;
    assert_eq!(invalido.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn aluno_retira_candidatura_pendente() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Aluno", "aluno@uni.pt", "segredo123", "aluno", true)
        .await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;
    let aluno = app.login_token("aluno@uni.pt", "segredo123").await?;

    let proposta_id = criar_proposta(&app, &doc, "publicada").await?;
    let submissao = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": proposta_id }),
            Some(&aluno),
        )
        .await?;
    let candidatura: CandidaturaInfo = dados_from(submissao.into_body()).await?;

    let retirada = app
        .delete(&format!("/api/candidaturas/{}", candidatura.id), Some(&aluno))
        .await?;
    assert_eq!(retirada.status(), StatusCode::NO_CONTENT);

    // Depois de decidida deixa de ser possível retirar.
    let submissao = app
        .post_json(
            "/api/candidaturas",
            &json!({ "proposta_id": proposta_id }),
            Some(&aluno),
        )
        .await?;
    let candidatura: CandidaturaInfo = dados_from(submissao.into_body()).await?;
    let decisao = app
        .put_json(
            &format!("/api/candidaturas/{}/estado", candidatura.id),
            &json!({ "estado": "rejeitada" }),
            Some(&doc),
        )
        .await?;
    assert_eq!(decisao.status(), StatusCode::OK);

    let tardia = app
        .delete(&format!("/api/candidaturas/{}", candidatura.id), Some(&aluno))
        .await?;
    assert_eq!(tardia.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}
