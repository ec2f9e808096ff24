mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, dados_from, TestApp};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct PalavraCatalogo {
    id: i32,
    termo: String,
    total_propostas: i64,
}

#[derive(Deserialize)]
struct PropostaDetalhe {
    id: i32,
    palavras_chave: Vec<PalavraRef>,
}

#[derive(Deserialize)]
struct PalavraRef {
    id: i32,
}

#[tokio::test]
async fn catalogo_sem_duplicados_por_capitalizacao() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Aluno", "aluno@uni.pt", "segredo123", "aluno", true)
        .await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;
    let aluno = app.login_token("aluno@uni.pt", "segredo123").await?;

    let criada = app
        .post_json(
            "/api/palavras-chave",
            &json!({ "termo": "Machine Learning" }),
            Some(&doc),
        )
        .await?;
    assert_eq!(criada.status(), StatusCode::CREATED);

    let duplicada = app
        .post_json(
            "/api/palavras-chave",
            &json!({ "termo": "machine learning" }),
            Some(&doc),
        )
        .await?;
    assert_eq!(duplicada.status(), StatusCode::CONFLICT);

    // Alunos não gerem o catálogo.
    let recusada = app
        .post_json(
            "/api/palavras-chave",
            &json!({ "termo": "intrusa" }),
            Some(&aluno),
        )
        .await?;
    assert_eq!(recusada.status(), StatusCode::FORBIDDEN);

    let vazia = app
        .post_json("/api/palavras-chave", &json!({ "termo": "   " }), Some(&doc))
        .await?;
    assert_eq!(vazia.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn contagem_de_uso_e_remocao_em_cascata() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Admin", "admin@uni.pt", "segredo123", "administrador", true)
        .await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;
    let admin = app.login_token("admin@uni.pt", "segredo123").await?;

    let proposta = app
        .post_json(
            "/api/propostas",
            &json!({
                "titulo": "Etiquetada",
                "descricao_objetivos": "Aplicar técnicas de indexação por palavras-chave ao catálogo de propostas de tese.",
                "palavras_chave": ["grafos", "otimização"]
            }),
            Some(&doc),
        )
        .await?;
    let proposta: PropostaDetalhe = dados_from(proposta.into_body()).await?;
    assert_eq!(proposta.palavras_chave.len(), 2);

    let catalogo = app.get("/api/palavras-chave", Some(&doc)).await?;
    let termos: Vec<PalavraCatalogo> = dados_from(catalogo.into_body()).await?;
    assert_eq!(termos.len(), 2);
    assert!(termos.iter().all(|termo| termo.total_propostas == 1));

    let alvo = termos
        .iter()
        .find(|termo| termo.termo == "grafos")
        .expect("termo grafos no catálogo");

    // Só o administrador remove termos; as associações caem com eles.
    let recusada = app
        .delete(&format!("/api/palavras-chave/{}", alvo.id), Some(&doc))
        .await?;
    assert_eq!(recusada.status(), StatusCode::FORBIDDEN);

    let removida = app
        .delete(&format!("/api/palavras-chave/{}", alvo.id), Some(&admin))
        .await?;
    assert_eq!(removida.status(), StatusCode::NO_CONTENT);

    let atualizada = app
        .get(&format!("/api/propostas/{}", proposta.id), Some(&doc))
        .await?;
    let atualizada: PropostaDetalhe = dados_from(atualizada.into_body()).await?;
    assert_eq!(atualizada.palavras_chave.len(), 1);
    assert!(atualizada
        .palavras_chave
        .iter()
        .all(|termo| termo.id != alvo.id));

    app.cleanup().await?;
    Ok(())
}
