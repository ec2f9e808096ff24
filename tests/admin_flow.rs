mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, dados_from, TestApp};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct UtilizadorInfo {
    id: i32,
    email: String,
    tipo: String,
    aprovado: bool,
}

#[tokio::test]
async fn gestao_de_contas_pelo_administrador() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let admin_id = app
        .insert_user("Admin", "admin@uni.pt", "segredo123", "administrador", true)
        .await?;
    let pendente_id = app
        .insert_user("Pendente", "pendente@uni.pt", "segredo123", "docente", false)
        .await?;
    app.insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    let admin = app.login_token("admin@uni.pt", "segredo123").await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;

    // Docente não entra na área de administração.
    let recusada = app.get("/api/admin/utilizadores", Some(&doc)).await?;
    assert_eq!(recusada.status(), StatusCode::FORBIDDEN);

    let por_aprovar = app
        .get("/api/admin/utilizadores?aprovado=false", Some(&admin))
        .await?;
    assert_eq!(por_aprovar.status(), StatusCode::OK);
    let contas: Vec<UtilizadorInfo> = dados_from(por_aprovar.into_body()).await?;
    assert_eq!(contas.len(), 1);
    assert_eq!(contas[0].id, pendente_id);

    let aprovada = app
        .put_json(
            &format!("/api/admin/utilizadores/{pendente_id}/aprovar"),
            &json!({}),
            Some(&admin),
        )
        .await?;
    assert_eq!(aprovada.status(), StatusCode::OK);
    let conta: UtilizadorInfo = dados_from(aprovada.into_body()).await?;
    assert!(conta.aprovado);

    let rejeitada = app
        .put_json(
            &format!("/api/admin/utilizadores/{pendente_id}/rejeitar"),
            &json!({}),
            Some(&admin),
        )
        .await?;
    assert_eq!(rejeitada.status(), StatusCode::OK);
    let conta: UtilizadorInfo = dados_from(rejeitada.into_body()).await?;
    assert!(!conta.aprovado);

    let tipo_invalido = app
        .put_json(
            &format!("/api/admin/utilizadores/{pendente_id}/tipo"),
            &json!({ "tipo": "reitor" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(tipo_invalido.status(), StatusCode::BAD_REQUEST);

    let promovida = app
        .put_json(
            &format!("/api/admin/utilizadores/{pendente_id}/tipo"),
            &json!({ "tipo": "aluno" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(promovida.status(), StatusCode::OK);
    let conta: UtilizadorInfo = dados_from(promovida.into_body()).await?;
    assert_eq!(conta.tipo, "aluno");
    assert_eq!(conta.email, "pendente@uni.pt");

    // O administrador não se elimina a si próprio.
    let suicidio = app
        .delete(&format!("/api/admin/utilizadores/{admin_id}"), Some(&admin))
        .await?;
    assert_eq!(suicidio.status(), StatusCode::BAD_REQUEST);

    let eliminada = app
        .delete(
            &format!("/api/admin/utilizadores/{pendente_id}"),
            Some(&admin),
        )
        .await?;
    assert_eq!(eliminada.status(), StatusCode::NO_CONTENT);

    let inexistente = app
        .delete(
            &format!("/api/admin/utilizadores/{pendente_id}"),
            Some(&admin),
        )
        .await?;
    assert_eq!(inexistente.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn contas_criadas_pelo_administrador_nascem_aprovadas() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("Admin", "admin@uni.pt", "segredo123", "administrador", true)
        .await?;
    let admin = app.login_token("admin@uni.pt", "segredo123").await?;

    let criada = app
        .post_json(
            "/api/admin/utilizadores",
            &json!({
                "nome": "Docente Novo",
                "email": "novo@uni.pt",
                "palavra_passe": "segredo123",
                "tipo": "docente",
                "departamento": "Informática"
            }),
            Some(&admin),
        )
        .await?;
    assert_eq!(criada.status(), StatusCode::CREATED);
    let conta: UtilizadorInfo = dados_from(criada.into_body()).await?;
    assert!(conta.aprovado);
    assert_eq!(conta.tipo, "docente");

    // Aprovada à nascença, a conta entra logo.
    let token = app.login_token("novo@uni.pt", "segredo123").await?;
    let perfil = app.get("/api/auth/perfil", Some(&token)).await?;
    assert_eq!(perfil.status(), StatusCode::OK);

    let repetida = app
        .post_json(
            "/api/admin/utilizadores",
            &json!({
                "nome": "Outro",
                "email": "novo@uni.pt",
                "palavra_passe": "segredo123",
                "tipo": "aluno"
            }),
            Some(&admin),
        )
        .await?;
    assert_eq!(repetida.status(), StatusCode::CONFLICT);

    let por_aprovar = app
        .post_json(
            "/api/admin/utilizadores",
            &json!({
                "nome": "Ainda Pendente",
                "email": "pendente@uni.pt",
                "palavra_passe": "segredo123",
                "tipo": "aluno",
                "aprovado": false
            }),
            Some(&admin),
        )
        .await?;
    assert_eq!(por_aprovar.status(), StatusCode::CREATED);
    let conta: UtilizadorInfo = dados_from(por_aprovar.into_body()).await?;
    assert!(!conta.aprovado);

    let detalhe = app
        .get(&format!("/api/admin/utilizadores/{}", conta.id), Some(&admin))
        .await?;
    assert_eq!(detalhe.status(), StatusCode::OK);
    let detalhe: UtilizadorInfo = dados_from(detalhe.into_body()).await?;
    assert_eq!(detalhe.email, "pendente@uni.pt");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn listagens_de_docentes_e_alunos() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let docente_id = app
        .insert_user("Docente", "doc@uni.pt", "segredo123", "docente", true)
        .await?;
    app.insert_user("Por Aprovar", "novo@uni.pt", "segredo123", "docente", false)
        .await?;
    app.insert_user("Aluno", "aluno@uni.pt", "segredo123", "aluno", true)
        .await?;
    let doc = app.login_token("doc@uni.pt", "segredo123").await?;
    let aluno = app.login_token("aluno@uni.pt", "segredo123").await?;

    // As listagens exigem sessão como qualquer outra rota da API.
    let anonimo = app.get("/api/docentes", None).await?;
    assert_eq!(anonimo.status(), StatusCode::UNAUTHORIZED);

    // Só contas aprovadas aparecem nas listagens.
    let docentes = app.get("/api/docentes", Some(&aluno)).await?;
    assert_eq!(docentes.status(), StatusCode::OK);
    let docentes: Vec<UtilizadorInfo> = dados_from(docentes.into_body()).await?;
    assert_eq!(docentes.len(), 1);
    assert_eq!(docentes[0].id, docente_id);

    let detalhe = app
        .get(&format!("/api/docentes/{docente_id}"), Some(&aluno))
        .await?;
    assert_eq!(detalhe.status(), StatusCode::OK);

    let alunos_para_docente = app.get("/api/alunos", Some(&doc)).await?;
    assert_eq!(alunos_para_docente.status(), StatusCode::OK);
    let alunos: Vec<UtilizadorInfo> = dados_from(alunos_para_docente.into_body()).await?;
    assert_eq!(alunos.len(), 1);

    // Alunos não enumeram os colegas.
    let alunos_para_aluno = app.get("/api/alunos", Some(&aluno)).await?;
    assert_eq!(alunos_para_aluno.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}
