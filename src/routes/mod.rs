use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{google, AuthenticatedUser};
use crate::state::AppState;

pub mod admin;
pub mod anexos;
pub mod auth;
pub mod candidaturas;
pub mod health;
pub mod palavras_chave;
pub mod propostas;
pub mod ucs;
pub mod utilizadores;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    // Margem sobre o limite de upload para os cabeçalhos do multipart.
    let body_limit = state.config.max_file_size as usize + 1024 * 1024;

    let auth_public = Router::new()
        .route("/registar", post(auth::registar))
        .route("/login", post(auth::login))
        .route("/google", get(google::google_start))
        .route("/google/callback", get(google::google_callback));

    let auth_protected =
        Router::new().route("/perfil", get(auth::perfil).put(auth::atualizar_perfil));

    let propostas_routes = Router::new()
        .route("/", get(propostas::listar).post(propostas::criar))
        .route("/minhas", get(propostas::minhas))
        .route("/atribuidas", get(propostas::atribuidas))
        .route(
            "/:id",
            get(propostas::obter)
                .put(propostas::atualizar)
                .delete(propostas::eliminar),
        )
        .route(
            "/:id/coorientadores",
            post(propostas::adicionar_coorientador),
        )
        .route(
            "/:id/coorientadores/:docente_id",
            delete(propostas::remover_coorientador),
        )
        .route("/:id/alunos", post(propostas::associar_aluno))
        .route("/:id/alunos/:aluno_id", delete(propostas::remover_aluno))
        .route(
            "/:id/palavras-chave",
            post(propostas::adicionar_palavra_chave),
        )
        .route(
            "/:id/palavras-chave/:palavra_chave_id",
            delete(propostas::remover_palavra_chave),
        )
        .route(
            "/:id/anexos",
            get(anexos::listar_anexos_proposta).post(anexos::upload_anexo_proposta),
        )
        .route("/:id/candidaturas", get(candidaturas::por_proposta));

    let candidaturas_routes = Router::new()
        .route("/", post(candidaturas::submeter))
        .route("/minhas", get(candidaturas::minhas))
        .route(
            "/:id",
            get(candidaturas::obter).delete(candidaturas::retirar),
        )
        .route("/:id/estado", put(candidaturas::decidir))
        .route(
            "/:id/anexos",
            get(anexos::listar_anexos_candidatura).post(anexos::upload_anexo_candidatura),
        );

    let anexos_routes = Router::new()
        .route("/:id/download", get(anexos::download_anexo_proposta))
        .route(
            "/:id",
            get(anexos::obter_anexo_proposta).delete(anexos::eliminar_anexo_proposta),
        );

    let anexos_candidatura_routes = Router::new()
        .route("/:id/download", get(anexos::download_anexo_candidatura))
        .route("/:id", delete(anexos::eliminar_anexo_candidatura));

    let ucs_routes = Router::new()
        .route("/", get(ucs::listar).post(ucs::criar))
        .route("/minhas", get(ucs::minhas))
        .route(
            "/:id",
            get(ucs::obter).put(ucs::atualizar).delete(ucs::eliminar),
        )
        .route("/:id/propostas", get(ucs::propostas_da_uc));

    let palavras_routes = Router::new()
        .route(
            "/",
            get(palavras_chave::listar).post(palavras_chave::criar),
        )
        .route(
            "/:id",
            get(palavras_chave::obter)
                .put(palavras_chave::atualizar)
                .delete(palavras_chave::eliminar),
        );

    let admin_routes = Router::new()
        .route(
            "/utilizadores",
            get(admin::listar_utilizadores).post(admin::criar),
        )
        .route("/utilizadores/:id/aprovar", put(admin::aprovar))
        .route("/utilizadores/:id/rejeitar", put(admin::rejeitar))
        .route("/utilizadores/:id/tipo", put(admin::alterar_tipo))
        .route(
            "/utilizadores/:id",
            get(admin::obter).delete(admin::eliminar),
        );

    let utilizadores_routes = Router::new()
        .route("/docentes", get(utilizadores::listar_docentes))
        .route("/docentes/:id", get(utilizadores::obter_docente))
        .route("/alunos", get(utilizadores::listar_alunos));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/auth", auth_protected)
        .nest("/api/propostas", propostas_routes)
        .nest("/api/candidaturas", candidaturas_routes)
        .nest("/api/anexos", anexos_routes)
        .nest("/api/anexos-candidatura", anexos_candidatura_routes)
        .nest("/api/ucs", ucs_routes)
        .nest("/api/palavras-chave", palavras_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", utilizadores_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_public)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
}
