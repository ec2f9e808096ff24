//! Capability checks for propostas e candidaturas.
//!
//! Controllers resolve existence first (404) and only then consult these
//! checks (403): a missing record is always reported as NotFound, and
//! Forbidden only ever refers to a record that exists.

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::{select, PgConnection};

use crate::models::Proposta;
use crate::schema::{proposta, proposta_coorientador};

/// Um docente controla a proposta se for o orientador ou constar da lista de
/// coorientadores.
pub fn controls_proposta(orientador_id: i32, coorientadores: &[i32], docente_id: i32) -> bool {
    orientador_id == docente_id || coorientadores.contains(&docente_id)
}

/// Editar (atualizar campos, gerir associações e anexos): orientador ou
/// coorientador.
pub fn can_edit_proposta(
    conn: &mut PgConnection,
    proposta_id: i32,
    docente_id: i32,
) -> QueryResult<bool> {
    let orientador: bool = select(exists(
        proposta::table
            .filter(proposta::id.eq(proposta_id))
            .filter(proposta::orientador_id.eq(docente_id)),
    ))
    .get_result(conn)?;

    if orientador {
        return Ok(true);
    }

    select(exists(
        proposta_coorientador::table
            .filter(proposta_coorientador::proposta_id.eq(proposta_id))
            .filter(proposta_coorientador::coorientador_id.eq(docente_id)),
    ))
    .get_result(conn)
}

/// Eliminar é mais restrito do que editar: apenas o orientador.
pub fn can_delete_proposta(proposta: &Proposta, docente_id: i32) -> bool {
    proposta.orientador_id == docente_id
}

/// Decidir candidaturas é um direito do orientador; coorientadores podem
/// editar a proposta mas não decidir sobre candidatos.
pub fn can_decide_candidatura(orientador_id: i32, docente_id: i32) -> bool {
    orientador_id == docente_id
}

/// Visibilidade de uma candidatura e dos seus anexos: o aluno que a submeteu
/// ou o orientador da proposta alvo.
pub fn can_view_candidatura(
    candidatura_aluno_id: i32,
    proposta_orientador_id: i32,
    actor_id: i32,
    actor_tipo: &str,
) -> bool {
    match actor_tipo {
        "aluno" => candidatura_aluno_id == actor_id,
        "docente" => proposta_orientador_id == actor_id,
        "administrador" => true,
        _ => false,
    }
}
