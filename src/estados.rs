use std::fmt;

/// Estado de uma proposta. Só propostas publicadas aceitam candidaturas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropostaEstado {
    Rascunho,
    Publicada,
    Aprovada,
    Arquivada,
}

impl PropostaEstado {
    pub const TODOS: &'static [PropostaEstado] = &[
        PropostaEstado::Rascunho,
        PropostaEstado::Publicada,
        PropostaEstado::Aprovada,
        PropostaEstado::Arquivada,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rascunho" => Some(PropostaEstado::Rascunho),
            "publicada" => Some(PropostaEstado::Publicada),
            "aprovada" => Some(PropostaEstado::Aprovada),
            "arquivada" => Some(PropostaEstado::Arquivada),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropostaEstado::Rascunho => "rascunho",
            PropostaEstado::Publicada => "publicada",
            PropostaEstado::Aprovada => "aprovada",
            PropostaEstado::Arquivada => "arquivada",
        }
    }

    pub fn valores() -> String {
        Self::TODOS
            .iter()
            .map(|estado| estado.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PropostaEstado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estado de uma candidatura. `Pendente` é o estado inicial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidaturaEstado {
    Pendente,
    Aceite,
    Rejeitada,
}

impl CandidaturaEstado {
    pub const TODOS: &'static [CandidaturaEstado] = &[
        CandidaturaEstado::Pendente,
        CandidaturaEstado::Aceite,
        CandidaturaEstado::Rejeitada,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendente" => Some(CandidaturaEstado::Pendente),
            "aceite" => Some(CandidaturaEstado::Aceite),
            "rejeitada" => Some(CandidaturaEstado::Rejeitada),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CandidaturaEstado::Pendente => "pendente",
            CandidaturaEstado::Aceite => "aceite",
            CandidaturaEstado::Rejeitada => "rejeitada",
        }
    }

    pub fn valores() -> String {
        Self::TODOS
            .iter()
            .map(|estado| estado.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Tabela de transições legais. O regresso a `pendente` é permitido: o
    /// docente pode reconsiderar uma decisão já tomada.
    pub fn transicao_permitida(self, para: CandidaturaEstado) -> bool {
        use CandidaturaEstado::*;
        matches!(
            (self, para),
            (Pendente, Aceite)
                | (Pendente, Rejeitada)
                | (Aceite, Pendente)
                | (Aceite, Rejeitada)
                | (Rejeitada, Pendente)
                | (Rejeitada, Aceite)
                | (Pendente, Pendente)
                | (Aceite, Aceite)
                | (Rejeitada, Rejeitada)
        )
    }
}

impl fmt::Display for CandidaturaEstado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
