//! Monitor de inatividade de sessão.
//!
//! Lógica pura sobre timestamps injetados: o cliente regista atividade nos
//! eventos de interação e chama [`MonitorSessao::tick`] uma vez por segundo.
//! Quando o tempo inativo excede o limite, o monitor devolve `Expirada` uma
//! única vez e desarma-se, pelo que o teardown (limpar o estado de
//! autenticação e navegar para a página inicial) nunca é repetido.

use std::time::Instant;

#[derive(Clone, Copy, Debug)]
pub struct ConfigSessao {
    pub minutos_expiracao: u64,
    pub segundos_aviso: u64,
}

impl Default for ConfigSessao {
    fn default() -> Self {
        Self {
            minutos_expiracao: 30,
            segundos_aviso: 60,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EstadoSessao {
    /// Monitor parado (sem sessão autenticada).
    Inativa,
    Ativa {
        restante_segundos: u64,
        /// Últimos segundos antes da expiração; a UI mostra o countdown em
        /// alerta.
        em_alerta: bool,
    },
    /// Emitido exatamente uma vez; o monitor fica desarmado a seguir.
    Expirada,
}

#[derive(Debug)]
pub struct MonitorSessao {
    config: ConfigSessao,
    ultima_atividade: Option<Instant>,
}

impl MonitorSessao {
    pub fn new(config: ConfigSessao) -> Self {
        Self {
            config,
            ultima_atividade: None,
        }
    }

    pub fn ativo(&self) -> bool {
        self.ultima_atividade.is_some()
    }

    /// Arma o monitor. Chamar com o monitor já armado apenas reinicia o
    /// relógio de atividade.
    pub fn iniciar(&mut self, agora: Instant) {
        self.ultima_atividade = Some(agora);
    }

    /// Desarma o monitor. Seguro chamar antes de `iniciar` ou duas vezes.
    pub fn parar(&mut self) {
        self.ultima_atividade = None;
    }

    /// Regista interação do utilizador e limpa o estado de alerta.
    pub fn registar_atividade(&mut self, agora: Instant) {
        if self.ultima_atividade.is_some() {
            self.ultima_atividade = Some(agora);
        }
    }

    pub fn tick(&mut self, agora: Instant) -> EstadoSessao {
        let Some(ultima) = self.ultima_atividade else {
            return EstadoSessao::Inativa;
        };

        let expiracao_segundos = self.config.minutos_expiracao * 60;
        let inativo = agora.saturating_duration_since(ultima).as_secs();

        if inativo >= expiracao_segundos {
            self.parar();
            return EstadoSessao::Expirada;
        }

        let restante_segundos = expiracao_segundos - inativo;
        EstadoSessao::Ativa {
            restante_segundos,
            em_alerta: restante_segundos <= self.config.segundos_aviso,
        }
    }
}

/// Formata segundos restantes como `m:ss` para o countdown.
pub fn formatar_tempo(segundos: u64) -> String {
    format!("{}:{:02}", segundos / 60, segundos % 60)
}
