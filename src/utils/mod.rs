pub mod json;
pub mod resposta;
pub mod upload;
