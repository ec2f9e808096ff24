use serde::{Deserialize, Deserializer};

/// Distingue "campo ausente" de "campo presente a null" em atualizações
/// parciais. Ausente fica `None`; `null` explícito fica `Some(None)` e limpa
/// a coluna.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
