use serde::{Deserialize, Deserializer};

/// Mise à jour partielle d'un champ optionnel
///
/// - clé absente ou "" : on garde la valeur stockée
/// - `null`            : on efface
/// - une valeur        : on remplace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }
}

impl Patch<String> {
    pub fn set(value: impl Into<String>) -> Self {
        Patch::Set(value.into())
    }
}

// Utiliser avec #[serde(default)] pour que l'absence donne Keep
impl<'de> Deserialize<'de> for Patch<String> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => Patch::Clear,
            Some(s) if s.is_empty() => Patch::Keep,
            Some(s) => Patch::Set(s),
        })
    }
}
