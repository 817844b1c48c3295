use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Movement category an exercise trains. Names are lowercase Dutch words and
/// are matched exactly (case-sensitive).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementForm {
    Klimmen,
    Balans,
    Mikken,
    Gooien,
    Springen,
    Zwaaien,
    Rollen,
    Hardlopen,
    Overspelen,
    Stoeien,
}

impl MovementForm {
    pub const ALL: [MovementForm; 10] = [
        MovementForm::Klimmen,
        MovementForm::Balans,
        MovementForm::Mikken,
        MovementForm::Gooien,
        MovementForm::Springen,
        MovementForm::Zwaaien,
        MovementForm::Rollen,
        MovementForm::Hardlopen,
        MovementForm::Overspelen,
        MovementForm::Stoeien,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementForm::Klimmen => "klimmen",
            MovementForm::Balans => "balans",
            MovementForm::Mikken => "mikken",
            MovementForm::Gooien => "gooien",
            MovementForm::Springen => "springen",
            MovementForm::Zwaaien => "zwaaien",
            MovementForm::Rollen => "rollen",
            MovementForm::Hardlopen => "hardlopen",
            MovementForm::Overspelen => "overspelen",
            MovementForm::Stoeien => "stoeien",
        }
    }
}

impl core::fmt::Display for MovementForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown movement form '{0}'")]
pub struct UnknownMovementForm(pub String);

impl FromStr for MovementForm {
    type Err = UnknownMovementForm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementForm::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownMovementForm(s.to_string()))
    }
}

/// De-duplicate forms, keeping first occurrences in order.
pub fn dedup_forms(forms: &[MovementForm]) -> Vec<MovementForm> {
    let mut out = Vec::with_capacity(forms.len());
    for f in forms {
        if !out.contains(f) {
            out.push(*f);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for form in MovementForm::ALL {
            assert_eq!(form.as_str().parse::<MovementForm>().unwrap(), form);
        }
        assert!("Klimmen".parse::<MovementForm>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&MovementForm::Hardlopen).unwrap();
        assert_eq!(json, "\"hardlopen\"");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        use MovementForm::*;
        assert_eq!(dedup_forms(&[Rollen, Balans, Rollen]), vec![Rollen, Balans]);
    }
}
