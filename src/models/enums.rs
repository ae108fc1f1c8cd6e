use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Variants are declared in ascending order, so the derived Ord gives
/// the fixed severity rankings used for every sort and tie-break.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(InteractionSeverity {
    Caution => "caution",
    Warning => "warning",
    Contraindicated => "contraindicated",
});

str_enum!(AllergySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    LifeThreatening => "life_threatening",
});

str_enum!(AllergyCategory {
    Herb => "herb",
    Drug => "drug",
    Food => "food",
    Environmental => "environmental",
    Other => "other",
});

str_enum!(EntryState {
    Active => "active",
    Removed => "removed",
});

str_enum!(AllergyEventKind {
    Added => "added",
    Removed => "removed",
    Restored => "restored",
});
