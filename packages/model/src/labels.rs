use serde::{Deserialize, Serialize};
use std::fmt;

/// Output classes of the brain-scan model, in the order of the final layer's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TumorClass {
    Glioma,
    Meningioma,
    #[serde(rename = "notumor")]
    NoTumor,
    Pituitary,
}

impl TumorClass {
    pub const ALL: [TumorClass; 4] = [
        TumorClass::Glioma,
        TumorClass::Meningioma,
        TumorClass::NoTumor,
        TumorClass::Pituitary,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TumorClass::Glioma => "glioma",
            TumorClass::Meningioma => "meningioma",
            TumorClass::NoTumor => "notumor",
            TumorClass::Pituitary => "pituitary",
        }
    }
}

impl fmt::Display for TumorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_output_columns() {
        for (i, class) in TumorClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(TumorClass::from_index(i), Some(*class));
        }
        assert_eq!(TumorClass::from_index(4), None);
    }

    #[test]
    fn serializes_as_label_string() {
        let json = serde_json::to_string(&TumorClass::NoTumor).unwrap();
        assert_eq!(json, "\"notumor\"");
        assert_eq!(TumorClass::Meningioma.to_string(), "meningioma");
    }
}
