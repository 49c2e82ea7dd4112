use serde::{Deserialize, Serialize};

/// Колонка налога в MTR-отчёте, к которой привязан шаблон налога товара.
///
/// SGST/CGST означают поставку внутри штата, IGST - между штатами.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxColumn {
    #[serde(rename = "In State")]
    InState,
    #[serde(rename = "Out State")]
    OutState,
}

impl TaxColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxColumn::InState => "In State",
            TaxColumn::OutState => "Out State",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "In State" => Some(TaxColumn::InState),
            "Out State" => Some(TaxColumn::OutState),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaxColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
