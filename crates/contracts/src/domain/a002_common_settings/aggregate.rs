use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор общих настроек (запись-синглтон)
    CommonSettingsId
);

pub const GST_CATEGORY_REGISTERED: &str = "Registered Regular";
pub const GST_CATEGORY_UNREGISTERED: &str = "Unregistered";

/// Код единственной записи общих настроек
pub const COMMON_SETTINGS_CODE: &str = "common";

/// Общие для всех продавцов параметры учёта: B2C-клиент, налоговые
/// категории и счета налогов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonSettings {
    #[serde(flatten)]
    pub base: BaseAggregate<CommonSettingsId>,

    /// Клиент-заглушка, на которого оформляются все B2C-заказы
    pub b2c_customer: String,
    pub in_state_tax_category: String,
    pub out_state_tax_category: String,
    pub cgst_account: Option<String>,
    pub sgst_account: Option<String>,
    pub igst_account: Option<String>,
}

/// Вид налога в строке налогов счета
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GstComponent {
    Cgst,
    Sgst,
    Igst,
}

impl GstComponent {
    pub fn label(&self) -> &'static str {
        match self {
            GstComponent::Cgst => "CGST",
            GstComponent::Sgst => "SGST",
            GstComponent::Igst => "IGST",
        }
    }
}

impl CommonSettings {
    pub fn new_default() -> Self {
        Self {
            base: BaseAggregate::new(
                CommonSettingsId::new_v4(),
                COMMON_SETTINGS_CODE.to_string(),
                "Amazon SP common settings".to_string(),
            ),
            b2c_customer: String::new(),
            in_state_tax_category: "In-State".to_string(),
            out_state_tax_category: "Out-State".to_string(),
            cgst_account: None,
            sgst_account: None,
            igst_account: None,
        }
    }

    /// Налоговая категория счета по ставкам первой строки заказа:
    /// SGST → внутри штата, IGST → между штатами, иначе пусто.
    pub fn tax_category_for(&self, sgst_rate: Option<f64>, igst_rate: Option<f64>) -> String {
        if sgst_rate.map(|r| r > 0.0).unwrap_or(false) {
            self.in_state_tax_category.clone()
        } else if igst_rate.map(|r| r > 0.0).unwrap_or(false) {
            self.out_state_tax_category.clone()
        } else {
            String::new()
        }
    }

    pub fn gst_category_for(gstin: Option<&str>) -> &'static str {
        match gstin.map(str::trim) {
            Some(g) if !g.is_empty() => GST_CATEGORY_REGISTERED,
            _ => GST_CATEGORY_UNREGISTERED,
        }
    }

    pub fn account_for(&self, component: GstComponent) -> Option<&str> {
        let account = match component {
            GstComponent::Cgst => &self.cgst_account,
            GstComponent::Sgst => &self.sgst_account,
            GstComponent::Igst => &self.igst_account,
        };
        account.as_deref().filter(|a| !a.trim().is_empty())
    }

    pub fn update(&mut self, dto: &CommonSettingsDto) {
        self.b2c_customer = dto.b2c_customer.clone();
        if let Some(v) = &dto.in_state_tax_category {
            self.in_state_tax_category = v.clone();
        }
        if let Some(v) = &dto.out_state_tax_category {
            self.out_state_tax_category = v.clone();
        }
        self.cgst_account = dto.cgst_account.clone();
        self.sgst_account = dto.sgst_account.clone();
        self.igst_account = dto.igst_account.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.in_state_tax_category.trim().is_empty()
            || self.out_state_tax_category.trim().is_empty()
        {
            return Err("Tax categories must not be empty".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.code = COMMON_SETTINGS_CODE.to_string();
        self.base.touch();
    }
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self::new_default()
    }
}

impl AggregateRoot for CommonSettings {
    type Id = CommonSettingsId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "common_settings"
    }

    fn element_name() -> &'static str {
        "Amazon SP Common Settings"
    }

    fn list_name() -> &'static str {
        "Amazon SP Common Settings"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommonSettingsDto {
    pub b2c_customer: String,
    pub in_state_tax_category: Option<String>,
    pub out_state_tax_category: Option<String>,
    pub cgst_account: Option<String>,
    pub sgst_account: Option<String>,
    pub igst_account: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_category_prefers_sgst() {
        let s = CommonSettings::new_default();
        assert_eq!(s.tax_category_for(Some(0.05), None), "In-State");
        assert_eq!(s.tax_category_for(Some(0.0), Some(0.18)), "Out-State");
        assert_eq!(s.tax_category_for(None, None), "");
    }

    #[test]
    fn test_gst_category() {
        assert_eq!(
            CommonSettings::gst_category_for(Some("29ABCDE1234F1Z5")),
            GST_CATEGORY_REGISTERED
        );
        assert_eq!(CommonSettings::gst_category_for(Some("  ")), GST_CATEGORY_UNREGISTERED);
        assert_eq!(CommonSettings::gst_category_for(None), GST_CATEGORY_UNREGISTERED);
    }

    #[test]
    fn test_blank_account_is_missing() {
        let mut s = CommonSettings::new_default();
        s.sgst_account = Some(" ".into());
        s.igst_account = Some("IGST - AC".into());
        assert_eq!(s.account_for(GstComponent::Sgst), None);
        assert_eq!(s.account_for(GstComponent::Igst), Some("IGST - AC"));
    }
}
