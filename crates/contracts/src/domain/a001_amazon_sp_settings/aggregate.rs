use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use crate::enums::ItemLookupField;
use serde::{Deserialize, Serialize};

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор настроек подключения к Amazon SP-API
    AmazonSpSettingsId
);

/// Серия нумерации счетов по умолчанию
pub const DEFAULT_INVOICE_SERIES: &str = "ACC-SINV-.YYYY.-";

/// Тип отчёта, который заказывается по расписанию, если в настройках пусто
pub const DEFAULT_REPORT_TYPE: &str = "GET_GST_MTR_B2B_CUSTOM";

// ============================================================================
// Aggregate Root
// ============================================================================

/// Настройки одного аккаунта продавца (tenant).
///
/// `code` - имя настроек, по нему ссылаются отчёты и журнал заказов.
/// Refresh token записывается только OAuth-обработчиком, остальные поля
/// заполняет администратор.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmazonSpSettings {
    #[serde(flatten)]
    pub base: BaseAggregate<AmazonSpSettingsId>,

    /// Организация ERP, от имени которой выставляются счета
    pub company: String,
    pub is_default: bool,
    pub is_enabled: bool,

    // LWA / OAuth
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    pub application_id: String,
    pub seller_central_url: String,
    pub oauth_path: String,
    pub oauth_redirect_uri: String,
    /// Переопределяет `sp_api.token_url` из конфигурации
    pub oauth_token_url: Option<String>,
    /// Внешний адрес сервиса для redirect_uri (иначе `server.public_base_url`)
    pub public_base_url: Option<String>,

    // SP-API
    pub marketplace_id: String,
    /// Переопределяет `sp_api.endpoint` из конфигурации (sandbox, другой регион)
    pub sp_api_endpoint: Option<String>,
    pub report_types: Vec<String>,
    /// Глубина выборки заказов по умолчанию, в днях
    pub orders_created_after_days: i64,

    // Параметры создаваемых документов
    pub sales_invoice_series: Option<String>,
    pub debit_to: Option<String>,
    pub default_warehouse: Option<String>,
    pub customer_group: String,
    pub territory: String,
    pub customer_type: String,
    pub item_lookup_field: ItemLookupField,
}

impl AmazonSpSettings {
    /// Создать новые настройки для вставки в БД
    pub fn new_for_insert(
        code: String,
        description: String,
        company: String,
        client_id: String,
        client_secret: String,
        application_id: String,
        marketplace_id: String,
    ) -> Self {
        Self {
            base: BaseAggregate::new(AmazonSpSettingsId::new_v4(), code, description),
            company,
            is_default: false,
            is_enabled: true,
            client_id,
            client_secret,
            refresh_token: None,
            application_id,
            seller_central_url: "https://sellercentral.amazon.in".to_string(),
            oauth_path: "/apps/authorize/consent".to_string(),
            oauth_redirect_uri: "/oauth/redirect".to_string(),
            oauth_token_url: None,
            public_base_url: None,
            marketplace_id,
            sp_api_endpoint: None,
            report_types: vec![DEFAULT_REPORT_TYPE.to_string()],
            orders_created_after_days: 1,
            sales_invoice_series: None,
            debit_to: None,
            default_warehouse: None,
            customer_group: "All Customer Groups".to_string(),
            territory: "India".to_string(),
            customer_type: "Company".to_string(),
            item_lookup_field: ItemLookupField::default(),
        }
    }

    pub fn to_string_id(&self) -> String {
        use crate::domain::common::AggregateId;
        self.base.id.as_string()
    }

    /// Обновить данные из DTO. Refresh token не трогаем: его пишет только OAuth.
    pub fn update(&mut self, dto: &AmazonSpSettingsDto) {
        if let Some(code) = &dto.code {
            self.base.code = code.clone();
        }
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        self.company = dto.company.clone();
        self.is_default = dto.is_default;
        self.is_enabled = dto.is_enabled;
        self.client_id = dto.client_id.clone();
        if let Some(secret) = dto.client_secret.as_ref().filter(|s| !s.is_empty()) {
            self.client_secret = secret.clone();
        }
        self.application_id = dto.application_id.clone();
        self.marketplace_id = dto.marketplace_id.clone();
        if let Some(v) = &dto.seller_central_url {
            self.seller_central_url = v.clone();
        }
        if let Some(v) = &dto.oauth_path {
            self.oauth_path = v.clone();
        }
        if let Some(v) = &dto.oauth_redirect_uri {
            self.oauth_redirect_uri = v.clone();
        }
        self.oauth_token_url = dto.oauth_token_url.clone();
        self.public_base_url = dto.public_base_url.clone();
        self.sp_api_endpoint = dto.sp_api_endpoint.clone();
        if let Some(types) = &dto.report_types {
            self.report_types = types.clone();
        }
        if let Some(days) = dto.orders_created_after_days {
            self.orders_created_after_days = days;
        }
        self.sales_invoice_series = dto.sales_invoice_series.clone();
        self.debit_to = dto.debit_to.clone();
        self.default_warehouse = dto.default_warehouse.clone();
        if let Some(v) = &dto.customer_group {
            self.customer_group = v.clone();
        }
        if let Some(v) = &dto.territory {
            self.territory = v.clone();
        }
        if let Some(v) = &dto.customer_type {
            self.customer_type = v.clone();
        }
        if let Some(field) = dto.item_lookup_field {
            self.item_lookup_field = field;
        }
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Settings name must not be empty".into());
        }
        if self.company.trim().is_empty() {
            return Err("Company must be set".into());
        }
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err("LWA client id and client secret are required".into());
        }
        if self.marketplace_id.trim().is_empty() {
            return Err("Marketplace id must be set".into());
        }
        if self.orders_created_after_days <= 0 {
            return Err("orders_created_after_days must be positive".into());
        }
        if !self.seller_central_url.starts_with("https://")
            && !self.seller_central_url.starts_with("http://")
        {
            return Err("Seller Central URL must be an absolute http(s) URL".into());
        }
        Ok(())
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.report_types.retain(|t| !t.trim().is_empty());
        self.report_types.dedup();
        self.base.touch();
    }

    /// Есть ли refresh token (пройдена ли авторизация продавца)
    pub fn is_authorized(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Типы отчётов для заказа по расписанию
    pub fn effective_report_types(&self) -> Vec<String> {
        if self.report_types.is_empty() {
            vec![DEFAULT_REPORT_TYPE.to_string()]
        } else {
            self.report_types.clone()
        }
    }

    pub fn invoice_series(&self) -> &str {
        self.sales_invoice_series
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_INVOICE_SERIES)
    }

    /// Префикс имени счета для года проводки: `ACC-SINV-.YYYY.-` → `ACC-SINV-2024-`
    pub fn invoice_name_prefix(&self, year: i32) -> String {
        self.invoice_series()
            .replace(".YYYY.", &year.to_string())
            .replace(".YY.", &format!("{:02}", year % 100))
    }
}

impl AggregateRoot for AmazonSpSettings {
    type Id = AmazonSpSettingsId;

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
        "a001"
    }

    fn collection_name() -> &'static str {
        "amazon_sp_settings"
    }

    fn element_name() -> &'static str {
        "Amazon SP Settings"
    }

    fn list_name() -> &'static str {
        "Amazon SP Settings"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания/обновления настроек
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AmazonSpSettingsDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub description: String,
    pub comment: Option<String>,
    pub company: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    pub client_id: String,
    /// Пустое значение при обновлении оставляет прежний секрет
    pub client_secret: Option<String>,
    pub application_id: String,
    pub marketplace_id: String,
    pub seller_central_url: Option<String>,
    pub oauth_path: Option<String>,
    pub oauth_redirect_uri: Option<String>,
    pub oauth_token_url: Option<String>,
    pub public_base_url: Option<String>,
    pub sp_api_endpoint: Option<String>,
    pub report_types: Option<Vec<String>>,
    pub orders_created_after_days: Option<i64>,
    pub sales_invoice_series: Option<String>,
    pub debit_to: Option<String>,
    pub default_warehouse: Option<String>,
    pub customer_group: Option<String>,
    pub territory: Option<String>,
    pub customer_type: Option<String>,
    pub item_lookup_field: Option<ItemLookupField>,
}

fn default_true() -> bool {
    true
}

/// Представление настроек для API: секреты не отдаются наружу
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmazonSpSettingsView {
    #[serde(flatten)]
    pub settings: AmazonSpSettings,
    pub is_authorized: bool,
}

impl From<AmazonSpSettings> for AmazonSpSettingsView {
    fn from(mut settings: AmazonSpSettings) -> Self {
        let is_authorized = settings.is_authorized();
        settings.client_secret = "****".to_string();
        settings.refresh_token = settings.refresh_token.map(|_| "****".to_string());
        Self {
            settings,
            is_authorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AmazonSpSettings {
        AmazonSpSettings::new_for_insert(
            "Default".into(),
            "Main seller account".into(),
            "Acme India".into(),
            "amzn1.application-oa2-client.x".into(),
            "secret".into(),
            "amzn1.sp.solution.x".into(),
            "A21TJRUUN4KGV".into(),
        )
    }

    #[test]
    fn test_invoice_name_prefix_expands_year() {
        let mut s = sample();
        assert_eq!(s.invoice_name_prefix(2024), "ACC-SINV-2024-");
        s.sales_invoice_series = Some("AMZ-.YY.-".into());
        assert_eq!(s.invoice_name_prefix(2024), "AMZ-24-");
        s.sales_invoice_series = Some("  ".into());
        assert_eq!(s.invoice_series(), DEFAULT_INVOICE_SERIES);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut s = sample();
        assert!(s.validate().is_ok());
        s.client_secret = String::new();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_update_keeps_secret_and_refresh_token() {
        let mut s = sample();
        s.refresh_token = Some("Atzr|token".into());
        let dto = AmazonSpSettingsDto {
            description: "Renamed".into(),
            company: "Acme India".into(),
            client_id: "new-client".into(),
            client_secret: Some(String::new()),
            application_id: "app".into(),
            marketplace_id: "A21TJRUUN4KGV".into(),
            is_enabled: true,
            ..Default::default()
        };
        s.update(&dto);
        assert_eq!(s.client_secret, "secret");
        assert_eq!(s.client_id, "new-client");
        assert!(s.is_authorized());
    }

    #[test]
    fn test_view_masks_secrets() {
        let mut s = sample();
        s.refresh_token = Some("Atzr|token".into());
        let view = AmazonSpSettingsView::from(s);
        assert!(view.is_authorized);
        assert_eq!(view.settings.client_secret, "****");
        assert_eq!(view.settings.refresh_token.as_deref(), Some("****"));
    }

    #[test]
    fn test_effective_report_types_default() {
        let mut s = sample();
        s.report_types.clear();
        assert_eq!(s.effective_report_types(), vec![DEFAULT_REPORT_TYPE.to_string()]);
    }
}
