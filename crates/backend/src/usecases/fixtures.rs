//! Справочники для тестов use case'ов

use contracts::domain::a001_amazon_sp_settings::aggregate::{AmazonSpSettings, AmazonSpSettingsDto};
use contracts::domain::a002_common_settings::aggregate::CommonSettingsDto;
use contracts::domain::a009_item::aggregate::ItemDto;
use contracts::domain::a010_warehouse::aggregate::WarehouseDto;
use contracts::domain::a011_item_tax_template::aggregate::ItemTaxTemplateDto;
use contracts::enums::TaxColumn;
use sea_orm::DatabaseConnection;

use crate::domain::{
    a001_amazon_sp_settings, a002_common_settings, a009_item, a010_warehouse,
    a011_item_tax_template,
};
use crate::shared::data::db::connect_in_memory;

pub const SETTINGS_CODE: &str = "IN-MAIN";
pub const COMPANY: &str = "Test Co";

/// База с настройками продавца, товарами, складом и шаблонами налогов
pub async fn seeded_db() -> (DatabaseConnection, AmazonSpSettings) {
    let db = connect_in_memory().await;

    a001_amazon_sp_settings::service::create(
        &db,
        AmazonSpSettingsDto {
            code: Some(SETTINGS_CODE.into()),
            description: "India seller".into(),
            company: COMPANY.into(),
            is_enabled: true,
            client_id: "amzn1.application-oa2-client.x".into(),
            client_secret: Some("secret".into()),
            application_id: "amzn1.sp.solution.x".into(),
            marketplace_id: "A21TJRUUN4KGV".into(),
            debit_to: Some("Debtors - TC".into()),
            default_warehouse: Some("Stores - TC".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    a001_amazon_sp_settings::repository::set_refresh_token(&db, SETTINGS_CODE, "Atzr|token")
        .await
        .unwrap();

    a002_common_settings::service::save(
        &db,
        CommonSettingsDto {
            b2c_customer: "Amazon B2C".into(),
            cgst_account: Some("Output CGST - TC".into()),
            sgst_account: Some("Output SGST - TC".into()),
            igst_account: Some("Output IGST - TC".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    for (code, sku, asin) in [("ITEM1", "SKU1", "B0ASIN1"), ("ITEM2", "SKU2", "B0ASIN2")] {
        a009_item::service::create(
            &db,
            ItemDto {
                item_code: code.into(),
                item_name: format!("{} name", code),
                amazon_sku: Some(sku.into()),
                asin: Some(asin.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    a010_warehouse::service::create(
        &db,
        WarehouseDto {
            id: None,
            name: "Amazon BOM7 - TC".into(),
            company: COMPANY.into(),
            fba_fulfilment_center: Some("BOM7".into()),
        },
    )
    .await
    .unwrap();

    for (name, column, rate) in [
        ("GST 5% In State", TaxColumn::InState, 0.05),
        ("GST 5% Out State", TaxColumn::OutState, 0.05),
        ("GST 18% Out State", TaxColumn::OutState, 0.18),
    ] {
        a011_item_tax_template::service::create(
            &db,
            ItemTaxTemplateDto {
                id: None,
                name: name.into(),
                company: Some(COMPANY.into()),
                mtr_tax_column: column,
                mtr_tax_rate: rate,
            },
        )
        .await
        .unwrap();
    }

    let settings = a001_amazon_sp_settings::service::resolve(&db, Some(SETTINGS_CODE))
        .await
        .unwrap();
    (db, settings)
}
