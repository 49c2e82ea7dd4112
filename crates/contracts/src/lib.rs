//! Общие типы данных интеграции Amazon SP-API → ERP.
//!
//! Крейт не зависит от БД и HTTP: здесь только агрегаты, DTO use-case'ов
//! и системные типы, которые сериализуются между слоями.

pub mod domain;
pub mod enums;
pub mod shared;
pub mod system;
pub mod usecases;
