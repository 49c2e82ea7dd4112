use super::{EntityMetadata, Origin};

/// Трейт для корня агрегата
///
/// Определяет обязательные методы и метаданные для всех документов системы
pub trait AggregateRoot {
    /// Тип идентификатора агрегата
    type Id;

    // ============================================================================
    // Методы экземпляра
    // ============================================================================

    fn id(&self) -> Self::Id;

    /// Бизнес-код записи (имя документа, например "ACC-SINV-2024-00001")
    fn code(&self) -> &str;

    fn description(&self) -> &str;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    // ============================================================================
    // Метаданные класса агрегата
    // ============================================================================

    /// Индекс агрегата в системе (например, "a005")
    fn aggregate_index() -> &'static str;

    /// Имя коллекции для БД (например, "sales_invoice")
    fn collection_name() -> &'static str;

    /// Имя элемента (единственное число)
    fn element_name() -> &'static str;

    /// Имя списка (множественное число)
    fn list_name() -> &'static str;

    fn origin() -> Origin;

    /// Полное имя агрегата, совпадает с именем таблицы (например, "a005_sales_invoice")
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
