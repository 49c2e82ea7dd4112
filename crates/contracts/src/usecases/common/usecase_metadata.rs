/// Метаданные UseCase для идентификации и документирования
pub trait UseCaseMetadata {
    /// Индекс UseCase (например, "u501")
    fn usecase_index() -> &'static str;

    /// Техническое имя (например, "process_mtr")
    fn usecase_name() -> &'static str;

    fn display_name() -> &'static str;

    /// Полное имя вида "u501_process_mtr"
    fn full_name() -> String {
        format!("{}_{}", Self::usecase_index(), Self::usecase_name())
    }
}
