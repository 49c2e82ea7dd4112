pub mod item_lookup_field;
pub mod tax_column;

pub use item_lookup_field::ItemLookupField;
pub use tax_column::TaxColumn;
