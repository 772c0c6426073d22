pub mod db;
pub mod error;
pub mod schema;
pub use db::{ IndexStore, create_index_store, create_indexes_from_file, get_store_type, StoreType, IndexStoreConfig };
pub use error::IndexError;
pub use schema::{
    Field,
    FieldOptions,
    FieldType,
    NumericFieldOptions,
    Options,
    Schema,
    SchemaFile,
    TagFieldOptions,
    TextFieldOptions,
    DEFAULT_OPTIONS,
};
