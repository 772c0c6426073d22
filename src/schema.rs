use log::{ debug, info };
use serde::{ Deserialize, Serialize };
use std::path::Path;

use crate::error::IndexError;

/// Kind of value a field holds and how the engine indexes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Full-text field.
    Text,
    /// Numeric range field.
    Numeric,
    /// Geo-indexed point field.
    Geo,
    /// Compact exact-match field holding separated values.
    Tag,
}

/// Index-wide flags, fixed when the index is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Keep only the index, not the original field values.
    pub no_save: bool,
    /// Skip per-term field bits. Saves memory, disables filtering by field.
    pub no_field_flags: bool,
    /// Skip term frequencies. Disables frequency-based ranking.
    pub no_frequencies: bool,
    /// Skip term offsets. Disables exact phrase search and highlighting.
    pub no_offset_vectors: bool,
    /// Custom stopword list. `None` keeps the engine's default list,
    /// an empty list disables stopwords.
    pub stopwords: Option<Vec<String>>,
}

pub const DEFAULT_OPTIONS: Options = Options {
    no_save: false,
    no_field_flags: false,
    no_frequencies: false,
    no_offset_vectors: false,
    stopwords: None,
};

pub const DEFAULT_TAG_SEPARATOR: u8 = b',';
pub const DEFAULT_TEXT_WEIGHT: f32 = 1.0;

/// Options for text fields.
///
/// `sortable` is written next to the field name in schema files, not with
/// the options, so it is skipped here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextFieldOptions {
    /// Relevance multiplier for matches in this field. 1.0 is neutral.
    pub weight: f32,
    #[serde(skip)]
    pub sortable: bool,
    /// Index terms as written, without stemming.
    pub no_stem: bool,
    /// Keep the value for sorting and retrieval but leave it out of the index.
    pub no_index: bool,
}

impl Default for TextFieldOptions {
    fn default() -> Self {
        Self {
            weight: DEFAULT_TEXT_WEIGHT,
            sortable: false,
            no_stem: false,
            no_index: false,
        }
    }
}

/// Options for tag fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFieldOptions {
    /// Byte between tags inside one value.
    #[serde(with = "separator")]
    pub separator: u8,
    /// Keep the value for sorting and retrieval but leave it out of the index.
    pub no_index: bool,
    #[serde(skip)]
    pub sortable: bool,
}

impl Default for TagFieldOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_TAG_SEPARATOR,
            no_index: false,
            sortable: false,
        }
    }
}

/// Options for numeric fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericFieldOptions {
    #[serde(skip)]
    pub sortable: bool,
    /// Keep the value for sorting and retrieval but leave it out of the index.
    pub no_index: bool,
}

/// Per-type options. The variant decides the field's [`FieldType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldOptions {
    Text(TextFieldOptions),
    Numeric(NumericFieldOptions),
    Geo,
    Tag(TagFieldOptions),
}

impl FieldOptions {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldOptions::Text(_) => FieldType::Text,
            FieldOptions::Numeric(_) => FieldType::Numeric,
            FieldOptions::Geo => FieldType::Geo,
            FieldOptions::Tag(_) => FieldType::Tag,
        }
    }

    pub fn sortable(&self) -> bool {
        match self {
            FieldOptions::Text(o) => o.sortable,
            FieldOptions::Numeric(o) => o.sortable,
            FieldOptions::Tag(o) => o.sortable,
            FieldOptions::Geo => false,
        }
    }

    fn set_sortable(&mut self, sortable: bool) {
        match self {
            FieldOptions::Text(o) => {
                o.sortable = sortable;
            }
            FieldOptions::Numeric(o) => {
                o.sortable = sortable;
            }
            FieldOptions::Tag(o) => {
                o.sortable = sortable;
            }
            FieldOptions::Geo => {}
        }
    }
}

/// One entry of an index schema.
///
/// `sortable` mirrors the flag inside `options`. The constructors keep the two in
/// sync; code that sets either one directly is responsible for the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldRecord", into = "FieldRecord")]
pub struct Field {
    pub name: String,
    pub sortable: bool,
    pub options: FieldOptions,
}

impl Field {
    fn with_options(name: impl Into<String>, options: FieldOptions) -> Self {
        Self {
            name: name.into(),
            sortable: options.sortable(),
            options,
        }
    }

    /// Text field with weight 1.0 and every flag off.
    pub fn text(name: impl Into<String>) -> Self {
        Self::with_options(name, FieldOptions::Text(TextFieldOptions::default()))
    }

    /// Text field using `opts` as given. `sortable` follows `opts.sortable`.
    pub fn text_with_options(name: impl Into<String>, opts: TextFieldOptions) -> Self {
        Self::with_options(name, FieldOptions::Text(opts))
    }

    /// Text field with the given weight and a sortable copy kept by the engine.
    pub fn sortable_text(name: impl Into<String>, weight: f32) -> Self {
        Self::text_with_options(name, TextFieldOptions {
            weight,
            sortable: true,
            ..TextFieldOptions::default()
        })
    }

    /// Tag field separated by `,`.
    pub fn tag(name: impl Into<String>) -> Self {
        Self::with_options(name, FieldOptions::Tag(TagFieldOptions::default()))
    }

    /// Tag field using `opts` as given. `sortable` follows `opts.sortable`.
    pub fn tag_with_options(name: impl Into<String>, opts: TagFieldOptions) -> Self {
        Self::with_options(name, FieldOptions::Tag(opts))
    }

    /// Numeric field, neither sortable nor hidden from the index.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::with_options(name, FieldOptions::Numeric(NumericFieldOptions::default()))
    }

    /// Numeric field using `opts` as given. `sortable` follows `opts.sortable`.
    pub fn numeric_with_options(name: impl Into<String>, opts: NumericFieldOptions) -> Self {
        Self::with_options(name, FieldOptions::Numeric(opts))
    }

    /// Numeric field with a sortable copy kept by the engine.
    pub fn sortable_numeric(name: impl Into<String>) -> Self {
        Self::numeric_with_options(name, NumericFieldOptions {
            sortable: true,
            no_index: false,
        })
    }

    /// Geo point field. Geo fields have no per-type options, so only the
    /// top-level `sortable` flag applies to them.
    pub fn geo(name: impl Into<String>) -> Self {
        Self::with_options(name, FieldOptions::Geo)
    }

    pub fn field_type(&self) -> FieldType {
        self.options.field_type()
    }

    /// True if either the top-level flag or the per-type flag asks for sorting.
    pub fn is_sortable(&self) -> bool {
        self.sortable || self.options.sortable()
    }
}

/// On-disk shape of a field: name, a single `sortable` key, and the tagged
/// options flattened alongside.
#[derive(Serialize, Deserialize)]
struct FieldRecord {
    name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    sortable: bool,
    #[serde(flatten)]
    options: FieldOptions,
}

impl From<FieldRecord> for Field {
    fn from(record: FieldRecord) -> Self {
        let mut options = record.options;
        options.set_sortable(record.sortable);
        Field {
            name: record.name,
            sortable: record.sortable,
            options,
        }
    }
}

impl From<Field> for FieldRecord {
    fn from(field: Field) -> Self {
        FieldRecord {
            sortable: field.is_sortable(),
            name: field.name,
            options: field.options,
        }
    }
}

/// How an index treats the documents sent to it: ordered fields plus
/// index-wide options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
    #[serde(default)]
    pub options: Options,
}

impl Schema {
    /// Empty schema carrying `options`.
    pub fn new(options: Options) -> Self {
        Self {
            fields: Vec::new(),
            options,
        }
    }

    /// Appends `field` after the ones already declared.
    pub fn add_field(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// By-value [`Schema::add_field`], for building a schema in one expression.
    pub fn with_field(mut self, field: Field) -> Self {
        self.add_field(field);
        self
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A named index definition as stored in a schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// The index name (normalized with the `idx:` prefix on creation).
    pub name: String,
    #[serde(default)]
    pub options: Options,
    pub fields: Vec<Field>,
}

impl IndexDefinition {
    pub fn to_schema(&self) -> Schema {
        self.fields
            .iter()
            .cloned()
            .fold(Schema::new(self.options.clone()), Schema::with_field)
    }
}

/// Represents the structure of the schema file (e.g., schema.json).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    pub indexes: Vec<IndexDefinition>,
}

impl SchemaFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        info!("Loading index schema file from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let file = Self::from_json(&raw)?;
        info!("Loaded {} index definitions from {}", file.indexes.len(), path.display());
        Ok(file)
    }

    pub fn from_json(raw: &str) -> Result<Self, IndexError> {
        let file: SchemaFile = serde_json::from_str(raw)?;
        for index in &file.indexes {
            debug!("Index '{}' declares {} fields", index.name, index.fields.len());
        }
        Ok(file)
    }
}

/// Tag separators are written as one-character strings. Bytes above 0x7F map
/// to the Latin-1 code point of the same value so every byte reads back.
mod separator {
    use serde::{ de, Deserialize, Deserializer, Serializer };

    pub fn serialize<S: Serializer>(sep: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(*sep as char)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => u8::try_from(c).map_err(|_| {
                de::Error::custom(format!("separator must be one character up to U+00FF, got {:?}", raw))
            }),
            _ => Err(de::Error::custom(format!("separator must be one character, got {:?}", raw))),
        }
    }
}
