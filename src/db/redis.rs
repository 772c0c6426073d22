use redis::aio::MultiplexedConnection;
use redis::{ Client, RedisError, cmd, Value as RedisValue };
use async_trait::async_trait;
use std::collections::HashSet;
use log::{ info, debug, warn };

use crate::error::IndexError;
use crate::schema::{ Field, FieldOptions, Options, Schema, DEFAULT_TAG_SEPARATOR, DEFAULT_TEXT_WEIGHT };
use super::IndexStore;

pub struct RedisIndexStore {
    client: Client,
}

impl RedisIndexStore {
    pub fn new(host: &str) -> Result<Self, RedisError> {
        info!("Connecting to Redis at {}", host);
        Ok(Self {
            client: Client::open(host)?,
        })
    }

    pub async fn get_connection(&self) -> Result<MultiplexedConnection, RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

/// Trims `index_name` and adds the `idx:` prefix unless it is already there.
pub fn normalize_index_name(index_name: &str) -> String {
    let index_name = index_name.trim();
    if index_name.starts_with("idx:") {
        index_name.to_string()
    } else {
        format!("idx:{}", index_name)
    }
}

/// Builds the arguments that follow `FT.CREATE` for `schema`.
///
/// This is where shape problems the builder lets through are rejected:
/// empty or repeated field names, weights that are not positive, and tag
/// separators the engine cannot parse.
pub fn ft_create_args(index_name: &str, schema: &Schema) -> Result<Vec<String>, IndexError> {
    let index_name = index_name.trim();
    if index_name.is_empty() {
        return Err(IndexError::EmptyIndexName);
    }
    if schema.is_empty() {
        return Err(IndexError::EmptySchema(index_name.to_string()));
    }

    let mut args = vec![normalize_index_name(index_name)];
    push_index_options(&mut args, &schema.options);
    args.push("SCHEMA".to_string());

    let mut seen = HashSet::new();
    for (position, field) in schema.fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(IndexError::EmptyFieldName(position));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(IndexError::DuplicateField(field.name.clone()));
        }
        push_field(&mut args, field)?;
    }
    Ok(args)
}

fn push_index_options(args: &mut Vec<String>, options: &Options) {
    if options.no_save {
        args.push("NOSAVE".to_string());
    }
    if options.no_field_flags {
        args.push("NOFIELDS".to_string());
    }
    if options.no_frequencies {
        args.push("NOFREQS".to_string());
    }
    if options.no_offset_vectors {
        args.push("NOOFFSETS".to_string());
    }
    if let Some(words) = &options.stopwords {
        args.push("STOPWORDS".to_string());
        args.push(words.len().to_string());
        args.extend(words.iter().cloned());
    }
}

fn push_field(args: &mut Vec<String>, field: &Field) -> Result<(), IndexError> {
    let has_options_flag = !matches!(field.options, FieldOptions::Geo);
    if has_options_flag && field.sortable != field.options.sortable() {
        warn!(
            "Field '{}' has mismatched sortable flags (top-level: {}, options: {}). Treating it as sortable.",
            field.name,
            field.sortable,
            field.options.sortable()
        );
    }

    args.push(field.name.clone());
    let sortable = field.is_sortable();
    match &field.options {
        FieldOptions::Text(opts) => {
            args.push("TEXT".to_string());
            if !opts.weight.is_finite() || opts.weight <= 0.0 {
                return Err(IndexError::InvalidWeight {
                    field: field.name.clone(),
                    weight: opts.weight,
                });
            }
            if opts.weight != DEFAULT_TEXT_WEIGHT {
                args.push("WEIGHT".to_string());
                args.push(opts.weight.to_string());
            }
            if opts.no_stem {
                args.push("NOSTEM".to_string());
            }
            push_flags(args, sortable, opts.no_index);
        }
        FieldOptions::Numeric(opts) => {
            args.push("NUMERIC".to_string());
            push_flags(args, sortable, opts.no_index);
        }
        FieldOptions::Tag(opts) => {
            args.push("TAG".to_string());
            if !opts.separator.is_ascii_punctuation() {
                return Err(IndexError::InvalidSeparator {
                    field: field.name.clone(),
                    separator: opts.separator as char,
                });
            }
            if opts.separator != DEFAULT_TAG_SEPARATOR {
                args.push("SEPARATOR".to_string());
                args.push((opts.separator as char).to_string());
            }
            push_flags(args, sortable, opts.no_index);
        }
        FieldOptions::Geo => {
            args.push("GEO".to_string());
            push_flags(args, sortable, false);
        }
    }
    Ok(())
}

fn push_flags(args: &mut Vec<String>, sortable: bool, no_index: bool) {
    if sortable {
        args.push("SORTABLE".to_string());
    }
    if no_index {
        args.push("NOINDEX".to_string());
    }
}

#[async_trait]
impl IndexStore for RedisIndexStore {
    async fn create_index(&self, index_name: &str, schema: &Schema) -> Result<(), IndexError> {
        let args = ft_create_args(index_name, schema)?;
        debug!("FT.CREATE {}", args.join(" "));

        let mut con = self.get_connection().await?;
        let reply: RedisValue = cmd("FT.CREATE").arg(&args).query_async(&mut con).await?;
        debug!("Raw FT.CREATE result for index {}: {:?}", args[0], reply);
        info!("Created index '{}' with {} fields", args[0], schema.len());
        Ok(())
    }

    async fn drop_index(&self, index_name: &str, delete_documents: bool) -> Result<(), IndexError> {
        let index_name = index_name.trim();
        if index_name.is_empty() {
            return Err(IndexError::EmptyIndexName);
        }
        let index_name = normalize_index_name(index_name);
        let mut con = self.get_connection().await?;

        let mut ft = cmd("FT.DROPINDEX");
        ft.arg(&index_name);
        if delete_documents {
            ft.arg("DD");
        }
        let reply: RedisValue = ft.query_async(&mut con).await?;
        debug!("Raw FT.DROPINDEX result for index {}: {:?}", index_name, reply);
        info!("Dropped index '{}' (documents deleted: {})", index_name, delete_documents);
        Ok(())
    }

    async fn list_indexes(&self) -> Result<Vec<String>, IndexError> {
        let mut con = self.get_connection().await?;
        let names: Vec<String> = cmd("FT._LIST").query_async(&mut con).await?;
        debug!("FT._LIST returned {} indexes", names.len());
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ NumericFieldOptions, TagFieldOptions, TextFieldOptions };

    fn args(index: &str, schema: &Schema) -> Vec<String> {
        ft_create_args(index, schema).unwrap()
    }

    #[test]
    fn index_names_get_idx_prefix() {
        assert_eq!(normalize_index_name("products"), "idx:products");
        assert_eq!(normalize_index_name("idx:products"), "idx:products");
        assert_eq!(normalize_index_name("redis:products"), "idx:redis:products");
        assert_eq!(normalize_index_name("  products "), "idx:products");
    }

    #[test]
    fn index_name_is_trimmed_before_prefixing() {
        let schema = Schema::default().with_field(Field::text("body"));
        assert_eq!(args(" docs ", &schema), ["idx:docs", "SCHEMA", "body", "TEXT"]);
        assert!(matches!(
            ft_create_args(" docs ", &Schema::default()),
            Err(IndexError::EmptySchema(ref name)) if name == "docs"
        ));
    }

    #[test]
    fn sortable_geo_field_is_sent_sortable() {
        let mut loc = Field::geo("loc");
        loc.sortable = true;
        let schema = Schema::default().with_field(loc).with_field(Field::geo("plain"));
        assert_eq!(args("x", &schema), ["idx:x", "SCHEMA", "loc", "GEO", "SORTABLE", "plain", "GEO"]);
    }

    #[test]
    fn minimal_schema() {
        let schema = Schema::default().with_field(Field::text("body"));
        assert_eq!(args("docs", &schema), ["idx:docs", "SCHEMA", "body", "TEXT"]);
    }

    #[test]
    fn index_options_and_stopwords() {
        let options = Options {
            no_save: true,
            no_field_flags: true,
            no_frequencies: true,
            no_offset_vectors: true,
            stopwords: Some(vec!["a".to_string(), "the".to_string()]),
        };
        let schema = Schema::new(options).with_field(Field::geo("loc"));
        assert_eq!(
            args("places", &schema),
            [
                "idx:places", "NOSAVE", "NOFIELDS", "NOFREQS", "NOOFFSETS",
                "STOPWORDS", "2", "a", "the",
                "SCHEMA", "loc", "GEO",
            ]
        );
    }

    #[test]
    fn empty_stopword_list_is_sent() {
        let options = Options { stopwords: Some(Vec::new()), ..Options::default() };
        let schema = Schema::new(options).with_field(Field::numeric("n"));
        assert_eq!(args("n", &schema), ["idx:n", "STOPWORDS", "0", "SCHEMA", "n", "NUMERIC"]);
    }

    #[test]
    fn field_options_are_serialized_in_order() {
        let schema = Schema::default()
            .with_field(Field::sortable_text("title", 2.5))
            .with_field(Field::text_with_options("body", TextFieldOptions {
                no_stem: true,
                no_index: true,
                ..TextFieldOptions::default()
            }))
            .with_field(Field::tag("tags"))
            .with_field(Field::tag_with_options("cats", TagFieldOptions {
                separator: b';',
                sortable: true,
                no_index: true,
            }))
            .with_field(Field::sortable_numeric("price"))
            .with_field(Field::numeric_with_options("stock", NumericFieldOptions {
                sortable: false,
                no_index: true,
            }));

        assert_eq!(
            args("shop", &schema),
            [
                "idx:shop", "SCHEMA",
                "title", "TEXT", "WEIGHT", "2.5", "SORTABLE",
                "body", "TEXT", "NOSTEM", "NOINDEX",
                "tags", "TAG",
                "cats", "TAG", "SEPARATOR", ";", "SORTABLE", "NOINDEX",
                "price", "NUMERIC", "SORTABLE",
                "stock", "NUMERIC", "NOINDEX",
            ]
        );
    }

    #[test]
    fn top_level_sortable_alone_is_honored() {
        let mut field = Field::numeric("rank");
        field.sortable = true;
        let schema = Schema::default().with_field(field);
        assert_eq!(args("r", &schema), ["idx:r", "SCHEMA", "rank", "NUMERIC", "SORTABLE"]);
    }

    #[test]
    fn rejects_empty_index_name() {
        let schema = Schema::default().with_field(Field::text("body"));
        assert!(matches!(ft_create_args("  ", &schema), Err(IndexError::EmptyIndexName)));
    }

    #[test]
    fn rejects_schema_without_fields() {
        assert!(matches!(
            ft_create_args("docs", &Schema::default()),
            Err(IndexError::EmptySchema(ref name)) if name == "docs"
        ));
    }

    #[test]
    fn rejects_empty_field_name() {
        let schema = Schema::default().with_field(Field::text("ok")).with_field(Field::tag(""));
        assert!(matches!(ft_create_args("docs", &schema), Err(IndexError::EmptyFieldName(1))));
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let schema = Schema::default()
            .with_field(Field::text("title"))
            .with_field(Field::numeric("title"));
        assert!(matches!(
            ft_create_args("docs", &schema),
            Err(IndexError::DuplicateField(ref name)) if name == "title"
        ));
    }

    #[test]
    fn rejects_bad_weights() {
        for weight in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let schema = Schema::default().with_field(Field::sortable_text("title", weight));
            assert!(
                matches!(ft_create_args("docs", &schema), Err(IndexError::InvalidWeight { .. })),
                "weight {} should be rejected",
                weight
            );
        }
    }

    #[test]
    fn rejects_unparseable_separator() {
        for separator in [b' ', b'a', 0u8, 0xC3] {
            let schema = Schema::default().with_field(Field::tag_with_options("tags", TagFieldOptions {
                separator,
                ..TagFieldOptions::default()
            }));
            assert!(
                matches!(ft_create_args("docs", &schema), Err(IndexError::InvalidSeparator { .. })),
                "separator {:?} should be rejected",
                separator
            );
        }
    }
}
