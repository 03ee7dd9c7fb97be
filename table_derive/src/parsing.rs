//! Parsing utilities for model and field attributes
//!
//! This module handles the parsing of `#[model]`, `#[target]`,
//! `#[relationship]`, `#[field]`, `#[unmapped]` and `#[change_tracking]`
//! attributes, and the compile-time validation of the names they carry.

use std::str::FromStr;

use syn::punctuated::Punctuated;
use syn::{Attribute, Data, Error, Fields, Ident, LitStr, Result, Token};
use type_mapping::FieldType;

/// Keys accepted by `#[relationship(...)]`, with the annotation key each maps to
const RELATIONSHIP_KEYS: &[(&str, &str)] = &[
    ("name", "name"),
    ("model", "model"),
    ("kind", "type"),
    ("mapped_key", "mappedKey"),
    ("mapped_by", "mappedBy"),
    ("foreign_key", "foreignKey"),
    ("foreign_by", "foreignBy"),
    ("referenced_by", "referencedBy"),
    ("referenced_order", "referencedOrder"),
];

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validation logic that mirrors store_object::validation
/// This ensures compile-time validation matches runtime validation
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;

    // Check length (PostgreSQL limit)
    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    Ok(())
}

#[derive(Debug)]
pub struct ModelInfo {
    /// Model name, the struct name unless `#[model(name = "...")]` overrides it
    pub name: String,
    pub targets: Vec<String>,
    /// Relationship annotations as (annotation key, value) pairs
    pub relationships: Vec<Vec<(String, String)>>,
}

#[derive(Debug)]
pub struct FieldEntry {
    pub ident: Ident,
    /// Tag from `#[field(...)]`, if the field declares one
    pub field_type: Option<String>,
}

#[derive(Debug)]
pub struct FieldInfo {
    pub fields: Vec<FieldEntry>,
    pub unmapped_field: Ident,
    pub tracker_field: Option<Ident>,
}

pub fn parse_model_attributes(struct_name: &Ident, attrs: &[Attribute]) -> Result<ModelInfo> {
    let mut name = struct_name.to_string();
    let mut targets: Option<Vec<String>> = None;
    let mut relationships = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("model") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    if value.value().trim().is_empty() {
                        return Err(meta.error("model name cannot be empty"));
                    }
                    name = value.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported model attribute, expected `name`"))
                }
            })?;
        } else if attr.path().is_ident("target") {
            if targets.is_some() {
                return Err(Error::new_spanned(attr, "only one #[target(...)] is allowed"));
            }
            let tables = attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
            let mut names = Vec::new();
            for table in tables {
                validate_table_name_syn(&table.value(), table.span())?;
                names.push(table.value());
            }
            if names.is_empty() {
                return Err(Error::new_spanned(
                    attr,
                    "target attribute requires at least one table name",
                ));
            }
            targets = Some(names);
        } else if attr.path().is_ident("relationship") {
            relationships.push(parse_relationship(attr)?);
        }
    }

    Ok(ModelInfo {
        name,
        targets: targets.unwrap_or_default(),
        relationships,
    })
}

/// Parse `#[relationship(name = "...", kind = "toMany", mapped_key = "...", ...)]`
fn parse_relationship(attr: &Attribute) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    attr.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .map(|ident| ident.to_string())
            .unwrap_or_default();
        let annotation_key = RELATIONSHIP_KEYS
            .iter()
            .find(|(attribute, _)| *attribute == key)
            .map(|(_, annotation)| *annotation)
            .ok_or_else(|| meta.error(format!("unknown relationship key `{}`", key)))?;

        if pairs.iter().any(|(existing, _)| existing == annotation_key) {
            return Err(meta.error(format!("duplicate relationship key `{}`", key)));
        }

        let value: LitStr = meta.value()?.parse()?;
        pairs.push((annotation_key.to_string(), value.value()));
        Ok(())
    })?;

    for required in ["name", "model", "type"] {
        if !pairs.iter().any(|(key, _)| key == required) {
            let attribute = RELATIONSHIP_KEYS
                .iter()
                .find(|(_, annotation)| *annotation == required)
                .map(|(attribute, _)| *attribute)
                .unwrap_or(required);
            return Err(Error::new_spanned(
                attr,
                format!("relationship attribute requires `{}`", attribute),
            ));
        }
    }

    Ok(pairs)
}

/// Parse `#[field(datetime)]` or `#[field("datetime")]`
fn parse_field_type(attr: &Attribute) -> Result<String> {
    let tag = if let Ok(ident) = attr.parse_args::<Ident>() {
        ident.to_string()
    } else {
        attr.parse_args::<LitStr>()?.value()
    };

    FieldType::from_str(&tag).map_err(|_| {
        Error::new_spanned(
            attr,
            format!(
                "unknown field type `{}`, expected one of: string, boolean, float, date, time, datetime, json_array, json_object, integer, binary",
                tag
            ),
        )
    })?;

    Ok(tag)
}

pub fn parse_field_attributes(data: &Data) -> Result<FieldInfo> {
    if let Data::Struct(data_struct) = data {
        if let Fields::Named(fields_named) = &data_struct.fields {
            let mut fields = Vec::new();
            let mut unmapped_field = None;
            let mut tracker_field = None;

            for field in &fields_named.named {
                let field_name = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;

                if has_attribute(&field.attrs, "unmapped") {
                    if unmapped_field.is_some() {
                        return Err(Error::new_spanned(field, "only one #[unmapped] field is allowed"));
                    }
                    unmapped_field = Some(field_name.clone());
                    continue;
                }

                if has_attribute(&field.attrs, "change_tracking") {
                    if tracker_field.is_some() {
                        return Err(Error::new_spanned(
                            field,
                            "only one #[change_tracking] field is allowed",
                        ));
                    }
                    tracker_field = Some(field_name.clone());
                    continue;
                }

                let field_type = match field.attrs.iter().find(|attr| attr.path().is_ident("field")) {
                    Some(attr) => Some(parse_field_type(attr)?),
                    None => None,
                };

                fields.push(FieldEntry {
                    ident: field_name.clone(),
                    field_type,
                });
            }

            let unmapped_field = unmapped_field.ok_or_else(|| {
                Error::new(
                    proc_macro2::Span::call_site(),
                    "Model requires an #[unmapped] field of type UnmappedProperties",
                )
            })?;

            return Ok(FieldInfo {
                fields,
                unmapped_field,
                tracker_field,
            });
        }
    }

    Err(Error::new(
        proc_macro2::Span::call_site(),
        "Model can only be derived for structs with named fields",
    ))
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
