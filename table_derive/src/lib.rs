//! Procedural macros for declaring mapped models
//!
//! This crate provides the `Model` derive, the annotation front end of the
//! mapping layer: it turns struct and field attributes into the ordered
//! annotation list and builds the per-class field accessor table.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod model_impl;
mod parsing;

use model_impl::generate_model_impl;
use parsing::{parse_field_attributes, parse_model_attributes};

/// Derive macro for the `Model` trait
///
/// Usage:
/// ```rust,ignore
/// use modelhaus::prelude::*;
///
/// #[derive(Debug, Clone, Default, Model)]
/// #[target("moduledev_user")]
/// #[relationship(name = "Roles", model = "Role", kind = "manyToMany",
///     mapped_key = "id", mapped_by = "user_id", foreign_key = "id",
///     foreign_by = "role_id", referenced_by = "moduledev_user_role")]
/// pub struct User {
///     #[field(integer)]
///     pub id: Option<i64>,
///
///     #[field(string)]
///     pub forename: String,
///
///     #[field(datetime)]
///     pub created_at: Option<DateTime<Utc>>,
///
///     #[unmapped]
///     pub unmapped: UnmappedProperties,
///
///     #[change_tracking]
///     pub tracker: ChangeTracker,
/// }
/// ```
///
/// Every named field other than the `#[unmapped]` and `#[change_tracking]`
/// ones becomes a declared property; `#[field(type)]` adds a Field
/// annotation so hydration coerces it.
#[proc_macro_derive(
    Model,
    attributes(model, target, relationship, field, unmapped, change_tracking)
)]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let model_info = match parse_model_attributes(name, &input.attrs) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input.data) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(generate_model_impl(name, &model_info, &field_info))
}
