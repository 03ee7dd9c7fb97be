//! Code generation for the `Model` trait
//!
//! Emits the annotation list, the per-class field accessor table and the
//! unmapped/change-tracking capability wiring.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::parsing::{FieldInfo, ModelInfo};

pub fn generate_model_impl(name: &Ident, model_info: &ModelInfo, field_info: &FieldInfo) -> TokenStream {
    let model_name = &model_info.name;
    let annotations = generate_annotations(model_info, field_info);

    let accessors = field_info.fields.iter().map(|field| {
        let ident = &field.ident;
        quote! { store_object::model_field!(#name, #ident) }
    });

    let unmapped = &field_info.unmapped_field;

    let tracker_impl = match &field_info.tracker_field {
        Some(tracker) => quote! {
            fn change_tracker(&self) -> Option<&store_object::ChangeTracker> {
                Some(&self.#tracker)
            }

            fn change_tracker_mut(&mut self) -> Option<&mut store_object::ChangeTracker> {
                Some(&mut self.#tracker)
            }
        },
        None => quote! {},
    };

    quote! {
        impl store_object::Model for #name {
            const MODEL_NAME: &'static str = #model_name;

            fn annotations() -> Vec<store_object::Annotation> {
                #annotations
            }

            fn accessors() -> &'static store_object::FieldAccessors<Self> {
                static ACCESSORS: std::sync::OnceLock<store_object::FieldAccessors<#name>> =
                    std::sync::OnceLock::new();
                ACCESSORS.get_or_init(|| store_object::FieldAccessors::new(vec![#(#accessors),*]))
            }

            fn unmapped(&self) -> &store_object::UnmappedProperties {
                &self.#unmapped
            }

            fn unmapped_mut(&mut self) -> &mut store_object::UnmappedProperties {
                &mut self.#unmapped
            }

            #tracker_impl
        }
    }
}

/// Annotation list in declaration order: target, fields, relationships
fn generate_annotations(model_info: &ModelInfo, field_info: &FieldInfo) -> TokenStream {
    let target = if model_info.targets.is_empty() {
        quote! {}
    } else {
        let tables = &model_info.targets;
        quote! { store_object::Annotation::target([#(#tables),*]), }
    };

    let fields = field_info.fields.iter().filter_map(|field| {
        let tag = field.field_type.as_ref()?;
        let property = field.ident.to_string();
        Some(quote! { store_object::Annotation::field(#property, #tag), })
    });

    let relationships = model_info.relationships.iter().map(|pairs| {
        let keys = pairs.iter().map(|(key, _)| key);
        let values = pairs.iter().map(|(_, value)| value);
        quote! {
            store_object::Annotation::relationship([#((#keys, #values)),*]),
        }
    });

    quote! {
        vec![
            #target
            #(#fields)*
            #(#relationships)*
        ]
    }
}
