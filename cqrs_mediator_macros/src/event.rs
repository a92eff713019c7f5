use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let meta_field = match extract_meta_field(&input) {
        Ok(field) => field,
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl #impl_generics ::cqrs_mediator::Event for #name #ty_generics #where_clause {
            fn domain(&self) -> &str {
                self.#meta_field.domain()
            }

            fn id(&self) -> &str {
                self.#meta_field.id()
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_meta_field(input: &DeriveInput) -> syn::Result<syn::Ident> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            for field in &fields.named {
                for attr in &field.attrs {
                    if attr.path().is_ident("event") {
                        let mut is_meta = false;
                        attr.parse_nested_meta(|meta| {
                            if meta.path.is_ident("meta") {
                                is_meta = true;
                            }
                            Ok(())
                        })?;
                        if is_meta {
                            if let Some(ident) = &field.ident {
                                return Ok(ident.clone());
                            }
                        }
                    }
                }
            }

            // Default: look for a field named "meta"
            for field in &fields.named {
                if let Some(ident) = &field.ident {
                    if ident == "meta" {
                        return Ok(ident.clone());
                    }
                }
            }
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "Event derive: no field marked with #[event(meta)] and no field named `meta`",
    ))
}
