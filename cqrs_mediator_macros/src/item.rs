use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_quote, Data, DeriveInput, Fields, GenericParam};

pub fn derive_item(input: TokenStream) -> TokenStream {
    let mut input = syn::parse_macro_input!(input as DeriveInput);
    let name = input.ident.clone();

    // Item requires Any + Send + Sync.
    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::std::marker::Send));
            ty.bounds.push(parse_quote!(::std::marker::Sync));
            ty.bounds.push(parse_quote!('static));
        }
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let handled_impl = match extract_handled_field(&input) {
        Ok(Some(field)) => quote! {
            impl #impl_generics ::cqrs_mediator::Handleable for #name #ty_generics #where_clause {
                fn is_handled(&self) -> bool {
                    ::cqrs_mediator::Handleable::is_handled(&self.#field)
                }

                fn set_handled(&mut self) {
                    ::cqrs_mediator::Handleable::set_handled(&mut self.#field)
                }
            }
        },
        Ok(None) => quote! {},
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl #impl_generics ::cqrs_mediator::Item for #name #ty_generics #where_clause {
            fn key(&self) -> ::cqrs_mediator::Key {
                ::cqrs_mediator::Key::of::<Self>()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        #handled_impl
    };

    TokenStream::from(expanded)
}

fn extract_handled_field(input: &DeriveInput) -> syn::Result<Option<syn::Member>> {
    let Data::Struct(data_struct) = &input.data else {
        return Ok(None);
    };

    let mut found = None;
    for (index, field) in data_struct.fields.iter().enumerate() {
        for attr in &field.attrs {
            if !attr.path().is_ident("item") {
                continue;
            }

            let mut is_handled = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("handled") {
                    is_handled = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported item attribute, expected `handled`"))
                }
            })?;

            if is_handled {
                if found.is_some() {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "only one field may be marked #[item(handled)]",
                    ));
                }
                found = Some(match (&data_struct.fields, &field.ident) {
                    (Fields::Named(_), Some(ident)) => syn::Member::Named(ident.clone()),
                    _ => syn::Member::Unnamed(index.into()),
                });
            }
        }
    }

    Ok(found)
}
