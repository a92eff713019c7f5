use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, parse_quote, FnArg, ImplItem, ImplItemFn, ItemImpl, PathArguments, ReturnType,
    Token, Type, TypeParamBound, Visibility,
};

pub fn expand_registry(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RegistryArgs);
    let item_impl = parse_macro_input!(item as ItemImpl);

    if let Some((_, trait_path, _)) = &item_impl.trait_ {
        return syn::Error::new_spanned(trait_path, "#[registry] expects an inherent impl block")
            .to_compile_error()
            .into();
    }

    let handler = &args.handler;
    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();

    let methods: Vec<_> = item_impl
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(method) if is_provider_method(method) => Some(&method.sig.ident),
            _ => None,
        })
        .collect();

    let body = if methods.is_empty() {
        quote! { ::std::vec::Vec::new() }
    } else {
        let entries = methods.iter().map(|method| {
            let name = to_upper_camel_case(&method.to_string());
            quote! {
                (
                    ::cqrs_mediator::Key::new(owner.group(), #name),
                    ::cqrs_mediator::IntoProvider::<#handler>::into_provider(self.#method()),
                )
            }
        });
        quote! {
            let owner = ::cqrs_mediator::Key::of::<Self>();
            ::std::vec![#(#entries),*]
        }
    };

    let expanded = quote! {
        #item_impl

        impl #impl_generics ::cqrs_mediator::Registry<#handler> for #self_ty #where_clause {
            fn providers(
                &self,
            ) -> ::std::vec::Vec<(::cqrs_mediator::Key, ::cqrs_mediator::Provider<#handler>)> {
                #body
            }
        }
    };

    TokenStream::from(expanded)
}

struct RegistryArgs {
    handler: Type,
}

impl Parse for RegistryArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(RegistryArgs {
                handler: parse_quote!(dyn ::cqrs_mediator::Handler),
            });
        }

        let ident: syn::Ident = input.parse()?;
        if ident == "command" {
            return Ok(RegistryArgs {
                handler: parse_quote!(dyn ::cqrs_mediator::CommandHandler),
            });
        }
        if ident == "handler" {
            input.parse::<Token![=]>()?;
            return Ok(RegistryArgs {
                handler: input.parse()?,
            });
        }

        Err(syn::Error::new(
            ident.span(),
            "expected `command` or `handler = <type>`",
        ))
    }
}

/// `pub fn name(&self) -> <provider shape>`, nothing else.
fn is_provider_method(method: &ImplItemFn) -> bool {
    let sig = &method.sig;

    if !matches!(method.vis, Visibility::Public(_))
        || sig.asyncness.is_some()
        || !sig.generics.params.is_empty()
        || sig.inputs.len() != 1
    {
        return false;
    }

    let Some(FnArg::Receiver(receiver)) = sig.inputs.first() else {
        return false;
    };
    if receiver.reference.is_none() || receiver.mutability.is_some() {
        return false;
    }

    match &sig.output {
        ReturnType::Type(_, ty) => is_provider_type(ty),
        ReturnType::Default => false,
    }
}

fn is_provider_type(ty: &Type) -> bool {
    match ty {
        Type::Paren(inner) => is_provider_type(&inner.elem),
        Type::Group(inner) => is_provider_type(&inner.elem),
        Type::Path(path) if path.qself.is_none() => match path.path.segments.last() {
            Some(segment) if segment.ident == "Provider" => true,
            Some(segment) if segment.ident == "Box" => match &segment.arguments {
                PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                    syn::GenericArgument::Type(Type::TraitObject(object)) => {
                        has_factory_bound(object.bounds.iter())
                    }
                    _ => false,
                }),
                _ => false,
            },
            _ => false,
        },
        Type::ImplTrait(bounds) => has_factory_bound(bounds.bounds.iter()),
        Type::BareFn(bare) => bare.inputs.is_empty() && returns_arc(&bare.output),
        _ => false,
    }
}

/// Some bound is `Fn() -> Arc<..>`.
fn has_factory_bound<'a>(mut bounds: impl Iterator<Item = &'a TypeParamBound>) -> bool {
    bounds.any(|bound| match bound {
        TypeParamBound::Trait(trait_bound) => match trait_bound.path.segments.last() {
            Some(segment) if segment.ident == "Fn" => match &segment.arguments {
                PathArguments::Parenthesized(args) => {
                    args.inputs.is_empty() && returns_arc(&args.output)
                }
                _ => false,
            },
            _ => false,
        },
        _ => false,
    })
}

fn returns_arc(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Arc"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}

fn to_upper_camel_case(name: &str) -> String {
    name.trim_start_matches("r#")
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(tokens: proc_macro2::TokenStream) -> ImplItemFn {
        syn::parse2(tokens).unwrap()
    }

    #[test]
    fn camel_cases_method_names() {
        assert_eq!(to_upper_camel_case("dummy_command"), "DummyCommand");
        assert_eq!(to_upper_camel_case("open"), "Open");
        assert_eq!(to_upper_camel_case("DummyCommand"), "DummyCommand");
    }

    #[test]
    fn accepts_provider_shapes() {
        assert!(is_provider_method(&method(quote! {
            pub fn a(&self) -> Provider<dyn Handler> { todo!() }
        })));
        assert!(is_provider_method(&method(quote! {
            pub fn b(&self) -> cqrs_mediator::Provider<dyn Handler> { todo!() }
        })));
        assert!(is_provider_method(&method(quote! {
            pub fn c(&self) -> Box<dyn Fn() -> Arc<dyn Handler> + Send + Sync> { todo!() }
        })));
        assert!(is_provider_method(&method(quote! {
            pub fn d(&self) -> fn() -> Arc<dyn Handler> { todo!() }
        })));
        assert!(is_provider_method(&method(quote! {
            pub fn e(&self) -> impl Fn() -> Arc<dyn Handler> + Send + Sync + 'static { || todo!() }
        })));
    }

    #[test]
    fn rejects_other_shapes() {
        for tokens in [
            quote! { pub fn no_return(&self) {} },
            quote! { pub fn with_param(&self, i: i32) -> Provider<dyn Handler> { todo!() } },
            quote! { pub fn returns_int(&self) -> i32 { 0 } },
            quote! { pub fn returns_unit_fn(&self) -> Box<dyn Fn()> { todo!() } },
            quote! { pub fn returns_int_fn(&self) -> fn() -> i32 { todo!() } },
            quote! { pub fn returns_tuple(&self) -> (Provider<dyn Handler>, Error) { todo!() } },
            quote! { pub fn factory_with_param(&self) -> fn(i32) -> Arc<dyn Handler> { todo!() } },
            quote! { pub fn consumes(self) -> Provider<dyn Handler> { todo!() } },
            quote! { pub fn mutates(&mut self) -> Provider<dyn Handler> { todo!() } },
            quote! { pub fn associated() -> Provider<dyn Handler> { todo!() } },
            quote! { fn private(&self) -> Provider<dyn Handler> { todo!() } },
        ] {
            let m = method(tokens);
            assert!(!is_provider_method(&m), "{} should be skipped", m.sig.ident);
        }
    }
}
