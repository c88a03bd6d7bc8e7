use darling::ast::{Data, Style};
use darling::util::{Flag, PathList};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(component), supports(struct_named, struct_unit))]
struct ComponentArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), ComponentField>,
    #[darling(default)]
    controller: Flag,
    #[darling(default)]
    service: Flag,
    #[darling(default)]
    repository: Flag,
    #[darling(default)]
    configuration: Flag,
    name: Option<String>,
    #[darling(default)]
    provides: PathList,
}

#[derive(FromField)]
struct ComponentField {
    ident: Option<syn::Ident>,
    ty: Type,
}

pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match ComponentArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(e) => return e.write_errors().into(),
    };

    match generate_component_impl(args) {
        Ok(expanded) => expanded.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn generate_component_impl(args: ComponentArgs) -> syn::Result<TokenStream2> {
    if !args.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &args.generics,
            "#[derive(Component)] does not support generic types",
        ));
    }

    let struct_name = &args.ident;
    let stereotype = stereotype(&args)?;

    let fields = match args.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "#[derive(Component)] can only be applied to structs",
            ))
        }
    };

    // Arc<T> fields are constructor parameters, everything else starts from Default.
    let mut params = Vec::new();
    let mut field_inits = Vec::new();
    for field in &fields.fields {
        let field_name = &field.ident;
        match extract_arc_inner(&field.ty) {
            Some(inner) => {
                params.push(quote!(.param::<#inner>()));
                field_inits.push(quote!(#field_name: deps.get::<#inner>()?));
            }
            None => {
                field_inits.push(quote!(#field_name: ::core::default::Default::default()));
            }
        }
    }

    let construct = match fields.style {
        Style::Unit => quote!(Self),
        _ => quote!(Self { #(#field_inits),* }),
    };
    let deps = if params.is_empty() {
        quote!(_)
    } else {
        quote!(deps)
    };

    let name = args.name.as_ref().map(|name| quote!(.name(#name)));

    let provides = args.provides.iter().map(|path| {
        quote! {
            .provides::<dyn #path, _>(|bean| bean as ::std::sync::Arc<dyn #path>)
        }
    });

    let configuration = args.configuration.is_present().then(|| {
        quote! {
            let builder = <Self as ::minibean::Configuration>::bean_methods(builder);
        }
    });

    let controller = args.controller.is_present().then(|| {
        quote! {
            let builder = builder.request_mappings(
                <Self as ::minibean::mvc::Controller>::request_mappings,
            );
        }
    });

    Ok(quote! {
        impl ::minibean::Component for #struct_name {
            fn bean_definition() -> ::minibean::Result<::minibean::BeanDefinition> {
                let builder = ::minibean::BeanDefinition::builder::<Self>()
                    .stereotype(#stereotype)
                    .constructor(
                        ::minibean::Constructor::new(|#deps: &::minibean::Dependencies| {
                            ::core::result::Result::Ok(#construct)
                        })
                        #(#params)*
                    )
                    #name
                    #(#provides)*;
                #configuration
                #controller
                builder.build()
            }
        }

        ::minibean::inventory::submit! {
            ::minibean::ComponentEntry::new(
                ::core::module_path!(),
                ::core::stringify!(#struct_name),
                <#struct_name as ::minibean::Component>::bean_definition,
            )
        }
    })
}

fn stereotype(args: &ComponentArgs) -> syn::Result<TokenStream2> {
    let declared: Vec<TokenStream2> = [
        (&args.controller, quote!(Controller)),
        (&args.service, quote!(Service)),
        (&args.repository, quote!(Repository)),
        (&args.configuration, quote!(Configuration)),
    ]
    .into_iter()
    .filter(|(flag, _)| flag.is_present())
    .map(|(_, variant)| variant)
    .collect();

    match declared.as_slice() {
        [] => Ok(quote!(::minibean::Stereotype::Component)),
        [variant] => Ok(quote!(::minibean::Stereotype::#variant)),
        _ => Err(syn::Error::new_spanned(
            &args.ident,
            "a component can declare at most one of controller, service, repository, configuration",
        )),
    }
}

/// Extract the inner type from Arc<T> or Arc<dyn Trait>
fn extract_arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
