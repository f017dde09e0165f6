use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Meta};

/// Derive macro for zone-aware structs.
///
/// Generates `Walk` and `Composite` impls so the conversion walker can
/// enumerate the struct's fields:
///
/// - `describe()`: field descriptors (name, declared type, marker, format).
/// - `has_field()` / `field_mut()`: field access by name.
///
/// Field attributes:
///
/// - `#[time]`: the field is converted even when its runtime type is only
///   converted on request (e.g. `String`).
/// - `#[time(format = "yyyy/MM/dd HH:mm")]`: marker with a format override.
/// - `#[time(base)]`: the field is an embedded base struct; its fields are
///   listed after this struct's own fields, names declared here win.
/// - `#[time(skip)]`: the field is never visited.
///
/// Enums get an opaque impl: they are returned unchanged.
///
/// # Example
///
/// ```ignore
/// #[derive(Temporal)]
/// pub struct Meeting {
///     pub title: String,
///     #[time]
///     pub starts_at: NaiveDateTime,
///     #[time(format = "yyyy/MM/dd")]
///     pub day: String,
///     #[time(base)]
///     pub audit: Audit,
/// }
/// ```
#[proc_macro_derive(Temporal, attributes(time))]
pub fn derive_temporal(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Parsed `#[time(...)]` options of one field.
#[derive(Default)]
struct FieldOptions {
    marker: bool,
    format: Option<String>,
    base: bool,
    skip: bool,
}

fn field_options(field: &syn::Field) -> Result<FieldOptions, syn::Error> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("time") {
            continue;
        }
        if let Meta::Path(_) = attr.meta {
            options.marker = true;
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("format") {
                let value: LitStr = meta.value()?.parse()?;
                options.marker = true;
                options.format = Some(value.value());
            } else if meta.path.is_ident("base") {
                options.base = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error("unknown option (expected 'format', 'base' or 'skip')"));
            }
            Ok(())
        })?;
    }
    if options.base && (options.marker || options.skip) {
        return Err(syn::Error::new_spanned(
            field,
            "#[time(base)] cannot be combined with a marker or 'skip'",
        ));
    }
    Ok(options)
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) => return Ok(opaque_impl(input)),
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Temporal cannot be derived for unions",
            ))
        }
    };

    let mut descriptor_tokens = Vec::new();
    let mut own_names = Vec::new();
    let mut own_members = Vec::new();
    let mut bases = Vec::new();
    let mut base_bounds = Vec::new();

    let type_params: Vec<&syn::Ident> = input.generics.type_params().map(|p| &p.ident).collect();

    let members: Vec<(String, TokenStream2, &syn::Field)> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|f| {
                let ident = f.ident.as_ref().expect("named field");
                (ident.to_string(), quote! { #ident }, f)
            })
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let index = syn::Index::from(i);
                (i.to_string(), quote! { #index }, f)
            })
            .collect(),
        Fields::Unit => Vec::new(),
    };

    for (field_name, member, field) in members {
        let options = field_options(field)?;
        if options.skip {
            continue;
        }
        let field_ty = &field.ty;

        if options.base {
            // Concrete base types are checked in the generated body; a bare
            // type parameter needs an explicit bound.
            if let syn::Type::Path(path) = field_ty {
                if path.qself.is_none() && type_params.iter().any(|p| path.path.is_ident(*p)) {
                    base_bounds.push(quote! { #field_ty: ::kronos_api::schema::Composite });
                }
            }
            bases.push(member);
            continue;
        }

        let declared_type = type_string(field_ty);
        let mut descriptor = quote! {
            ::kronos_api::schema::FieldDescriptor::new(#field_name, #declared_type)
        };
        if options.marker {
            let format = match &options.format {
                Some(f) => quote! { Some(#f) },
                None => quote! { None },
            };
            descriptor = quote! { #descriptor.marked(#format) };
        }
        descriptor_tokens.push(descriptor);
        own_names.push(field_name);
        own_members.push(member);
    }

    // Field types are not bounded individually: a recursive struct would
    // make the bound depend on the impl being defined.
    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(syn::parse_quote!(::kronos_api::walk::Walk));
    }
    let where_clause = generics.make_where_clause();
    for bound in base_bounds {
        where_clause.predicates.push(syn::parse_quote!(#bound));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::kronos_api::walk::Walk for #name #ty_generics #where_clause {
            fn kind(&self) -> ::kronos_api::walk::NodeKind {
                ::kronos_api::walk::NodeKind::Composite
            }

            fn shape(&mut self) -> ::kronos_api::walk::Shape<'_> {
                ::kronos_api::walk::Shape::Composite(self)
            }
        }

        impl #impl_generics ::kronos_api::schema::Composite for #name #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn describe(&self) -> ::std::vec::Vec<::kronos_api::schema::FieldDescriptor> {
                let mut fields: ::std::vec::Vec<::kronos_api::schema::FieldDescriptor> =
                    ::std::vec![#(#descriptor_tokens),*];
                #(
                    ::kronos_api::schema::merge_base(
                        &mut fields,
                        ::kronos_api::schema::Composite::describe(&self.#bases),
                    );
                )*
                fields
            }

            fn has_field(&self, name: &str) -> bool {
                match name {
                    #( #own_names => true, )*
                    _ => false #( || ::kronos_api::schema::Composite::has_field(&self.#bases, name) )*,
                }
            }

            fn field_mut(&mut self, name: &str) -> ::std::option::Option<&mut dyn ::kronos_api::walk::Walk> {
                match name {
                    #( #own_names => ::std::option::Option::Some(&mut self.#own_members as &mut dyn ::kronos_api::walk::Walk), )*
                    _ => {
                        #(
                            if ::kronos_api::schema::Composite::has_field(&self.#bases, name) {
                                return ::kronos_api::schema::Composite::field_mut(&mut self.#bases, name);
                            }
                        )*
                        ::std::option::Option::None
                    }
                }
            }
        }
    };

    Ok(expanded)
}

/// Source form of a type, without the token spacing `quote` inserts.
fn type_string(ty: &syn::Type) -> String {
    let raw = quote!(#ty).to_string();
    let chars: Vec<char> = raw.chars().collect();
    let word = |c: Option<&char>| c.is_some_and(|c| c.is_alphanumeric() || *c == '_');
    let mut out = String::with_capacity(raw.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == ' ' {
            let prev = i.checked_sub(1).and_then(|j| chars.get(j));
            if word(prev) && word(chars.get(i + 1)) {
                out.push(' ');
            }
            continue;
        }
        out.push(*c);
    }
    out
}

/// Enums hold no convertible fields: walk them as scalars.
fn opaque_impl(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(syn::parse_quote!('static));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    quote! {
        impl #impl_generics ::kronos_api::walk::Walk for #name #ty_generics #where_clause {
            fn kind(&self) -> ::kronos_api::walk::NodeKind {
                ::kronos_api::walk::NodeKind::Scalar
            }

            fn shape(&mut self) -> ::kronos_api::walk::Shape<'_> {
                ::kronos_api::walk::Shape::Scalar
            }
        }
    }
}
