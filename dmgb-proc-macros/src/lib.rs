extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::Data::Enum;
use syn::{DeriveInput, Ident};

/// Collect the variant identifiers of a fieldless enum, panicking with a message that names the
/// offending derive if the input is not an enum or has a variant with fields.
fn fieldless_variants<'a>(ast: &'a DeriveInput, derive_name: &str) -> Vec<&'a Ident> {
    let name = &ast.ident;

    let Enum(data) = &ast.data else {
        panic!("{derive_name} derive macro can only be applied to enums; {name} is not an enum")
    };

    data.variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            if !variant.fields.is_empty() {
                panic!("{derive_name} only supports enums with only fieldless variants; {name}::{variant_name} has fields");
            }
            variant_name
        })
        .collect()
}

/// Normalize a name for lookup: lowercase with `_`, `-` and spaces removed.
fn lookup_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Implement the `std::fmt::Display` trait for the given enum by writing the variant name. Only
/// supports enums which have only fieldless variants.
#[proc_macro_derive(EnumDisplay)]
pub fn enum_display(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = &ast.ident;
    let match_arms: Vec<_> = fieldless_variants(&ast, "EnumDisplay")
        .into_iter()
        .map(|variant_name| {
            let variant_name_str = variant_name.to_string();
            quote! {
                Self::#variant_name => f.write_str(#variant_name_str)
            }
        })
        .collect();

    let gen = quote! {
        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    #(#match_arms,)*
                }
            }
        }
    };

    gen.into()
}

/// Implement the `std::str::FromStr` trait for the given enum, with `FromStr::Err` set to `String`.
/// Only supports enums which have only fieldless variants.
///
/// Matching ignores ASCII case as well as `_`, `-` and spaces, so a variant named `FixedRom`
/// parses from `FixedRom`, `fixed_rom`, `fixed-rom` and `FIXEDROM`.
#[proc_macro_derive(EnumFromStr)]
pub fn enum_from_str(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = &ast.ident;
    let match_arms: Vec<_> = fieldless_variants(&ast, "EnumFromStr")
        .into_iter()
        .map(|variant_name| {
            let key = lookup_key(&variant_name.to_string());
            quote! {
                #key => Ok(Self::#variant_name)
            }
        })
        .collect();

    let err_fmt_string = format!("invalid {name} string: '{{}}'");
    let gen = quote! {
        impl std::str::FromStr for #name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key: String = s
                    .chars()
                    .filter(|c| !matches!(c, '_' | '-' | ' '))
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                match key.as_str() {
                    #(#match_arms,)*
                    _ => Err(format!(#err_fmt_string, s))
                }
            }
        }
    };

    gen.into()
}

/// Implement the `serde::Serialize` trait for the given type, serializing values as strings. This
/// requires that the type implements the `std::fmt::Display` trait.
#[proc_macro_derive(StrSerialize)]
pub fn str_serialize(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let ident = &ast.ident;

    let gen = quote! {
        impl serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }
    };

    gen.into()
}

/// Implement the `serde::Deserialize` trait for the given type, deserializing values from strings.
/// This requires that the type implements the `std::str::FromStr` trait with an error type that
/// implements `std::fmt::Display`.
#[proc_macro_derive(StrDeserialize)]
pub fn str_deserialize(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let ident = &ast.ident;

    let visitor_struct_name = format_ident!("__{}StrVisitor", ident);
    let expecting_fmt_string = format!("a string naming a {ident}");
    let gen = quote! {
        struct #visitor_struct_name;

        impl<'de> serde::de::Visitor<'de> for #visitor_struct_name {
            type Value = #ident;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str(#expecting_fmt_string)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(serde::de::Error::custom)
            }
        }

        impl<'de> serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_str(#visitor_struct_name)
            }
        }
    };

    gen.into()
}
