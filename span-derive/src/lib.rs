use proc_macro::TokenStream;
use quote::quote_spanned;
use syn::{parse_macro_input, spanned::Spanned, ItemFn};

/// Records where a command is defined in the `custom_data` field of the `poise::command` output.
///
/// The expansion refers to `Context` and `Spanned` unqualified, so both must be in scope
/// wherever the attribute is used.
#[proc_macro_attribute]
pub fn inject_span(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let fn_name = input.sig.ident.clone();
    let vis = input.vis.clone();
    let item_name = fn_name.to_string();

    let span = input.span();

    let output: proc_macro2::TokenStream = quote_spanned! { span =>
        #vis fn #fn_name() -> ::poise::Command<
            <Context<'static> as poise::_GetGenerics>::U,
            <Context<'static> as poise::_GetGenerics>::E,
        > {
            #input

            let mut command = #fn_name();
            command.custom_data = Box::new(Spanned {
                item: #item_name,
                file: file!(),
                line: line!(),
                inner: command.custom_data
            }) as Box<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync + 'static>;
            command
        }
    };

    proc_macro::TokenStream::from(output)
}
