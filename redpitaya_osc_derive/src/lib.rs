use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[proc_macro_derive(RegisterSerde)]
/// Derived on a 4 byte packed_struct to shim in the register word serde methods of
/// `redpitaya_osc`. Only meant to be used from inside that crate.
pub fn derive_register_serde(tokens: TokenStream) -> TokenStream {
    let input = parse_macro_input!(tokens as DeriveInput);
    let word_name = input.ident;
    let generated = quote! {
        impl crate::transport::Serialize for #word_name {
            fn serialize(&self) -> u32 {
                // lsb0 numbering packs bit 0 into the last byte
                u32::from_be_bytes(
                    <Self as ::packed_struct::PackedStruct>::pack(self)
                        .expect("Packing failed, this shouldn't happen"),
                )
            }
        }

        impl crate::transport::Deserialize for #word_name {
            fn deserialize(word: u32) -> crate::transport::TransportResult<Self> {
                Ok(<Self as ::packed_struct::PackedStruct>::unpack(&word.to_be_bytes())?)
            }
        }
    };
    TokenStream::from(generated)
}
