use proc_macro2::{TokenStream, Ident, Span};
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::JsonSchema;

use crate::{impl_enum_to_tokens, impl_struct_to_tokens};

/// CAN bus parameters shared by both nodes
#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
pub struct BusConfig {
    /// Nominal bitrate, must be the same on all nodes
    pub bitrate: Bitrate,
    /// Internal loopback, useful for testing a single board
    #[serde(default)]
    pub loopback: bool,
    /// Listen-only mode, node does not drive the bus
    #[serde(default)]
    pub silent: bool,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone, Copy)]
pub enum Bitrate {
    Kbps25,
    Kbps50,
    Kbps100,
    Kbps125,
    Kbps250,
    Kbps500,
    Kbps800,
    Mbps1,
}

impl_enum_to_tokens! {
    enum Bitrate: crate::config::Bitrate,
}

impl_struct_to_tokens! {
    struct BusConfig: crate::config::BusConfig {
        bitrate,
        loopback,
        silent,
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::format::assert_tokens_eq;

    pub fn example_json() -> serde_json::Value {
        serde_json::json!({
            "bitrate": "Kbps25",
            "silent": false
        })
    }

    pub fn example_config() -> BusConfig {
        BusConfig {
            bitrate: Bitrate::Kbps25,
            loopback: false,
            silent: false,
        }
    }

    pub fn example_code() -> TokenStream {
        quote! {
            crate::config::BusConfig {
                bitrate: crate::config::Bitrate::Kbps25,
                loopback: false,
                silent: false,
            }
        }
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: BusConfig = serde_json::from_value(example_json()).unwrap();
        assert_eq!(config, example_config());
    }

    #[test]
    fn unknown_bitrate_rejected() {
        let json = serde_json::json!({ "bitrate": "Kbps33" });
        assert!(serde_json::from_value::<BusConfig>(json).is_err());
    }

    #[test]
    fn tokenize() {
        let config = example_config();
        assert_tokens_eq(quote! { #config }, example_code());
    }

    #[test]
    fn tokenize_bitrate() {
        let bitrate = Bitrate::Mbps1;
        assert_tokens_eq(quote! { #bitrate }, quote! { crate::config::Bitrate::Mbps1 });
    }
}
