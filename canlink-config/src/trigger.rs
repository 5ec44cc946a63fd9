use proc_macro2::{TokenStream, Ident, Span};
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::JsonSchema;

use crate::{impl_enum_to_tokens, impl_struct_to_tokens};

/// Button that triggers the start command on the controller
#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
pub struct TriggerConfig {
    /// Signal edge that fires the trigger
    pub edge: Edge,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone, Copy)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

impl_enum_to_tokens! {
    enum Edge: crate::hal_ext::exti::Edge,
}

impl_struct_to_tokens! {
    struct TriggerConfig: crate::config::TriggerConfig {
        edge,
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::format::assert_tokens_eq;

    pub fn example_json() -> serde_json::Value {
        serde_json::json!({ "edge": "Rising" })
    }

    pub fn example_config() -> TriggerConfig {
        TriggerConfig { edge: Edge::Rising }
    }

    pub fn example_code() -> TokenStream {
        quote! {
            crate::config::TriggerConfig {
                edge: crate::hal_ext::exti::Edge::Rising,
            }
        }
    }

    #[test]
    fn deserialize() {
        let config: TriggerConfig = serde_json::from_value(example_json()).unwrap();
        assert_eq!(config, example_config());
    }

    #[test]
    fn tokenize() {
        let config = example_config();
        assert_tokens_eq(quote! { #config }, example_code());
    }
}
