pub mod bus;
pub mod format;
pub mod trigger;

use std::{path::Path, fs::File, io::{Write, BufReader}};

use anyhow::Context;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::{JsonSchema, schema_for, schema::RootSchema};

const fn default_tx_timeout_ms() -> u32 {
    1000
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq)]
pub struct NodeConfig {
    bus: bus::BusConfig,
    /// Time limit for a single transmission attempt
    #[serde(default = "default_tx_timeout_ms")]
    tx_timeout_ms: u32,
    trigger: trigger::TriggerConfig,
}

impl ToTokens for NodeConfig {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let bus = &self.bus;
        let tx_timeout_ms = &self.tx_timeout_ms;
        let trigger = &self.trigger;
        tokens.append_all(quote! {
            crate::config::NodeConfig {
                bus: #bus,
                tx_timeout_ms: #tx_timeout_ms,
                trigger: #trigger,
            }
        })
    }
}

impl NodeConfig {
    fn file_tokens(&self) -> TokenStream {
        quote! {
            pub static CONFIG: crate::config::NodeConfig = #self;
        }
    }

    fn to_string_pretty(&self) -> anyhow::Result<String> {
        let file = self.file_tokens();
        format::format_file(file.clone())
            .context(format!("Failed to parse:\n{}", file))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.tx_timeout_ms > 0, "tx_timeout_ms must be non-zero");
        Ok(())
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let code = self.to_string_pretty()?;
        file.write_all(code.as_bytes())?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(&mut reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn schema() -> RootSchema {
        schema_for!(Self)
    }

    pub fn schema_to_file(path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let schema = Self::schema();
        let string = serde_json::to_string_pretty(&schema)?;
        file.write_all(string.as_bytes())?;
        Ok(())
    }
}

/// Implement ToTokens for a simple enum with variants without data.
#[macro_export]
macro_rules! impl_enum_to_tokens {
    ( $( enum $enum:ident: $path:path ),* $(,)? ) => {
        $(
            impl ToTokens for $enum {
                fn to_tokens(&self, tokens: &mut TokenStream) {
                    let v = serde_json::to_value(self).unwrap();
                    let s = v.as_str().unwrap();
                    let i = Ident::new(s, Span::call_site());
                    tokens.append_all(quote! { $path::#i });
                }
            }
        )*
    };
}

/// Implement ToTokens for a regular struct
///
/// Uses $path as the name of struct in generated tokens. Each field
/// has to end with a comma (even the last one).
#[macro_export]
macro_rules! impl_struct_to_tokens {
    ( $( struct $struct:ident: $path:path { $($field:ident,)* } )* ) => {
        $(
            impl ToTokens for $struct {
                fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
                    $( let $field = &self.$field; )*
                    tokens.append_all(quote! {
                        $path { $( $field: #$field, )* }
                    });
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use crate::format::assert_tokens_eq;

    use super::*;

    pub fn example_json() -> serde_json::Value {
        serde_json::json!({
            "bus": bus::tests::example_json(),
            "tx_timeout_ms": 1000u32,
            "trigger": trigger::tests::example_json(),
        })
    }

    pub fn example_config() -> NodeConfig {
        NodeConfig {
            bus: bus::tests::example_config(),
            tx_timeout_ms: 1000,
            trigger: trigger::tests::example_config(),
        }
    }

    pub fn example_code() -> TokenStream {
        let bus = bus::tests::example_code();
        let trigger = trigger::tests::example_code();
        quote! {
            crate::config::NodeConfig {
                bus: #bus,
                tx_timeout_ms: 1000u32,
                trigger: #trigger,
            }
        }
    }

    #[test]
    fn deserialize() -> anyhow::Result<()> {
        let config: NodeConfig = serde_json::from_value(example_json())?;
        assert_eq!(config, example_config());
        Ok(())
    }

    #[test]
    fn default_timeout() -> anyhow::Result<()> {
        let mut json = example_json();
        json.as_object_mut().unwrap().remove("tx_timeout_ms");
        let config: NodeConfig = serde_json::from_value(json)?;
        assert_eq!(config.tx_timeout_ms, 1000);
        Ok(())
    }

    #[test]
    fn zero_timeout_invalid() {
        let config = NodeConfig { tx_timeout_ms: 0, ..example_config() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tokenize() {
        let config = example_config();
        assert_tokens_eq(quote! { #config }, example_code())
    }

    #[test]
    fn file_contains_static() -> anyhow::Result<()> {
        let code = example_config().to_string_pretty()?;
        assert!(code.starts_with("pub static CONFIG: crate::config::NodeConfig = crate::config::NodeConfig {"));
        Ok(())
    }

    #[test]
    fn schema_lists_bitrates() -> anyhow::Result<()> {
        let schema = serde_json::to_string(&NodeConfig::schema())?;
        assert!(schema.contains("Kbps25"));
        assert!(schema.contains("Mbps1"));
        Ok(())
    }
}
