//! Print the redacted request every provider family would send
//!
//! Runs entirely in debug-prompt mode, so no API keys or network access are
//! needed. Set `RUST_LOG=modelgate_core=debug` to see the pipeline logs.

use modelgate_core::{CallParams, CallResult, ProviderKind, ResponseFormat};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let format = ResponseFormat::new(
        "allergens",
        json!({
            "type": "object",
            "properties": {"allergens": {"type": "array", "items": {"type": "string"}}},
            "required": ["allergens"],
            "additionalProperties": false
        }),
    );
    let params = CallParams::new().with_response_format(format).with_debug_prompt();

    for kind in ProviderKind::ALL {
        let mut instance = kind.create("demo-key", None);
        instance.add_context("product", json!({"name": "Cheddar crackers", "sku": "CC-12"}));

        println!("== {} ==", kind);
        match instance.generate_text("Which allergens does this product contain?", &params) {
            Ok(CallResult::Simulated(request)) => match serde_json::to_string_pretty(&request) {
                Ok(rendered) => println!("{}\n", rendered),
                Err(err) => eprintln!("could not render request: {}", err),
            },
            Ok(other) => println!("{:?}\n", other),
            Err(err) => eprintln!("{}\n", err),
        }
    }
}
