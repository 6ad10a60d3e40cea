// crates/input_demo/src/main.rs
mod app;

use std::env;
use std::error::Error;
use std::path::PathBuf;

use input_core::InputDefaults;
use input_shared::InputConfig;
use tracing::warn;

use crate::app::DemoApp;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    // input_demo [definitions.json] [profile]
    let args: Vec<String> = env::args().collect();
    let definitions_path = args.get(1).map(PathBuf::from);
    let profile = args.get(2).cloned();

    let definitions = match &definitions_path {
        Some(path) => match InputConfig::load_from(path) {
            Ok(config) => config.inputs,
            Err(err) => {
                warn!("Could not read {}: {err}. Using built-in inputs.", path.display());
                InputDefaults::definitions()
            }
        },
        None => InputDefaults::definitions(),
    };

    DemoApp::new(definitions, definitions_path, profile).run()
}
