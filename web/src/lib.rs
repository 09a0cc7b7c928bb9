use clap::Parser;
use concentration_core::Dimensions;
use wasm_bindgen::prelude::*;

mod game;
mod storage;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Board size to start with, like 4x4
    #[arg(short, long)]
    difficulty: Option<Dimensions>,
}

/// Arguments come from the URL fragment, e.g. `#-vv&--seed=42&--difficulty=6x6`.
fn parse_args(location_hash: &str) -> Result<Args, clap::Error> {
    Args::try_parse_from(location_hash.split(['#', '&']))
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let (args, args_error) = match parse_args(&location_hash) {
        Ok(args) => (args, None),
        Err(err) => (Args::parse_from([""]), Some(err)),
    };
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).expect("Error initializing logger");
    }
    if let Some(err) = args_error {
        log::warn!("Ignoring URL arguments: {}", err);
    }
    log::debug!("seed: {:?}, difficulty: {:?}", args.seed, args.difficulty);

    let root = document()
        .get_element_by_id("game")
        .expect("Could not find id=\"game\" element");

    log::debug!("App started");
    yew::Renderer::<game::GameView>::with_root_and_props(
        root,
        game::GameProps {
            seed: args.seed,
            difficulty: args.difficulty,
        },
    )
    .render();
}
