// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod command;
mod config;
mod credentials;
mod error;
mod form;
mod gate;
mod http;
mod metadata;
mod model;
mod password;
mod session;
mod storage;

use std::{path::PathBuf, process, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use config::Config;
use error::Result;
use log::{debug, error, warn};
use storage::{IsPersistent as _, Storage};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Register(command::register::Command),
    Logout(command::logout::Command),
    Whoami(command::whoami::Command),
    Predict(command::predict::Command),
    History(command::history::Command),
    Diagnosis(command::diagnosis::Command),
    Crops(command::crops::Command),
    Stats(command::stats::Command),
    Advisory(command::advisory::Command),
    Open(command::open::Command),
}

impl Command {
    async fn dispatch(self, ctx: &command::Context) -> Result<()> {
        match self {
            Self::Login(cmd) => command::dispatch(cmd, ctx).await,
            Self::Register(cmd) => command::dispatch(cmd, ctx).await,
            Self::Logout(cmd) => command::dispatch(cmd, ctx).await,
            Self::Whoami(cmd) => command::dispatch(cmd, ctx).await,
            Self::Predict(cmd) => command::dispatch(cmd, ctx).await,
            Self::History(cmd) => command::dispatch(cmd, ctx).await,
            Self::Diagnosis(cmd) => command::dispatch(cmd, ctx).await,
            Self::Crops(cmd) => command::dispatch(cmd, ctx).await,
            Self::Stats(cmd) => command::dispatch(cmd, ctx).await,
            Self::Advisory(cmd) => command::dispatch(cmd, ctx).await,
            Self::Open(cmd) => command::dispatch(cmd, ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the KhetAI API.
    #[arg(long, env = "KHETAI_API_URL", default_value = config::DEFAULT_API_URL, value_parser = Url::parse)]
    api_url: Url,

    /// The name of the session to use. Each session signs in separately, like
    /// tabs in a browser.
    #[arg(long, env = "KHETAI_SESSION", default_value = config::DEFAULT_SESSION)]
    session: String,

    /// Keep the session in memory only, so it ends when this command exits.
    #[arg(long)]
    no_persist_session: bool,

    /// Give up on any request that takes longer than this many seconds.
    #[arg(long, env = "KHETAI_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// The path to the Pinentry program to use when asking for a password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

fn session_storage(config: &Config) -> Box<dyn Storage> {
    if config.persist_session {
        match storage::File::new(&config.session) {
            Ok(file_storage) => return Box::new(file_storage),
            Err(e) => {
                warn!("We need to fall back to in-memory session storage: {}", e);
            }
        }
    }

    Box::new(storage::Memory::new())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::new(args.api_url)
        .with_session(&args.session)?
        .with_persistence(!args.no_persist_session)
        .with_timeout(args.timeout_secs.map(Duration::from_secs));

    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let storage = session_storage(&config);
    debug!(
        "Using {} storage for session '{}'",
        if storage.is_persistent() { "persistent" } else { "in-memory" },
        config.session
    );

    let client = Arc::new(http::Client::new(&config)?);
    let identity: Arc<dyn session::Identity> = Arc::<http::Client>::clone(&client);
    let session = Arc::new(session::Manager::new(
        storage,
        Arc::clone(&client),
        identity,
    ));
    let ctx = command::Context {
        client,
        prompt: Arc::new(prompt),
    };

    let verification = session.restore().await.map(|unverified| {
        let verifier = Arc::clone(&session);
        tokio::spawn(async move { verifier.verify(unverified).await })
    });

    let result = session::provide(session, args.command.dispatch(&ctx)).await;
    if let Some(verification) = verification {
        let phase = verification.await?;
        debug!("Session finished {}", phase);
    }

    result
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("KHETAI_LOG", "warn")
        .write_style("KHETAI_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
