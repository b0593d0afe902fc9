// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audio Native Dashboard CLI
//!
//! Signs in to the hosted provider, shows the restored session, edits
//! settings, browses generated audio history and renders the player embed
//! snippet.

use anyhow::{bail, Context};
use audio_native_dashboard::{
    config::Config,
    gateway::SupabaseGateway,
    models::VoiceProvider,
    services::{
        embed, FileSnapshotStore, GeneralEdit, PlayerEdit, SettingsEdit, SortField, VoiceEdit,
    },
    time_utils::{format_date, truncate_text},
    AppState,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "audio-native-dashboard")]
#[command(about = "Manage Audio Native player settings and history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the restored session and settings
    Status,
    /// Sign in with email and password
    SignIn {
        email: String,
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with a Google ID token
    SignInGoogle {
        #[arg(long, env = "GOOGLE_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },
    /// Create an account
    SignUp {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the local session
    SignOut,
    /// Email a password reset link
    ResetPassword { email: String },
    /// List generated audio
    History {
        /// Pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Only show items matching this text
        #[arg(long)]
        search: Option<String>,
        /// Sort column
        #[arg(long, value_enum)]
        sort: Option<SortColumn>,
        /// Sort descending instead of ascending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Test a page URL against the website settings
    CheckUrl { url: String },
    /// Print the player embed snippet
    Embed {
        /// Overrides PUBLIC_USER_ID
        #[arg(long)]
        public_user_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Allow the player on URLs starting with this prefix
    AllowUrl { url: String },
    /// Remove an allowed URL prefix
    UnallowUrl { url: String },
    /// Block the player on this exact URL
    BlockUrl { url: String },
    /// Remove a blocked URL
    UnblockUrl { url: String },
    /// Block the player on URLs containing this word
    BlockWord { word: String },
    /// Remove a blocked word
    UnblockWord { word: String },
    /// Player appearance and controls
    Player {
        #[arg(long)]
        small: Option<bool>,
        #[arg(long)]
        volume_control: Option<bool>,
        #[arg(long)]
        rewind_forward: Option<bool>,
        #[arg(long)]
        speed_control: Option<bool>,
        /// Hex (#RRGGBB or #RRGGBBAA) or rgb()/rgba()
        #[arg(long)]
        text_color: Option<String>,
        /// Hex (#RRGGBB or #RRGGBBAA) or rgb()/rgba()
        #[arg(long)]
        bg_color: Option<String>,
    },
    /// Voice defaults for new projects
    Voice {
        #[arg(long)]
        autoselect: Option<bool>,
        /// 11Labs, OpenAI, PlayHT or Google
        #[arg(long)]
        provider: Option<VoiceProvider>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        voice: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Project behaviour
    General {
        #[arg(long)]
        sessionization: Option<bool>,
        #[arg(long)]
        autoconvert: Option<bool>,
    },
}

impl SettingsAction {
    /// The edit to apply; `None` for `show`.
    fn into_edit(self) -> Option<SettingsEdit> {
        let edit = match self {
            SettingsAction::Show => return None,
            SettingsAction::AllowUrl { url } => SettingsEdit::AllowUrl(url),
            SettingsAction::UnallowUrl { url } => SettingsEdit::UnallowUrl(url),
            SettingsAction::BlockUrl { url } => SettingsEdit::BlockUrl(url),
            SettingsAction::UnblockUrl { url } => SettingsEdit::UnblockUrl(url),
            SettingsAction::BlockWord { word } => SettingsEdit::BlockWord(word),
            SettingsAction::UnblockWord { word } => SettingsEdit::UnblockWord(word),
            SettingsAction::Player {
                small,
                volume_control,
                rewind_forward,
                speed_control,
                text_color,
                bg_color,
            } => SettingsEdit::Player(PlayerEdit {
                small_player: small,
                volume_control,
                rewind_forward,
                speed_control,
                text_color,
                bg_color,
            }),
            SettingsAction::Voice {
                autoselect,
                provider,
                language,
                gender,
                voice,
                model,
            } => SettingsEdit::Voice(VoiceEdit {
                autoselect_voice: autoselect,
                voice_provider: provider,
                language,
                gender,
                default_voice: voice,
                default_model: model,
            }),
            SettingsAction::General {
                sessionization,
                autoconvert,
            } => SettingsEdit::General(GeneralEdit {
                sessionization,
                autoconvert,
            }),
        };
        Some(edit)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortColumn {
    Id,
    Voice,
    Text,
    PageUrl,
    AudioUrl,
    CreatedDate,
    Listens,
}

impl From<SortColumn> for SortField {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Id => SortField::Id,
            SortColumn::Voice => SortField::Voice,
            SortColumn::Text => SortField::Text,
            SortColumn::PageUrl => SortField::PageUrl,
            SortColumn::AudioUrl => SortField::AudioUrl,
            SortColumn::CreatedDate => SortField::CreatedDate,
            SortColumn::Listens => SortField::Listens,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(storage_dir = %config.storage_dir.display(), "Configuration loaded");

    let snapshots = Arc::new(FileSnapshotStore::new(&config.storage_dir));
    let gateway = Arc::new(SupabaseGateway::from_config(&config, snapshots.clone())?);
    let state = AppState::new(config, gateway, snapshots);

    match cli.command {
        Command::Status => {
            let snapshot = state.session.state().await;
            match (&snapshot.user, snapshot.is_authenticated) {
                (Some(user), true) => println!("Signed in as {} <{}>", user.name, user.email),
                _ => println!("Signed out"),
            }
            println!("{}", serde_json::to_string_pretty(&snapshot.settings)?);
        }
        Command::SignIn { email, password } => {
            let user = state.session.sign_in(&email, &password).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Command::SignInGoogle { id_token } => {
            let user = state.session.sign_in_with_google(&id_token).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Command::SignUp {
            email,
            name,
            password,
        } => {
            let user = state.session.sign_up(&email, &password, &name).await?;
            println!("Account created for {} <{}>", user.name, user.email);
        }
        Command::SignOut => {
            state.session.sign_out().await?;
            println!("Signed out");
        }
        Command::ResetPassword { email } => {
            state.session.request_password_reset(&email).await?;
            println!("Password reset email sent to {}", email);
        }
        Command::History {
            pages,
            search,
            sort,
            desc,
        } => {
            let feed = &state.history;
            for _ in 0..pages {
                if !feed.has_more().await {
                    break;
                }
                feed.load_more().await?;
            }

            if let Some(column) = sort {
                let field = SortField::from(column);
                feed.sort(field).await;
                if desc {
                    feed.sort(field).await;
                }
            }
            if let Some(term) = search {
                feed.search(&term).await;
            }

            for item in feed.visible().await {
                println!(
                    "{:>6}  {}  {:<12}  {:>5}  {}  {}",
                    item.id,
                    format_date(&item.created_date),
                    item.voice.name,
                    item.listens,
                    truncate_text(&item.text, 60),
                    item.page_url
                );
            }
        }
        Command::Settings { action } => {
            let current = state.session.state().await.settings;
            let settings = match action.into_edit() {
                None => current,
                Some(edit) => match edit.to_patch(&current)? {
                    Some(patch) => state.session.update_settings(patch).await?,
                    None => {
                        println!("Settings unchanged");
                        current
                    }
                },
            };
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::CheckUrl { url } => {
            let settings = state.session.state().await.settings;
            println!("{}", settings.websites.check_url(&url));
        }
        Command::Embed { public_user_id } => {
            let Some(public_user_id) =
                public_user_id.or_else(|| state.config.public_user_id.clone())
            else {
                bail!("No public user id; pass --public-user-id or set PUBLIC_USER_ID");
            };
            let settings = state.session.state().await.settings;
            let snippet = embed::iframe_snippet(
                &state.config.player_base_url,
                &public_user_id,
                &settings.player,
            )?;
            println!("{}", snippet);
        }
    }

    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("audio_native_dashboard=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
