//! Blocks hosting runtime
//!
//! Everything between the wire and the rendering core:
//! - **Interactions** (`interaction`) - parsed `block_actions`,
//!   `view_submission`, `view_closed` and slash command payloads,
//!   including `state.values` → `FormState` normalization
//! - **Registry** (`registry`) - callback id → root component routing
//! - **Turns** (`turn`) - the takeValues → invoke → re-render sequencing
//!   for each interaction kind, one fresh context per request
//! - **Client** (`client`) - the outbound Web API trait with a reqwest
//!   implementation and a noop stand-in for tests
//! - **Config/bootstrap** (`config`, `bootstrap`) - `BLOCKS_*` env
//!   configuration and tracing setup
//!
//! # Wiring a turn
//!
//! ```no_run
//! use blocks_core::primitives::{Section, Text};
//! use blocks_host::interaction::InteractionPayload;
//! use blocks_host::registry::BlocksRegistry;
//!
//! # async fn demo(body: serde_json::Value) -> anyhow::Result<()> {
//! let mut registry = BlocksRegistry::new();
//! registry.register("status", || Section::new(Text::new("All good")).into());
//!
//! match InteractionPayload::parse(&body)? {
//!     InteractionPayload::BlockActions(payload) => {
//!         let outcome = registry.block_actions_turn(payload).await?;
//!         // hand `outcome` to the transport layer
//!         let _ = outcome;
//!     }
//!     InteractionPayload::ViewSubmission(payload) => {
//!         let outcome = registry.view_submission_turn(payload).await?;
//!         let _ = outcome.response_action_json();
//!     }
//!     InteractionPayload::ViewClosed(payload) => {
//!         registry.view_closed_turn(payload).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod interaction;
pub mod registry;
pub mod turn;

pub use bootstrap::{bootstrap, init_tracing, BootstrapError, Host};
pub use client::{ApiError, HttpApiClient, NoopApiClient, SlackApiClient};
pub use config::{ConfigError, ConfigOverrides, HostConfig, LogFormat};
pub use interaction::{
    BlockActionsPayload, InboundView, InteractionPayload, PayloadError, SlashCommandPayload,
    ViewClosedPayload, ViewSubmissionPayload,
};
pub use registry::{BlocksRegistry, RootFactory};
pub use turn::{TurnError, TurnOutcome};
