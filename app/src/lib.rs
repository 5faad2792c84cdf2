//! # Larder
//!
//! Client for a household pantry service: pantry items grouped by category,
//! recipes and their ingredients, meal planning, and the shopping list.
//!
//! Each screen is a reducer run by a [`larder_runtime::Store`]. Screens keep
//! their own copy of the server's collections and stay in step through the
//! [`resource::AppBus`]: whoever completes a write announces it, and every
//! mounted list reconciles.
//!
//! - [`reconciler`]: the list held by each screen
//! - [`workflow`]: the edit panel (menu, form, delete confirmation)
//! - [`session`]: login, logout and token persistence
//! - [`shell`]: the [`shell::App`] that mounts screens for the active view

pub mod config;
pub mod environment;
pub mod error;
pub mod forms;
pub mod mount;
pub mod notice;
pub mod reconciler;
pub mod resource;
pub mod router;
pub mod screens;
pub mod session;
pub mod shell;
pub mod workflow;

pub use config::AppConfig;
pub use environment::AppEnvironment;
pub use error::{AppError, ConfigError, FormError, LoginError, Result};
pub use mount::{Mounted, Screen};
pub use notice::{Notice, NoticeLevel, NoticeSlot};
pub use reconciler::{ListAction, ListPhase, ListReducer, ListState};
pub use resource::{AppBus, AppMutation, Entity, EntityKey, Resource, ResourceKind};
pub use router::{RouterAction, RouterReducer, RouterState, View};
pub use session::{FileTokenStore, SessionAction, SessionEnvironment, SessionReducer, SessionState};
pub use shell::{ActiveScreen, App};
pub use workflow::{Editable, WorkflowAction, WorkflowReducer, WorkflowState};
