//! Business modules of the sample platform.
//!
//! Dependency graph:
//!
//! ```text
//! auth <- profiles <- campaigns
//!   ^                    |
//!   +--- notifications <-+ (via the domain bus)
//! ```

mod auth;
mod campaigns;
mod error;
mod notifications;
mod profiles;

pub use auth::AuthModule;
pub use campaigns::{Campaign, CampaignsModule, CAMPAIGN_CREATED};
pub use error::PlatformError;
pub use notifications::{Notification, NotificationsModule};
pub use profiles::{Profile, ProfilesModule};
