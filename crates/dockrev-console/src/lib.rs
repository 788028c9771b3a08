#![forbid(unsafe_code)]

//! Rendering-independent core of the dockrev console.
//!
//! Everything here is a pure, re-derivable function of API data plus
//! ephemeral selection state: classifying a service's update opportunity,
//! resolving the concrete target tag an update should apply, mapping the
//! browser address to a route and back, and probing the supervisor before
//! offering self-upgrade actions. The HTTP API, the rendering layer, and the
//! supervisor process itself are external collaborators.

pub mod config;
pub mod nav;
pub mod resolver;
pub mod routes;
pub mod status;
pub mod supervisor;
pub mod tags;
pub mod types;

pub use config::ConsoleConfig;
pub use nav::{AddressBar, Navigator, Subscription};
pub use resolver::{ChangeFn, NO_TARGET, ResolvedTarget, TargetResolver};
pub use routes::{Route, RouteCodec};
pub use status::classify;
pub use supervisor::{
    HttpSupervisorProbe, ProbeResponse, SupervisorHealth, SupervisorMonitor, SupervisorProbe,
};
pub use tags::{TagSeries, parse_tag_series, tag_series_matches};
