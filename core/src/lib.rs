mod bindings;
pub mod countup;
pub mod error;
pub mod hero;
pub mod host;
pub mod images;
pub mod landing;
pub mod navigation;
pub mod progress;
pub mod reveal;
pub mod shell;
pub mod special;
pub mod viewport;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use countup::{CountUpAnimator, CountUpState, parse_count_target};
pub use error::EffectError;
pub use hero::HeroEffects;
pub use host::*;
pub use images::LazyImages;
pub use landing::Landing;
pub use navigation::SmoothNavigator;
pub use progress::{ScrollMetrics, ScrollProgressIndicator};
pub use reveal::{RevealAnimator, RevealState};
pub use shell::{DeviceClass, PageShell};
pub use special::SpecialEffects;
pub use viewport::{BackendKind, ViewportWatcher, Watch, WatchOptions};
