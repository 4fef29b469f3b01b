//! Composition root: mounts every enabled effect and tears them all down.

use std::cell::Cell;
use std::rc::Rc;

use dreamjob_types::EffectsConfig;
use tracing::{debug, info, warn};

use crate::countup::CountUpAnimator;
use crate::error::EffectError;
use crate::hero::HeroEffects;
use crate::host::Host;
use crate::images::LazyImages;
use crate::navigation::SmoothNavigator;
use crate::progress::ScrollProgressIndicator;
use crate::reveal::RevealAnimator;
use crate::shell::PageShell;
use crate::viewport::WatchOptions;

/// Run one component's mount. Failures are logged and turn into `None` so
/// the remaining components still mount.
fn mount_component<T>(name: &str, mount: impl FnOnce() -> Result<T, EffectError>) -> Option<T> {
    match mount() {
        Ok(component) => Some(component),
        Err(err @ EffectError::Disabled { .. }) => {
            debug!(component = name, "{err}");
            None
        }
        Err(err) => {
            warn!(component = name, error = %err, "Skipping effect");
            None
        }
    }
}

/// Every effect on the page. Components that are disabled or failed to mount
/// are `None`.
pub struct Landing<H: Host> {
    shell: Option<PageShell<H>>,
    progress: Option<ScrollProgressIndicator<H>>,
    reveal: Option<RevealAnimator<H>>,
    count_up: Option<CountUpAnimator<H>>,
    hero: Option<HeroEffects<H>>,
    navigation: Option<SmoothNavigator<H>>,
    lazy_images: Option<LazyImages<H>>,
    destroyed: Cell<bool>,
}

impl<H: Host> Landing<H> {
    pub fn mount(host: Rc<H>, config: &EffectsConfig) -> Self {
        let options = WatchOptions::from(&config.viewport);

        let shell = mount_component("shell", || PageShell::mount(&host, &config.shell));
        let progress = mount_component("progress", || {
            ScrollProgressIndicator::mount(&host, &config.progress)
        });
        let reveal = mount_component("reveal", || {
            RevealAnimator::mount(&host, &config.reveal, options)
        });
        let count_up = mount_component("count_up", || {
            CountUpAnimator::mount(&host, &config.count_up, options)
        });
        let hero = mount_component("hero", || HeroEffects::mount(&host, &config.hero));
        let navigation = mount_component("navigation", || {
            SmoothNavigator::mount(&host, &config.navigation)
        });
        let lazy_images = mount_component("lazy_images", || {
            LazyImages::mount(&host, &config.lazy_images, options)
        });

        if let Some(shell) = &shell {
            if let Some(reveal) = &reveal {
                let reveal = reveal.clone();
                shell.on_resize(move || reveal.handle_resize());
            }
            if let Some(navigation) = &navigation {
                let navigation = navigation.clone();
                shell.on_resize(move || navigation.update_active_section());
            }
        }

        let landing = Self {
            shell,
            progress,
            reveal,
            count_up,
            hero,
            navigation,
            lazy_images,
            destroyed: Cell::new(false),
        };
        info!(mounted = landing.mounted_count(), "Landing effects ready");
        landing
    }

    /// How many components are live.
    pub fn mounted_count(&self) -> usize {
        [
            self.shell.is_some(),
            self.progress.is_some(),
            self.reveal.is_some(),
            self.count_up.is_some(),
            self.hero.is_some(),
            self.navigation.is_some(),
            self.lazy_images.is_some(),
        ]
        .into_iter()
        .filter(|mounted| *mounted)
        .count()
    }

    pub fn shell(&self) -> Option<&PageShell<H>> {
        self.shell.as_ref()
    }

    pub fn progress(&self) -> Option<&ScrollProgressIndicator<H>> {
        self.progress.as_ref()
    }

    pub fn reveal(&self) -> Option<&RevealAnimator<H>> {
        self.reveal.as_ref()
    }

    pub fn count_up(&self) -> Option<&CountUpAnimator<H>> {
        self.count_up.as_ref()
    }

    pub fn hero(&self) -> Option<&HeroEffects<H>> {
        self.hero.as_ref()
    }

    pub fn navigation(&self) -> Option<&SmoothNavigator<H>> {
        self.navigation.as_ref()
    }

    pub fn lazy_images(&self) -> Option<&LazyImages<H>> {
        self.lazy_images.as_ref()
    }

    /// Smooth-scroll to the first element matching `selector`.
    pub fn scroll_to_section(&self, selector: &str) -> bool {
        if self.destroyed.get() {
            return false;
        }
        self.navigation
            .as_ref()
            .is_some_and(|nav| nav.scroll_to_section(selector))
    }

    /// Apply a resize right away, skipping the debounce.
    pub fn handle_resize(&self) {
        if self.destroyed.get() {
            return;
        }
        match &self.shell {
            Some(shell) => shell.handle_resize(),
            None => {
                if let Some(reveal) = &self.reveal {
                    reveal.handle_resize();
                }
                if let Some(navigation) = &self.navigation {
                    navigation.update_active_section();
                }
            }
        }
    }

    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        if let Some(shell) = &self.shell {
            shell.destroy();
        }
        if let Some(progress) = &self.progress {
            progress.destroy();
        }
        if let Some(reveal) = &self.reveal {
            reveal.destroy();
        }
        if let Some(count_up) = &self.count_up {
            count_up.destroy();
        }
        if let Some(hero) = &self.hero {
            hero.destroy();
        }
        if let Some(navigation) = &self.navigation {
            navigation.destroy();
        }
        if let Some(lazy_images) = &self.lazy_images {
            lazy_images.destroy();
        }
        info!("Landing effects destroyed");
    }
}
