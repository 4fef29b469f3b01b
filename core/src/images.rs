//! Deferred image loading: `data-src` becomes `src` once the image is seen.

use std::cell::Cell;
use std::rc::Rc;

use dreamjob_types::LazyImagesConfig;
use tracing::debug;

use crate::error::EffectError;
use crate::host::Host;
use crate::viewport::{ViewportWatcher, Watch, WatchOptions};

pub const DATA_SRC: &str = "data-src";

/// Swap in the real source. Images without `data-src` are left alone.
pub fn load_image<H: Host>(host: &H, image: &H::Node) -> bool {
    match host.attribute(image, DATA_SRC) {
        Some(src) => {
            host.set_attribute(image, "src", &src);
            host.remove_attribute(image, DATA_SRC);
            true
        }
        None => false,
    }
}

pub struct LazyImages<H: Host> {
    watcher: ViewportWatcher<H>,
    destroyed: Rc<Cell<bool>>,
}

impl<H: Host> LazyImages<H> {
    pub fn mount(
        host: &Rc<H>,
        config: &LazyImagesConfig,
        options: WatchOptions,
    ) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled {
                component: "lazy_images",
            });
        }

        let images = host.query_all(&config.selector);
        let lazy = Self {
            watcher: ViewportWatcher::new(host, options),
            destroyed: Rc::new(Cell::new(false)),
        };

        let mut loaded_now = 0;
        for image in &images {
            let weak = Rc::downgrade(host);
            let destroyed = lazy.destroyed.clone();
            let outcome = lazy.watcher.watch(image, move |image| {
                if let Some(host) = weak.upgrade()
                    && !destroyed.get()
                {
                    load_image(&*host, image);
                }
            });
            if outcome == Watch::Unsupported {
                load_image(&**host, image);
                loaded_now += 1;
            }
        }

        debug!(
            images = images.len(),
            loaded_now,
            "Lazy images mounted"
        );
        Ok(lazy)
    }

    /// Images still waiting to become visible.
    pub fn pending(&self) -> usize {
        self.watcher.pending_count()
    }

    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.watcher.destroy();
        debug!("Lazy images destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Dom;
    use crate::testing::{FakeHost, FakeNode};
    use dreamjob_types::{ViewportConfig, VisibilityFallback};

    fn image(host: &FakeHost, src: &str) -> FakeNode {
        let img = host.add(None, "img", &[]);
        host.set_attribute(&img, DATA_SRC, src);
        img
    }

    #[test]
    fn test_loads_when_visible() {
        let host = FakeHost::with_native_observer();
        let img = image(&host, "/img/team.webp");
        let lazy =
            LazyImages::mount(&host, &LazyImagesConfig::default(), WatchOptions::default()).unwrap();

        assert_eq!(lazy.pending(), 1);
        assert_eq!(host.attribute(&img, "src"), None);

        host.intersect(img);
        assert_eq!(host.attribute(&img, "src").as_deref(), Some("/img/team.webp"));
        assert_eq!(host.attribute(&img, DATA_SRC), None);
        assert_eq!(lazy.pending(), 0);
    }

    #[test]
    fn test_loads_immediately_without_detection() {
        let host = FakeHost::new();
        let img = image(&host, "/img/hero.jpg");
        let options = WatchOptions::from(&ViewportConfig {
            fallback: VisibilityFallback::Immediate,
            ..Default::default()
        });
        let lazy = LazyImages::mount(&host, &LazyImagesConfig::default(), options).unwrap();

        assert_eq!(host.attribute(&img, "src").as_deref(), Some("/img/hero.jpg"));
        assert_eq!(lazy.pending(), 0);
    }

    #[test]
    fn test_destroyed_images_stay_deferred() {
        let host = FakeHost::with_native_observer();
        let img = image(&host, "/img/late.png");
        let lazy =
            LazyImages::mount(&host, &LazyImagesConfig::default(), WatchOptions::default()).unwrap();

        lazy.destroy();
        host.intersect(img);
        assert_eq!(host.attribute(&img, "src"), None);
        assert_eq!(host.observed_count(), 0);
    }
}
