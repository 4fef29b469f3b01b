//! Effect configuration
//!
//! Every section is `#[serde(default)]`, so a page can ship a partial JSON or
//! TOML object and inherit the rest. Selectors are plain CSS selectors; the
//! engine never hard-codes markup classes beyond these defaults.

use serde::{Deserialize, Serialize};

/// Shortest reveal transition the animator will apply.
pub const REVEAL_MIN_DURATION_MS: u32 = 600;
/// Longest reveal transition the animator will apply.
pub const REVEAL_MAX_DURATION_MS: u32 = 800;

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for every landing page effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Minimum log level forwarded to the browser console (`trace`..`error`).
    pub log_level: String,
    pub viewport: ViewportConfig,
    pub reveal: RevealConfig,
    pub count_up: CountUpConfig,
    pub progress: ProgressConfig,
    pub navigation: NavigationConfig,
    pub hero: HeroConfig,
    pub shell: ShellConfig,
    pub lazy_images: LazyImagesConfig,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            viewport: ViewportConfig::default(),
            reveal: RevealConfig::default(),
            count_up: CountUpConfig::default(),
            progress: ProgressConfig::default(),
            navigation: NavigationConfig::default(),
            hero: HeroConfig::default(),
            shell: ShellConfig::default(),
            lazy_images: LazyImagesConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visibility
// ─────────────────────────────────────────────────────────────────────────────

/// What to do when the browser has no native intersection observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFallback {
    /// Check element rectangles on scroll and resize.
    #[default]
    Polling,
    /// Treat every watched element as visible right away.
    Immediate,
}

/// Viewport intersection settings shared by every watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Visible fraction of the element needed before it counts as seen.
    pub threshold: f64,
    /// Pixels cut from the bottom of the viewport before testing.
    pub bottom_margin_px: f64,
    pub fallback: VisibilityFallback,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin_px: 50.0,
            fallback: VisibilityFallback::Polling,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reveal / count-up
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub enabled: bool,
    /// Elements that fade in once. Duplicates across selectors are merged.
    pub selectors: Vec<String>,
    /// Initial downward offset in pixels.
    pub offset_px: f64,
    /// Transition length; clamped by [`RevealConfig::duration_ms`].
    pub duration_ms: u32,
    /// Extra effects played on revealed elements matching a selector.
    pub special_effects: Vec<SpecialEffectRule>,
}

impl RevealConfig {
    /// Transition length clamped to the supported reveal range.
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
            .clamp(REVEAL_MIN_DURATION_MS, REVEAL_MAX_DURATION_MS)
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selectors: vec![".reveal-candidate".to_string()],
            offset_px: 30.0,
            duration_ms: REVEAL_MIN_DURATION_MS,
            special_effects: vec![
                SpecialEffectRule::new(".audience-card", SpecialEffect::HoverLift),
                SpecialEffectRule::new(".timeline-item", SpecialEffect::TimelineHighlight),
                SpecialEffectRule::new(".partner-item", SpecialEffect::LogoLift),
                SpecialEffectRule::new(".result-item", SpecialEffect::Pulse),
            ],
        }
    }
}

/// Effect played once an element has been revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialEffect {
    /// Card lifts on hover and spins its `.card-number`.
    HoverLift,
    /// `.timeline-dot` pops and `.timeline-content` flashes.
    TimelineHighlight,
    /// `.partner-logo` bobs once; the item scales on hover.
    LogoLift,
    /// `.result-icon`/`.result-number` pulses; the item grows a shadow on hover.
    Pulse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialEffectRule {
    pub selector: String,
    pub effect: SpecialEffect,
}

impl SpecialEffectRule {
    pub fn new(selector: &str, effect: SpecialEffect) -> Self {
        Self {
            selector: selector.to_string(),
            effect,
        }
    }
}

/// Digit grouping used for count-up frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberGrouping {
    /// `12000`
    #[default]
    None,
    /// `12,000`
    Standard,
    /// `12.000`
    European,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountUpConfig {
    pub enabled: bool,
    pub selector: String,
    pub duration_ms: u32,
    pub grouping: NumberGrouping,
}

impl Default for CountUpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selector: ".count-target".to_string(),
            duration_ms: 2000,
            grouping: NumberGrouping::None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scroll progress / navigation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub enabled: bool,
    /// Class of the indicator bar; an existing element with it is reused.
    pub class_name: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            class_name: "scroll-progress".to_string(),
        }
    }
}

/// Buttons that scroll to a section when clicked.
///
/// Every element matching `button` is bound, after dropping the first
/// `skip` matches and keeping at most `limit` of the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtaBinding {
    pub button: String,
    pub section: String,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl CtaBinding {
    pub fn new(button: &str, section: &str) -> Self {
        Self {
            button: button.to_string(),
            section: section.to_string(),
            skip: 0,
            limit: None,
        }
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Tracks which section currently fills the middle of the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveSectionConfig {
    pub enabled: bool,
    pub selector: String,
    /// Fraction of a section inside the band before it becomes active.
    pub threshold: f64,
    /// Pixels cut from the top and bottom of the viewport.
    pub margin_px: f64,
    /// Class put on the active section; empty only logs the change.
    pub class_name: String,
}

impl Default for ActiveSectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selector: "section[class]".to_string(),
            threshold: 0.3,
            margin_px: 100.0,
            class_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub enabled: bool,
    /// Links handled by the smooth navigator.
    pub anchor_selector: String,
    /// Space left above the target for a fixed header.
    pub header_offset_px: f64,
    pub call_to_action: Vec<CtaBinding>,
    pub active_section: ActiveSectionConfig,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            anchor_selector: "a[href^=\"#\"]".to_string(),
            header_offset_px: 80.0,
            call_to_action: vec![
                CtaBinding::new(".hero-actions .btn", ".target-audience").limit(1),
                CtaBinding::new(".hero-actions .btn", ".why-important").skip(1),
            ],
            active_section: ActiveSectionConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hero
// ─────────────────────────────────────────────────────────────────────────────

/// One staggered part of the hero intro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroStep {
    pub selector: String,
    pub delay_ms: u32,
}

impl IntroStep {
    fn new(selector: &str, delay_ms: u32) -> Self {
        Self {
            selector: selector.to_string(),
            delay_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub enabled: bool,
    pub root: String,
    pub intro: Vec<IntroStep>,
    pub intro_duration_ms: u32,
    pub intro_offset_px: f64,
    pub button_selector: String,
    pub background_selector: String,
    /// Background moves this fraction of the scroll distance.
    pub parallax_rate: f64,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: ".hero".to_string(),
            intro: vec![
                IntroStep::new(".title-uk", 0),
                IntroStep::new(".title-en", 300),
                IntroStep::new(".hero-subtitle", 600),
                IntroStep::new(".hero-description p:first-child", 800),
                IntroStep::new(".hero-description p:last-child", 1000),
                IntroStep::new(".hero-actions", 1200),
            ],
            intro_duration_ms: 800,
            intro_offset_px: 30.0,
            button_selector: ".btn".to_string(),
            background_selector: ".hero-bg-image".to_string(),
            parallax_rate: 0.3,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Page shell / images
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub enabled: bool,
    /// Widths up to this value get the `mobile` class.
    pub mobile_max_width: f64,
    /// Widths up to this value (and above mobile) get the `tablet` class.
    pub tablet_max_width: f64,
    pub resize_debounce_ms: u32,
    /// Skip link target; empty disables the link.
    pub skip_link_target: String,
    pub skip_link_text: String,
    pub hide_broken_images: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mobile_max_width: 768.0,
            tablet_max_width: 968.0,
            resize_debounce_ms: 250,
            skip_link_target: "#main-content".to_string(),
            skip_link_text: "Skip to main content".to_string(),
            hide_broken_images: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyImagesConfig {
    pub enabled: bool,
    pub selector: String,
}

impl Default for LazyImagesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selector: "img[data-src]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: EffectsConfig = toml::from_str("").unwrap();
        assert_eq!(config, EffectsConfig::default());
        assert_eq!(config.viewport.threshold, 0.1);
        assert_eq!(config.navigation.header_offset_px, 80.0);
        assert_eq!(config.count_up.duration_ms, 2000);
    }

    #[test]
    fn test_partial_section_override() {
        let toml = r#"
log_level = "debug"

[reveal]
selectors = [".audience-card", ".timeline-item", ".result-card"]
duration_ms = 700

[count_up]
selector = ".result-number"
grouping = "european"

[viewport]
fallback = "immediate"
"#;

        let config: EffectsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.reveal.selectors.len(), 3);
        assert_eq!(config.reveal.offset_px, 30.0);
        assert_eq!(config.reveal.duration_ms(), 700);
        assert_eq!(config.count_up.selector, ".result-number");
        assert_eq!(config.count_up.grouping, NumberGrouping::European);
        assert_eq!(config.viewport.fallback, VisibilityFallback::Immediate);
        assert_eq!(config.viewport.bottom_margin_px, 50.0);
    }

    #[test]
    fn test_reveal_duration_clamped() {
        let mut reveal = RevealConfig::default();
        reveal.duration_ms = 100;
        assert_eq!(reveal.duration_ms(), REVEAL_MIN_DURATION_MS);
        reveal.duration_ms = 5_000;
        assert_eq!(reveal.duration_ms(), REVEAL_MAX_DURATION_MS);
    }

    #[test]
    fn test_parse_hero_and_cta() {
        let toml = r#"
[hero]
root = ".landing-hero"
parallax_rate = 0.5

[[hero.intro]]
selector = ".headline"
delay_ms = 150

[[navigation.call_to_action]]
button = ".start"
section = ".pricing"
"#;

        let config: EffectsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.hero.root, ".landing-hero");
        assert_eq!(config.hero.intro.len(), 1);
        assert_eq!(config.hero.intro[0].delay_ms, 150);
        assert_eq!(config.hero.button_selector, ".btn");
        assert_eq!(config.navigation.call_to_action.len(), 1);
        assert_eq!(config.navigation.call_to_action[0].section, ".pricing");
        assert_eq!(config.navigation.call_to_action[0].skip, 0);
        assert_eq!(config.navigation.call_to_action[0].limit, None);
        assert!(config.navigation.enabled);
    }

    #[test]
    fn test_default_cta_split_by_position() {
        let ctas = NavigationConfig::default().call_to_action;
        assert_eq!(ctas[0].button, ctas[1].button);
        assert_eq!((ctas[0].skip, ctas[0].limit), (0, Some(1)));
        assert_eq!((ctas[1].skip, ctas[1].limit), (1, None));
    }

    #[test]
    fn test_parse_special_effects_and_active_section() {
        let toml = r#"
[[reveal.special_effects]]
selector = ".case-study"
effect = "pulse"

[navigation.active_section]
class_name = "is-active"
"#;

        let config: EffectsConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.reveal.special_effects,
            vec![SpecialEffectRule::new(".case-study", SpecialEffect::Pulse)]
        );
        let active = &config.navigation.active_section;
        assert_eq!(active.class_name, "is-active");
        assert_eq!(active.selector, "section[class]");
        assert_eq!(active.threshold, 0.3);
    }

    #[test]
    fn test_disable_component() {
        let config: EffectsConfig = toml::from_str("[progress]\nenabled = false\n").unwrap();
        assert!(!config.progress.enabled);
        assert_eq!(config.progress.class_name, "scroll-progress");
    }
}
