//! Decorative particle fields behind the dashboard.
//!
//! Every generator is a pure function of its RNG, so a scene is reproducible
//! from its seed.

use crate::catalog::WeatherCondition;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;

const FADE_TRANSITION: &str = "opacity 1s ease";
const LIGHTNING_PROBABILITY: f64 = 0.15;
const BOLT_SKEWS: [i32; 5] = [-8, -5, 0, 5, 8];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledNode {
    pub class_name: &'static str,
    pub style: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StyledNode>,
}

impl StyledNode {
    fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            style: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn with(mut self, key: &str, value: String) -> Self {
        self.style.insert(key.to_string(), value);
        self
    }

    fn with_children(mut self, children: Vec<StyledNode>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectField {
    pub visible: bool,
    pub transition: Option<&'static str>,
    pub children: Vec<StyledNode>,
}

impl EffectField {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            transition: None,
            children: Vec::new(),
        }
    }

    fn shown(transition: Option<&'static str>, children: Vec<StyledNode>) -> Self {
        Self {
            visible: true,
            transition,
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbientScene {
    pub seed: u64,
    pub rain: EffectField,
    pub snow: EffectField,
    pub clouds: EffectField,
    pub thunder: EffectField,
}

pub fn fresh_seed() -> u64 {
    fastrand::u64(..)
}

/// Scene for a condition. Only the field that belongs to it is populated.
pub fn generate(condition: WeatherCondition, seed: u64) -> AmbientScene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = AmbientScene {
        seed,
        rain: EffectField::hidden(),
        snow: EffectField::hidden(),
        clouds: EffectField::hidden(),
        thunder: EffectField::hidden(),
    };

    match condition {
        WeatherCondition::Rain => scene.rain = rain_field(&mut rng),
        WeatherCondition::Snow => scene.snow = snow_field(&mut rng),
        WeatherCondition::PartlyCloudy => scene.clouds = cloud_field(&mut rng, CloudDensity::Light),
        WeatherCondition::Cloudy => scene.clouds = cloud_field(&mut rng, CloudDensity::Dense),
        WeatherCondition::Thunder => scene.thunder = thunder_field(&mut rng),
        WeatherCondition::Clear | WeatherCondition::Foggy | WeatherCondition::Default => {}
    }

    scene
}

pub fn generate_for_theme(theme_class: &str, seed: u64) -> AmbientScene {
    generate(WeatherCondition::from_theme_class(theme_class), seed)
}

pub fn rain_field<R: Rng>(rng: &mut R) -> EffectField {
    let drops = (0..120)
        .map(|_| {
            StyledNode::new("rain-drop")
                .with("left", format!("{}%", rng.gen_range(-5.0..105.0)))
                .with("top", format!("{}px", rng.gen_range(-100.0..0.0)))
                .with("height", format!("{}px", rng.gen_range(20.0..50.0)))
                .with("width", format!("{}px", rng.gen_range(1.0..2.0)))
                .with("opacity", format!("{}", 0.6 * rng.gen_range(0.8..1.2)))
                .with("animationDelay", format!("{}s", rng.gen_range(0.0..2.0)))
                .with("animationDuration", format!("{}s", rng.gen_range(1.5..3.0)))
        })
        .collect();

    EffectField::shown(Some(FADE_TRANSITION), drops)
}

pub fn snow_field<R: Rng>(rng: &mut R) -> EffectField {
    let layers = (0..3)
        .map(|layer| {
            let layer = f64::from(layer);
            let speed_factor = 1.0 + layer * 0.6;
            let size_factor = 0.6 + layer * 0.4;

            let mut flakes = Vec::with_capacity(100);
            for _ in 0..50 {
                let top = rng.gen_range(0.0..100.0);
                let flake = StyledNode::new("snowflake")
                    .with("left", format!("{}%", rng.gen_range(-10.0..110.0)))
                    .with("fontSize", format!("{}px", rng.gen_range(12.0..24.0) * size_factor))
                    .with("opacity", format!("{}", rng.gen_range(0.7..1.0)))
                    .with("--sway-distance", format!("{}px", rng.gen_range(30.0..80.0)))
                    .with("--sway-duration", format!("{}s", rng.gen_range(3.0..7.0)))
                    .with("--rotation-speed", format!("{}s", rng.gen_range(8.0..20.0)));

                flakes.push(flake.clone().with("top", format!("{}vh", top)));
                flakes.push(flake.with("top", format!("{}vh", top + 100.0)));
            }

            StyledNode::new("snow-layer")
                .with("--fall-duration", format!("{}s", 60.0 / speed_factor))
                .with_children(flakes)
        })
        .collect();

    EffectField::shown(None, layers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudDensity {
    Light,
    Dense,
}

impl CloudDensity {
    /// (clouds per layer, base opacity, base width, base height)
    fn params(self) -> (usize, f64, f64, f64) {
        match self {
            CloudDensity::Light => (10, 0.85, 200.0, 80.0),
            CloudDensity::Dense => (20, 0.95, 250.0, 100.0),
        }
    }
}

pub fn cloud_field<R: Rng>(rng: &mut R, density: CloudDensity) -> EffectField {
    let (count, base_opacity, base_width, base_height) = density.params();

    let layers = (0..3)
        .map(|layer| {
            let layer = f64::from(layer);
            let scale = 1.0 - layer * 0.2;

            let mut clouds = Vec::with_capacity(count * 2);
            for _ in 0..count {
                let left = rng.gen_range(0.0..100.0);
                let cloud = StyledNode::new("cloud")
                    .with("top", format!("{}vh", rng.gen_range(10.0..80.0 + layer * 10.0)))
                    .with(
                        "width",
                        format!("{}px", rng.gen_range(0.7..1.3) * base_width * scale),
                    )
                    .with(
                        "height",
                        format!("{}px", rng.gen_range(0.8..1.2) * base_height * scale),
                    )
                    .with("opacity", format!("{}", rng.gen_range(0.8..1.2) * base_opacity))
                    .with("filter", format!("blur({}px)", 1.0 + layer * 0.5));

                clouds.push(cloud.clone().with("left", format!("{}vw", left)));
                clouds.push(cloud.with("left", format!("{}vw", left + 100.0)));
            }

            StyledNode::new("cloud-layer")
                .with("--scroll-duration", format!("{}s", 60.0 + layer * 30.0))
                .with_children(clouds)
        })
        .collect();

    EffectField::shown(Some(FADE_TRANSITION), layers)
}

pub fn thunder_field<R: Rng>(rng: &mut R) -> EffectField {
    let layers = (0..4)
        .map(|layer| {
            let layer = f64::from(layer);
            let scale = 1.0 - layer * 0.2;

            let mut containers = Vec::with_capacity(24);
            for _ in 0..12 {
                let left = rng.gen_range(0.0..100.0);
                let mut content = vec![StyledNode::new("thunder-cloud")
                    .with("width", "100%".to_string())
                    .with("height", "100%".to_string())
                    .with("opacity", format!("{}", rng.gen_range(0.85..1.0)))
                    .with("filter", format!("blur({}px)", 2.0 + layer))];

                if rng.gen_bool(LIGHTNING_PROBABILITY) {
                    let flash_duration = format!("{}s", rng.gen_range(3.0..5.0));
                    let flash_delay = format!("{}s", rng.gen_range(0.0..20.0));
                    let skew = BOLT_SKEWS[rng.gen_range(0..BOLT_SKEWS.len())];

                    let bolt = StyledNode::new("lightning-bolt")
                        .with("--bolt-height", format!("{}vh", rng.gen_range(20.0..35.0)))
                        .with("--skew", format!("{}deg", skew))
                        .with("--flash-duration", flash_duration.clone())
                        .with("--flash-delay", flash_delay.clone());
                    let glow = StyledNode::new("cloud-glow")
                        .with("--flash-duration", flash_duration)
                        .with("--flash-delay", flash_delay);

                    content.push(StyledNode::new("cloud-lightning").with_children(vec![bolt, glow]));
                }

                let container = StyledNode::new("thunder-cloud-container")
                    .with("top", format!("{}vh", rng.gen_range(10.0..50.0 + layer * 15.0)))
                    .with("width", format!("{}px", rng.gen_range(0.7..1.3) * 280.0 * scale))
                    .with("height", format!("{}px", rng.gen_range(0.8..1.2) * 110.0 * scale))
                    .with_children(content);

                containers.push(container.clone().with("left", format!("{}vw", left)));
                containers.push(container.with("left", format!("{}vw", left + 100.0)));
            }

            StyledNode::new("thunder-layer")
                .with("--scroll-duration", "120s".to_string())
                .with_children(containers)
        })
        .collect();

    EffectField::shown(None, layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(node: &StyledNode, key: &str, unit: &str) -> f64 {
        node.style[key]
            .strip_suffix(unit)
            .unwrap_or_else(|| panic!("{} has no {} suffix", key, unit))
            .parse()
            .unwrap()
    }

    #[test]
    fn test_same_seed_same_scene() {
        for condition in [
            WeatherCondition::Rain,
            WeatherCondition::Snow,
            WeatherCondition::Cloudy,
            WeatherCondition::Thunder,
        ] {
            assert_eq!(generate(condition, 42), generate(condition, 42));
        }
        assert_ne!(
            generate(WeatherCondition::Rain, 1).rain,
            generate(WeatherCondition::Rain, 2).rain
        );
    }

    #[test]
    fn test_only_matching_field_is_visible() {
        let scene = generate_for_theme("weather-bg rain light-text", 7);
        assert!(scene.rain.visible);
        assert!(!scene.snow.visible && !scene.clouds.visible && !scene.thunder.visible);

        let scene = generate_for_theme("weather-bg default light-text", 7);
        for field in [&scene.rain, &scene.snow, &scene.clouds, &scene.thunder] {
            assert_eq!(field, &EffectField::hidden());
        }

        let scene = generate_for_theme("weather-bg partly-cloudy light-text", 7);
        assert!(scene.clouds.visible);
        assert_eq!(scene.clouds.children[0].children.len(), 20);
    }

    #[test]
    fn test_rain_bounds() {
        let field = rain_field(&mut StdRng::seed_from_u64(3));
        assert_eq!(field.children.len(), 120);
        assert_eq!(field.transition, Some("opacity 1s ease"));
        for drop in &field.children {
            assert!((-5.0..105.0).contains(&value(drop, "left", "%")));
            assert!((-100.0..0.0).contains(&value(drop, "top", "px")));
            assert!((20.0..50.0).contains(&value(drop, "height", "px")));
            assert!((1.5..3.0).contains(&value(drop, "animationDuration", "s")));
            let opacity = value(drop, "opacity", "");
            assert!((0.48..=0.72).contains(&opacity));
        }
    }

    #[test]
    fn test_snow_layers() {
        let field = snow_field(&mut StdRng::seed_from_u64(4));
        assert_eq!(field.children.len(), 3);
        for (layer, node) in field.children.iter().enumerate() {
            let expected = 60.0 / (1.0 + layer as f64 * 0.6);
            assert!((value(node, "--fall-duration", "s") - expected).abs() < 1e-9);
            assert_eq!(node.children.len(), 100);

            let size_factor = 0.6 + layer as f64 * 0.4;
            for pair in node.children.chunks(2) {
                let top = value(&pair[0], "top", "vh");
                assert!((0.0..100.0).contains(&top));
                assert!((value(&pair[1], "top", "vh") - top - 100.0).abs() < 1e-9);
                let size = value(&pair[0], "fontSize", "px");
                assert!(size >= 12.0 * size_factor && size <= 24.0 * size_factor);
            }
        }
    }

    #[test]
    fn test_cloud_layers() {
        let field = cloud_field(&mut StdRng::seed_from_u64(5), CloudDensity::Light);
        assert_eq!(field.children.len(), 3);
        for (layer, node) in field.children.iter().enumerate() {
            let layer = layer as f64;
            let scale = 1.0 - layer * 0.2;
            assert_eq!(value(node, "--scroll-duration", "s"), 60.0 + layer * 30.0);
            assert_eq!(node.children.len(), 20);
            for pair in node.children.chunks(2) {
                let left = value(&pair[0], "left", "vw");
                assert!((value(&pair[1], "left", "vw") - left - 100.0).abs() < 1e-9);
                let width = value(&pair[0], "width", "px");
                assert!(width >= 0.7 * 200.0 * scale - 1e-9 && width <= 1.3 * 200.0 * scale + 1e-9);
                let top = value(&pair[0], "top", "vh");
                assert!(top >= 10.0 && top < 80.0 + layer * 10.0);
            }
        }
    }

    #[test]
    fn test_thunder_layers() {
        let field = thunder_field(&mut StdRng::seed_from_u64(6));
        assert_eq!(field.children.len(), 4);
        for node in &field.children {
            assert_eq!(node.style["--scroll-duration"], "120s");
            assert_eq!(node.children.len(), 24);
            for pair in node.children.chunks(2) {
                assert_eq!(pair[0].children, pair[1].children);
                assert_eq!(pair[0].children[0].class_name, "thunder-cloud");
                if let Some(lightning) = pair[0].children.get(1) {
                    let bolt = &lightning.children[0];
                    let glow = &lightning.children[1];
                    assert_eq!(bolt.style["--flash-delay"], glow.style["--flash-delay"]);
                    let skew = value(bolt, "--skew", "deg") as i32;
                    assert!(BOLT_SKEWS.contains(&skew));
                }
            }
        }
    }
}
