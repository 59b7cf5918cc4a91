use rand::seq::IndexedRandom;
use rand::Rng;

use super::{ChaseSequence, Scene};
use crate::dmx::{ChannelMap, Color, ColorTable, Frame};
use crate::error::ConfigError;

const COLORWHEEL: [&str; 12] = [
    "red", "orange", "yellow", "lime", "green", "turquoise", "cyan", "sky", "blue", "purple",
    "magenta", "pink",
];

/// Builds the named chases from color names and the lamp layout.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChaseGenerator {
    channels: ChannelMap,
    colors: ColorTable,
}

impl ChaseGenerator {
    /// Upper bound on `random`, every scene holds a full universe.
    pub(crate) const MAX_RANDOM_SCENES: usize = 1024;

    pub(crate) fn new(channels: ChannelMap, colors: ColorTable) -> Self {
        Self { channels, colors }
    }

    pub(crate) fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// One scene per entry of `scenes`, each naming one color per lamp.
    pub(crate) fn make_chase<S: AsRef<str>>(
        &self,
        name: &str,
        channels: &ChannelMap,
        scenes: &[Vec<S>],
    ) -> Result<ChaseSequence, ConfigError> {
        let scenes = scenes
            .iter()
            .map(|names| {
                let colors = names
                    .iter()
                    .map(|n| Color::parse(n.as_ref(), &self.colors))
                    .collect::<Result<Vec<_>, _>>()?;
                Scene::new(channels, &colors)
            })
            .collect::<Result<Vec<_>, _>>()?;
        ChaseSequence::new(name, scenes)
    }

    /// Every channel off.
    pub(crate) fn blackout(&self) -> ChaseSequence {
        ChaseSequence {
            name: "blackout".to_string(),
            scenes: vec![Scene { frame: Frame::blank() }],
            cursor: 0,
        }
    }

    /// All lamps switch between two colors.
    pub(crate) fn iso(&self, color1: &str, color2: Option<&str>) -> Result<ChaseSequence, ConfigError> {
        let color2 = color2.unwrap_or("#000000");
        let lamps = self.channels.len();
        self.make_chase(
            "iso",
            &self.channels,
            &[vec![color1; lamps], vec![color2; lamps]],
        )
    }

    /// Two lamps alternating blue and yellow.
    pub(crate) fn mayday(&self) -> Result<ChaseSequence, ConfigError> {
        self.pair_chase("mayday", &[["blue", "yellow"], ["yellow", "blue"]])
    }

    /// Two lamps walking the color wheel one step apart.
    pub(crate) fn colorwheel(&self) -> Result<ChaseSequence, ConfigError> {
        let steps: Vec<[&str; 2]> = (0..COLORWHEEL.len())
            .map(|i| [COLORWHEEL[i], COLORWHEEL[(i + 1) % COLORWHEEL.len()]])
            .collect();
        self.pair_chase("colorwheel", &steps)
    }

    /// `scenes` scenes of named colors, sampled once here and fixed afterwards.
    pub(crate) fn random<R: Rng + ?Sized>(&self, scenes: usize, rng: &mut R) -> Result<ChaseSequence, ConfigError> {
        if !(1..=Self::MAX_RANDOM_SCENES).contains(&scenes) {
            return Err(ConfigError::SceneCountOutOfRange {
                value: scenes,
                max: Self::MAX_RANDOM_SCENES,
            });
        }
        let names = self.colors.names();
        let mut picked: Vec<Vec<&str>> = Vec::new();
        for _ in 0..scenes {
            let scene = (0..self.channels.len())
                .filter_map(|_| names.choose(&mut *rng).map(String::as_str))
                .collect();
            picked.push(scene);
        }
        self.make_chase("random", &self.channels, &picked)
    }

    fn pair_chase(&self, name: &str, scenes: &[[&str; 2]]) -> Result<ChaseSequence, ConfigError> {
        let channels = self.channels.take(2);
        // fewer than two lamps: only the first column is used
        let scenes: Vec<Vec<&str>> = scenes
            .iter()
            .map(|s| s[..channels.len()].to_vec())
            .collect();
        self.make_chase(name, &channels, &scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lamp(chase: &mut ChaseSequence, offset: usize) -> [u8; 3] {
        let frame = chase.next_frame();
        let bytes = frame.as_bytes();
        [bytes[offset], bytes[offset + 1], bytes[offset + 2]]
    }

    #[test]
    fn test_blackout() {
        let mut chase = ChaseGenerator::default().blackout();
        assert_eq!(chase.len(), 1);
        assert!(chase.next_frame().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_iso_defaults_to_off() {
        let mut chase = ChaseGenerator::default().iso("white", None).unwrap();
        assert_eq!(chase.len(), 2);
        assert_eq!(lamp(&mut chase, 8), [255, 255, 255]);
        assert_eq!(lamp(&mut chase, 0), [0, 0, 0]);
    }

    #[test]
    fn test_iso_unknown_color() {
        let result = ChaseGenerator::default().iso("mauve", Some("red"));
        assert!(matches!(result, Err(ConfigError::UnknownColor(c)) if c == "mauve"));
    }

    #[test]
    fn test_mayday() {
        let mut chase = ChaseGenerator::default().mayday().unwrap();
        let first = chase.next_frame();
        assert_eq!(&first.as_bytes()[0..3], &[0, 0, 255]);
        assert_eq!(&first.as_bytes()[8..11], &[255, 255, 0]);
        let second = chase.next_frame();
        assert_eq!(&second.as_bytes()[0..3], &[255, 255, 0]);
        assert_eq!(&second.as_bytes()[8..11], &[0, 0, 255]);
    }

    #[test]
    fn test_colorwheel_wraps() {
        let mut chase = ChaseGenerator::default().colorwheel().unwrap();
        assert_eq!(chase.len(), 12);
        for _ in 0..11 {
            chase.next_frame();
        }
        // pink, red
        let last = chase.next_frame();
        assert_eq!(&last.as_bytes()[0..3], &[255, 0, 127]);
        assert_eq!(&last.as_bytes()[8..11], &[255, 0, 0]);
    }

    #[test]
    fn test_pair_chase_with_one_lamp() {
        let gen = ChaseGenerator::new(ChannelMap::new(vec![4]).unwrap(), ColorTable::default());
        let mut chase = gen.mayday().unwrap();
        assert_eq!(&chase.next_frame().as_bytes()[4..7], &[0, 0, 255]);
    }

    #[test]
    fn test_random_is_fixed_once_built() {
        let gen = ChaseGenerator::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut chase = gen.random(5, &mut rng).unwrap();
        assert_eq!(chase.len(), 5);

        let first_cycle: Vec<_> = chase.by_ref().take(5).collect();
        let second_cycle: Vec<_> = chase.by_ref().take(5).collect();
        assert_eq!(first_cycle, second_cycle);
    }

    #[test]
    fn test_random_scene_count_bounds() {
        let gen = ChaseGenerator::default();
        let mut rng = StdRng::seed_from_u64(1);
        for count in [0, ChaseGenerator::MAX_RANDOM_SCENES + 1, usize::MAX] {
            assert_eq!(
                gen.random(count, &mut rng).err(),
                Some(ConfigError::SceneCountOutOfRange { value: count, max: 1024 })
            );
        }
        let chase = gen.random(ChaseGenerator::MAX_RANDOM_SCENES, &mut rng).unwrap();
        assert_eq!(chase.len(), 1024);
    }

    #[test]
    fn test_make_chase_hex_literal() {
        let gen = ChaseGenerator::default();
        let mut chase = gen
            .make_chase("custom", &gen.channels, &[vec!["#010203", "black"]])
            .unwrap();
        assert_eq!(lamp(&mut chase, 0), [1, 2, 3]);
    }
}
