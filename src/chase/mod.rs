pub(crate) mod generator;

pub(crate) use generator::ChaseGenerator;

use crate::dmx::{ChannelMap, Color, Frame};
use crate::error::ConfigError;

/// One lighting state, rendered into a full frame up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scene {
    frame: Frame,
}

impl Scene {
    /// `colors[i]` goes to the lamp at `channels.offsets()[i]`.
    pub(crate) fn new(channels: &ChannelMap, colors: &[Color]) -> Result<Self, ConfigError> {
        if colors.len() != channels.len() {
            return Err(ConfigError::LampCountMismatch {
                lamps: channels.len(),
                colors: colors.len(),
            });
        }
        let mut frame = Frame::blank();
        for (&channel, &color) in channels.offsets().iter().zip(colors) {
            frame.write_color(channel, color)?;
        }
        Ok(Self { frame })
    }

    pub(crate) fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// A looping list of scenes.
///
/// The cursor cannot be rewound. Starting over means building a new
/// sequence, which is what happens whenever the pipeline swaps chases.
#[derive(Debug, Clone)]
pub(crate) struct ChaseSequence {
    name: String,
    scenes: Vec<Scene>,
    cursor: usize,
}

impl ChaseSequence {
    pub(crate) fn new(name: impl Into<String>, scenes: Vec<Scene>) -> Result<Self, ConfigError> {
        if scenes.is_empty() {
            return Err(ConfigError::EmptyChase);
        }
        Ok(Self {
            name: name.into(),
            scenes,
            cursor: 0,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Index of the scene the next call to [`Self::next_frame`] returns.
    pub(crate) fn position(&self) -> usize {
        self.cursor
    }

    pub(crate) fn next_frame(&mut self) -> Frame {
        let frame = self.scenes[self.cursor].frame().clone();
        self.cursor = (self.cursor + 1) % self.scenes.len();
        frame
    }
}

/// Never returns `None`.
impl Iterator for ChaseSequence {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        Some(self.next_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ChannelMap {
        ChannelMap::new(vec![0, 8]).unwrap()
    }

    fn scene(a: Color, b: Color) -> Scene {
        Scene::new(&map(), &[a, b]).unwrap()
    }

    #[test]
    fn test_scene_renders_lamps() {
        let s = scene(Color(255, 0, 0), Color(0, 0, 255));
        let bytes = s.frame().as_bytes();
        assert_eq!(&bytes[0..3], &[255, 0, 0]);
        assert_eq!(&bytes[8..11], &[0, 0, 255]);
        assert!(bytes[3..8].iter().all(|&b| b == 0));
        assert!(bytes[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_scene_lamp_count_mismatch() {
        assert_eq!(
            Scene::new(&map(), &[Color::BLACK]),
            Err(ConfigError::LampCountMismatch { lamps: 2, colors: 1 })
        );
    }

    #[test]
    fn test_empty_chase_rejected() {
        assert!(matches!(
            ChaseSequence::new("empty", vec![]),
            Err(ConfigError::EmptyChase)
        ));
    }

    #[test]
    fn test_cycles_in_order() {
        let scenes = vec![
            scene(Color(1, 0, 0), Color::BLACK),
            scene(Color(2, 0, 0), Color::BLACK),
            scene(Color(3, 0, 0), Color::BLACK),
        ];
        let mut chase = ChaseSequence::new("steps", scenes.clone()).unwrap();

        for _ in 0..4 {
            for expected in &scenes {
                assert_eq!(&chase.next_frame(), expected.frame());
            }
        }
        assert_eq!(chase.position(), 0);
    }

    #[test]
    fn test_single_scene_never_ends() {
        let mut chase = ChaseSequence::new("still", vec![scene(Color::BLACK, Color::BLACK)]).unwrap();
        assert_eq!(chase.by_ref().take(1000).count(), 1000);
        assert!(chase.next().is_some());
    }

    #[test]
    fn test_clone_keeps_position() {
        let mut chase = ChaseSequence::new(
            "pair",
            vec![scene(Color(1, 0, 0), Color::BLACK), scene(Color(2, 0, 0), Color::BLACK)],
        )
        .unwrap();
        chase.next_frame();
        let mut copy = chase.clone();
        assert_eq!(copy.position(), 1);
        assert_eq!(copy.next_frame(), chase.next_frame());
    }
}
