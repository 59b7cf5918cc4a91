use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;

/// An (r, g, b) color as it goes on the wire.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub(crate) const BLACK: Self = Self(0, 0, 0);

    /// Parse exactly six hex digits, without a leading `#`.
    pub(crate) fn from_hex(value: &str) -> Result<Self, ConfigError> {
        if value.len() != 6 {
            return Err(ConfigError::InvalidHex(value.to_string()));
        }
        let bytes = hex::decode(value).map_err(|_| ConfigError::InvalidHex(value.to_string()))?;
        Ok(Self(bytes[0], bytes[1], bytes[2]))
    }

    pub(crate) fn to_hex(self) -> String {
        hex::encode(self.bytes())
    }

    /// Resolve an alias from `table`, falling back to a `#rrggbb` literal.
    pub(crate) fn parse(value: &str, table: &ColorTable) -> Result<Self, ConfigError> {
        if let Some(color) = table.get(value) {
            return Ok(color);
        }
        match value.strip_prefix('#') {
            Some(digits) => Self::from_hex(digits),
            None => Err(ConfigError::UnknownColor(value.to_string())),
        }
    }

    pub(crate) fn bytes(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Case-sensitive color names, consulted only while building chases.
#[derive(Debug, Clone)]
pub(crate) struct ColorTable {
    aliases: HashMap<String, Color>,
    // insertion order, for help output and random sampling
    names: Vec<String>,
}

impl ColorTable {
    pub(crate) fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
            names: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, color: Color) {
        let name = name.into();
        if self.aliases.insert(name.clone(), color).is_none() {
            self.names.push(name);
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Color> {
        self.aliases.get(name).copied()
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (name, value) in [
            ("red", Color(0xff, 0x00, 0x00)),
            ("green", Color(0x00, 0xff, 0x00)),
            ("blue", Color(0x00, 0x00, 0xff)),
            ("yellow", Color(0xff, 0xff, 0x00)),
            ("magenta", Color(0xff, 0x00, 0xff)),
            ("cyan", Color(0x00, 0xff, 0xff)),
            ("orange", Color(0xff, 0x7f, 0x00)),
            ("pink", Color(0xff, 0x00, 0x7f)),
            ("lime", Color(0x7f, 0xff, 0x00)),
            ("turquoise", Color(0x00, 0xff, 0x7f)),
            ("purple", Color(0x7f, 0x00, 0xff)),
            ("sky", Color(0x00, 0x7f, 0xff)),
            ("white", Color(0xff, 0xff, 0xff)),
            ("black", Color::BLACK),
        ] {
            table.insert(name, value);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_normalizes_case() {
        for s in ["ff7f00", "000000", "00FF7F", "AbCdEf"] {
            let color = Color::from_hex(s).unwrap();
            assert_eq!(color.to_hex(), s.to_lowercase());
        }
        assert_eq!(Color::from_hex("ff7f00").unwrap(), Color(255, 127, 0));
    }

    #[test]
    fn test_hex_rejects_bad_input() {
        assert_eq!(
            Color::from_hex("fff"),
            Err(ConfigError::InvalidHex("fff".to_string()))
        );
        assert!(Color::from_hex("ff00ff00").is_err());
        assert!(Color::from_hex("gg0000").is_err());
        assert!(Color::from_hex("#ff000").is_err());
    }

    #[test]
    fn test_parse_alias_and_literal() {
        let table = ColorTable::default();
        assert_eq!(Color::parse("sky", &table).unwrap(), Color(0, 127, 255));
        assert_eq!(Color::parse("#102030", &table).unwrap(), Color(0x10, 0x20, 0x30));
        assert_eq!(
            Color::parse("Red", &table),
            Err(ConfigError::UnknownColor("Red".to_string()))
        );
        assert!(Color::parse("102030", &table).is_err());
    }

    #[test]
    fn test_default_table() {
        let table = ColorTable::default();
        assert_eq!(table.names().len(), 14);
        assert_eq!(table.names()[0], "red");
        assert_eq!(table.get("black"), Some(Color::BLACK));
    }

    #[test]
    fn test_display() {
        assert_eq!(Color(1, 2, 255).to_string(), "#0102ff");
    }
}
