use std::fmt;

/// Most `level:color` pairs kept from configuration; the rest are dropped.
pub const MAX_LEVEL_COLORS: usize = 100;

const DELIMITERS: [char; 4] = [' ', ':', ',', ';'];

#[derive(Clone, Debug, PartialEq)]
pub struct LevelColor {
    pub level: f64,
    pub color: String,
}

/// Threshold table mapping a value to a color, ascending by level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelColorTable {
    entries: Vec<LevelColor>,
}

#[derive(Debug, PartialEq)]
pub enum LevelColorError {
    InvalidLevel(String),
    NotAscending { previous: f64, next: f64 },
}

impl fmt::Display for LevelColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelColorError::InvalidLevel(token) => write!(f, "invalid level `{token}`"),
            LevelColorError::NotAscending { previous, next } => {
                write!(f, "level {next} follows {previous}; levels must be ascending")
            }
        }
    }
}

impl std::error::Error for LevelColorError {}

impl LevelColorTable {
    /// Parses `"0:green 50:yellow 80:red"`. Tokens may be separated by any mix
    /// of spaces, colons, commas and semicolons and are consumed pairwise.
    pub fn parse(input: &str) -> Result<Self, LevelColorError> {
        let mut tokens = input.split(DELIMITERS).filter(|t| !t.is_empty());
        let mut entries: Vec<LevelColor> = Vec::new();

        while entries.len() < MAX_LEVEL_COLORS {
            let Some(level_token) = tokens.next() else {
                break;
            };
            let level: f64 = level_token
                .parse()
                .map_err(|_| LevelColorError::InvalidLevel(level_token.to_string()))?;
            let Some(color) = tokens.next() else {
                break;
            };
            if let Some(previous) = entries.last()
                && level < previous.level
            {
                return Err(LevelColorError::NotAscending {
                    previous: previous.level,
                    next: level,
                });
            }
            entries.push(LevelColor {
                level,
                color: color.to_string(),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LevelColor] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color of the last entry whose level is `<= value`. An empty table
    /// gives `fallback`; a value below every level gives the last entry.
    pub fn color_for<'a>(&'a self, value: f64, fallback: &'a str) -> &'a str {
        let Some(last) = self.entries.last() else {
            return fallback;
        };
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.level <= value)
            .unwrap_or(last)
            .color
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traffic_light() -> LevelColorTable {
        LevelColorTable::parse("0:green 50:yellow 80:red").unwrap()
    }

    #[test]
    fn boundaries() {
        let table = traffic_light();
        assert_eq!(table.color_for(0.0, "blue"), "green");
        assert_eq!(table.color_for(49.9, "blue"), "green");
        assert_eq!(table.color_for(50.0, "blue"), "yellow");
        assert_eq!(table.color_for(79.99, "blue"), "yellow");
        assert_eq!(table.color_for(100.0, "blue"), "red");
    }

    #[test]
    fn empty_table_uses_fallback() {
        let table = LevelColorTable::default();
        assert_eq!(table.color_for(-5.0, "blue"), "blue");
    }

    #[test]
    fn below_every_level_uses_last_entry() {
        let table = traffic_light();
        assert_eq!(table.color_for(-5.0, "blue"), "red");
        assert_eq!(table.color_for(f64::NAN, "blue"), "red");
    }

    #[test]
    fn mixed_delimiters() {
        let table = LevelColorTable::parse("0,green;50:yellow  80 red").unwrap();
        assert_eq!(table, traffic_light());
    }

    #[test]
    fn dangling_level_is_ignored() {
        let table = LevelColorTable::parse("0:green 50").unwrap();
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn excess_pairs_are_dropped() {
        let input = (0..150)
            .map(|i| format!("{i}:c{i}"))
            .collect::<Vec<_>>()
            .join(",");
        let table = LevelColorTable::parse(&input).unwrap();
        assert_eq!(table.entries().len(), MAX_LEVEL_COLORS);
        assert_eq!(table.entries()[99].color, "c99");
    }

    #[test]
    fn rejects_descending_levels() {
        let err = LevelColorTable::parse("50:yellow 0:green").unwrap_err();
        assert_eq!(
            err,
            LevelColorError::NotAscending {
                previous: 50.0,
                next: 0.0
            }
        );
    }

    #[test]
    fn equal_levels_are_allowed() {
        let table = LevelColorTable::parse("10:a 10:b").unwrap();
        assert_eq!(table.color_for(10.0, "x"), "b");
    }

    #[test]
    fn rejects_garbage_level() {
        assert!(matches!(
            LevelColorTable::parse("high:red"),
            Err(LevelColorError::InvalidLevel(_))
        ));
    }
}
