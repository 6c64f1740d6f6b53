use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Inclusive TCP port range, always within `1..=65535` with `start <= end`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Every TCP port.
    pub const FULL: PortRange = PortRange {
        start: 1,
        end: 65535,
    };

    pub fn new(start: u16, end: u16) -> Result<Self, ConfigError> {
        if start == 0 || start > end {
            return Err(ConfigError::InvalidRange {
                start: start.into(),
                end: end.into(),
            });
        }
        Ok(Self { start, end })
    }

    /// A range covering one port.
    pub fn single(port: u16) -> Result<Self, ConfigError> {
        Self::new(port, port)
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the range. Never zero.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    /// Ports in ascending order.
    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl IntoIterator for PortRange {
    type Item = u16;
    type IntoIter = RangeInclusive<u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Parses `80` or an inclusive range `8000-8010`. Surrounding whitespace is ignored.
impl FromStr for PortRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((a, b)) = s.split_once('-') {
            let start = parse_port_str(a.trim())?;
            let end = parse_port_str(b.trim())?;
            if start > end {
                return Err(ConfigError::InvalidRange { start, end });
            }
            return PortRange::new(start as u16, end as u16);
        }
        let p = parse_port_str(s)?;
        PortRange::single(p as u16)
    }
}

// Returns u32 so an out-of-order range can still be reported with its raw bounds.
fn parse_port_str(s: &str) -> Result<u32, ConfigError> {
    let val: u32 = s
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidPort(s.to_string()))?;
    if val == 0 || val > 65535 {
        return Err(ConfigError::InvalidPort(s.to_string()));
    }
    Ok(val)
}
