use rand::Rng;
use std::str::FromStr;
use thiserror::Error;

/// Ephemeral range used by `random`
const RANDOM_PORTS: std::ops::RangeInclusive<u16> = 1024..=65535;

/// How a generated record picks a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    Random,
    Range(u16, u16),
    List(Vec<u16>),
    Single(u16),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortSpecError {
    #[error("Invalid port configuration: {0}")]
    Invalid(String),
    #[error("Port range {0}-{1} is backwards")]
    Backwards(u16, u16),
}

impl FromStr for PortSpec {
    type Err = PortSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let port = |p: &str| p.trim().parse::<u16>().map_err(|_| PortSpecError::Invalid(s.to_string()));
        if s.eq_ignore_ascii_case("random") {
            Ok(PortSpec::Random)
        } else if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (port(start)?, port(end)?);
            if start > end {
                return Err(PortSpecError::Backwards(start, end));
            }
            Ok(PortSpec::Range(start, end))
        } else if s.contains(',') {
            let ports = s.split(',').map(port).collect::<Result<Vec<u16>, _>>()?;
            Ok(PortSpec::List(ports))
        } else {
            Ok(PortSpec::Single(port(s)?))
        }
    }
}

impl PortSpec {
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> u16 {
        match self {
            PortSpec::Random => rng.random_range(RANDOM_PORTS),
            PortSpec::Range(start, end) => rng.random_range(*start..=*end),
            PortSpec::List(ports) => ports[rng.random_range(0..ports.len())],
            PortSpec::Single(port) => *port,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn parse() {
        assert_eq!("random".parse(), Ok(PortSpec::Random));
        assert_eq!("RANDOM".parse(), Ok(PortSpec::Random));
        assert_eq!("1000-2000".parse(), Ok(PortSpec::Range(1000, 2000)));
        assert_eq!("80,443, 8080".parse(), Ok(PortSpec::List(vec![80, 443, 8080])));
        assert_eq!("53".parse(), Ok(PortSpec::Single(53)));
        assert_eq!("2000-1000".parse::<PortSpec>(), Err(PortSpecError::Backwards(2000, 1000)));
        assert!("http".parse::<PortSpec>().is_err());
        assert!("80,,443".parse::<PortSpec>().is_err());
        assert!("70000".parse::<PortSpec>().is_err());
    }

    #[test]
    fn picks_stay_in_bounds() {
        let mut rng = SmallRng::seed_from_u64(7);
        let range = PortSpec::Range(1000, 1010);
        let list = PortSpec::List(vec![80, 443]);
        for _ in 0..1000 {
            assert!((1000..=1010).contains(&range.pick(&mut rng)));
            assert!([80, 443].contains(&list.pick(&mut rng)));
            assert!(PortSpec::Random.pick(&mut rng) >= 1024);
        }
        assert_eq!(PortSpec::Single(53).pick(&mut rng), 53);
    }
}
