use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;

/// Parses a comma-separated list of ports and inclusive port ranges, e.g.
/// `8081,9000-9010`.
pub fn parse_portset(s: &str) -> Result<BTreeSet<u16>> {
    let mut ports = BTreeSet::new();
    for spec in s.split(',') {
        match spec.split_once('-') {
            None => {
                if !spec.trim().is_empty() {
                    let port = spec.trim().parse().context("parsing port")?;
                    if port == 0 {
                        bail!("port must not be 0")
                    }
                    ports.insert(port);
                }
            }
            Some((floor, ceil)) => {
                let floor = floor.trim().parse::<u16>().context("parsing port")?;
                let ceil = ceil.trim().parse::<u16>().context("parsing port")?;
                if floor == 0 {
                    bail!("port must not be 0")
                }
                if floor > ceil {
                    bail!("port range must be increasing");
                }
                ports.extend(floor..=ceil);
            }
        }
    }
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ports_and_ranges() {
        assert!(parse_portset("").unwrap().is_empty(), "empty");
        assert!(parse_portset("0").is_err(), "0");
        assert!(parse_portset("0-2").is_err(), "0-2");
        assert!(parse_portset("3-1").is_err(), "3-1");
        assert!(parse_portset("http").is_err(), "http");
        assert_eq!(parse_portset("1").unwrap(), BTreeSet::from([1]), "1");
        assert_eq!(parse_portset("1-2").unwrap(), BTreeSet::from([1, 2]), "1-2");
        assert_eq!(
            parse_portset(" 4, 1-2 ,").unwrap(),
            BTreeSet::from([1, 2, 4]),
            "4,1-2"
        );
    }
}
