use anyhow::{bail, Context, Result};

/// Parse a comma-separated ports-of-interest list into a deduplicated list
/// of TCP ports (1..=65535). One result table is kept per port.
///
/// Supported tokens:
/// - single port number: `80`
/// - inclusive range: `8000-8010`
/// - whitespace around tokens is ignored
pub fn parse_port_list(s: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        // Range `start-end`
        if let Some((a, b)) = token.split_once('-') {
            let start = parse_port_str(a.trim())
                .with_context(|| format!("invalid start in range: {a}"))?;
            let end =
                parse_port_str(b.trim()).with_context(|| format!("invalid end in range: {b}"))?;
            if start > end {
                bail!("invalid range {start}-{end} (start > end)");
            }
            for p in start..=end {
                if seen.insert(p) {
                    out.push(p);
                }
            }
            continue;
        }

        // Single number
        let p = parse_port_str(token).with_context(|| format!("invalid port value: {token}"))?;
        if seen.insert(p) {
            out.push(p);
        }
    }

    Ok(out)
}

/// A conservative default list of ports the console keeps result tables for.
pub fn default_ports() -> Vec<u16> {
    const DEFAULT: &[u16] = &[21, 22, 23, 25, 53, 79, 80, 110, 143, 443];
    DEFAULT.to_vec()
}

fn parse_port_str(s: &str) -> Result<u16> {
    let val: u32 = s.parse::<u32>().map_err(|e| anyhow::anyhow!(e))?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_ports() {
        let ports = parse_port_list("80, 22,443").unwrap();
        assert_eq!(ports, vec![80, 22, 443]);
    }

    #[test]
    fn parse_ranges_and_dedup() {
        let ports = parse_port_list("8000-8002,80,8001").unwrap();
        assert_eq!(ports, vec![8000, 8001, 8002, 80]);
    }

    #[test]
    fn empty_tokens_are_skipped() {
        let ports = parse_port_list("22,,80,").unwrap();
        assert_eq!(ports, vec![22, 80]);
    }

    #[test]
    fn invalid_values_error() {
        assert!(parse_port_list("70000").is_err());
        assert!(parse_port_list("0").is_err());
        assert!(parse_port_list("22,http").is_err());
        assert!(parse_port_list("90-80").is_err());
    }

    #[test]
    fn default_has_common_ports() {
        let d = default_ports();
        assert!(!d.is_empty());
        assert!(d.contains(&22) && d.contains(&80));
    }
}
