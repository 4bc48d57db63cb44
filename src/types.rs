use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::Deserialize;

/// One of the three managed worker categories on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Generator,
    Scanner,
    Xfr,
}

impl Facility {
    pub const ALL: [Facility; 3] = [Facility::Generator, Facility::Scanner, Facility::Xfr];

    /// Numeric code used in command paths. Matches the server's enumeration order.
    pub fn code(self) -> u8 {
        match self {
            Facility::Generator => 0,
            Facility::Scanner => 1,
            Facility::Xfr => 2,
        }
    }

    /// Panel element id of the counter displaying this facility's worker count.
    pub fn counter_id(self) -> &'static str {
        match self {
            Facility::Generator => "cnt_gen",
            Facility::Scanner => "cnt_scan",
            Facility::Xfr => "cnt_xfr",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facility::Generator => write!(f, "Generator"),
            Facility::Scanner => write!(f, "Scanner"),
            Facility::Xfr => write!(f, "XFR"),
        }
    }
}

impl FromStr for Facility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generator" | "gen" => Ok(Facility::Generator),
            "scanner" | "scan" => Ok(Facility::Scanner),
            "xfr" => Ok(Facility::Xfr),
            other => bail!("unknown facility: {other}"),
        }
    }
}

/// Reply from the liveness endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BeaconReply {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Host identification as reported with a scan result.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct HostInfo {
    pub name: String,
    pub address: String,
}

/// One port-scan result record.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ScanResult {
    pub host: HostInfo,
    pub stamp: String,
    pub reply: String,
}

/// Reply from the incremental result poll, keyed by port number.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortRecentReply {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: BTreeMap<u16, Vec<ScanResult>>,
}

/// Reply from a spawn/stop worker command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerReply {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub new_cnt: i64,
}

/// Reply from the aggregate worker count endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerCountReply {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub generator: i64,
    #[serde(default)]
    pub scanner: i64,
    #[serde(rename = "XFR", default)]
    pub xfr: i64,
}

impl WorkerCountReply {
    pub fn count_for(&self, facility: Facility) -> i64 {
        match facility {
            Facility::Generator => self.generator,
            Facility::Scanner => self.scanner,
            Facility::Xfr => self.xfr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_codes_follow_server_order() {
        assert_eq!(Facility::Generator.code(), 0);
        assert_eq!(Facility::Scanner.code(), 1);
        assert_eq!(Facility::Xfr.code(), 2);
    }

    #[test]
    fn facility_parses_names_and_aliases() {
        assert_eq!("generator".parse::<Facility>().unwrap(), Facility::Generator);
        assert_eq!("SCAN".parse::<Facility>().unwrap(), Facility::Scanner);
        assert_eq!("Xfr".parse::<Facility>().unwrap(), Facility::Xfr);
        assert!("mailer".parse::<Facility>().is_err());
    }

    #[test]
    fn port_recent_reply_decodes_string_port_keys() {
        let body = r#"{
            "Status": true,
            "Results": {
                "22": [
                    {
                        "Host": { "Name": "mail.example.com", "Address": "192.0.2.7" },
                        "Stamp": "2022-11-09 19:19:21",
                        "Reply": "SSH-2.0-OpenSSH_9.1"
                    }
                ]
            }
        }"#;
        let reply: PortRecentReply = serde_json::from_str(body).unwrap();
        assert!(reply.status);
        let results = &reply.results[&22];
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].host.name, "mail.example.com");
        assert_eq!(results[0].reply, "SSH-2.0-OpenSSH_9.1");
    }

    #[test]
    fn worker_count_reply_uses_uppercase_xfr_key() {
        let body = r#"{ "Status": true, "Generator": 4, "Scanner": 16, "XFR": 2 }"#;
        let reply: WorkerCountReply = serde_json::from_str(body).unwrap();
        assert_eq!(reply.count_for(Facility::Generator), 4);
        assert_eq!(reply.count_for(Facility::Scanner), 16);
        assert_eq!(reply.count_for(Facility::Xfr), 2);
    }
}
