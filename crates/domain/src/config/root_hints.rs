use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// A root server the descent starts from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RootHint {
    pub hostname: String,

    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,

    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,
}

impl RootHint {
    fn new(hostname: &str, ipv4: [u8; 4], ipv6: [u16; 8]) -> Self {
        Self {
            hostname: hostname.to_string(),
            ipv4: Some(Ipv4Addr::from(ipv4)),
            ipv6: Some(Ipv6Addr::from(ipv6)),
        }
    }
}

/// The IANA root server set.
pub fn default_root_hints() -> Vec<RootHint> {
    vec![
        RootHint::new("a.root-servers.net", [198, 41, 0, 4], [0x2001, 0x503, 0xba3e, 0, 0, 0, 0x2, 0x30]),
        RootHint::new("b.root-servers.net", [170, 247, 170, 2], [0x2801, 0x1b8, 0x10, 0, 0, 0, 0, 0xb]),
        RootHint::new("c.root-servers.net", [192, 33, 4, 12], [0x2001, 0x500, 0x2, 0, 0, 0, 0, 0xc]),
        RootHint::new("d.root-servers.net", [199, 7, 91, 13], [0x2001, 0x500, 0x2d, 0, 0, 0, 0, 0xd]),
        RootHint::new("e.root-servers.net", [192, 203, 230, 10], [0x2001, 0x500, 0xa8, 0, 0, 0, 0, 0xe]),
        RootHint::new("f.root-servers.net", [192, 5, 5, 241], [0x2001, 0x500, 0x2f, 0, 0, 0, 0, 0xf]),
        RootHint::new("g.root-servers.net", [192, 112, 36, 4], [0x2001, 0x500, 0x12, 0, 0, 0, 0, 0xd0d]),
        RootHint::new("h.root-servers.net", [198, 97, 190, 53], [0x2001, 0x500, 0x1, 0, 0, 0, 0, 0x53]),
        RootHint::new("i.root-servers.net", [192, 36, 148, 17], [0x2001, 0x7fe, 0, 0, 0, 0, 0, 0x53]),
        RootHint::new("j.root-servers.net", [192, 58, 128, 30], [0x2001, 0x503, 0xc27, 0, 0, 0, 0x2, 0x30]),
        RootHint::new("k.root-servers.net", [193, 0, 14, 129], [0x2001, 0x7fd, 0, 0, 0, 0, 0, 0x1]),
        RootHint::new("l.root-servers.net", [199, 7, 83, 42], [0x2001, 0x500, 0x9f, 0, 0, 0, 0, 0x42]),
        RootHint::new("m.root-servers.net", [202, 12, 27, 33], [0x2001, 0xdc3, 0, 0, 0, 0, 0, 0x35]),
    ]
}
