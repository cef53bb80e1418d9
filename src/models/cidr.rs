//! IPv4 CIDR block utilities.
//!
//! Provides [`Cidr`] for representing an IPv4 network in prefix notation,
//! along with the mask arithmetic used by the layout check.

use std::error::Error;
use std::net::Ipv4Addr;

/// Maximum length for an IPv4 prefix (32 bits).
const MAX_LENGTH: u8 = 32;

/// Subnet mask for a prefix length as u32; lengths past 32 saturate.
fn mask_bits(len: u8) -> u32 {
    let right_len = MAX_LENGTH - len.min(MAX_LENGTH);
    let all_bits = u32::MAX as u64;
    ((all_bits >> right_len) << right_len) as u32
}

/// IPv4 network in CIDR notation.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash)]
pub struct Cidr {
    /// The IPv4 address as written.
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Cidr {
    /// Create a new [`Cidr`] from a string such as "10.0.0.0/16".
    ///
    /// # Examples
    /// ```
    /// use aws_vpc_topology::models::Cidr;
    /// let cidr = Cidr::new("10.0.37.42/19").unwrap();
    /// assert_eq!(cidr.lo().to_string(), "10.0.32.0");
    /// assert!(!cidr.is_network_aligned());
    /// ```
    pub fn new(addr_cidr: &str) -> Result<Cidr, Box<dyn Error>> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| format!("Invalid address/mask {addr_cidr}"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("Invalid address {addr}"))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| format!("Invalid prefix length {mask}"))?;
        if mask > MAX_LENGTH {
            return Err("Network length is too long".into());
        }
        Ok(Cidr { addr, mask })
    }

    /// Lowest (network) address of the block.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & mask_bits(self.mask))
    }

    /// Highest (broadcast) address of the block.
    pub fn hi(&self) -> Ipv4Addr {
        let mask = mask_bits(self.mask);
        Ipv4Addr::from((u32::from(self.addr) & mask) | !mask)
    }

    /// True when the address is the network address (no host bits set).
    pub fn is_network_aligned(&self) -> bool {
        self.addr == self.lo()
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &Cidr) -> bool {
        self.mask <= other.mask && self.lo() <= other.lo() && other.hi() <= self.hi()
    }

    /// True when the two blocks share at least one address.
    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl PartialEq for Cidr {
    fn eq(&self, other: &Cidr) -> bool {
        self.addr == other.addr && self.mask == other.mask
    }
}

impl PartialOrd for Cidr {
    fn partial_cmp(&self, other: &Cidr) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lo_hi() {
        let cidr = Cidr::new("10.0.37.42/19").unwrap();
        assert_eq!(cidr.lo(), Ipv4Addr::new(10, 0, 32, 0));
        assert_eq!(cidr.hi(), Ipv4Addr::new(10, 0, 63, 255));

        let public = Cidr::new("10.0.128.0/20").unwrap();
        assert_eq!(public.hi(), Ipv4Addr::new(10, 0, 143, 255));

        let host = Cidr::new("10.0.0.7/32").unwrap();
        assert_eq!(host.lo(), host.hi());
        let all = Cidr::new("0.0.0.0/0").unwrap();
        assert_eq!(all.hi(), Ipv4Addr::new(255, 255, 255, 255));
    }

    #[test]
    fn test_cidr_new_rejects_garbage() {
        assert!(Cidr::new("10.0.0.0").is_err());
        assert!(Cidr::new("10.0.0/16").is_err());
        assert!(Cidr::new("10.0.0.0/33").is_err());
        assert!(Cidr::new("10.0.0.0/x").is_err());
        assert_eq!(
            Cidr::new(" 10.0.0.0/16 ").unwrap().to_string(),
            "10.0.0.0/16"
        );
    }

    #[test]
    fn test_contains_and_overlaps() {
        let vpc = Cidr::new("10.0.0.0/16").unwrap();
        let private = Cidr::new("10.0.32.0/19").unwrap();
        let public = Cidr::new("10.0.128.0/20").unwrap();
        let outside = Cidr::new("10.1.0.0/24").unwrap();

        assert!(vpc.contains(&private));
        assert!(vpc.contains(&public));
        assert!(!vpc.contains(&outside));
        assert!(!private.contains(&vpc));
        assert!(vpc.overlaps(&private));
        assert!(!private.overlaps(&public));
        assert!(!vpc.overlaps(&outside));
    }

    #[test]
    fn test_alignment() {
        assert!(Cidr::new("10.0.192.0/21").unwrap().is_network_aligned());
        assert!(!Cidr::new("10.0.193.0/21").unwrap().is_network_aligned());
    }
}
